//! Exhaustive enumeration loop.

use super::combinations::{binomial, Combinations};
use crate::error::Result;
use crate::objective::ObjectiveFunction;
use crate::search::{impl_search, SearchConfig, SearchCore, StopReason};
use crate::solution::SubsetSolution;

/// Evaluates every subset with a size in the window and keeps the best.
///
/// Subsets are visited size by size in lexicographic order, so
/// consecutive subsets mostly differ in a few items and the incremental
/// evaluation stays cheap. A step is one subset; progress is the fraction
/// enumerated.
pub struct ExhaustiveSearch {
    core: SearchCore,
}

impl ExhaustiveSearch {
    pub fn new(objective: ObjectiveFunction, universe_size: usize, config: SearchConfig) -> Result<Self> {
        Ok(Self {
            core: SearchCore::new("exhaustive search", objective, universe_size, config, false)?,
        })
    }

    /// Number of subsets in the window.
    pub fn space_size(&self) -> f64 {
        let n = self.core.universe_size();
        let bounds = self.core.bounds();
        (bounds.min..=bounds.max).map(|k| binomial(n, k)).sum()
    }

    #[tracing::instrument(level = "debug", name = "exhaustive_search", skip(self))]
    fn run(&mut self) -> Result<StopReason> {
        let objective = self.core.objective().clone();
        let direction = objective.direction();
        let n = self.core.universe_size();
        let bounds = self.core.bounds();
        let total = self.space_size();
        tracing::debug!(subsets = total, "enumerating");

        let mut context = objective.new_context();
        let mut enumerated = 0.0;
        for k in bounds.min..=bounds.max {
            let mut combinations = Combinations::new(n, k);
            while let Some(subset) = combinations.advance() {
                if let Some(reason) = self.core.limit_reached() {
                    return Ok(reason);
                }
                let value = objective.evaluate(subset, &mut context)?;
                if self
                    .core
                    .best_evaluation()
                    .is_none_or(|best| direction.is_better(value, best))
                {
                    let solution = SubsetSolution::new(n, subset.iter().copied())?;
                    self.core.offer(&solution, value);
                }
                enumerated += 1.0;
                self.core.step();
                self.core.report_progress(enumerated / total);
            }
        }
        Ok(StopReason::Exhausted)
    }
}

impl_search!(ExhaustiveSearch);
