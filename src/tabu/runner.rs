//! Tabu Search execution engine.
//!
//! # Algorithm
//!
//! 1. Start from the initial solution
//! 2. At each step:
//!    a. Evaluate the neighbourhood incrementally
//!    b. Take the best non-tabu move (or a tabu move that would improve the
//!       best solution, aspiration), even when it worsens the current one
//!    c. Make the indices it touched tabu
//!    d. Update the best solution if improved
//! 3. Terminate on a limit, on stagnation or when every move is tabu

use super::config::TabuConfig;
use super::manager::TabuManager;
use crate::error::Result;
use crate::neighbourhood::Neighbourhood;
use crate::objective::ObjectiveFunction;
use crate::search::{impl_search, SearchConfig, SearchCore, StopReason};
use crate::solution::SubsetSolution;

/// Tabu Search over add / remove / swap moves.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use corehunter::data::DistanceMatrix;
/// use corehunter::objective::{Aggregation, ObjectiveFunction, PrecomputedDistance};
/// use corehunter::search::{Search, SearchConfig};
/// use corehunter::tabu::{TabuConfig, TabuSearch};
///
/// let matrix = DistanceMatrix::from_rows(&[
///     vec![0.0, 1.0, 5.0, 2.0],
///     vec![1.0, 0.0, 1.0, 1.0],
///     vec![5.0, 1.0, 0.0, 3.0],
///     vec![2.0, 1.0, 3.0, 0.0],
/// ])
/// .unwrap();
/// let objective = ObjectiveFunction::new(
///     Arc::new(PrecomputedDistance::new(Arc::new(matrix))),
///     Aggregation::Mean,
/// );
/// let config = SearchConfig::new(2, 2).with_max_steps(20).with_seed(42);
/// let mut search = TabuSearch::new(objective, 4, config, TabuConfig::default()).unwrap();
/// search.start().unwrap();
/// assert_eq!(search.best_solution_evaluation(), Some(5.0));
/// ```
pub struct TabuSearch {
    core: SearchCore,
    config: TabuConfig,
    initial: Option<SubsetSolution>,
}

impl TabuSearch {
    /// Creates a Tabu Search over a universe of `universe_size` items.
    ///
    /// # Errors
    ///
    /// [`CoreError::Config`](crate::CoreError::Config) for invalid size
    /// bounds, a search without any limit, or an invalid `tabu` config.
    pub fn new(
        objective: ObjectiveFunction,
        universe_size: usize,
        config: SearchConfig,
        tabu: TabuConfig,
    ) -> Result<Self> {
        tabu.validate()?;
        Ok(Self {
            core: SearchCore::new("tabu search", objective, universe_size, config, true)?,
            config: tabu,
            initial: None,
        })
    }

    /// Starts from `solution` instead of a random subset.
    pub fn with_initial_solution(mut self, solution: SubsetSolution) -> Result<Self> {
        self.core.check_initial(&solution)?;
        self.initial = Some(solution);
        Ok(self)
    }

    #[tracing::instrument(level = "debug", name = "tabu_search", skip(self))]
    fn run(&mut self) -> Result<StopReason> {
        let objective = self.core.objective().clone();
        let mut rng = self.core.rng();
        let mut current = self.core.initial_solution(self.initial.as_ref(), &mut rng)?;
        let mut context = objective.new_context();
        let evaluation = objective.evaluate(&current, &mut context)?;
        self.core.offer(&current, evaluation);

        let mut neighbourhood = Neighbourhood::new(self.config.neighbourhood, self.core.bounds(), 1);
        let mut tabu = TabuManager::new(self.config.history_size);

        loop {
            if let Some(reason) = self.core.limit_reached() {
                return Ok(reason);
            }
            let best = self
                .core
                .best_evaluation()
                .unwrap_or_else(|| objective.direction().worst());
            let outcome = neighbourhood.perform_best_move(
                &mut current,
                &objective,
                &mut context,
                best,
                Some(&tabu),
                &mut rng,
            )?;
            let Some(outcome) = outcome else {
                self.core.message("every move is tabu");
                return Ok(StopReason::NoAdmissibleMove);
            };
            tabu.register_move_taken(&outcome.mv)?;
            if self.core.offer(&current, outcome.evaluation) {
                tracing::debug!(step = self.core.steps(), mv = %outcome.mv, evaluation = outcome.evaluation, "new best");
            }
            self.core.step();
        }
    }
}

impl_search!(TabuSearch);
