//! Hill-climbing loops.

use rand::Rng;

use crate::error::{CoreError, Result};
use crate::neighbourhood::{Neighbourhood, NeighbourhoodKind};
use crate::objective::ObjectiveFunction;
use crate::search::{impl_search, SearchConfig, SearchCore, StopReason};
use crate::solution::{Move, SubsetSolution};

/// Undoes the move just applied, which must succeed for `current` to stay
/// in step with its evaluation.
fn revert(neighbourhood: &mut Neighbourhood, mv: &Move, current: &mut SubsetSolution) -> Result<()> {
    if !neighbourhood.undo_move(mv, current) {
        return Err(CoreError::internal(format!("could not undo {mv}")));
    }
    Ok(())
}

/// Repeatedly applies the best neighbour while it strictly improves.
///
/// A non-improving best neighbour is undone. With an exact neighbourhood
/// that proves a local optimum and the search ends; with a sampled one
/// the search resamples, so a limit must be configured unless
/// `stop_at_first_failure` is set.
fn climb<R: Rng + ?Sized>(
    core: &mut SearchCore,
    kind: NeighbourhoodKind,
    initial: Option<&SubsetSolution>,
    stop_at_first_failure: bool,
    rng: &mut R,
) -> Result<StopReason> {
    let objective = core.objective().clone();
    let direction = objective.direction();
    let mut current = core.initial_solution(initial, rng)?;
    let mut context = objective.new_context();
    let mut evaluation = objective.evaluate(&current, &mut context)?;
    core.offer(&current, evaluation);

    let mut neighbourhood = Neighbourhood::new(kind, core.bounds(), 1);
    loop {
        if let Some(reason) = core.limit_reached() {
            return Ok(reason);
        }
        let outcome = neighbourhood.perform_best_move(
            &mut current,
            &objective,
            &mut context,
            evaluation,
            None,
            rng,
        )?;
        core.step();
        match outcome {
            None => return Ok(StopReason::NoAdmissibleMove),
            Some(o) if direction.is_better(o.evaluation, evaluation) => {
                evaluation = o.evaluation;
                core.offer(&current, evaluation);
            }
            Some(o) => {
                revert(&mut neighbourhood, &o.mv, &mut current)?;
                if stop_at_first_failure || kind == NeighbourhoodKind::Exact {
                    return Ok(StopReason::LocalOptimum);
                }
            }
        }
    }
}

/// Best-improvement local search.
///
/// Stops at a local optimum (exact neighbourhood), on a limit, or on
/// stagnation. A heuristic neighbourhood needs at least one limit.
pub struct LocalSearch {
    core: SearchCore,
    neighbourhood: NeighbourhoodKind,
    initial: Option<SubsetSolution>,
}

impl LocalSearch {
    pub fn new(
        objective: ObjectiveFunction,
        universe_size: usize,
        config: SearchConfig,
        neighbourhood: NeighbourhoodKind,
    ) -> Result<Self> {
        neighbourhood.validate()?;
        let bounded = neighbourhood != NeighbourhoodKind::Exact;
        Ok(Self {
            core: SearchCore::new("local search", objective, universe_size, config, bounded)?,
            neighbourhood,
            initial: None,
        })
    }

    /// Starts from `solution` instead of a random subset.
    pub fn with_initial_solution(mut self, solution: SubsetSolution) -> Result<Self> {
        self.core.check_initial(&solution)?;
        self.initial = Some(solution);
        Ok(self)
    }

    #[tracing::instrument(level = "debug", name = "local_search", skip(self))]
    fn run(&mut self) -> Result<StopReason> {
        let mut rng = self.core.rng();
        climb(&mut self.core, self.neighbourhood, self.initial.as_ref(), false, &mut rng)
    }
}

impl_search!(LocalSearch);

/// Steepest descent: stops the instant a step fails to improve.
///
/// Uses the exact neighbourhood unless configured otherwise.
pub struct SteepestDescentSearch {
    core: SearchCore,
    neighbourhood: NeighbourhoodKind,
    initial: Option<SubsetSolution>,
}

impl SteepestDescentSearch {
    pub fn new(objective: ObjectiveFunction, universe_size: usize, config: SearchConfig) -> Result<Self> {
        Ok(Self {
            core: SearchCore::new("steepest descent", objective, universe_size, config, false)?,
            neighbourhood: NeighbourhoodKind::Exact,
            initial: None,
        })
    }

    /// Uses `neighbourhood` instead of the exact one.
    pub fn with_neighbourhood(mut self, neighbourhood: NeighbourhoodKind) -> Result<Self> {
        neighbourhood.validate()?;
        self.neighbourhood = neighbourhood;
        Ok(self)
    }

    /// Starts from `solution` instead of a random subset.
    pub fn with_initial_solution(mut self, solution: SubsetSolution) -> Result<Self> {
        self.core.check_initial(&solution)?;
        self.initial = Some(solution);
        Ok(self)
    }

    #[tracing::instrument(level = "debug", name = "steepest_descent", skip(self))]
    fn run(&mut self) -> Result<StopReason> {
        let mut rng = self.core.rng();
        climb(&mut self.core, self.neighbourhood, self.initial.as_ref(), true, &mut rng)
    }
}

impl_search!(SteepestDescentSearch);
