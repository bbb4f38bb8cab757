//! Metropolis execution loop.

use super::config::MetropolisConfig;
use crate::error::{CoreError, Result};
use crate::neighbourhood::{Neighbourhood, NeighbourhoodKind};
use crate::objective::ObjectiveFunction;
use crate::search::replica::metropolis_accept;
use crate::search::{impl_search, SearchConfig, SearchCore, StopReason};
use crate::solution::SubsetSolution;

/// Fixed-temperature Metropolis random walk.
///
/// A step is one proposal. At least one limit must be configured.
pub struct MetropolisSearch {
    core: SearchCore,
    config: MetropolisConfig,
    initial: Option<SubsetSolution>,
    accepted_moves: u64,
    improving_moves: u64,
}

impl MetropolisSearch {
    pub fn new(
        objective: ObjectiveFunction,
        universe_size: usize,
        config: SearchConfig,
        metropolis: MetropolisConfig,
    ) -> Result<Self> {
        metropolis.validate()?;
        Ok(Self {
            core: SearchCore::new("metropolis search", objective, universe_size, config, true)?,
            config: metropolis,
            initial: None,
            accepted_moves: 0,
            improving_moves: 0,
        })
    }

    /// Starts from `solution` instead of a random subset.
    pub fn with_initial_solution(mut self, solution: SubsetSolution) -> Result<Self> {
        self.core.check_initial(&solution)?;
        self.initial = Some(solution);
        Ok(self)
    }

    pub fn temperature(&self) -> f64 {
        self.config.temperature
    }

    /// Number of accepted proposals (including improvements).
    pub fn accepted_moves(&self) -> u64 {
        self.accepted_moves
    }

    /// Number of strictly improving proposals.
    pub fn improving_moves(&self) -> u64 {
        self.improving_moves
    }

    #[tracing::instrument(level = "debug", name = "metropolis_search", skip(self), fields(temperature = self.config.temperature))]
    fn run(&mut self) -> Result<StopReason> {
        let objective = self.core.objective().clone();
        let direction = objective.direction();
        let mut rng = self.core.rng();
        let mut current = self.core.initial_solution(self.initial.as_ref(), &mut rng)?;
        let mut context = objective.new_context();
        let mut current_eval = objective.evaluate(&current, &mut context)?;
        self.core.offer(&current, current_eval);

        let mut neighbourhood = Neighbourhood::new(NeighbourhoodKind::Exact, self.core.bounds(), 1);

        loop {
            if let Some(reason) = self.core.limit_reached() {
                tracing::debug!(
                    accepted = self.accepted_moves,
                    improving = self.improving_moves,
                    "metropolis walk finished"
                );
                return Ok(reason);
            }

            let Some(mv) = neighbourhood.perform_random_move(&mut current, &mut rng) else {
                return Ok(StopReason::NoAdmissibleMove);
            };
            let candidate = objective.evaluate(&current, &mut context)?;

            // Metropolis acceptance criterion
            if direction.is_better(candidate, current_eval) {
                self.improving_moves += 1;
            }
            let accept = metropolis_accept(
                direction,
                current_eval,
                candidate,
                self.config.boltzmann,
                self.config.temperature,
                &mut rng,
            );

            if accept {
                current_eval = candidate;
                self.accepted_moves += 1;
                self.core.offer(&current, current_eval);
            } else if !neighbourhood.undo_move(&mv, &mut current) {
                return Err(CoreError::internal(format!("could not undo rejected {mv}")));
            }
            self.core.step();
        }
    }
}

impl_search!(MetropolisSearch);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objective::Direction;
    use crate::search::{Search, SearchStatus};
    use crate::testing::{random_objective, Recorder};

    #[test]
    fn test_metropolis_step_budget() {
        let recorder = Recorder::default();
        let config = SearchConfig::new(2, 5).with_max_steps(500).with_seed(42);
        let mut search =
            MetropolisSearch::new(random_objective(12, 1), 12, config, MetropolisConfig::default()).unwrap();
        search.add_listener(Box::new(recorder.clone()));
        search.start().unwrap();
        assert_eq!(search.status(), SearchStatus::Completed);
        assert_eq!(search.steps(), 500);
        assert!(search.accepted_moves() >= search.improving_moves());
        assert!(search.accepted_moves() <= 500);
        recorder.assert_lifecycle(true);
    }

    #[test]
    fn test_low_temperature_climbs_to_local_optimum() {
        let objective = random_objective(10, 3);
        let config = SearchConfig::new(3, 3).with_max_steps(3000).with_seed(9);
        let metropolis = MetropolisConfig::default().with_temperature(1e-3);
        let mut search = MetropolisSearch::new(objective.clone(), 10, config, metropolis).unwrap();
        search.start().unwrap();
        let best = search.best_solution().unwrap().clone();
        let value = search.best_solution_evaluation().unwrap();
        for &add in best.remaining() {
            for &remove in best.selected() {
                let mut s = best.clone();
                s.swap(add, remove);
                assert!(objective.calculate(&s) <= value + 1e-9, "swap(+{add}, -{remove}) improves");
            }
        }
    }

    #[test]
    fn test_high_temperature_accepts_nearly_everything() {
        let config = SearchConfig::new(2, 6).with_max_steps(300).with_seed(5);
        let metropolis = MetropolisConfig::default().with_temperature(1e12);
        let mut search = MetropolisSearch::new(random_objective(12, 2), 12, config, metropolis).unwrap();
        search.start().unwrap();
        assert!(search.accepted_moves() >= 295);
    }

    #[test]
    fn test_minimizing_best_is_minimum_seen() {
        let objective = random_objective(10, 6).with_direction(Direction::Minimize);
        let config = SearchConfig::new(2, 4).with_max_steps(200).with_seed(5);
        let mut search =
            MetropolisSearch::new(objective.clone(), 10, config, MetropolisConfig::default()).unwrap();
        let recorder = Recorder::default();
        search.add_listener(Box::new(recorder.clone()));
        search.start().unwrap();
        recorder.assert_lifecycle(false);
        let best = search.best_solution().unwrap();
        assert!((objective.calculate(best) - search.best_solution_evaluation().unwrap()).abs() < 1e-9);
    }

    #[test]
    fn test_requires_limit() {
        let r = MetropolisSearch::new(
            random_objective(10, 6),
            10,
            SearchConfig::new(2, 4),
            MetropolisConfig::default(),
        );
        assert!(r.is_err());
    }
}
