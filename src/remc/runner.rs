//! REMC round loop.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use super::config::RemcConfig;
use crate::error::Result;
use crate::neighbourhood::{Neighbourhood, NeighbourhoodKind};
use crate::objective::{Direction, ObjectiveFunction};
use crate::search::replica::Replica;
use crate::search::{impl_search, SearchConfig, SearchCore, StopReason};
use crate::solution::SubsetSolution;

/// Replica Exchange Monte Carlo search.
///
/// A step is one round: every replica makes `steps_per_round` Metropolis
/// proposals in parallel, then adjacent rungs attempt exchanges. At least
/// one limit must be configured.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use corehunter::data::DistanceMatrix;
/// use corehunter::objective::{Aggregation, ObjectiveFunction, PrecomputedDistance};
/// use corehunter::remc::{RemcConfig, RemcSearch};
/// use corehunter::search::{Search, SearchConfig};
///
/// let rows: Vec<Vec<f64>> = (0..6)
///     .map(|i: i32| (0..6).map(|j: i32| f64::from((i - j).abs())).collect())
///     .collect();
/// let objective = ObjectiveFunction::new(
///     Arc::new(PrecomputedDistance::new(Arc::new(DistanceMatrix::from_rows(&rows).unwrap()))),
///     Aggregation::Min,
/// );
/// let config = SearchConfig::new(2, 2).with_max_steps(20).with_seed(3);
/// let remc = RemcConfig::default().with_replicas(4).with_steps_per_round(10);
/// let mut search = RemcSearch::new(objective, 6, config, remc).unwrap();
/// search.start().unwrap();
/// assert_eq!(search.best_solution().unwrap().selected_sorted(), vec![0, 5]);
/// ```
pub struct RemcSearch {
    core: SearchCore,
    config: RemcConfig,
    initial: Option<SubsetSolution>,
    replicas: Vec<Replica>,
    exchanges: u64,
}

impl RemcSearch {
    pub fn new(
        objective: ObjectiveFunction,
        universe_size: usize,
        config: SearchConfig,
        remc: RemcConfig,
    ) -> Result<Self> {
        remc.validate()?;
        Ok(Self {
            core: SearchCore::new("REMC search", objective, universe_size, config, true)?,
            config: remc,
            initial: None,
            replicas: Vec::new(),
            exchanges: 0,
        })
    }

    /// Starts every replica from a copy of `solution`.
    pub fn with_initial_solution(mut self, solution: SubsetSolution) -> Result<Self> {
        self.core.check_initial(&solution)?;
        self.initial = Some(solution);
        Ok(self)
    }

    /// Number of accepted replica exchanges.
    pub fn exchanges(&self) -> u64 {
        self.exchanges
    }

    #[tracing::instrument(level = "debug", name = "remc_search", skip(self), fields(replicas = self.config.replicas))]
    fn run(&mut self) -> Result<StopReason> {
        let objective = self.core.objective().clone();
        let direction = objective.direction();
        let mut rng = self.core.rng();
        let bounds = self.core.bounds();

        let mut replicas = Vec::with_capacity(self.config.replicas);
        for temperature in self.config.temperatures() {
            let solution = self.core.initial_solution(self.initial.as_ref(), &mut rng)?;
            replicas.push(Replica::new(
                &objective,
                solution,
                Neighbourhood::new(NeighbourhoodKind::Exact, bounds, 1),
                temperature,
                StdRng::seed_from_u64(rng.random()),
            )?);
        }
        self.replicas = replicas;
        self.offer_replica_bests();

        let steps = self.config.steps_per_round;
        let boltzmann = self.config.boltzmann;
        let mut round = 0usize;
        loop {
            if let Some(reason) = self.core.limit_reached() {
                return Ok(reason);
            }

            self.replicas
                .par_iter_mut()
                .try_for_each(|replica| replica.metropolis_round(&objective, steps, boltzmann))?;
            self.offer_replica_bests();

            let swaps = exchange_adjacent(&mut self.replicas, round % 2, direction, boltzmann, &mut rng);
            self.exchanges += swaps as u64;
            tracing::debug!(round, swaps, best = self.core.best_evaluation(), "remc round");

            round += 1;
            self.core.step();
        }
    }

    fn offer_replica_bests(&mut self) {
        for replica in &self.replicas {
            self.core.offer(&replica.best, replica.best_evaluation);
        }
    }
}

impl_search!(RemcSearch);

/// Attempts exchanges between rungs `(parity, parity + 1)`,
/// `(parity + 2, parity + 3)`, ... Returns the number accepted.
///
/// A pair swaps with probability `min(1, exp((b_i - b_j) * (E_i - E_j)))`
/// where `b = 1 / (k_B * T)` and `E` is the energy (lower is better).
fn exchange_adjacent<R: Rng + ?Sized>(
    replicas: &mut [Replica],
    parity: usize,
    direction: Direction,
    boltzmann: f64,
    rng: &mut R,
) -> usize {
    let mut swaps = 0;
    let mut i = parity;
    while i + 1 < replicas.len() {
        let (lower, upper) = replicas.split_at_mut(i + 1);
        let (a, b) = (&mut lower[i], &mut upper[0]);
        let beta_a = 1.0 / (boltzmann * a.temperature);
        let beta_b = 1.0 / (boltzmann * b.temperature);
        let delta =
            (beta_a - beta_b) * (direction.energy(a.evaluation) - direction.energy(b.evaluation));
        if delta >= 0.0 || rng.random_range(0.0..1.0) < delta.exp() {
            a.exchange(b);
            swaps += 1;
        }
        i += 2;
    }
    swaps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neighbourhood::SizeBounds;
    use crate::rng::create_rng;
    use crate::search::{Search, SearchStatus};
    use crate::testing::{brute_force_best, random_objective, Recorder};

    fn replica(objective: &ObjectiveFunction, items: &[usize], temperature: f64) -> Replica {
        let bounds = SizeBounds::new(1, 4, objective.size()).unwrap();
        Replica::new(
            objective,
            SubsetSolution::new(objective.size(), items.iter().copied()).unwrap(),
            Neighbourhood::new(NeighbourhoodKind::Exact, bounds, 1),
            temperature,
            create_rng(Some(1)),
        )
        .unwrap()
    }

    #[test]
    fn test_global_best_dominates_replicas() {
        let recorder = Recorder::default();
        let config = SearchConfig::new(3, 6).with_max_steps(15).with_seed(17);
        let remc = RemcConfig::default().with_replicas(5).with_steps_per_round(20);
        let mut search = RemcSearch::new(random_objective(20, 4), 20, config, remc).unwrap();
        search.add_listener(Box::new(recorder.clone()));
        search.start().unwrap();

        assert_eq!(search.status(), SearchStatus::Completed);
        assert_eq!(search.steps(), 15);
        // new bests are strictly monotone over the whole run
        recorder.assert_lifecycle(true);

        let best = search.best_solution_evaluation().unwrap();
        let replica_best = search
            .replicas
            .iter()
            .map(|r| r.best_evaluation)
            .fold(f64::NEG_INFINITY, f64::max);
        for r in &search.replicas {
            assert!(best >= r.best_evaluation);
            assert!(best >= r.evaluation);
        }
        assert_eq!(best, replica_best);
    }

    #[test]
    fn test_global_best_dominates_at_every_round() {
        // seeded runs are reproducible, so a run cut after k rounds shows
        // the state at the k-th round boundary
        for rounds in 1..=8 {
            let config = SearchConfig::new(3, 6).with_max_steps(rounds).with_seed(23);
            let remc = RemcConfig::default().with_replicas(4).with_steps_per_round(10);
            let mut search = RemcSearch::new(random_objective(14, 6), 14, config, remc).unwrap();
            search.start().unwrap();
            assert_eq!(search.steps(), rounds);
            let best = search.best_solution_evaluation().unwrap();
            for r in &search.replicas {
                assert!(best >= r.best_evaluation, "round {rounds}");
                assert!(best >= r.evaluation, "round {rounds}");
            }
        }
    }

    #[test]
    fn test_finds_small_optimum() {
        let objective = random_objective(9, 2);
        let expected = brute_force_best(&objective, 9, 2, 3);
        let config = SearchConfig::new(2, 3).with_max_steps(40).with_seed(8);
        // a cold rung that exploits and hot rungs that wander freely
        let remc = RemcConfig::default()
            .with_replicas(4)
            .with_steps_per_round(30)
            .with_boltzmann(1.0)
            .with_temperatures(0.01, 1.0);
        let mut search = RemcSearch::new(objective, 9, config, remc).unwrap();
        search.start().unwrap();
        assert!((search.best_solution_evaluation().unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let run = || {
            let config = SearchConfig::new(3, 5).with_max_steps(10).with_seed(99);
            let remc = RemcConfig::default().with_replicas(6).with_steps_per_round(15);
            let mut search = RemcSearch::new(random_objective(16, 5), 16, config, remc).unwrap();
            search.start().unwrap();
            (
                search.best_solution().unwrap().selected_sorted(),
                search.best_solution_evaluation().unwrap(),
                search.exchanges(),
            )
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_exchange_moves_better_solution_down() {
        let objective = random_objective(8, 3);
        let mut rng = create_rng(Some(0));
        // order the two candidate solutions so the cold rung holds the worse one
        let (x, y) = ([0usize, 1, 2], [3usize, 4, 5]);
        let (worse, better) = if objective.calculate(&x[..]) < objective.calculate(&y[..]) {
            (x, y)
        } else {
            (y, x)
        };
        let mut ladder = vec![replica(&objective, &worse, 1.0), replica(&objective, &better, 2.0)];
        let swaps = exchange_adjacent(&mut ladder, 0, Direction::Maximize, 1.0, &mut rng);
        assert_eq!(swaps, 1);
        assert_eq!(ladder[0].solution.selected_sorted(), better.to_vec());
        assert_eq!(ladder[1].solution.selected_sorted(), worse.to_vec());
        assert_eq!((ladder[0].temperature, ladder[1].temperature), (1.0, 2.0));
        // odd parity has no pair on a two-rung ladder
        assert_eq!(exchange_adjacent(&mut ladder, 1, Direction::Maximize, 1.0, &mut rng), 0);
    }
}
