//! Mixed replica round loop.

use std::time::Instant;

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use super::config::MixedReplicaConfig;
use crate::error::{CoreError, Result};
use crate::neighbourhood::{Neighbourhood, NeighbourhoodKind, SizeBounds};
use crate::objective::{Direction, ObjectiveFunction};
use crate::search::replica::Replica;
use crate::search::{impl_search, SearchConfig, SearchCore, StopReason};
use crate::solution::SubsetSolution;
use crate::tabu::TabuManager;

/// Index of the best evaluation among `candidates`; among equal
/// evaluations the lowest index wins.
pub(crate) fn tournament_winner(
    evaluations: &[f64],
    candidates: &[usize],
    direction: Direction,
) -> Option<usize> {
    candidates.iter().copied().fold(None, |winner, i| match winner {
        None => Some(i),
        Some(w)
            if direction.is_better(evaluations[i], evaluations[w])
                || (evaluations[i] == evaluations[w] && i < w) =>
        {
            Some(i)
        }
        keep => keep,
    })
}

#[derive(Debug)]
enum Role {
    Tabu(TabuManager),
    Local,
    Metropolis,
}

#[derive(Debug)]
struct Member {
    role: Role,
    // None while an unseeded tabu replica waits
    replica: Option<Replica>,
    boosts: usize,
    boost_next: bool,
    progress_reference: f64,
    progressed_at: Instant,
}

impl Member {
    fn new(role: Role, replica: Option<Replica>) -> Self {
        let progress_reference = replica.as_ref().map_or(f64::NAN, |r| r.best_evaluation);
        Self {
            role,
            replica,
            boosts: 0,
            boost_next: false,
            progress_reference,
            progressed_at: Instant::now(),
        }
    }

    fn evaluation(&self) -> Option<f64> {
        self.replica.as_ref().map(|r| r.evaluation)
    }

    fn round(&mut self, objective: &ObjectiveFunction, config: &MixedReplicaConfig) -> Result<()> {
        let Some(replica) = self.replica.as_mut() else {
            return Ok(());
        };
        let steps = config.steps_per_round;
        if std::mem::take(&mut self.boost_next) {
            return replica.intensify(objective, steps).map(|_| ());
        }
        match &mut self.role {
            Role::Tabu(tabu) => replica.tabu_round(objective, tabu, steps),
            Role::Local => replica.descent_round(objective, steps).map(|_| ()),
            Role::Metropolis => replica.metropolis_round(objective, steps, config.boltzmann),
        }
    }

    /// Takes over `source`'s current trajectory.
    fn adopt(&mut self, source: &Replica) {
        if let Some(replica) = self.replica.as_mut() {
            replica.copy_state_from(source);
        }
        if let Role::Tabu(tabu) = &mut self.role {
            tabu.reset();
        }
    }

    /// Schedules a boost when the replica's best has not progressed for
    /// the configured stall time. Returns whether it did.
    fn check_stall(&mut self, config: &MixedReplicaConfig, direction: Direction, now: Instant) -> bool {
        let Some(replica) = self.replica.as_ref() else {
            return false;
        };
        let progression = if self.progress_reference.is_nan() {
            f64::INFINITY
        } else {
            -direction.worsening(self.progress_reference, replica.best_evaluation)
        };
        if progression > 0.0 && progression >= config.boost_min_progression {
            self.progress_reference = replica.best_evaluation;
            self.progressed_at = now;
            return false;
        }
        if self.boosts < config.boost_number
            && now.duration_since(self.progressed_at) >= config.boost_stall_time()
        {
            self.boosts += 1;
            self.boost_next = true;
            self.progressed_at = now;
            return true;
        }
        false
    }
}

/// Two distinct members, mutably and immutably.
fn split_pair(members: &mut [Member], target: usize, source: usize) -> (&mut Member, &Member) {
    if target < source {
        let (lower, upper) = members.split_at_mut(source);
        (&mut lower[target], &upper[0])
    } else {
        let (lower, upper) = members.split_at_mut(target);
        (&mut upper[0], &lower[source])
    }
}

/// Copies each `(target, source)` winner over its target.
///
/// A source is strictly better than its target, so targets are processed
/// from worst to best: a member that is both a source and a target hands
/// out its own trajectory before it adopts a new one.
fn apply_replacements(
    members: &mut [Member],
    replacements: &mut [(usize, usize)],
    evaluations: &[f64],
    direction: Direction,
) {
    replacements.sort_by(|a, b| {
        direction
            .energy(evaluations[b.0])
            .total_cmp(&direction.energy(evaluations[a.0]))
    });
    for &(target, source) in replacements.iter() {
        let (target, source) = split_pair(members, target, source);
        if let Some(source) = source.replica.as_ref() {
            target.adopt(source);
        }
    }
}

/// Ensemble of tabu, local and Metropolis replicas with tournaments.
///
/// A step is one round. At least one limit must be configured.
///
/// # Examples
///
/// ```
/// use corehunter::mixed::{MixedReplicaConfig, MixedReplicaSearch};
/// use corehunter::search::{Search, SearchConfig, SearchStatus};
/// # use std::sync::Arc;
/// # use corehunter::data::DistanceMatrix;
/// # use corehunter::objective::{Aggregation, ObjectiveFunction, PrecomputedDistance};
/// # let rows: Vec<Vec<f64>> = (0..8)
/// #     .map(|i: i32| (0..8).map(|j: i32| f64::from((i - j).abs())).collect())
/// #     .collect();
/// # let objective = ObjectiveFunction::new(
/// #     Arc::new(PrecomputedDistance::new(Arc::new(DistanceMatrix::from_rows(&rows).unwrap()))),
/// #     Aggregation::Min,
/// # );
///
/// let config = SearchConfig::new(3, 3).with_max_steps(10).with_seed(1);
/// let mixed = MixedReplicaConfig::default()
///     .with_replicas(1, 1, 2)
///     .with_rounds_without_tabu(2)
///     .with_steps_per_round(10);
/// let mut search = MixedReplicaSearch::new(objective, 8, config, mixed).unwrap();
/// search.start().unwrap();
/// assert_eq!(search.status(), SearchStatus::Completed);
/// assert_eq!(search.best_solution().unwrap().size(), 3);
/// ```
pub struct MixedReplicaSearch {
    core: SearchCore,
    config: MixedReplicaConfig,
    initial: Option<SubsetSolution>,
    members: Vec<Member>,
    replacements: u64,
}

impl MixedReplicaSearch {
    pub fn new(
        objective: ObjectiveFunction,
        universe_size: usize,
        config: SearchConfig,
        mixed: MixedReplicaConfig,
    ) -> Result<Self> {
        mixed.validate()?;
        Ok(Self {
            core: SearchCore::new("mixed replica search", objective, universe_size, config, true)?,
            config: mixed,
            initial: None,
            members: Vec::new(),
            replacements: 0,
        })
    }

    /// Starts every local and Metropolis replica from a copy of `solution`.
    pub fn with_initial_solution(mut self, solution: SubsetSolution) -> Result<Self> {
        self.core.check_initial(&solution)?;
        self.initial = Some(solution);
        Ok(self)
    }

    /// Number of tournament replacements so far.
    pub fn replacements(&self) -> u64 {
        self.replacements
    }

    #[tracing::instrument(
        level = "debug",
        name = "mixed_replica_search",
        skip(self),
        fields(replicas = self.config.total_replicas())
    )]
    fn run(&mut self) -> Result<StopReason> {
        let objective = self.core.objective().clone();
        let direction = objective.direction();
        let mut rng = self.core.rng();
        self.members = self.create_members(&objective, &mut rng)?;
        self.offer_member_bests();

        let mut round = 0usize;
        let mut tabu_seeded = self.config.tabu_replicas == 0;
        loop {
            if let Some(reason) = self.core.limit_reached() {
                tracing::debug!(replacements = self.replacements, "mixed replica search finished");
                return Ok(reason);
            }
            let warmed_up = round >= self.config.rounds_without_tabu;
            if warmed_up && !tabu_seeded {
                self.seed_tabu_replicas(&objective, &mut rng)?;
                tabu_seeded = true;
            }

            let config = &self.config;
            self.members
                .par_iter_mut()
                .try_for_each(|member| member.round(&objective, config))?;
            self.offer_member_bests();

            if warmed_up {
                self.tournaments(direction, &mut rng);
            }

            let now = Instant::now();
            for (i, member) in self.members.iter_mut().enumerate() {
                if member.check_stall(&self.config, direction, now) {
                    tracing::debug!(replica = i, boosts = member.boosts, "boosting stalled replica");
                }
            }

            round += 1;
            self.core.step();
        }
    }

    fn create_members(&self, objective: &ObjectiveFunction, rng: &mut StdRng) -> Result<Vec<Member>> {
        let bounds = self.core.bounds();
        let mut members = Vec::with_capacity(self.config.total_replicas());
        let spawn = |kind: NeighbourhoodKind, temperature: f64, rng: &mut StdRng| -> Result<Replica> {
            let solution = self.core.initial_solution(self.initial.as_ref(), rng)?;
            Replica::new(
                objective,
                solution,
                Neighbourhood::new(kind, bounds, 1),
                temperature,
                StdRng::seed_from_u64(rng.random()),
            )
        };
        for _ in 0..self.config.local_replicas {
            let replica = spawn(self.config.neighbourhood, 0.0, &mut *rng)?;
            members.push(Member::new(Role::Local, Some(replica)));
        }
        for temperature in self.config.temperatures() {
            let replica = spawn(NeighbourhoodKind::Exact, temperature, &mut *rng)?;
            members.push(Member::new(Role::Metropolis, Some(replica)));
        }
        for _ in 0..self.config.tabu_replicas {
            let tabu = TabuManager::new(self.config.tabu_history_size);
            members.push(Member::new(Role::Tabu(tabu), None));
        }
        Ok(members)
    }

    /// Starts each idle tabu replica from a tournament winner.
    fn seed_tabu_replicas(&mut self, objective: &ObjectiveFunction, rng: &mut StdRng) -> Result<()> {
        let direction = objective.direction();
        let bounds: SizeBounds = self.core.bounds();
        let active: Vec<usize> = (0..self.members.len())
            .filter(|&i| self.members[i].replica.is_some())
            .collect();
        let evaluations: Vec<f64> = self
            .members
            .iter()
            .map(|m| m.evaluation().unwrap_or(f64::NAN))
            .collect();

        for i in 0..self.members.len() {
            if self.members[i].replica.is_some() {
                continue;
            }
            let drawn: Vec<usize> = active
                .choose_multiple(rng, self.config.tournament_size)
                .copied()
                .collect();
            let winner = tournament_winner(&evaluations, &drawn, direction)
                .and_then(|w| self.members[w].replica.as_ref())
                .ok_or_else(|| CoreError::internal("no active replica to seed a tabu replica from"))?;
            let replica = Replica::new(
                objective,
                winner.solution.clone(),
                Neighbourhood::new(self.config.neighbourhood, bounds, 1),
                0.0,
                StdRng::seed_from_u64(rng.random()),
            )?;
            let member = &mut self.members[i];
            member.progress_reference = replica.best_evaluation;
            member.progressed_at = Instant::now();
            member.replica = Some(replica);
        }
        self.core.message("tabu replicas joined the ensemble");
        Ok(())
    }

    /// One tournament per replica on the end-of-round evaluations. A
    /// replica is replaced only by a strictly better winner.
    fn tournaments(&mut self, direction: Direction, rng: &mut StdRng) {
        let evaluations: Vec<f64> = self
            .members
            .iter()
            .map(|m| m.evaluation().unwrap_or(f64::NAN))
            .collect();
        let everyone: Vec<usize> = (0..self.members.len()).collect();

        let mut replacements = Vec::new();
        for (i, &own) in evaluations.iter().enumerate() {
            let drawn: Vec<usize> = everyone
                .choose_multiple(rng, self.config.tournament_size)
                .copied()
                .collect();
            if let Some(w) = tournament_winner(&evaluations, &drawn, direction) {
                if w != i && direction.is_better(evaluations[w], own) {
                    replacements.push((i, w));
                }
            }
        }

        apply_replacements(&mut self.members, &mut replacements, &evaluations, direction);
        if !replacements.is_empty() {
            tracing::debug!(count = replacements.len(), "tournament replacements");
        }
        self.replacements += replacements.len() as u64;
    }

    fn offer_member_bests(&mut self) {
        for replica in self.members.iter().filter_map(|m| m.replica.as_ref()) {
            self.core.offer(&replica.best, replica.best_evaluation);
        }
    }
}

impl_search!(MixedReplicaSearch);
