//! One independent trajectory of an ensemble search.

use rand::rngs::StdRng;
use rand::Rng;

use crate::error::{CoreError, Result};
use crate::neighbourhood::{Neighbourhood, NeighbourhoodKind};
use crate::objective::{Direction, EvaluationContext, ObjectiveFunction};
use crate::solution::{Move, SubsetSolution};
use crate::tabu::TabuManager;

/// Boltzmann acceptance: improvements always, worsening moves with
/// probability `exp(-delta / (k_B * T))`.
pub(crate) fn metropolis_accept<R: Rng + ?Sized>(
    direction: Direction,
    current: f64,
    candidate: f64,
    boltzmann: f64,
    temperature: f64,
    rng: &mut R,
) -> bool {
    let delta = direction.worsening(current, candidate);
    if delta <= 0.0 {
        return true;
    }
    let scale = boltzmann * temperature;
    if scale <= 0.0 {
        return false;
    }
    rng.random_range(0.0..1.0) < (-delta / scale).exp()
}

/// A solution with its own evaluation context, neighbourhood and random
/// stream, plus the best solution it has visited.
#[derive(Debug)]
pub(crate) struct Replica {
    pub(crate) solution: SubsetSolution,
    pub(crate) evaluation: f64,
    pub(crate) context: EvaluationContext,
    pub(crate) temperature: f64,
    pub(crate) best: SubsetSolution,
    pub(crate) best_evaluation: f64,
    direction: Direction,
    neighbourhood: Neighbourhood,
    rng: StdRng,
}

impl Replica {
    pub(crate) fn new(
        objective: &ObjectiveFunction,
        solution: SubsetSolution,
        neighbourhood: Neighbourhood,
        temperature: f64,
        rng: StdRng,
    ) -> Result<Self> {
        let mut context = objective.new_context();
        let evaluation = objective.evaluate(&solution, &mut context)?;
        Ok(Self {
            best: solution.clone(),
            best_evaluation: evaluation,
            solution,
            evaluation,
            context,
            temperature,
            direction: objective.direction(),
            neighbourhood,
            rng,
        })
    }

    /// Replaces the trajectory with a copy of `other`'s current state.
    pub(crate) fn copy_state_from(&mut self, other: &Replica) {
        self.solution.clone_from(&other.solution);
        self.evaluation = other.evaluation;
        self.context = other.context.fork();
        self.neighbourhood.clear_history();
        self.consider_best();
    }

    /// Exchanges trajectories with `other`; temperatures stay put.
    pub(crate) fn exchange(&mut self, other: &mut Replica) {
        std::mem::swap(&mut self.solution, &mut other.solution);
        std::mem::swap(&mut self.evaluation, &mut other.evaluation);
        std::mem::swap(&mut self.context, &mut other.context);
        self.neighbourhood.clear_history();
        other.neighbourhood.clear_history();
        self.consider_best();
        other.consider_best();
    }

    /// `steps` Metropolis proposals at this replica's temperature.
    pub(crate) fn metropolis_round(
        &mut self,
        objective: &ObjectiveFunction,
        steps: usize,
        boltzmann: f64,
    ) -> Result<()> {
        let direction = objective.direction();
        for _ in 0..steps {
            let Some(mv) = self.neighbourhood.perform_random_move(&mut self.solution, &mut self.rng)
            else {
                break;
            };
            let candidate = objective.evaluate(&self.solution, &mut self.context)?;
            if metropolis_accept(
                direction,
                self.evaluation,
                candidate,
                boltzmann,
                self.temperature,
                &mut self.rng,
            ) {
                self.evaluation = candidate;
                self.consider_best();
            } else {
                self.revert(&mv)?;
            }
        }
        Ok(())
    }

    /// Up to `steps` strictly improving best moves. Returns `false` once no
    /// neighbour improves.
    pub(crate) fn descent_round(
        &mut self,
        objective: &ObjectiveFunction,
        steps: usize,
    ) -> Result<bool> {
        let direction = objective.direction();
        for _ in 0..steps {
            let outcome = self.neighbourhood.perform_best_move(
                &mut self.solution,
                objective,
                &mut self.context,
                self.evaluation,
                None,
                &mut self.rng,
            )?;
            match outcome {
                Some(o) if direction.is_better(o.evaluation, self.evaluation) => {
                    self.evaluation = o.evaluation;
                    self.consider_best();
                }
                Some(o) => {
                    self.revert(&o.mv)?;
                    return Ok(false);
                }
                None => return Ok(false),
            }
        }
        Ok(true)
    }

    /// One round of steepest descent over the exact neighbourhood, whatever
    /// this replica's own neighbourhood is.
    pub(crate) fn intensify(&mut self, objective: &ObjectiveFunction, steps: usize) -> Result<bool> {
        let exact = Neighbourhood::new(NeighbourhoodKind::Exact, self.neighbourhood.bounds(), 1);
        let own = std::mem::replace(&mut self.neighbourhood, exact);
        let outcome = self.descent_round(objective, steps);
        self.neighbourhood = own;
        outcome
    }

    /// Up to `steps` tabu moves: the best admissible move is always taken,
    /// improving or not.
    pub(crate) fn tabu_round(
        &mut self,
        objective: &ObjectiveFunction,
        tabu: &mut TabuManager,
        steps: usize,
    ) -> Result<()> {
        for _ in 0..steps {
            let outcome = self.neighbourhood.perform_best_move(
                &mut self.solution,
                objective,
                &mut self.context,
                self.best_evaluation,
                Some(&*tabu),
                &mut self.rng,
            )?;
            let Some(o) = outcome else {
                break;
            };
            tabu.register_move_taken(&o.mv)?;
            self.evaluation = o.evaluation;
            self.consider_best();
        }
        Ok(())
    }

    fn revert(&mut self, mv: &Move) -> Result<()> {
        if !self.neighbourhood.undo_move(mv, &mut self.solution) {
            return Err(CoreError::internal(format!("could not undo {mv}")));
        }
        Ok(())
    }

    fn consider_best(&mut self) {
        if self.neighbourhood.bounds().contains(self.solution.size())
            && self.direction.is_better(self.evaluation, self.best_evaluation)
        {
            self.best.clone_from(&self.solution);
            self.best_evaluation = self.evaluation;
        }
    }
}
