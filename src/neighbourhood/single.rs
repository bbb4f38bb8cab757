//! Add / remove / swap neighbourhood.

use std::collections::VecDeque;

use rand::seq::SliceRandom;
use rand::Rng;

use super::config::{NeighbourhoodKind, SizeBounds};
use crate::error::Result;
use crate::objective::{EvaluationContext, ObjectiveFunction};
use crate::solution::{Move, SubsetSolution};
use crate::tabu::TabuManager;

/// A move that was applied together with the evaluation it produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveOutcome {
    pub mv: Move,
    pub evaluation: f64,
}

/// Single-move neighbourhood within a size window.
///
/// Moves applied through [`perform_best_move`](Self::perform_best_move) and
/// [`perform_random_move`](Self::perform_random_move) are logged so the
/// most recent ones can be undone with [`undo_move`](Self::undo_move).
#[derive(Debug, Clone)]
pub struct Neighbourhood {
    kind: NeighbourhoodKind,
    bounds: SizeBounds,
    // applied moves with the solution version right after each
    undo_log: VecDeque<(Move, u64)>,
    undo_history: usize,
}

impl Neighbourhood {
    /// Creates a neighbourhood that can undo up to `undo_history` moves.
    pub fn new(kind: NeighbourhoodKind, bounds: SizeBounds, undo_history: usize) -> Self {
        Self {
            kind,
            bounds,
            undo_log: VecDeque::with_capacity(undo_history.min(64)),
            undo_history,
        }
    }

    pub fn kind(&self) -> NeighbourhoodKind {
        self.kind
    }

    pub fn bounds(&self) -> SizeBounds {
        self.bounds
    }

    /// Candidate moves for `solution`: all of them for
    /// [`NeighbourhoodKind::Exact`] (in random order), a uniform sample for
    /// [`NeighbourhoodKind::Heuristic`].
    pub fn candidate_moves<R: Rng + ?Sized>(&self, solution: &SubsetSolution, rng: &mut R) -> Vec<Move> {
        match self.kind {
            NeighbourhoodKind::Exact => {
                let mut moves = self.all_moves(solution);
                moves.shuffle(rng);
                moves
            }
            NeighbourhoodKind::Heuristic { sample_size } => {
                let total = self.count_moves(solution);
                if total <= sample_size {
                    let mut moves = self.all_moves(solution);
                    moves.shuffle(rng);
                    return moves;
                }
                (0..sample_size)
                    .filter_map(|_| self.nth_move(solution, rng.random_range(0..total)))
                    .collect()
            }
        }
    }

    /// Every legal move: adds, then removes, then swaps.
    pub fn all_moves(&self, solution: &SubsetSolution) -> Vec<Move> {
        let mut moves = Vec::with_capacity(self.count_moves(solution));
        let size = solution.size();
        if self.bounds.can_grow(size) {
            moves.extend(solution.remaining().iter().map(|&i| Move::Add(i)));
        }
        if self.bounds.can_shrink(size) {
            moves.extend(solution.selected().iter().map(|&i| Move::Remove(i)));
        }
        for &add in solution.remaining() {
            for &remove in solution.selected() {
                moves.push(Move::Swap { add, remove });
            }
        }
        moves
    }

    /// Number of legal moves.
    pub fn count_moves(&self, solution: &SubsetSolution) -> usize {
        let (k, r) = (solution.selected().len(), solution.remaining().len());
        let adds = if self.bounds.can_grow(k) { r } else { 0 };
        let removes = if self.bounds.can_shrink(k) { k } else { 0 };
        adds + removes + k * r
    }

    /// The `n`-th legal move in [`all_moves`](Self::all_moves) order.
    fn nth_move(&self, solution: &SubsetSolution, mut n: usize) -> Option<Move> {
        let (sel, rem) = (solution.selected(), solution.remaining());
        if self.bounds.can_grow(sel.len()) {
            if n < rem.len() {
                return Some(Move::Add(rem[n]));
            }
            n -= rem.len();
        }
        if self.bounds.can_shrink(sel.len()) {
            if n < sel.len() {
                return Some(Move::Remove(sel[n]));
            }
            n -= sel.len();
        }
        if sel.is_empty() {
            return None;
        }
        let (a, r) = (n / sel.len(), n % sel.len());
        rem.get(a).map(|&add| Move::Swap { add, remove: sel[r] })
    }

    /// Applies the best admissible candidate move.
    ///
    /// Each candidate is applied, evaluated through `context` and reverted.
    /// With a `tabu` manager, tabu moves are skipped unless they would
    /// strictly improve `current_best`. Ties keep the first candidate seen.
    /// Returns `None`, leaving `solution` unchanged, when no candidate is
    /// admissible. On return `context` is synchronized with `solution`.
    pub fn perform_best_move<R: Rng + ?Sized>(
        &mut self,
        solution: &mut SubsetSolution,
        objective: &ObjectiveFunction,
        context: &mut EvaluationContext,
        current_best: f64,
        tabu: Option<&TabuManager>,
        rng: &mut R,
    ) -> Result<Option<MoveOutcome>> {
        let direction = objective.direction();
        let mut best: Option<MoveOutcome> = None;

        for mv in self.candidate_moves(solution, rng) {
            if !mv.apply(solution) {
                continue;
            }
            let evaluation = objective.evaluate(&*solution, context)?;
            mv.undo(solution);

            if let Some(t) = tabu {
                if !t.move_allowed(&mv, evaluation, current_best, direction) {
                    continue;
                }
            }
            if best.is_none_or(|b| direction.is_better(evaluation, b.evaluation)) {
                best = Some(MoveOutcome { mv, evaluation });
            }
        }

        match best {
            Some(outcome) => {
                outcome.mv.apply(solution);
                self.log(outcome.mv, solution);
                objective.evaluate(&*solution, context)?;
                Ok(Some(outcome))
            }
            None => {
                objective.evaluate(&*solution, context)?;
                Ok(None)
            }
        }
    }

    /// Applies one move drawn uniformly from all legal moves.
    pub fn perform_random_move<R: Rng + ?Sized>(
        &mut self,
        solution: &mut SubsetSolution,
        rng: &mut R,
    ) -> Option<Move> {
        let total = self.count_moves(solution);
        if total == 0 {
            return None;
        }
        let mv = self.nth_move(solution, rng.random_range(0..total))?;
        mv.apply(solution);
        self.log(mv, solution);
        Some(mv)
    }

    /// Reverts `mv` if it is the most recent logged move and `solution` has
    /// not been changed since. Earlier moves become undoable in turn.
    pub fn undo_move(&mut self, mv: &Move, solution: &mut SubsetSolution) -> bool {
        match self.undo_log.back() {
            Some((last, version)) if last == mv && *version == solution.version() => {}
            _ => return false,
        }
        if !mv.undo(solution) {
            return false;
        }
        self.undo_log.pop_back();
        // the older entry now refers to the state we just restored
        if let Some(prev) = self.undo_log.back_mut() {
            prev.1 = solution.version();
        }
        true
    }

    /// Forgets all undo information.
    pub fn clear_history(&mut self) {
        self.undo_log.clear();
    }

    fn log(&mut self, mv: Move, solution: &SubsetSolution) {
        if self.undo_history == 0 {
            return;
        }
        if self.undo_log.len() == self.undo_history {
            self.undo_log.pop_front();
        }
        self.undo_log.push_back((mv, solution.version()));
    }
}
