//! Bounded tabu memory over item indices.

use std::collections::VecDeque;

use rustc_hash::FxHashMap;

use crate::error::{CoreError, Result};
use crate::objective::Direction;
use crate::solution::Move;

/// FIFO memory of recently touched indices.
///
/// Taking a move records every index it touches (a swap records both). A
/// candidate move is tabu while any index it would add or remove is still
/// in the history, which keeps a just-removed item from being re-added and
/// a just-added item from being dropped again. The history holds at most
/// `history_size` indices; the oldest is evicted first.
///
/// Aspiration: a tabu move is still allowed when it would strictly improve
/// the best evaluation seen so far.
#[derive(Debug, Clone)]
pub struct TabuManager {
    history: VecDeque<usize>,
    // occurrences of each index in `history`, for O(1) lookups
    frequency: FxHashMap<usize, usize>,
    history_size: usize,
}

impl TabuManager {
    pub fn new(history_size: usize) -> Self {
        Self {
            history: VecDeque::with_capacity(history_size + 2),
            frequency: FxHashMap::default(),
            history_size,
        }
    }

    pub fn history_size(&self) -> usize {
        self.history_size
    }

    /// Indices currently held, oldest first.
    pub fn history(&self) -> impl Iterator<Item = usize> + '_ {
        self.history.iter().copied()
    }

    /// Whether `index` is currently tabu.
    pub fn is_tabu_index(&self, index: usize) -> bool {
        self.frequency.contains_key(&index)
    }

    /// Whether `mv` touches a tabu index, ignoring aspiration.
    pub fn is_tabu(&self, mv: &Move) -> bool {
        mv.added().is_some_and(|i| self.is_tabu_index(i))
            || mv.removed().is_some_and(|i| self.is_tabu_index(i))
    }

    /// Whether `mv` may be taken, given the evaluation it would produce.
    pub fn move_allowed(
        &self,
        mv: &Move,
        new_evaluation: f64,
        current_best: f64,
        direction: Direction,
    ) -> bool {
        !self.is_tabu(mv) || direction.is_better(new_evaluation, current_best)
    }

    /// Records a taken move. Registration is permanent.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Internal`] if the frequency table disagrees with
    /// the history while evicting.
    pub fn register_move_taken(&mut self, mv: &Move) -> Result<()> {
        for index in mv.added().into_iter().chain(mv.removed()) {
            self.history.push_back(index);
            *self.frequency.entry(index).or_insert(0) += 1;
        }
        self.evict()
    }

    /// Changes the capacity, evicting the oldest entries if it shrinks.
    pub fn set_tabu_history_size(&mut self, history_size: usize) -> Result<()> {
        self.history_size = history_size;
        self.evict()
    }

    /// Forgets all history.
    pub fn reset(&mut self) {
        self.history.clear();
        self.frequency.clear();
    }

    fn evict(&mut self) -> Result<()> {
        while self.history.len() > self.history_size {
            let Some(old) = self.history.pop_front() else {
                break;
            };
            match self.frequency.get_mut(&old) {
                Some(n) if *n > 1 => *n -= 1,
                Some(_) => {
                    self.frequency.remove(&old);
                }
                None => {
                    return Err(CoreError::internal(format!(
                        "tabu frequency of index {old} would become negative"
                    )));
                }
            }
        }
        Ok(())
    }
}
