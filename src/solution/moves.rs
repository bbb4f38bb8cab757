//! Single-step changes to a [`SubsetSolution`].

use std::fmt;

use super::SubsetSolution;

/// A reversible single-step change of a subset.
///
/// A swap remembers both indices so it can be undone exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Move {
    /// Select a remaining item.
    Add(usize),
    /// Deselect a selected item.
    Remove(usize),
    /// Select `add` and deselect `remove` in one step.
    Swap {
        /// Index moved into the selection.
        add: usize,
        /// Index moved out of the selection.
        remove: usize,
    },
}

impl Move {
    /// Whether the move's preconditions hold on `solution`.
    pub fn is_legal(&self, solution: &SubsetSolution) -> bool {
        match *self {
            Move::Add(i) => solution.is_remaining(i),
            Move::Remove(i) => solution.contains(i),
            Move::Swap { add, remove } => solution.is_remaining(add) && solution.contains(remove),
        }
    }

    /// Applies the move. Returns `false`, leaving `solution` untouched, if
    /// the move is not legal.
    pub fn apply(&self, solution: &mut SubsetSolution) -> bool {
        match *self {
            Move::Add(i) => solution.add(i),
            Move::Remove(i) => solution.remove(i),
            Move::Swap { add, remove } => solution.swap(add, remove),
        }
    }

    /// Reverts a previously applied move.
    pub fn undo(&self, solution: &mut SubsetSolution) -> bool {
        self.inverse().apply(solution)
    }

    /// The move that cancels this one.
    pub fn inverse(&self) -> Move {
        match *self {
            Move::Add(i) => Move::Remove(i),
            Move::Remove(i) => Move::Add(i),
            Move::Swap { add, remove } => Move::Swap {
                add: remove,
                remove: add,
            },
        }
    }

    /// Index that enters the selection, if any.
    pub fn added(&self) -> Option<usize> {
        match *self {
            Move::Add(i) | Move::Swap { add: i, .. } => Some(i),
            Move::Remove(_) => None,
        }
    }

    /// Index that leaves the selection, if any.
    pub fn removed(&self) -> Option<usize> {
        match *self {
            Move::Remove(i) | Move::Swap { remove: i, .. } => Some(i),
            Move::Add(_) => None,
        }
    }

    /// Change in selection size caused by the move.
    pub fn size_delta(&self) -> isize {
        match self {
            Move::Add(_) => 1,
            Move::Remove(_) => -1,
            Move::Swap { .. } => 0,
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Move::Add(i) => write!(f, "add({i})"),
            Move::Remove(i) => write!(f, "remove({i})"),
            Move::Swap { add, remove } => write!(f, "swap(+{add}, -{remove})"),
        }
    }
}
