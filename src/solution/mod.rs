//! Subset solutions and the moves that mutate them.

mod moves;
mod subset;

pub use moves::Move;
pub use subset::SubsetSolution;

/// Read access to a selection of item indices.
///
/// Objective functions evaluate anything that can expose its selected
/// indices, so raw index lists and full [`SubsetSolution`]s share one
/// evaluation path.
pub trait Subset {
    /// Selected indices, in no particular order, without duplicates.
    fn selected(&self) -> &[usize];
}

impl Subset for [usize] {
    fn selected(&self) -> &[usize] {
        self
    }
}

impl Subset for Vec<usize> {
    fn selected(&self) -> &[usize] {
        self
    }
}

impl Subset for SubsetSolution {
    fn selected(&self) -> &[usize] {
        SubsetSolution::selected(self)
    }
}
