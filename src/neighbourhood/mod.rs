//! Single-move neighbourhoods over subset solutions.
//!
//! A neighbourhood enumerates (or samples) the add, remove and swap moves
//! that keep a solution inside its size window, picks the best one under an
//! objective, or applies a uniformly random one.

mod config;
mod single;

pub use config::{NeighbourhoodKind, SizeBounds};
pub use single::{MoveOutcome, Neighbourhood};
