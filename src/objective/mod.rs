//! Objective functions and incremental evaluation.
//!
//! An [`ObjectiveFunction`] combines a [`DistanceMeasure`] with an
//! [`Aggregation`]. Searches evaluate neighbours through an
//! [`EvaluationContext`], which carries the incremental cache of one
//! trajectory; [`ObjectiveFunction::calculate`] evaluates from scratch.

mod cache;
mod distance;
mod function;
mod memo;

pub use cache::{EneCache, EvaluationCache, MeanCache, MinCache};
pub use distance::{CavalliSforzaEdwards, DistanceMeasure, ModifiedRogers, PrecomputedDistance};
pub use function::{
    Aggregation, ContextId, ContextIdAllocator, Direction, EvaluationContext, ObjectiveFunction,
};
pub use memo::PairMemo;
