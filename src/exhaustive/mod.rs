//! Exhaustive enumeration of every subset in the size window.
//!
//! Only practical for small universes; the only strategy that guarantees
//! the global optimum.

mod combinations;
mod runner;

pub use combinations::{binomial, Combinations};
pub use runner::ExhaustiveSearch;
