//! Local search: hill climbing with best-improvement moves.
//!
//! [`LocalSearch`] keeps climbing while its limits allow, which suits
//! sampled neighbourhoods where a failed step does not prove a local
//! optimum. [`SteepestDescentSearch`] stops at the first step that does
//! not improve.

mod runner;

pub use runner::{LocalSearch, SteepestDescentSearch};
