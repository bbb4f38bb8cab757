//! Stepwise LR selection.
//!
//! Generalizes forward selection (`l = 1, r = 0`) and backward elimination
//! (`l = 0, r = 1`): each round greedily adds the `l` items whose addition
//! is best, then drops the `r` items whose removal is best (the other way
//! round when shrinking). Plus-l-take-away-r lets the search revisit early
//! greedy choices.

mod config;
mod runner;

pub use config::LrConfig;
pub use runner::LrSearch;
