//! Tabu Search (TS).
//!
//! A single-solution trajectory that always takes the best admissible
//! move, improving or not, and forbids moves touching recently changed
//! items so the search cannot immediately cycle back.
//!
//! # References
//!
//! - Glover, F. (1989). "Tabu Search, Part I", *ORSA Journal on Computing* 1(3), 190-206.
//! - Glover, F. (1990). "Tabu Search, Part II", *ORSA Journal on Computing* 2(1), 4-32.

mod config;
mod manager;
mod runner;

pub use config::TabuConfig;
pub use manager::TabuManager;
pub use runner::TabuSearch;
