//! Metropolis search: a random walk at fixed temperature.
//!
//! Each step proposes a uniformly random add / remove / swap. Improving
//! proposals are always accepted; worsening ones with probability
//! `exp(-delta / (k_B * T))`. Unlike simulated annealing the temperature
//! never changes, so the run is bounded by the configured limits only.
//!
//! # References
//!
//! - Metropolis, N. et al. (1953). "Equation of State Calculations by Fast
//!   Computing Machines", *J. Chem. Phys.* 21(6), 1087-1092.

mod config;
mod runner;

pub(crate) use config::validate_temperature;
pub use config::MetropolisConfig;
pub use runner::MetropolisSearch;

/// Default Boltzmann constant scaling temperatures to distance-sized deltas.
pub const DEFAULT_BOLTZMANN: f64 = 7.213475e-7;
