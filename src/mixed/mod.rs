//! Mixed replica search.
//!
//! An ensemble of local-search, Metropolis and tabu replicas. The cheap
//! replicas explore first while the tabu replicas wait; once they join,
//! every round ends with tournaments that copy strong trajectories over
//! weak ones. Replicas that stop making progress get a few intensified
//! rounds of steepest descent.

mod config;
mod runner;

pub use config::MixedReplicaConfig;
pub use runner::MixedReplicaSearch;
