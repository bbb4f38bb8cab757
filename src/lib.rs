//! Core subset selection engine.
//!
//! Selects a core subset of a collection of items (accessions) that
//! maximizes (or minimizes) a distance-based objective:
//!
//! - **Objectives**: a [`DistanceMeasure`](objective::DistanceMeasure)
//!   (Modified Rogers, Cavalli-Sforza & Edwards, precomputed matrix)
//!   combined with an [`Aggregation`](objective::Aggregation) (mean, min,
//!   entry-to-nearest-entry), evaluated incrementally per trajectory.
//! - **Neighbourhoods**: add / remove / swap moves inside a size window,
//!   exact or sampled.
//! - **Searches**: [`ExhaustiveSearch`](exhaustive::ExhaustiveSearch),
//!   [`LocalSearch`](local::LocalSearch),
//!   [`SteepestDescentSearch`](local::SteepestDescentSearch),
//!   [`TabuSearch`](tabu::TabuSearch),
//!   [`MetropolisSearch`](metropolis::MetropolisSearch),
//!   [`RemcSearch`](remc::RemcSearch), [`LrSearch`](lr::LrSearch) and
//!   [`MixedReplicaSearch`](mixed::MixedReplicaSearch).
//!
//! Every search implements [`Search`](search::Search): it is configured,
//! started once, and reports its lifecycle to
//! [`SearchListener`](search::SearchListener)s. Replica-based searches run
//! their replicas on the rayon pool.
//!
//! Dataset parsing and file formats are left to consumers; the
//! [`data`] module holds already-loaded data.

pub mod data;
pub mod error;
pub mod exhaustive;
pub mod local;
pub mod lr;
pub mod metropolis;
pub mod mixed;
pub mod neighbourhood;
pub mod objective;
pub mod remc;
pub mod rng;
pub mod search;
pub mod solution;
pub mod tabu;

#[cfg(test)]
mod testing;

pub use error::{CoreError, Result};
