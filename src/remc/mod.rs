//! Replica Exchange Monte Carlo (parallel tempering).
//!
//! A ladder of Metropolis replicas at increasing temperatures runs in
//! rounds. Within a round every replica walks independently on the rayon
//! pool; between rounds neighbouring rungs may exchange their solutions,
//! which lets good solutions found by hot, exploring replicas sink down to
//! cold, exploiting ones.
//!
//! # References
//!
//! - Swendsen, R. H. & Wang, J.-S. (1986). "Replica Monte Carlo Simulation
//!   of Spin-Glasses", *Phys. Rev. Lett.* 57(21), 2607-2609.

mod config;
mod runner;

pub use config::RemcConfig;
pub use runner::RemcSearch;
