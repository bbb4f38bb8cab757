//! In-memory dataset collaborators.
//!
//! Parsing and file formats live outside this crate. These types hold
//! already-loaded data and expose what the distance measures need.

mod frequency;
mod matrix;

pub use frequency::FrequencyData;
pub use matrix::DistanceMatrix;

use std::ops::Range;

/// A collection of items (accessions) addressed by index `0..size()`.
pub trait Dataset: Send + Sync {
    /// Number of items in the collection.
    fn size(&self) -> usize;

    /// The universe of item indices.
    fn indices(&self) -> Range<usize> {
        0..self.size()
    }
}
