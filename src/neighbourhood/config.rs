//! Neighbourhood configuration.

use crate::error::{CoreError, Result};

/// Inclusive window `[min, max]` of allowed selection sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SizeBounds {
    pub min: usize,
    pub max: usize,
}

impl SizeBounds {
    /// Creates bounds after checking `0 < min <= max <= universe_size`.
    pub fn new(min: usize, max: usize, universe_size: usize) -> Result<Self> {
        let bounds = Self { min, max };
        bounds.validate(universe_size)?;
        Ok(bounds)
    }

    /// Checks `0 < min <= max <= universe_size`.
    pub fn validate(&self, universe_size: usize) -> Result<()> {
        if universe_size == 0 {
            return Err(CoreError::config("universe must not be empty"));
        }
        if self.min == 0 {
            return Err(CoreError::config("minimum core size must be positive"));
        }
        if self.min > self.max {
            return Err(CoreError::config(format!(
                "minimum core size {} exceeds maximum {}",
                self.min, self.max
            )));
        }
        if self.max > universe_size {
            return Err(CoreError::config(format!(
                "maximum core size {} exceeds universe size {universe_size}",
                self.max
            )));
        }
        Ok(())
    }

    #[inline]
    pub fn contains(&self, size: usize) -> bool {
        (self.min..=self.max).contains(&size)
    }

    /// Whether an item may be added to a selection of `size` items.
    #[inline]
    pub fn can_grow(&self, size: usize) -> bool {
        size < self.max
    }

    /// Whether an item may be removed from a selection of `size` items.
    #[inline]
    pub fn can_shrink(&self, size: usize) -> bool {
        size > self.min
    }
}

/// How candidate moves are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NeighbourhoodKind {
    /// Every legal single move.
    #[default]
    Exact,
    /// `sample_size` uniformly drawn legal moves, for large universes.
    Heuristic {
        /// Number of candidate moves drawn per step.
        sample_size: usize,
    },
}

impl NeighbourhoodKind {
    /// A heuristic neighbourhood must sample at least one move.
    pub fn validate(&self) -> Result<()> {
        match self {
            NeighbourhoodKind::Heuristic { sample_size: 0 } => Err(CoreError::config(
                "heuristic neighbourhood sample_size must be positive",
            )),
            _ => Ok(()),
        }
    }
}
