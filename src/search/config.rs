//! Settings shared by every search strategy.

use std::time::Duration;

use crate::error::{CoreError, Result};
use crate::neighbourhood::SizeBounds;

/// Size window, limits and stagnation criteria of a search.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use corehunter::search::SearchConfig;
///
/// let config = SearchConfig::new(10, 20)
///     .with_runtime_limit(Duration::from_secs(5))
///     .with_min_progression(1e-4)
///     .with_max_time_without_improvement(Duration::from_secs(1))
///     .with_seed(42);
/// assert!(config.validate(100).is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchConfig {
    /// Smallest allowed core size (inclusive).
    pub min_size: usize,
    /// Largest allowed core size (inclusive).
    pub max_size: usize,
    /// Wall-clock budget.
    pub runtime_limit: Option<Duration>,
    /// Step budget. What a step is depends on the strategy (a move, a
    /// round, an enumerated subset).
    pub max_steps: Option<u64>,
    /// Improvements of the best evaluation smaller than this do not reset
    /// the stagnation clocks.
    pub min_progression: f64,
    /// Stop when no sufficient improvement happened for this long.
    pub max_time_without_improvement: Option<Duration>,
    /// Stop when no sufficient improvement happened for this many steps.
    pub max_steps_without_improvement: Option<u64>,
    /// Random seed (None for entropy).
    pub seed: Option<u64>,
}

impl SearchConfig {
    /// A configuration for cores of `min_size..=max_size` items, without
    /// limits.
    pub fn new(min_size: usize, max_size: usize) -> Self {
        Self {
            min_size,
            max_size,
            runtime_limit: None,
            max_steps: None,
            min_progression: 0.0,
            max_time_without_improvement: None,
            max_steps_without_improvement: None,
            seed: None,
        }
    }

    /// Sets the wall-clock budget.
    pub fn with_runtime_limit(mut self, limit: Duration) -> Self {
        self.runtime_limit = Some(limit);
        self
    }

    /// Sets the step budget.
    pub fn with_max_steps(mut self, steps: u64) -> Self {
        self.max_steps = Some(steps);
        self
    }

    /// Sets the smallest improvement that resets the stagnation clocks.
    pub fn with_min_progression(mut self, min_progression: f64) -> Self {
        self.min_progression = min_progression;
        self
    }

    /// Stops after this long without sufficient improvement.
    pub fn with_max_time_without_improvement(mut self, limit: Duration) -> Self {
        self.max_time_without_improvement = Some(limit);
        self
    }

    /// Stops after this many steps without sufficient improvement.
    pub fn with_max_steps_without_improvement(mut self, steps: u64) -> Self {
        self.max_steps_without_improvement = Some(steps);
        self
    }

    /// Sets the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// The size window as [`SizeBounds`].
    pub fn bounds(&self) -> SizeBounds {
        SizeBounds {
            min: self.min_size,
            max: self.max_size,
        }
    }

    /// Validates the configuration against a universe of `universe_size`.
    pub fn validate(&self, universe_size: usize) -> Result<()> {
        self.bounds().validate(universe_size)?;
        if !self.min_progression.is_finite() || self.min_progression < 0.0 {
            return Err(CoreError::config(format!(
                "min_progression must be finite and non-negative, got {}",
                self.min_progression
            )));
        }
        if self.runtime_limit == Some(Duration::ZERO) {
            return Err(CoreError::config("runtime_limit must be positive or None"));
        }
        Ok(())
    }

    /// Additionally requires at least one criterion that ends the search,
    /// for strategies that could otherwise run forever.
    pub fn validate_bounded(&self, universe_size: usize) -> Result<()> {
        self.validate(universe_size)?;
        if self.runtime_limit.is_none()
            && self.max_steps.is_none()
            && self.max_time_without_improvement.is_none()
            && self.max_steps_without_improvement.is_none()
        {
            return Err(CoreError::config(
                "search needs a runtime limit, a step limit or a stagnation limit",
            ));
        }
        Ok(())
    }
}
