//! Tabu Search configuration.

use crate::error::{CoreError, Result};
use crate::neighbourhood::NeighbourhoodKind;

/// Configuration parameters for Tabu Search.
///
/// # Examples
///
/// ```
/// use corehunter::neighbourhood::NeighbourhoodKind;
/// use corehunter::tabu::TabuConfig;
///
/// let config = TabuConfig::default()
///     .with_history_size(10)
///     .with_neighbourhood(NeighbourhoodKind::Heuristic { sample_size: 200 });
/// assert_eq!(config.history_size, 10);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TabuConfig {
    /// How many recently touched indices stay tabu.
    pub history_size: usize,
    /// Candidate moves examined per step.
    pub neighbourhood: NeighbourhoodKind,
}

impl Default for TabuConfig {
    fn default() -> Self {
        Self {
            history_size: 7,
            neighbourhood: NeighbourhoodKind::Exact,
        }
    }
}

impl TabuConfig {
    /// Sets the tabu history size.
    pub fn with_history_size(mut self, history_size: usize) -> Self {
        self.history_size = history_size;
        self
    }

    /// Sets the neighbourhood.
    pub fn with_neighbourhood(mut self, neighbourhood: NeighbourhoodKind) -> Self {
        self.neighbourhood = neighbourhood;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.history_size == 0 {
            return Err(CoreError::config("tabu history_size must be positive"));
        }
        self.neighbourhood.validate()
    }
}
