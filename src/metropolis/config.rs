//! Metropolis configuration.

use super::DEFAULT_BOLTZMANN;
use crate::error::{CoreError, Result};

/// Configuration for [`MetropolisSearch`](super::MetropolisSearch).
///
/// # Examples
///
/// ```
/// use corehunter::metropolis::MetropolisConfig;
///
/// let config = MetropolisConfig::default().with_temperature(150.0);
/// assert!(config.validate().is_ok());
/// assert!(config.with_temperature(-1.0).validate().is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MetropolisConfig {
    /// Fixed temperature `T`. Higher values accept more worsening moves.
    pub temperature: f64,
    /// Boltzmann constant `k_B`.
    pub boltzmann: f64,
}

impl Default for MetropolisConfig {
    fn default() -> Self {
        Self {
            temperature: 100.0,
            boltzmann: DEFAULT_BOLTZMANN,
        }
    }
}

impl MetropolisConfig {
    /// Sets the fixed temperature.
    pub fn with_temperature(mut self, t: f64) -> Self {
        self.temperature = t;
        self
    }

    /// Sets the Boltzmann constant `k_B`.
    pub fn with_boltzmann(mut self, k: f64) -> Self {
        self.boltzmann = k;
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_temperature("temperature", self.temperature)?;
        if !(self.boltzmann.is_finite() && self.boltzmann > 0.0) {
            return Err(CoreError::config(format!(
                "boltzmann constant must be positive, got {}",
                self.boltzmann
            )));
        }
        Ok(())
    }
}

pub(crate) fn validate_temperature(name: &str, t: f64) -> Result<()> {
    if !(t.is_finite() && t > 0.0) {
        return Err(CoreError::config(format!("{name} must be positive, got {t}")));
    }
    Ok(())
}
