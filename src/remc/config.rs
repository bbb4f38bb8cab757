//! REMC configuration.

use crate::error::{CoreError, Result};
use crate::metropolis::{validate_temperature, DEFAULT_BOLTZMANN};

/// Configuration for [`RemcSearch`](super::RemcSearch).
///
/// # Examples
///
/// ```
/// use corehunter::remc::RemcConfig;
///
/// let config = RemcConfig::default()
///     .with_replicas(4)
///     .with_temperatures(50.0, 200.0)
///     .with_steps_per_round(20);
/// assert_eq!(config.temperatures(), vec![50.0, 100.0, 150.0, 200.0]);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RemcConfig {
    /// Number of replicas on the temperature ladder.
    pub replicas: usize,
    /// Temperature of the coldest replica.
    pub min_temperature: f64,
    /// Temperature of the hottest replica.
    pub max_temperature: f64,
    /// Metropolis proposals per replica per round.
    pub steps_per_round: usize,
    /// Boltzmann constant `k_B`.
    pub boltzmann: f64,
}

impl Default for RemcConfig {
    fn default() -> Self {
        Self {
            replicas: 10,
            min_temperature: 50.0,
            max_temperature: 200.0,
            steps_per_round: 50,
            boltzmann: DEFAULT_BOLTZMANN,
        }
    }
}

impl RemcConfig {
    /// Sets the number of replicas on the ladder.
    pub fn with_replicas(mut self, n: usize) -> Self {
        self.replicas = n;
        self
    }

    /// Sets the coldest and hottest ladder temperatures.
    pub fn with_temperatures(mut self, min: f64, max: f64) -> Self {
        self.min_temperature = min;
        self.max_temperature = max;
        self
    }

    /// Sets the Metropolis proposals per replica per round.
    pub fn with_steps_per_round(mut self, n: usize) -> Self {
        self.steps_per_round = n;
        self
    }

    /// Sets the Boltzmann constant `k_B`.
    pub fn with_boltzmann(mut self, k: f64) -> Self {
        self.boltzmann = k;
        self
    }

    /// Evenly spaced ladder from `min_temperature` to `max_temperature`.
    pub fn temperatures(&self) -> Vec<f64> {
        if self.replicas <= 1 {
            return vec![self.min_temperature; self.replicas];
        }
        let step = (self.max_temperature - self.min_temperature) / (self.replicas - 1) as f64;
        (0..self.replicas)
            .map(|i| self.min_temperature + i as f64 * step)
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        if self.replicas == 0 {
            return Err(CoreError::config("replicas must be positive"));
        }
        if self.steps_per_round == 0 {
            return Err(CoreError::config("steps_per_round must be positive"));
        }
        validate_temperature("min_temperature", self.min_temperature)?;
        validate_temperature("max_temperature", self.max_temperature)?;
        if self.min_temperature > self.max_temperature {
            return Err(CoreError::config(format!(
                "min_temperature {} exceeds max_temperature {}",
                self.min_temperature, self.max_temperature
            )));
        }
        if !(self.boltzmann.is_finite() && self.boltzmann > 0.0) {
            return Err(CoreError::config("boltzmann constant must be positive"));
        }
        Ok(())
    }
}
