//! Mixed replica configuration.

use std::time::Duration;

use crate::error::{CoreError, Result};
use crate::metropolis::{validate_temperature, DEFAULT_BOLTZMANN};
use crate::neighbourhood::NeighbourhoodKind;

/// Configuration for [`MixedReplicaSearch`](super::MixedReplicaSearch).
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use corehunter::mixed::MixedReplicaConfig;
///
/// let config = MixedReplicaConfig::default()
///     .with_replicas(1, 2, 3)
///     .with_rounds_without_tabu(5)
///     .with_boost(3, 1e-4, Duration::from_millis(200), 2.0);
/// assert_eq!(config.total_replicas(), 6);
/// assert_eq!(config.boost_stall_time(), Duration::from_millis(400));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MixedReplicaConfig {
    /// Tabu replicas; idle until `rounds_without_tabu` rounds have passed.
    pub tabu_replicas: usize,
    /// Best-improvement local search replicas.
    pub local_replicas: usize,
    /// Metropolis replicas, on a temperature ladder.
    pub metropolis_replicas: usize,
    /// Temperature of the coldest Metropolis replica.
    pub min_temperature: f64,
    /// Temperature of the hottest Metropolis replica.
    pub max_temperature: f64,
    /// Boltzmann constant `k_B` of the Metropolis replicas.
    pub boltzmann: f64,
    /// Rounds before the tabu replicas are seeded and tournaments begin.
    pub rounds_without_tabu: usize,
    /// Moves or proposals per replica per round.
    pub steps_per_round: usize,
    /// Replicas drawn per tournament.
    pub tournament_size: usize,
    /// Tabu history size of each tabu replica.
    pub tabu_history_size: usize,
    /// Neighbourhood of the local and tabu replicas.
    pub neighbourhood: NeighbourhoodKind,
    /// Maximum number of boosts per replica.
    pub boost_number: usize,
    /// Improvement of a replica's best that counts as progress.
    pub boost_min_progression: f64,
    /// Base stall time before a boost.
    pub boost_min_progression_time: Duration,
    /// Multiplier on `boost_min_progression_time`.
    pub boost_time_factor: f64,
}

impl Default for MixedReplicaConfig {
    fn default() -> Self {
        Self {
            tabu_replicas: 2,
            local_replicas: 2,
            metropolis_replicas: 3,
            min_temperature: 50.0,
            max_temperature: 100.0,
            boltzmann: DEFAULT_BOLTZMANN,
            rounds_without_tabu: 10,
            steps_per_round: 50,
            tournament_size: 2,
            tabu_history_size: 7,
            neighbourhood: NeighbourhoodKind::Exact,
            boost_number: 2,
            boost_min_progression: 1e-4,
            boost_min_progression_time: Duration::from_secs(1),
            boost_time_factor: 2.0,
        }
    }
}

impl MixedReplicaConfig {
    /// Sets the number of tabu, local and Metropolis replicas.
    pub fn with_replicas(mut self, tabu: usize, local: usize, metropolis: usize) -> Self {
        self.tabu_replicas = tabu;
        self.local_replicas = local;
        self.metropolis_replicas = metropolis;
        self
    }

    /// Sets the Metropolis temperature range.
    pub fn with_temperatures(mut self, min: f64, max: f64) -> Self {
        self.min_temperature = min;
        self.max_temperature = max;
        self
    }

    /// Sets the Boltzmann constant `k_B`.
    pub fn with_boltzmann(mut self, k: f64) -> Self {
        self.boltzmann = k;
        self
    }

    /// Sets the number of warm-up rounds before tabu replicas and tournaments.
    pub fn with_rounds_without_tabu(mut self, rounds: usize) -> Self {
        self.rounds_without_tabu = rounds;
        self
    }

    /// Sets the moves or proposals per replica per round.
    pub fn with_steps_per_round(mut self, n: usize) -> Self {
        self.steps_per_round = n;
        self
    }

    /// Sets the number of replicas drawn per tournament.
    pub fn with_tournament_size(mut self, n: usize) -> Self {
        self.tournament_size = n;
        self
    }

    /// Sets the tabu history size of each tabu replica.
    pub fn with_tabu_history_size(mut self, n: usize) -> Self {
        self.tabu_history_size = n;
        self
    }

    /// Sets the neighbourhood of the local and tabu replicas.
    pub fn with_neighbourhood(mut self, neighbourhood: NeighbourhoodKind) -> Self {
        self.neighbourhood = neighbourhood;
        self
    }

    /// Sets the boost count, progression threshold and stall timing.
    pub fn with_boost(
        mut self,
        number: usize,
        min_progression: f64,
        min_progression_time: Duration,
        time_factor: f64,
    ) -> Self {
        self.boost_number = number;
        self.boost_min_progression = min_progression;
        self.boost_min_progression_time = min_progression_time;
        self.boost_time_factor = time_factor;
        self
    }

    pub fn total_replicas(&self) -> usize {
        self.tabu_replicas + self.local_replicas + self.metropolis_replicas
    }

    /// How long a replica may go without progress before it is boosted.
    ///
    /// Saturates at [`Duration::MAX`]; [`validate`](Self::validate) rejects
    /// configurations that overflow.
    pub fn boost_stall_time(&self) -> Duration {
        self.checked_boost_stall_time().unwrap_or(Duration::MAX)
    }

    fn checked_boost_stall_time(&self) -> Option<Duration> {
        Duration::try_from_secs_f64(self.boost_min_progression_time.as_secs_f64() * self.boost_time_factor)
            .ok()
    }

    /// Evenly spaced temperatures of the Metropolis replicas.
    pub fn temperatures(&self) -> Vec<f64> {
        let n = self.metropolis_replicas;
        if n <= 1 {
            return vec![self.min_temperature; n];
        }
        let step = (self.max_temperature - self.min_temperature) / (n - 1) as f64;
        (0..n).map(|i| self.min_temperature + i as f64 * step).collect()
    }

    pub fn validate(&self) -> Result<()> {
        if self.local_replicas + self.metropolis_replicas == 0 {
            return Err(CoreError::config(
                "at least one local or Metropolis replica is required",
            ));
        }
        if self.steps_per_round == 0 {
            return Err(CoreError::config("steps_per_round must be positive"));
        }
        if self.tournament_size == 0 {
            return Err(CoreError::config("tournament_size must be positive"));
        }
        if self.tabu_replicas > 0 && self.tabu_history_size == 0 {
            return Err(CoreError::config("tabu_history_size must be positive"));
        }
        if self.metropolis_replicas > 0 {
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
        }
        if !(self.boost_min_progression.is_finite() && self.boost_min_progression >= 0.0) {
            return Err(CoreError::config("boost_min_progression must be non-negative"));
        }
        if !(self.boost_time_factor.is_finite() && self.boost_time_factor >= 0.0) {
            return Err(CoreError::config("boost_time_factor must be non-negative"));
        }
        if self.checked_boost_stall_time().is_none() {
            return Err(CoreError::config(format!(
                "boost stall time {:?} * {} overflows",
                self.boost_min_progression_time, self.boost_time_factor
            )));
        }
        self.neighbourhood.validate()
    }
}
