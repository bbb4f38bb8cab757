//! LR configuration.

use crate::error::{CoreError, Result};

/// Configuration for [`LrSearch`](super::LrSearch).
///
/// `l > r` grows the selection from the empty set, `l < r` shrinks it
/// from the full universe.
///
/// # Examples
///
/// ```
/// use corehunter::lr::LrConfig;
///
/// let forward = LrConfig::default();
/// assert!(forward.is_forward());
/// let backward = LrConfig::new(0, 1);
/// assert!(!backward.is_forward());
/// assert!(LrConfig::new(2, 2).validate().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LrConfig {
    /// Items added per round.
    pub l: usize,
    /// Items removed per round.
    pub r: usize,
    /// Start a forward search from the best pair, found by brute force,
    /// instead of two greedy additions.
    pub exhaustive_first_pair: bool,
}

impl Default for LrConfig {
    fn default() -> Self {
        Self::new(2, 1)
    }
}

impl LrConfig {
    pub fn new(l: usize, r: usize) -> Self {
        Self {
            l,
            r,
            exhaustive_first_pair: false,
        }
    }

    /// Starts forward selection from the best pair found by brute force.
    pub fn with_exhaustive_first_pair(mut self, enabled: bool) -> Self {
        self.exhaustive_first_pair = enabled;
        self
    }

    pub fn is_forward(&self) -> bool {
        self.l > self.r
    }

    pub fn validate(&self) -> Result<()> {
        if self.l == self.r {
            return Err(CoreError::config(format!(
                "l and r must differ, both are {}",
                self.l
            )));
        }
        if self.exhaustive_first_pair && !self.is_forward() {
            return Err(CoreError::config(
                "exhaustive_first_pair requires a forward search (l > r)",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        assert!(LrConfig::default().validate().is_ok());
        assert!(LrConfig::new(0, 1).validate().is_ok());
        assert!(LrConfig::new(1, 1).validate().is_err());
        assert!(LrConfig::new(0, 1)
            .with_exhaustive_first_pair(true)
            .validate()
            .is_err());
        assert!(LrConfig::new(1, 0)
            .with_exhaustive_first_pair(true)
            .validate()
            .is_ok());
    }
}
