//! Shared memo table for pairwise distances.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

/// Memoized distances keyed by unordered index pair.
///
/// Shared by every trajectory evaluating the same objective. Values are a
/// pure function of the pair, so two threads missing on the same key at
/// once both compute it and the first insert wins.
#[derive(Debug, Default)]
pub struct PairMemo {
    table: RwLock<FxHashMap<(usize, usize), f64>>,
}

impl PairMemo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached distance of `(i, j)`, computing it on a miss.
    pub fn get_or_compute(&self, i: usize, j: usize, compute: impl FnOnce() -> f64) -> f64 {
        let key = if i < j { (i, j) } else { (j, i) };
        if let Some(&d) = self.table.read().get(&key) {
            return d;
        }
        let d = compute();
        *self.table.write().entry(key).or_insert(d)
    }

    /// Number of memoized pairs.
    pub fn len(&self) -> usize {
        self.table.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.read().is_empty()
    }

    /// Drops all memoized values.
    pub fn clear(&self) {
        self.table.write().clear();
    }
}
