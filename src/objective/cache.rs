//! Incremental evaluation caches.
//!
//! Each cache remembers the selection it last saw. Given a new selection it
//! splits the union into added, removed and common items and updates its
//! aggregate from the pairs that changed only, so evaluating a neighbour
//! that differs by one or two items costs O(k) distance lookups instead of
//! O(k^2).

use std::cmp::Ordering;
use std::collections::BTreeMap;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::{CoreError, Result};

/// Difference between the previous and the new selection.
#[derive(Debug, Default)]
struct Delta {
    added: Vec<usize>,
    removed: Vec<usize>,
    common: Vec<usize>,
}

/// Selection snapshot shared by all cache kinds.
#[derive(Debug, Clone, Default)]
struct Snapshot {
    members: FxHashSet<usize>,
}

impl Snapshot {
    /// Replaces the snapshot with `selected` and returns the difference.
    fn advance(&mut self, selected: &[usize]) -> Delta {
        let mut next = FxHashSet::with_capacity_and_hasher(selected.len(), Default::default());
        let mut delta = Delta::default();
        for &i in selected {
            if !next.insert(i) {
                continue;
            }
            if self.members.contains(&i) {
                delta.common.push(i);
            } else {
                delta.added.push(i);
            }
        }
        delta.removed = self
            .members
            .iter()
            .copied()
            .filter(|i| !next.contains(i))
            .collect();
        self.members = next;
        delta
    }

    fn len(&self) -> usize {
        self.members.len()
    }

    fn contains(&self, i: usize) -> bool {
        self.members.contains(&i)
    }
}

/// Visits every pair `(x, y)` with `x` in `a` and `y` in `b`, then every
/// unordered pair inside `a`.
fn touched_pairs(a: &[usize], b: &[usize], mut f: impl FnMut(usize, usize)) {
    for (n, &x) in a.iter().enumerate() {
        for &y in b {
            f(x, y);
        }
        for &y in &a[n + 1..] {
            f(x, y);
        }
    }
}

/// Running `(total, count)` of pairwise distances.
#[derive(Debug, Clone, Default)]
pub struct MeanCache {
    snapshot: Snapshot,
    total: f64,
    count: usize,
}

impl MeanCache {
    pub fn update(&mut self, selected: &[usize], dist: &impl Fn(usize, usize) -> f64) -> f64 {
        let delta = self.snapshot.advance(selected);
        let k = self.snapshot.len();
        if k < 2 {
            self.total = 0.0;
            self.count = 0;
            return 0.0;
        }
        let mut total = self.total;
        touched_pairs(&delta.removed, &delta.common, |x, y| total -= dist(x, y));
        touched_pairs(&delta.added, &delta.common, |x, y| total += dist(x, y));
        self.total = total;
        self.count = k * (k - 1) / 2;
        self.total / self.count as f64
    }
}

/// Total order over distances so they can key a [`BTreeMap`].
#[derive(Debug, Clone, Copy)]
struct DistanceKey(f64);

impl PartialEq for DistanceKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.total_cmp(&other.0) == Ordering::Equal
    }
}

impl Eq for DistanceKey {}

impl PartialOrd for DistanceKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DistanceKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Multiset of pairwise distances; the minimum is its smallest key.
#[derive(Debug, Clone, Default)]
pub struct MinCache {
    snapshot: Snapshot,
    frequencies: BTreeMap<DistanceKey, usize>,
}

impl MinCache {
    pub fn update(
        &mut self,
        selected: &[usize],
        dist: &impl Fn(usize, usize) -> f64,
    ) -> Result<f64> {
        let delta = self.snapshot.advance(selected);

        let mut missing = None;
        touched_pairs(&delta.removed, &delta.common, |x, y| {
            let key = DistanceKey(dist(x, y));
            match self.frequencies.get_mut(&key) {
                Some(n) if *n > 1 => *n -= 1,
                Some(_) => {
                    self.frequencies.remove(&key);
                }
                None => missing = Some((x, y)),
            }
        });
        if let Some((x, y)) = missing {
            return Err(CoreError::internal(format!(
                "distance of pair ({x}, {y}) removed from the minimum cache was never inserted"
            )));
        }
        touched_pairs(&delta.added, &delta.common, |x, y| {
            *self.frequencies.entry(DistanceKey(dist(x, y))).or_insert(0) += 1;
        });

        Ok(self
            .frequencies
            .keys()
            .next()
            .map(|k| k.0)
            .unwrap_or(0.0))
    }
}

/// Nearest other selected item of every selected item, plus the running sum
/// of those distances.
#[derive(Debug, Clone)]
pub struct EneCache {
    snapshot: Snapshot,
    nearest: FxHashMap<usize, (usize, f64)>,
    sum: f64,
    empty_value: f64,
}

impl EneCache {
    pub fn new(empty_value: f64) -> Self {
        Self {
            snapshot: Snapshot::default(),
            nearest: FxHashMap::default(),
            sum: 0.0,
            empty_value,
        }
    }

    pub fn update(&mut self, selected: &[usize], dist: &impl Fn(usize, usize) -> f64) -> f64 {
        let delta = self.snapshot.advance(selected);

        for r in &delta.removed {
            if let Some((_, d)) = self.nearest.remove(r) {
                self.sum -= d;
            }
        }

        let k = self.snapshot.len();
        if k < 2 {
            self.nearest.clear();
            self.sum = 0.0;
            return self.empty_value;
        }

        let members: Vec<usize> = delta.common.iter().chain(&delta.added).copied().collect();

        for &c in &delta.common {
            let recorded = self.nearest.get(&c).copied();
            let updated = match recorded {
                Some((nb, d)) if self.snapshot.contains(nb) => {
                    let mut best = (nb, d);
                    for &a in &delta.added {
                        let da = dist(c, a);
                        if da < best.1 {
                            best = (a, da);
                        }
                    }
                    best
                }
                // neighbour left the selection, or none was recorded yet
                _ => nearest_of(c, &members, dist),
            };
            if let Some((_, old)) = recorded {
                self.sum -= old;
            }
            self.sum += updated.1;
            self.nearest.insert(c, updated);
        }

        for &a in &delta.added {
            let found = nearest_of(a, &members, dist);
            self.sum += found.1;
            self.nearest.insert(a, found);
        }

        self.sum / k as f64
    }
}

/// Nearest item to `item` among `members`, excluding itself.
fn nearest_of(item: usize, members: &[usize], dist: &impl Fn(usize, usize) -> f64) -> (usize, f64) {
    let mut best = (item, f64::INFINITY);
    for &m in members {
        if m == item {
            continue;
        }
        let d = dist(item, m);
        if d < best.1 {
            best = (m, d);
        }
    }
    best
}

/// Aggregation-specific incremental state of one trajectory.
#[derive(Debug, Clone)]
pub enum EvaluationCache {
    Mean(MeanCache),
    Min(MinCache),
    EntryToNearestEntry(EneCache),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(i: usize, j: usize) -> f64 {
        (i as f64 - j as f64).abs()
    }

    #[test]
    fn test_snapshot_delta() {
        let mut s = Snapshot::default();
        let d = s.advance(&[1, 2, 3]);
        assert_eq!(d.added.len(), 3);
        let mut d = s.advance(&[2, 3, 4, 4]);
        d.common.sort_unstable();
        assert_eq!(d.added, vec![4]);
        assert_eq!(d.removed, vec![1]);
        assert_eq!(d.common, vec![2, 3]);
        assert_eq!(s.len(), 3);
    }

    #[test]
    fn test_mean_cache_tracks_changes() {
        let mut c = MeanCache::default();
        assert_eq!(c.update(&[], &line), 0.0);
        assert_eq!(c.update(&[3], &line), 0.0);
        // pairs: |0-3| = 3
        assert!((c.update(&[0, 3], &line) - 3.0).abs() < 1e-12);
        // pairs: 3, 5, 2
        assert!((c.update(&[0, 3, 5], &line) - 10.0 / 3.0).abs() < 1e-12);
        // swap 0 -> 4: pairs 1, 1, 2
        assert!((c.update(&[4, 3, 5], &line) - 4.0 / 3.0).abs() < 1e-12);
        assert_eq!(c.update(&[5], &line), 0.0);
    }

    #[test]
    fn test_min_cache_tracks_changes() {
        let mut c = MinCache::default();
        assert_eq!(c.update(&[1], &line).unwrap(), 0.0);
        assert_eq!(c.update(&[1, 7], &line).unwrap(), 6.0);
        assert_eq!(c.update(&[1, 7, 6], &line).unwrap(), 1.0);
        assert_eq!(c.update(&[1, 7, 3], &line).unwrap(), 2.0);
        assert_eq!(c.update(&[7], &line).unwrap(), 0.0);
        assert!(c.frequencies.is_empty());
    }

    #[test]
    fn test_min_cache_detects_corruption() {
        let mut c = MinCache::default();
        c.update(&[0, 2], &line).unwrap();
        c.frequencies.clear();
        let err = c.update(&[0], &line).unwrap_err();
        assert!(matches!(err, CoreError::Internal(_)));
    }

    #[test]
    fn test_ene_cache_tracks_changes() {
        let mut c = EneCache::new(-1.0);
        assert_eq!(c.update(&[4], &line), -1.0);
        // nearest: 0->4 (4), 4->0 (4)
        assert!((c.update(&[0, 4], &line) - 4.0).abs() < 1e-12);
        // add 5: 0->4 (4), 4->5 (1), 5->4 (1)
        assert!((c.update(&[0, 4, 5], &line) - 2.0).abs() < 1e-12);
        // remove 4: 0->5 (5), 5->0 (5)
        assert!((c.update(&[0, 5], &line) - 5.0).abs() < 1e-12);
        assert_eq!(c.update(&[], &line), -1.0);
    }
}
