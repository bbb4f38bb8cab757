//! Pairwise distance measures between accessions.

use std::sync::Arc;

use crate::data::{Dataset, DistanceMatrix, FrequencyData};

/// A symmetric, non-negative distance between two items of a collection.
///
/// `distance(i, i)` must be `0`.
pub trait DistanceMeasure: Send + Sync {
    /// Human-readable name.
    fn name(&self) -> &str;

    /// Number of items the measure is defined on.
    fn size(&self) -> usize;

    /// Distance between items `i` and `j`.
    fn distance(&self, i: usize, j: usize) -> f64;

    /// Whether a lookup is cheap enough that memoizing it is pointless.
    fn is_cheap(&self) -> bool {
        false
    }
}

/// Modified Rogers distance over allele frequencies.
///
/// `sqrt( sum_l sum_a (p_la - q_la)^2 / (2 L) )`, where `L` is the total
/// number of loci. Loci missing for either accession contribute nothing.
#[derive(Debug, Clone)]
pub struct ModifiedRogers {
    data: Arc<FrequencyData>,
}

impl ModifiedRogers {
    pub fn new(data: Arc<FrequencyData>) -> Self {
        Self { data }
    }
}

impl DistanceMeasure for ModifiedRogers {
    fn name(&self) -> &str {
        "Modified Rogers"
    }

    fn size(&self) -> usize {
        self.data.size()
    }

    fn distance(&self, i: usize, j: usize) -> f64 {
        if i == j {
            return 0.0;
        }
        let sum = shared_loci_sum(&self.data, i, j, |p, q| (p - q) * (p - q));
        (sum / (2.0 * self.data.number_of_loci() as f64)).sqrt()
    }
}

/// Cavalli-Sforza and Edwards chord distance over allele frequencies.
///
/// `sqrt( sum_l sum_a (sqrt p_la - sqrt q_la)^2 / (2 L) )`, skipping
/// missing loci the same way as [`ModifiedRogers`].
#[derive(Debug, Clone)]
pub struct CavalliSforzaEdwards {
    data: Arc<FrequencyData>,
}

impl CavalliSforzaEdwards {
    pub fn new(data: Arc<FrequencyData>) -> Self {
        Self { data }
    }
}

impl DistanceMeasure for CavalliSforzaEdwards {
    fn name(&self) -> &str {
        "Cavalli-Sforza and Edwards"
    }

    fn size(&self) -> usize {
        self.data.size()
    }

    fn distance(&self, i: usize, j: usize) -> f64 {
        if i == j {
            return 0.0;
        }
        let sum = shared_loci_sum(&self.data, i, j, |p, q| {
            let d = p.sqrt() - q.sqrt();
            d * d
        });
        (sum / (2.0 * self.data.number_of_loci() as f64)).sqrt()
    }
}

/// Distances read from a precomputed [`DistanceMatrix`].
#[derive(Debug, Clone)]
pub struct PrecomputedDistance {
    matrix: Arc<DistanceMatrix>,
}

impl PrecomputedDistance {
    pub fn new(matrix: Arc<DistanceMatrix>) -> Self {
        Self { matrix }
    }
}

impl DistanceMeasure for PrecomputedDistance {
    fn name(&self) -> &str {
        "Precomputed"
    }

    fn size(&self) -> usize {
        self.matrix.size()
    }

    fn distance(&self, i: usize, j: usize) -> f64 {
        self.matrix.get(i, j)
    }

    fn is_cheap(&self) -> bool {
        true
    }
}

/// Sums `term(p, q)` over all alleles of the loci present in both rows.
fn shared_loci_sum(data: &FrequencyData, i: usize, j: usize, term: impl Fn(f64, f64) -> f64) -> f64 {
    data.row_elements(i)
        .iter()
        .zip(data.row_elements(j))
        .filter_map(|(a, b)| match (a, b) {
            (Some(a), Some(b)) => Some(a.iter().zip(b).map(|(&p, &q)| term(p, q)).sum::<f64>()),
            _ => None,
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::toy_data;

    #[test]
    fn test_modified_rogers_toy_distances() {
        let mr = ModifiedRogers::new(toy_data());
        let expected = [
            (0, 1, 0.374165738677394),
            (0, 2, 0.070710678118655),
            (0, 3, 0.374165738677394),
            (1, 2, 0.308220700148449),
            (1, 3, 0.5),
            (2, 3, 0.308220700148449),
        ];
        for (i, j, d) in expected {
            assert!((mr.distance(i, j) - d).abs() < 1e-12, "d({i},{j})");
            assert!((mr.distance(j, i) - d).abs() < 1e-12, "d({j},{i})");
        }
        assert_eq!(mr.distance(2, 2), 0.0);
        assert_eq!(mr.size(), 4);
    }

    #[test]
    fn test_cavalli_sforza_edwards() {
        let ce = CavalliSforzaEdwards::new(toy_data());
        // only the second locus is shared between A1 and A3
        let expected = {
            let s: f64 = [(0.1f64, 0.0f64), (0.4, 0.5), (0.5, 0.5)]
                .iter()
                .map(|(p, q)| (p.sqrt() - q.sqrt()).powi(2))
                .sum();
            (s / 4.0).sqrt()
        };
        assert!((ce.distance(0, 2) - expected).abs() < 1e-12);
        assert!((ce.distance(0, 2) - ce.distance(2, 0)).abs() < 1e-15);
        assert_eq!(ce.distance(1, 1), 0.0);
        assert!(!ce.is_cheap());
    }

    #[test]
    fn test_precomputed() {
        let m = DistanceMatrix::from_rows(&[vec![0.0, 2.5], vec![2.5, 0.0]]).unwrap();
        let p = PrecomputedDistance::new(Arc::new(m));
        assert_eq!(p.distance(1, 0), 2.5);
        assert!(p.is_cheap());
    }
}
