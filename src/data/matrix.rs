//! Precomputed pairwise distances.

use super::Dataset;
use crate::error::{CoreError, Result};

/// A symmetric matrix of non-negative distances with a zero diagonal.
///
/// Stored as the strict upper triangle in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    n: usize,
    upper: Vec<f64>,
}

impl DistanceMatrix {
    /// Builds a matrix from full rows.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Config`] if the matrix is empty or not square,
    /// not symmetric, has a non-zero diagonal, or holds negative or
    /// non-finite entries.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let n = rows.len();
        if n == 0 {
            return Err(CoreError::config("distance matrix is empty"));
        }
        let mut upper = Vec::with_capacity(n * (n - 1) / 2);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != n {
                return Err(CoreError::config(format!(
                    "row {i} has {} entries, expected {n}",
                    row.len()
                )));
            }
            if row[i] != 0.0 {
                return Err(CoreError::config(format!(
                    "diagonal entry ({i}, {i}) is {}, expected 0",
                    row[i]
                )));
            }
            for (j, &d) in row.iter().enumerate().skip(i + 1) {
                if !d.is_finite() || d < 0.0 {
                    return Err(CoreError::config(format!(
                        "distance ({i}, {j}) = {d} is not a finite non-negative value"
                    )));
                }
                if (d - rows[j][i]).abs() > 1e-12 {
                    return Err(CoreError::config(format!(
                        "matrix is not symmetric at ({i}, {j})"
                    )));
                }
                upper.push(d);
            }
        }
        Ok(Self { n, upper })
    }

    /// Distance between `i` and `j`.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        if i == j {
            return 0.0;
        }
        let (a, b) = if i < j { (i, j) } else { (j, i) };
        // offset of row a in the strict upper triangle
        let row = a * (2 * self.n - a - 1) / 2;
        self.upper[row + (b - a - 1)]
    }
}

impl Dataset for DistanceMatrix {
    fn size(&self) -> usize {
        self.n
    }
}
