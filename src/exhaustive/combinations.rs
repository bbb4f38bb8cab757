//! Lexicographic k-combinations.

/// Successor generator over the `k`-subsets of `0..n` in lexicographic
/// order, in constant amortized time per subset.
///
/// # Examples
///
/// ```
/// use corehunter::exhaustive::Combinations;
///
/// let all: Vec<Vec<usize>> = Combinations::new(4, 2).map(|c| c.to_vec()).collect();
/// assert_eq!(all, vec![
///     vec![0, 1], vec![0, 2], vec![0, 3],
///     vec![1, 2], vec![1, 3], vec![2, 3],
/// ]);
/// ```
#[derive(Debug, Clone)]
pub struct Combinations {
    n: usize,
    current: Vec<usize>,
    started: bool,
    done: bool,
}

impl Combinations {
    pub fn new(n: usize, k: usize) -> Self {
        Self {
            n,
            current: (0..k).collect(),
            started: false,
            done: k > n,
        }
    }

    /// Advances to the next combination and returns it, or `None` after
    /// the last one. Borrowing, so no allocation per subset.
    pub fn advance(&mut self) -> Option<&[usize]> {
        if self.done {
            return None;
        }
        if !self.started {
            self.started = true;
            return Some(&self.current);
        }
        let k = self.current.len();
        // rightmost position that can still move right
        let Some(i) = (0..k).rev().find(|&i| self.current[i] < self.n - k + i) else {
            self.done = true;
            return None;
        };
        self.current[i] += 1;
        for j in i + 1..k {
            self.current[j] = self.current[j - 1] + 1;
        }
        Some(&self.current)
    }
}

impl Iterator for Combinations {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        self.advance().map(<[usize]>::to_vec)
    }
}

/// `n choose k` as a float, exact up to 2^53.
pub fn binomial(n: usize, k: usize) -> f64 {
    if k > n {
        return 0.0;
    }
    let k = k.min(n - k);
    (0..k).fold(1.0, |acc, i| acc * (n - i) as f64 / (i + 1) as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_edge_cases() {
        assert_eq!(Combinations::new(3, 0).collect::<Vec<_>>(), vec![Vec::<usize>::new()]);
        assert_eq!(Combinations::new(3, 3).collect::<Vec<_>>(), vec![vec![0, 1, 2]]);
        assert_eq!(Combinations::new(2, 3).count(), 0);
    }

    #[test]
    fn test_binomial() {
        assert_eq!(binomial(5, 2), 10.0);
        assert_eq!(binomial(10, 0), 1.0);
        assert_eq!(binomial(10, 10), 1.0);
        assert_eq!(binomial(3, 4), 0.0);
        assert_eq!(binomial(40, 20), 137_846_528_820.0);
    }

    proptest! {
        #[test]
        fn prop_count_and_order(n in 0usize..10, k in 0usize..6) {
            let all: Vec<Vec<usize>> = Combinations::new(n, k).collect();
            prop_assert_eq!(all.len() as f64, binomial(n, k));
            for w in all.windows(2) {
                prop_assert!(w[0] < w[1]);
            }
            for c in &all {
                prop_assert_eq!(c.len(), k);
                prop_assert!(c.windows(2).all(|p| p[0] < p[1]));
                prop_assert!(c.iter().all(|&i| i < n));
            }
        }
    }
}
