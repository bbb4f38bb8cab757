//! Selected/remaining partition of a universe of indices.

use rand::Rng;

use crate::error::{CoreError, Result};

const NONE: usize = usize::MAX;

/// A partition of the universe `0..n` into selected and remaining indices.
///
/// Both sides are dense vectors with a position table, so membership tests,
/// additions, removals and uniform random picks are all O(1). The order of
/// the vectors is unspecified and changes as items move between sides.
///
/// Every successful mutation bumps [`version`](Self::version), which lets
/// undo logs detect that a solution was changed behind their back.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SubsetSolution {
    selected: Vec<usize>,
    remaining: Vec<usize>,
    // position of each index inside `selected` or `remaining`
    position: Vec<usize>,
    in_selection: Vec<bool>,
    version: u64,
}

impl SubsetSolution {
    /// Creates a solution over `0..universe_size` with `initial` selected.
    ///
    /// Duplicate indices in `initial` are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Config`] if the universe is empty or an index is
    /// outside it.
    pub fn new<I>(universe_size: usize, initial: I) -> Result<Self>
    where
        I: IntoIterator<Item = usize>,
    {
        if universe_size == 0 {
            return Err(CoreError::config("universe must not be empty"));
        }
        let mut sol = Self {
            selected: Vec::new(),
            remaining: (0..universe_size).collect(),
            position: (0..universe_size).collect(),
            in_selection: vec![false; universe_size],
            version: 0,
        };
        for i in initial {
            if i >= universe_size {
                return Err(CoreError::config(format!(
                    "index {i} is outside the universe 0..{universe_size}"
                )));
            }
            sol.add(i);
        }
        sol.version = 0;
        Ok(sol)
    }

    /// A solution with nothing selected.
    pub fn empty(universe_size: usize) -> Result<Self> {
        Self::new(universe_size, std::iter::empty())
    }

    /// A solution with the whole universe selected.
    pub fn full(universe_size: usize) -> Result<Self> {
        Self::new(universe_size, 0..universe_size)
    }

    /// A uniformly random selection of exactly `size` items.
    pub fn random<R: Rng + ?Sized>(universe_size: usize, size: usize, rng: &mut R) -> Result<Self> {
        if size > universe_size {
            return Err(CoreError::config(format!(
                "cannot select {size} items from a universe of {universe_size}"
            )));
        }
        let mut sol = Self::empty(universe_size)?;
        for _ in 0..size {
            sol.add_random(rng);
        }
        sol.version = 0;
        Ok(sol)
    }

    /// Selected indices.
    #[inline]
    pub fn selected(&self) -> &[usize] {
        &self.selected
    }

    /// Indices not selected.
    #[inline]
    pub fn remaining(&self) -> &[usize] {
        &self.remaining
    }

    /// Selected indices in ascending order.
    pub fn selected_sorted(&self) -> Vec<usize> {
        let mut v = self.selected.clone();
        v.sort_unstable();
        v
    }

    /// Number of selected items.
    #[inline]
    pub fn size(&self) -> usize {
        self.selected.len()
    }

    /// Size of the universe.
    #[inline]
    pub fn universe_size(&self) -> usize {
        self.in_selection.len()
    }

    /// Mutation counter, bumped by every successful change.
    #[inline]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Whether `index` is selected. Out-of-universe indices are not.
    #[inline]
    pub fn contains(&self, index: usize) -> bool {
        self.in_selection.get(index).copied().unwrap_or(false)
    }

    /// Whether `index` is in the universe but not selected.
    #[inline]
    pub fn is_remaining(&self, index: usize) -> bool {
        index < self.universe_size() && !self.in_selection[index]
    }

    /// Moves `index` from remaining to selected. No-op returning `false`
    /// unless `index` is currently remaining.
    pub fn add(&mut self, index: usize) -> bool {
        if !self.is_remaining(index) {
            return false;
        }
        take(&mut self.remaining, &mut self.position, index);
        put(&mut self.selected, &mut self.position, index);
        self.in_selection[index] = true;
        self.version += 1;
        true
    }

    /// Moves `index` from selected to remaining. No-op returning `false`
    /// unless `index` is currently selected.
    pub fn remove(&mut self, index: usize) -> bool {
        if !self.contains(index) {
            return false;
        }
        take(&mut self.selected, &mut self.position, index);
        put(&mut self.remaining, &mut self.position, index);
        self.in_selection[index] = false;
        self.version += 1;
        true
    }

    /// Adds `add` and removes `remove` as one change.
    ///
    /// Both preconditions are checked before anything is touched, so a
    /// rejected swap leaves the solution exactly as it was.
    pub fn swap(&mut self, add: usize, remove: usize) -> bool {
        if !self.is_remaining(add) || !self.contains(remove) {
            return false;
        }
        let added = self.add(add);
        let removed = self.remove(remove);
        debug_assert!(added && removed);
        // count the swap as a single change
        self.version -= 1;
        true
    }

    /// Adds a uniformly chosen remaining item.
    pub fn add_random<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<usize> {
        if self.remaining.is_empty() {
            return None;
        }
        let index = self.remaining[rng.random_range(0..self.remaining.len())];
        self.add(index);
        Some(index)
    }

    /// Removes a uniformly chosen selected item.
    pub fn remove_random<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<usize> {
        if self.selected.is_empty() {
            return None;
        }
        let index = self.selected[rng.random_range(0..self.selected.len())];
        self.remove(index);
        Some(index)
    }

    /// Swaps a uniformly chosen remaining item in for a uniformly chosen
    /// selected one. Returns `(added, removed)`.
    pub fn swap_random<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<(usize, usize)> {
        if self.selected.is_empty() || self.remaining.is_empty() {
            return None;
        }
        let add = self.remaining[rng.random_range(0..self.remaining.len())];
        let remove = self.selected[rng.random_range(0..self.selected.len())];
        self.swap(add, remove);
        Some((add, remove))
    }

    /// Checks the partition invariants and that the selection is non-empty.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Config`] for an empty selection and
    /// [`CoreError::Internal`] if the partition itself is corrupted.
    pub fn validate(&self) -> Result<()> {
        let n = self.universe_size();
        if self.selected.len() + self.remaining.len() != n {
            return Err(CoreError::internal(format!(
                "partition sizes {} + {} do not cover universe of {n}",
                self.selected.len(),
                self.remaining.len()
            )));
        }
        for (side, items, flag) in [
            ("selected", &self.selected, true),
            ("remaining", &self.remaining, false),
        ] {
            for (pos, &i) in items.iter().enumerate() {
                if i >= n || self.in_selection[i] != flag || self.position[i] != pos {
                    return Err(CoreError::internal(format!(
                        "index {i} is misplaced in the {side} side"
                    )));
                }
            }
        }
        if self.selected.is_empty() {
            return Err(CoreError::config("selection must not be empty"));
        }
        Ok(())
    }

    /// [`validate`](Self::validate) plus the size window `[min, max]`.
    pub fn validate_bounds(&self, min: usize, max: usize) -> Result<()> {
        self.validate()?;
        if self.size() < min || self.size() > max {
            return Err(CoreError::config(format!(
                "selection size {} is outside [{min}, {max}]",
                self.size()
            )));
        }
        Ok(())
    }
}

impl PartialEq for SubsetSolution {
    /// Two solutions are equal when they select the same indices of the
    /// same universe, regardless of internal order or version.
    fn eq(&self, other: &Self) -> bool {
        self.in_selection == other.in_selection
    }
}

impl Eq for SubsetSolution {}

fn take(side: &mut Vec<usize>, position: &mut [usize], index: usize) {
    let pos = position[index];
    side.swap_remove(pos);
    if let Some(&moved) = side.get(pos) {
        position[moved] = pos;
    }
    position[index] = NONE;
}

fn put(side: &mut Vec<usize>, position: &mut [usize], index: usize) {
    position[index] = side.len();
    side.push(index);
}
