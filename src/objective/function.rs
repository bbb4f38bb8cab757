//! Distance-based objective functions.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::cache::{EneCache, EvaluationCache, MeanCache, MinCache};
use super::distance::DistanceMeasure;
use super::memo::PairMemo;
use crate::error::{CoreError, Result};
use crate::solution::Subset;

/// How pairwise distances inside a selection are folded into one value.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Aggregation {
    /// Average over all unordered pairs; `0` below two items.
    Mean,
    /// Smallest pairwise distance; `0` below two items.
    Min,
    /// Average distance from each item to its nearest other item;
    /// `empty_value` below two items.
    EntryToNearestEntry {
        /// Value of selections with fewer than two items.
        empty_value: f64,
    },
}

/// Optimization direction of an objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    /// Larger values are better (diversity objectives).
    #[default]
    Maximize,
    /// Smaller values are better.
    Minimize,
}

impl Direction {
    /// Whether `a` is strictly better than `b`.
    #[inline]
    pub fn is_better(self, a: f64, b: f64) -> bool {
        match self {
            Direction::Maximize => a > b,
            Direction::Minimize => a < b,
        }
    }

    /// How much worse `candidate` is than `current` (negative if better).
    #[inline]
    pub fn worsening(self, current: f64, candidate: f64) -> f64 {
        match self {
            Direction::Maximize => current - candidate,
            Direction::Minimize => candidate - current,
        }
    }

    /// Evaluation as an energy: lower is always better.
    #[inline]
    pub fn energy(self, evaluation: f64) -> f64 {
        match self {
            Direction::Maximize => -evaluation,
            Direction::Minimize => evaluation,
        }
    }

    /// A value every real evaluation improves on.
    #[inline]
    pub fn worst(self) -> f64 {
        match self {
            Direction::Maximize => f64::NEG_INFINITY,
            Direction::Minimize => f64::INFINITY,
        }
    }
}

/// Identifier of one evaluation context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(u64);

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctx#{}", self.0)
    }
}

/// Hands out [`ContextId`]s; owned by an objective and shared by its clones.
#[derive(Debug, Default)]
pub struct ContextIdAllocator {
    next: AtomicU64,
}

impl ContextIdAllocator {
    pub fn allocate(&self) -> ContextId {
        ContextId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

/// Incremental evaluation state of one search trajectory.
///
/// A context belongs to exactly one trajectory at a time. Replicas that
/// fork a trajectory must [`fork`](Self::fork) its context too.
#[derive(Debug)]
pub struct EvaluationContext {
    id: ContextId,
    cache: EvaluationCache,
    ids: Arc<ContextIdAllocator>,
}

impl EvaluationContext {
    pub fn id(&self) -> ContextId {
        self.id
    }

    /// Deep copy of the cache under a fresh id.
    pub fn fork(&self) -> EvaluationContext {
        EvaluationContext {
            id: self.ids.allocate(),
            cache: self.cache.clone(),
            ids: Arc::clone(&self.ids),
        }
    }
}

/// A scalar fitness for selections, built from a pairwise distance and an
/// [`Aggregation`].
///
/// Cloning is cheap: clones share the distance measure, the pair memo and
/// the context id allocator.
#[derive(Clone)]
pub struct ObjectiveFunction {
    name: String,
    aggregation: Aggregation,
    direction: Direction,
    measure: Arc<dyn DistanceMeasure>,
    memo: Option<Arc<PairMemo>>,
    ids: Arc<ContextIdAllocator>,
}

impl fmt::Debug for ObjectiveFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectiveFunction")
            .field("name", &self.name)
            .field("aggregation", &self.aggregation)
            .field("direction", &self.direction)
            .field("measure", &self.measure.name())
            .field("memoized", &self.memo.is_some())
            .finish()
    }
}

impl ObjectiveFunction {
    /// Creates a maximizing objective. Distances are memoized unless the
    /// measure reports itself as cheap.
    pub fn new(measure: Arc<dyn DistanceMeasure>, aggregation: Aggregation) -> Self {
        let label = match aggregation {
            Aggregation::Mean => "mean",
            Aggregation::Min => "min",
            Aggregation::EntryToNearestEntry { .. } => "entry-to-nearest-entry",
        };
        let memo = (!measure.is_cheap()).then(|| Arc::new(PairMemo::new()));
        Self {
            name: format!("{label} {}", measure.name()),
            aggregation,
            direction: Direction::Maximize,
            measure,
            memo,
            ids: Arc::new(ContextIdAllocator::default()),
        }
    }

    /// Sets whether larger or smaller evaluations are better.
    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Overrides the generated name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Enables or disables the shared pair memo.
    pub fn with_memoization(mut self, enabled: bool) -> Self {
        self.memo = enabled.then(|| Arc::new(PairMemo::new()));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn aggregation(&self) -> Aggregation {
        self.aggregation
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn is_minimizing(&self) -> bool {
        self.direction == Direction::Minimize
    }

    /// Number of items the objective is defined on.
    pub fn size(&self) -> usize {
        self.measure.size()
    }

    /// Number of memoized pairs (0 without memoization).
    pub fn memoized_pairs(&self) -> usize {
        self.memo.as_ref().map_or(0, |m| m.len())
    }

    /// Distance between `i` and `j`, through the memo if enabled.
    #[inline]
    pub fn distance(&self, i: usize, j: usize) -> f64 {
        if i == j {
            return 0.0;
        }
        match &self.memo {
            Some(memo) => memo.get_or_compute(i, j, || self.measure.distance(i, j)),
            None => self.measure.distance(i, j),
        }
    }

    /// Creates a fresh evaluation context for a new trajectory.
    pub fn new_context(&self) -> EvaluationContext {
        let cache = match self.aggregation {
            Aggregation::Mean => EvaluationCache::Mean(MeanCache::default()),
            Aggregation::Min => EvaluationCache::Min(MinCache::default()),
            Aggregation::EntryToNearestEntry { empty_value } => {
                EvaluationCache::EntryToNearestEntry(EneCache::new(empty_value))
            }
        };
        EvaluationContext {
            id: self.ids.allocate(),
            cache,
            ids: Arc::clone(&self.ids),
        }
    }

    /// Evaluates `subset` from scratch, without touching any context.
    pub fn calculate<S: Subset + ?Sized>(&self, subset: &S) -> f64 {
        let sel = subset.selected();
        let k = sel.len();
        match self.aggregation {
            Aggregation::Mean => {
                if k < 2 {
                    return 0.0;
                }
                let mut total = 0.0;
                for (n, &a) in sel.iter().enumerate() {
                    for &b in &sel[n + 1..] {
                        total += self.distance(a, b);
                    }
                }
                total / (k * (k - 1) / 2) as f64
            }
            Aggregation::Min => {
                if k < 2 {
                    return 0.0;
                }
                let mut min = f64::INFINITY;
                for (n, &a) in sel.iter().enumerate() {
                    for &b in &sel[n + 1..] {
                        min = min.min(self.distance(a, b));
                    }
                }
                min
            }
            Aggregation::EntryToNearestEntry { empty_value } => {
                if k < 2 {
                    return empty_value;
                }
                let sum: f64 = sel
                    .iter()
                    .map(|&a| {
                        sel.iter()
                            .filter(|&&b| b != a)
                            .map(|&b| self.distance(a, b))
                            .fold(f64::INFINITY, f64::min)
                    })
                    .sum();
                sum / k as f64
            }
        }
    }

    /// Evaluates `subset` incrementally against the selection `context`
    /// saw last, then records `subset` as the new reference point.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Internal`] if the context was created for a
    /// different aggregation or its cache is corrupted.
    pub fn evaluate<S: Subset + ?Sized>(
        &self,
        subset: &S,
        context: &mut EvaluationContext,
    ) -> Result<f64> {
        let dist = |i: usize, j: usize| self.distance(i, j);
        let sel = subset.selected();
        match (&mut context.cache, self.aggregation) {
            (EvaluationCache::Mean(c), Aggregation::Mean) => Ok(c.update(sel, &dist)),
            (EvaluationCache::Min(c), Aggregation::Min) => c.update(sel, &dist),
            (EvaluationCache::EntryToNearestEntry(c), Aggregation::EntryToNearestEntry { .. }) => {
                Ok(c.update(sel, &dist))
            }
            (cache, aggregation) => Err(CoreError::internal(format!(
                "{} holds a {} cache but the objective aggregates by {aggregation:?}",
                context.id,
                cache_kind(cache)
            ))),
        }
    }
}

fn cache_kind(cache: &EvaluationCache) -> &'static str {
    match cache {
        EvaluationCache::Mean(_) => "mean",
        EvaluationCache::Min(_) => "min",
        EvaluationCache::EntryToNearestEntry(_) => "entry-to-nearest-entry",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objective::ModifiedRogers;
    use crate::rng::create_rng;
    use crate::solution::{Move, SubsetSolution};
    use crate::testing::{random_data, toy_data};
    use proptest::prelude::*;
    use rand::Rng;

    fn toy(aggregation: Aggregation) -> ObjectiveFunction {
        ObjectiveFunction::new(Arc::new(ModifiedRogers::new(toy_data())), aggregation)
    }

    #[test]
    fn test_toy_mean_values() {
        let obj = toy(Aggregation::Mean);
        assert!((obj.calculate(&vec![0, 1, 2, 3]) - 0.322580592628).abs() < 1e-12);
        assert!((obj.calculate(&vec![0, 2]) - 0.070710678118655).abs() < 1e-12);
        assert_eq!(obj.calculate(&vec![1]), 0.0);
        assert_eq!(obj.calculate(&Vec::<usize>::new()), 0.0);
        assert_eq!(obj.name(), "mean Modified Rogers");
        assert_eq!(obj.memoized_pairs(), 6);
    }

    #[test]
    fn test_toy_min_and_ene_values() {
        let min = toy(Aggregation::Min);
        assert!((min.calculate(&vec![0, 1, 2, 3]) - 0.070710678118655).abs() < 1e-12);
        assert!((min.calculate(&vec![1, 3]) - 0.5).abs() < 1e-12);
        assert_eq!(min.calculate(&vec![2]), 0.0);

        let ene = toy(Aggregation::EntryToNearestEntry { empty_value: 0.0 });
        // nearest: A1->A3, A2->A3, A3->A1, A4->A3
        let expected =
            (0.070710678118655 + 0.308220700148449 + 0.070710678118655 + 0.308220700148449) / 4.0;
        assert!((ene.calculate(&vec![0, 1, 2, 3]) - expected).abs() < 1e-12);
        assert_eq!(ene.calculate(&vec![3]), 0.0);
    }

    #[test]
    fn test_incremental_matches_scratch_on_toy() {
        for aggregation in [
            Aggregation::Mean,
            Aggregation::Min,
            Aggregation::EntryToNearestEntry { empty_value: 0.0 },
        ] {
            let obj = toy(aggregation);
            let mut ctx = obj.new_context();
            for sel in [vec![0, 1], vec![0, 1, 2, 3], vec![3, 2], vec![1], vec![1, 2, 0]] {
                let inc = obj.evaluate(&sel, &mut ctx).unwrap();
                assert!((inc - obj.calculate(&sel)).abs() < 1e-12, "{aggregation:?} {sel:?}");
            }
        }
    }

    #[test]
    fn test_direction() {
        assert!(Direction::Maximize.is_better(2.0, 1.0));
        assert!(!Direction::Maximize.is_better(1.0, 1.0));
        assert!(Direction::Minimize.is_better(1.0, 2.0));
        assert_eq!(Direction::Maximize.worsening(3.0, 1.0), 2.0);
        assert_eq!(Direction::Minimize.worsening(3.0, 1.0), -2.0);
        assert_eq!(Direction::Maximize.energy(0.5), -0.5);
        assert!(Direction::Maximize.is_better(0.0, Direction::Maximize.worst()));
        assert!(Direction::Minimize.is_better(0.0, Direction::Minimize.worst()));
        let obj = toy(Aggregation::Mean).with_direction(Direction::Minimize);
        assert!(obj.is_minimizing());
    }

    #[test]
    fn test_contexts_are_independent_and_forkable() {
        let obj = toy(Aggregation::Mean);
        let mut a = obj.new_context();
        let mut b = obj.new_context();
        assert_ne!(a.id(), b.id());

        obj.evaluate(&vec![0, 1, 2], &mut a).unwrap();
        obj.evaluate(&vec![3], &mut b).unwrap();
        let mut fork = a.fork();
        assert_ne!(fork.id(), a.id());

        let v = obj.evaluate(&vec![0, 1, 2, 3], &mut fork).unwrap();
        assert!((v - obj.calculate(&vec![0, 1, 2, 3])).abs() < 1e-12);
        // the original still sees {0, 1, 2}
        let v = obj.evaluate(&vec![0, 1], &mut a).unwrap();
        assert!((v - obj.calculate(&vec![0, 1])).abs() < 1e-12);
    }

    #[test]
    fn test_mismatched_context_is_an_internal_error() {
        let mean = toy(Aggregation::Mean);
        let min = toy(Aggregation::Min);
        let mut ctx = min.new_context();
        let err = mean.evaluate(&vec![0, 1], &mut ctx).unwrap_err();
        assert!(matches!(err, CoreError::Internal(_)));
    }

    #[test]
    fn test_memoization_toggle() {
        let obj = toy(Aggregation::Mean).with_memoization(false);
        obj.calculate(&vec![0, 1, 2]);
        assert_eq!(obj.memoized_pairs(), 0);
    }

    fn arb_aggregation() -> impl Strategy<Value = Aggregation> {
        prop_oneof![
            Just(Aggregation::Mean),
            Just(Aggregation::Min),
            Just(Aggregation::EntryToNearestEntry { empty_value: 0.0 }),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(48))]

        #[test]
        fn prop_incremental_equals_scratch(
            aggregation in arb_aggregation(),
            seed in 0u64..1000,
            steps in 1usize..60,
        ) {
            let n = 15;
            let obj = ObjectiveFunction::new(
                Arc::new(ModifiedRogers::new(random_data(n, 6, seed))),
                aggregation,
            );
            let mut rng = create_rng(Some(seed));
            let mut sol = SubsetSolution::random(n, rng.random_range(0..=n), &mut rng).unwrap();
            let mut ctx = obj.new_context();
            for _ in 0..steps {
                let mv = match rng.random_range(0..3) {
                    0 => sol.remaining().first().map(|&i| Move::Add(i)),
                    1 => sol.selected().first().map(|&i| Move::Remove(i)),
                    _ => match (sol.remaining().last(), sol.selected().last()) {
                        (Some(&add), Some(&remove)) => Some(Move::Swap { add, remove }),
                        _ => None,
                    },
                };
                if let Some(mv) = mv {
                    mv.apply(&mut sol);
                }
                let inc = obj.evaluate(&sol, &mut ctx).unwrap();
                let scratch = obj.calculate(&sol);
                prop_assert!((inc - scratch).abs() < 1e-9, "{inc} vs {scratch}");
            }
        }
    }
}
