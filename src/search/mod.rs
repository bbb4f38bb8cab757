//! Search lifecycle shared by every strategy.
//!
//! A search moves through `Created -> Running -> {Completed | Failed}`.
//! [`Search::start`] is one-shot: it runs the strategy to termination on
//! the calling thread and cannot be repeated. Hitting a limit is a normal
//! completion, recorded as a [`StopReason`].

mod config;
mod state;
mod listener;
pub(crate) mod replica;

use std::fmt;
use std::time::Duration;

pub use self::config::SearchConfig;
pub(crate) use self::state::SearchCore;
pub use self::listener::{SearchListener, TracingListener};

use crate::error::Result;
use crate::solution::SubsetSolution;

/// Lifecycle state of a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SearchStatus {
    Created,
    Running,
    Completed,
    Failed,
}

impl fmt::Display for SearchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SearchStatus::Created => "created",
            SearchStatus::Running => "running",
            SearchStatus::Completed => "completed",
            SearchStatus::Failed => "failed",
        })
    }
}

/// Why a search completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StopReason {
    /// The wall-clock budget ran out.
    RuntimeLimit,
    /// The step budget ran out.
    StepLimit,
    /// No sufficient improvement within the stagnation limits.
    Stagnation,
    /// The neighbourhood offered no admissible move.
    NoAdmissibleMove,
    /// Every candidate was enumerated.
    Exhausted,
    /// No neighbour improves the current solution.
    LocalOptimum,
    /// A stepwise search reached the far end of the size window.
    SizeLimit,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StopReason::RuntimeLimit => "runtime limit reached",
            StopReason::StepLimit => "step limit reached",
            StopReason::Stagnation => "no sufficient improvement",
            StopReason::NoAdmissibleMove => "no admissible move",
            StopReason::Exhausted => "search space exhausted",
            StopReason::LocalOptimum => "local optimum reached",
            StopReason::SizeLimit => "size window traversed",
        })
    }
}

/// A subset-selection search.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use corehunter::data::DistanceMatrix;
/// use corehunter::objective::{Aggregation, ObjectiveFunction, PrecomputedDistance};
/// use corehunter::search::{Search, SearchConfig, SearchStatus};
/// use corehunter::local::SteepestDescentSearch;
///
/// let matrix = DistanceMatrix::from_rows(&[
///     vec![0.0, 1.0, 4.0],
///     vec![1.0, 0.0, 2.0],
///     vec![4.0, 2.0, 0.0],
/// ])
/// .unwrap();
/// let objective = ObjectiveFunction::new(
///     Arc::new(PrecomputedDistance::new(Arc::new(matrix))),
///     Aggregation::Mean,
/// );
/// let mut search =
///     SteepestDescentSearch::new(objective, 3, SearchConfig::new(2, 2).with_seed(1)).unwrap();
/// search.start().unwrap();
/// assert_eq!(search.status(), SearchStatus::Completed);
/// assert_eq!(search.best_solution().unwrap().selected_sorted(), vec![0, 2]);
/// assert_eq!(search.best_solution_evaluation(), Some(4.0));
/// ```
pub trait Search {
    fn name(&self) -> &str;

    /// Runs the search to termination.
    ///
    /// # Errors
    ///
    /// [`CoreError::InvalidState`](crate::CoreError::InvalidState) unless
    /// the search is [`SearchStatus::Created`]; any error raised while
    /// running, after which the status is [`SearchStatus::Failed`].
    fn start(&mut self) -> Result<()>;

    fn status(&self) -> SearchStatus;

    /// Best solution within the size window seen so far.
    fn best_solution(&self) -> Option<&SubsetSolution>;

    fn best_solution_evaluation(&self) -> Option<f64>;

    fn add_listener(&mut self, listener: Box<dyn SearchListener + Send>);

    /// Steps taken; the unit depends on the strategy.
    fn steps(&self) -> u64;

    /// Running time, frozen once the search has terminated.
    fn elapsed(&self) -> Duration;

    /// Set once the search has completed.
    fn stop_reason(&self) -> Option<StopReason>;
}

/// Implements [`Search`] for a strategy holding a `core: SearchCore` field
/// and an inherent `fn run(&mut self) -> Result<StopReason>`.
macro_rules! impl_search {
    ($ty:ty) => {
        impl $crate::search::Search for $ty {
            fn name(&self) -> &str {
                self.core.name()
            }

            fn start(&mut self) -> $crate::error::Result<()> {
                self.core.begin()?;
                let outcome = self.run();
                self.core.finish(outcome)
            }

            fn status(&self) -> $crate::search::SearchStatus {
                self.core.status()
            }

            fn best_solution(&self) -> Option<&$crate::solution::SubsetSolution> {
                self.core.best_solution()
            }

            fn best_solution_evaluation(&self) -> Option<f64> {
                self.core.best_evaluation()
            }

            fn add_listener(&mut self, listener: Box<dyn $crate::search::SearchListener + Send>) {
                self.core.add_listener(listener);
            }

            fn steps(&self) -> u64 {
                self.core.steps()
            }

            fn elapsed(&self) -> std::time::Duration {
                self.core.elapsed()
            }

            fn stop_reason(&self) -> Option<$crate::search::StopReason> {
                self.core.stop_reason()
            }
        }
    };
}

pub(crate) use impl_search;
