//! Push notifications about a running search.

use crate::error::CoreError;
use crate::solution::SubsetSolution;

/// Receives events from a search.
///
/// A search emits exactly one `search_started`, then any number of
/// `new_best_solution`, `search_progress` and `search_message`, then
/// exactly one of `search_completed` or `search_failed`. All methods
/// default to doing nothing.
pub trait SearchListener {
    fn search_started(&mut self, _name: &str) {}

    fn search_completed(&mut self, _best: Option<&SubsetSolution>, _evaluation: Option<f64>) {}

    fn search_failed(&mut self, _error: &CoreError) {}

    fn new_best_solution(&mut self, _solution: &SubsetSolution, _evaluation: f64) {}

    /// Fraction of the budget used, in `[0, 1]`.
    fn search_progress(&mut self, _fraction: f64) {}

    fn search_message(&mut self, _message: &str) {}
}

/// Forwards search events to `tracing`.
#[derive(Debug, Clone, Default)]
pub struct TracingListener;

impl SearchListener for TracingListener {
    fn search_started(&mut self, name: &str) {
        tracing::info!(search = name, "search started");
    }

    fn search_completed(&mut self, best: Option<&SubsetSolution>, evaluation: Option<f64>) {
        tracing::info!(
            size = best.map(SubsetSolution::size),
            evaluation,
            "search completed"
        );
    }

    fn search_failed(&mut self, error: &CoreError) {
        tracing::error!(%error, "search failed");
    }

    fn new_best_solution(&mut self, solution: &SubsetSolution, evaluation: f64) {
        tracing::debug!(size = solution.size(), evaluation, "new best solution");
    }

    fn search_progress(&mut self, fraction: f64) {
        tracing::trace!(fraction, "search progress");
    }

    fn search_message(&mut self, message: &str) {
        tracing::info!("{message}");
    }
}
