//! LR round loop.

use super::config::LrConfig;
use crate::error::Result;
use crate::objective::{EvaluationContext, ObjectiveFunction};
use crate::search::{impl_search, SearchConfig, SearchCore, StopReason};
use crate::solution::SubsetSolution;

/// Adds the item whose addition gives the best evaluation, lowest index
/// first among ties. `None` if nothing is left to add.
fn greedy_add(
    objective: &ObjectiveFunction,
    solution: &mut SubsetSolution,
    context: &mut EvaluationContext,
) -> Result<Option<f64>> {
    let mut candidates = solution.remaining().to_vec();
    candidates.sort_unstable();
    let direction = objective.direction();
    let mut best: Option<(usize, f64)> = None;
    for i in candidates {
        solution.add(i);
        let value = objective.evaluate(&*solution, context)?;
        solution.remove(i);
        if best.is_none_or(|(_, b)| direction.is_better(value, b)) {
            best = Some((i, value));
        }
    }
    let Some((i, _)) = best else {
        return Ok(None);
    };
    solution.add(i);
    objective.evaluate(&*solution, context).map(Some)
}

/// Removes the item whose removal gives the best evaluation, lowest index
/// first among ties. `None` on an empty selection.
fn greedy_remove(
    objective: &ObjectiveFunction,
    solution: &mut SubsetSolution,
    context: &mut EvaluationContext,
) -> Result<Option<f64>> {
    let mut candidates = solution.selected().to_vec();
    candidates.sort_unstable();
    let direction = objective.direction();
    let mut best: Option<(usize, f64)> = None;
    for i in candidates {
        solution.remove(i);
        let value = objective.evaluate(&*solution, context)?;
        solution.add(i);
        if best.is_none_or(|(_, b)| direction.is_better(value, b)) {
            best = Some((i, value));
        }
    }
    let Some((i, _)) = best else {
        return Ok(None);
    };
    solution.remove(i);
    objective.evaluate(&*solution, context).map(Some)
}

/// Best pair by brute force, lowest indices first among ties.
fn best_pair(objective: &ObjectiveFunction, universe_size: usize) -> Option<[usize; 2]> {
    let direction = objective.direction();
    let mut best: Option<([usize; 2], f64)> = None;
    for i in 0..universe_size {
        for j in i + 1..universe_size {
            let value = objective.calculate(&[i, j][..]);
            if best.is_none_or(|(_, b)| direction.is_better(value, b)) {
                best = Some(([i, j], value));
            }
        }
    }
    best.map(|(pair, _)| pair)
}

/// Stepwise plus-l-take-away-r selection.
///
/// A step is one round. The search ends when the next round would leave
/// the size window or, once inside the window, when a round fails to
/// improve the best solution.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use corehunter::data::DistanceMatrix;
/// use corehunter::lr::{LrConfig, LrSearch};
/// use corehunter::objective::{Aggregation, ObjectiveFunction, PrecomputedDistance};
/// use corehunter::search::{Search, SearchConfig};
///
/// let matrix = DistanceMatrix::from_rows(&[
///     vec![0.0, 1.0, 1.0, 9.0],
///     vec![1.0, 0.0, 1.0, 1.0],
///     vec![1.0, 1.0, 0.0, 1.0],
///     vec![9.0, 1.0, 1.0, 0.0],
/// ])
/// .unwrap();
/// let objective = ObjectiveFunction::new(
///     Arc::new(PrecomputedDistance::new(Arc::new(matrix))),
///     Aggregation::Mean,
/// );
/// // backward elimination down to two items
/// let mut search = LrSearch::new(objective, 4, SearchConfig::new(2, 2), LrConfig::new(0, 1)).unwrap();
/// search.start().unwrap();
/// assert_eq!(search.best_solution().unwrap().selected_sorted(), vec![0, 3]);
/// ```
pub struct LrSearch {
    core: SearchCore,
    config: LrConfig,
}

impl LrSearch {
    pub fn new(
        objective: ObjectiveFunction,
        universe_size: usize,
        config: SearchConfig,
        lr: LrConfig,
    ) -> Result<Self> {
        lr.validate()?;
        let name = format!("LR({}, {}) search", lr.l, lr.r);
        Ok(Self {
            core: SearchCore::new(name, objective, universe_size, config, false)?,
            config: lr,
        })
    }

    #[tracing::instrument(level = "debug", name = "lr_search", skip(self), fields(l = self.config.l, r = self.config.r))]
    fn run(&mut self) -> Result<StopReason> {
        let objective = self.core.objective().clone();
        let n = self.core.universe_size();
        let bounds = self.core.bounds();
        let (l, r) = (self.config.l, self.config.r);
        let forward = self.config.is_forward();

        let mut current = if forward {
            SubsetSolution::empty(n)?
        } else {
            SubsetSolution::full(n)?
        };
        let mut context = objective.new_context();
        if self.config.exhaustive_first_pair && bounds.max >= 2 {
            if let Some([i, j]) = best_pair(&objective, n) {
                current.add(i);
                current.add(j);
            }
        }
        let mut evaluation = objective.evaluate(&current, &mut context)?;
        self.core.offer(&current, evaluation);

        loop {
            if let Some(reason) = self.core.limit_reached() {
                return Ok(reason);
            }
            let size = current.size();
            let full_round = if forward {
                size + l <= n && size + l - r <= bounds.max
            } else {
                size >= r && size + l >= bounds.min + r
            };

            if !full_round {
                // finish inside the window one item at a time
                while forward && current.size() < bounds.min {
                    match greedy_add(&objective, &mut current, &mut context)? {
                        Some(v) => evaluation = v,
                        None => break,
                    }
                }
                while !forward && current.size() > bounds.max {
                    match greedy_remove(&objective, &mut current, &mut context)? {
                        Some(v) => evaluation = v,
                        None => break,
                    }
                }
                self.core.step();
                self.core.offer(&current, evaluation);
                return Ok(StopReason::SizeLimit);
            }

            let (first, second) = if forward { (l, r) } else { (r, l) };
            for _ in 0..first {
                let step = if forward {
                    greedy_add(&objective, &mut current, &mut context)?
                } else {
                    greedy_remove(&objective, &mut current, &mut context)?
                };
                if let Some(v) = step {
                    evaluation = v;
                }
            }
            for _ in 0..second {
                let step = if forward {
                    greedy_remove(&objective, &mut current, &mut context)?
                } else {
                    greedy_add(&objective, &mut current, &mut context)?
                };
                if let Some(v) = step {
                    evaluation = v;
                }
            }
            self.core.step();
            tracing::debug!(size = current.size(), evaluation, "lr round");

            let improved = self.core.offer(&current, evaluation);
            if !improved && bounds.contains(current.size()) {
                return Ok(StopReason::LocalOptimum);
            }
        }
    }
}

impl_search!(LrSearch);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::{Search, SearchStatus};
    use crate::testing::{brute_force_best, random_objective, Recorder};

    /// Plain forward selection from scratch evaluations.
    fn forward_greedy(objective: &ObjectiveFunction, n: usize, k: usize) -> Vec<usize> {
        let mut sel: Vec<usize> = Vec::new();
        while sel.len() < k {
            let mut best: Option<(usize, f64)> = None;
            for i in (0..n).filter(|i| !sel.contains(i)) {
                let mut trial = sel.clone();
                trial.push(i);
                let v = objective.calculate(&trial);
                if best.is_none_or(|(_, b)| v > b) {
                    best = Some((i, v));
                }
            }
            sel.push(best.unwrap().0);
        }
        sel.sort_unstable();
        sel
    }

    #[test]
    fn test_forward_selection_matches_greedy() {
        let objective = random_objective(10, 3);
        let expected = forward_greedy(&objective, 10, 4);
        let mut search =
            LrSearch::new(objective, 10, SearchConfig::new(4, 4), LrConfig::new(1, 0)).unwrap();
        search.start().unwrap();
        assert_eq!(search.status(), SearchStatus::Completed);
        assert_eq!(search.best_solution().unwrap().selected_sorted(), expected);
    }

    #[test]
    fn test_exhaustive_first_pair_finds_best_pair() {
        let objective = random_objective(9, 6);
        let expected = brute_force_best(&objective, 9, 2, 2);
        let lr = LrConfig::new(1, 0).with_exhaustive_first_pair(true);
        let mut search = LrSearch::new(objective, 9, SearchConfig::new(2, 2), lr).unwrap();
        search.start().unwrap();
        assert!((search.best_solution_evaluation().unwrap() - expected).abs() < 1e-12);
        assert_eq!(search.stop_reason(), Some(StopReason::SizeLimit));
    }

    #[test]
    fn test_lr21_stays_in_window() {
        let objective = random_objective(14, 7);
        let recorder = Recorder::default();
        let mut search =
            LrSearch::new(objective.clone(), 14, SearchConfig::new(4, 7), LrConfig::default()).unwrap();
        search.add_listener(Box::new(recorder.clone()));
        search.start().unwrap();
        recorder.assert_lifecycle(true);
        let best = search.best_solution().unwrap();
        assert!((4..=7).contains(&best.size()));
        assert!((objective.calculate(best) - search.best_solution_evaluation().unwrap()).abs() < 1e-9);
        assert!(matches!(
            search.stop_reason(),
            Some(StopReason::LocalOptimum | StopReason::SizeLimit)
        ));
    }

    #[test]
    fn test_backward_elimination() {
        let objective = random_objective(8, 9);
        let mut search =
            LrSearch::new(objective.clone(), 8, SearchConfig::new(2, 3), LrConfig::new(0, 1)).unwrap();
        search.start().unwrap();
        let best = search.best_solution().unwrap();
        assert!((2..=3).contains(&best.size()));
        // one item per round from 8 down to 2, plus a closing step
        assert!(search.steps() <= 7);
    }

    #[test]
    fn test_odd_window_is_reached() {
        // net growth of two per round jumps over a single-size window
        let mut search = LrSearch::new(
            random_objective(10, 1),
            10,
            SearchConfig::new(3, 3),
            LrConfig::new(3, 1),
        )
        .unwrap();
        search.start().unwrap();
        assert_eq!(search.best_solution().unwrap().size(), 3);
    }

    #[test]
    fn test_rejects_equal_l_and_r() {
        assert!(LrSearch::new(random_objective(5, 1), 5, SearchConfig::new(2, 3), LrConfig::new(1, 1)).is_err());
    }
}
