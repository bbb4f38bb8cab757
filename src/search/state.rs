//! State every strategy embeds: lifecycle, best solution, limits and
//! listener fan-out.

use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::Rng;

use super::config::SearchConfig;
use super::listener::SearchListener;
use super::{SearchStatus, StopReason};
use crate::error::{CoreError, Result};
use crate::neighbourhood::SizeBounds;
use crate::objective::{Direction, ObjectiveFunction};
use crate::rng::create_rng;
use crate::solution::SubsetSolution;

// smallest progress change worth a listener notification
const PROGRESS_RESOLUTION: f64 = 0.01;

pub(crate) struct SearchCore {
    name: String,
    objective: ObjectiveFunction,
    config: SearchConfig,
    universe_size: usize,
    status: SearchStatus,
    listeners: Vec<Box<dyn SearchListener + Send>>,
    best: Option<SubsetSolution>,
    best_evaluation: Option<f64>,
    steps: u64,
    started_at: Option<Instant>,
    frozen_elapsed: Option<Duration>,
    // clocks of the last improvement of at least `min_progression`
    improved_at: Option<Instant>,
    improved_step: u64,
    progression_reference: Option<f64>,
    reported_progress: f64,
    stop_reason: Option<StopReason>,
}

impl SearchCore {
    /// Validates `config` against the universe and the objective.
    ///
    /// `bounded` strategies could run forever and must be given at least
    /// one limit.
    pub(crate) fn new(
        name: impl Into<String>,
        objective: ObjectiveFunction,
        universe_size: usize,
        config: SearchConfig,
        bounded: bool,
    ) -> Result<Self> {
        if bounded {
            config.validate_bounded(universe_size)?;
        } else {
            config.validate(universe_size)?;
        }
        if objective.size() != universe_size {
            return Err(CoreError::config(format!(
                "objective '{}' covers {} items but the universe has {universe_size}",
                objective.name(),
                objective.size()
            )));
        }
        Ok(Self {
            name: name.into(),
            objective,
            config,
            universe_size,
            status: SearchStatus::Created,
            listeners: Vec::new(),
            best: None,
            best_evaluation: None,
            steps: 0,
            started_at: None,
            frozen_elapsed: None,
            improved_at: None,
            improved_step: 0,
            progression_reference: None,
            reported_progress: 0.0,
            stop_reason: None,
        })
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn objective(&self) -> &ObjectiveFunction {
        &self.objective
    }

    pub(crate) fn bounds(&self) -> SizeBounds {
        self.config.bounds()
    }

    pub(crate) fn direction(&self) -> Direction {
        self.objective.direction()
    }

    pub(crate) fn universe_size(&self) -> usize {
        self.universe_size
    }

    pub(crate) fn status(&self) -> SearchStatus {
        self.status
    }

    pub(crate) fn best_solution(&self) -> Option<&SubsetSolution> {
        self.best.as_ref()
    }

    pub(crate) fn best_evaluation(&self) -> Option<f64> {
        self.best_evaluation
    }

    pub(crate) fn steps(&self) -> u64 {
        self.steps
    }

    pub(crate) fn stop_reason(&self) -> Option<StopReason> {
        self.stop_reason
    }

    pub(crate) fn elapsed(&self) -> Duration {
        match (self.frozen_elapsed, self.started_at) {
            (Some(frozen), _) => frozen,
            (None, Some(started)) => started.elapsed(),
            (None, None) => Duration::ZERO,
        }
    }

    pub(crate) fn add_listener(&mut self, listener: Box<dyn SearchListener + Send>) {
        self.listeners.push(listener);
    }

    /// Master random generator of a run.
    pub(crate) fn rng(&self) -> StdRng {
        create_rng(self.config.seed)
    }

    /// Checks a caller-supplied initial solution against the universe and
    /// the size window.
    pub(crate) fn check_initial(&self, solution: &SubsetSolution) -> Result<()> {
        if solution.universe_size() != self.universe_size {
            return Err(CoreError::config(format!(
                "initial solution spans {} items but the universe has {}",
                solution.universe_size(),
                self.universe_size
            )));
        }
        solution.validate_bounds(self.config.min_size, self.config.max_size)
    }

    /// `provided`, or a random subset whose size is uniform in the window.
    pub(crate) fn initial_solution<R: Rng + ?Sized>(
        &self,
        provided: Option<&SubsetSolution>,
        rng: &mut R,
    ) -> Result<SubsetSolution> {
        match provided {
            Some(solution) => {
                self.check_initial(solution)?;
                Ok(solution.clone())
            }
            None => {
                let size = rng.random_range(self.config.min_size..=self.config.max_size);
                SubsetSolution::random(self.universe_size, size, rng)
            }
        }
    }

    /// `Created -> Running`.
    pub(crate) fn begin(&mut self) -> Result<()> {
        if self.status != SearchStatus::Created {
            return Err(CoreError::InvalidState {
                expected: SearchStatus::Created,
                actual: self.status,
            });
        }
        let now = Instant::now();
        self.status = SearchStatus::Running;
        self.started_at = Some(now);
        self.improved_at = Some(now);
        tracing::info!(search = %self.name, objective = self.objective.name(), "starting search");
        for listener in &mut self.listeners {
            listener.search_started(&self.name);
        }
        Ok(())
    }

    /// `Running -> Completed` on `Ok`, `Running -> Failed` on `Err`.
    pub(crate) fn finish(&mut self, outcome: Result<StopReason>) -> Result<()> {
        self.frozen_elapsed = Some(self.elapsed());
        match outcome {
            Ok(reason) => {
                self.status = SearchStatus::Completed;
                self.stop_reason = Some(reason);
                if reason == StopReason::Stagnation {
                    tracing::warn!(search = %self.name, steps = self.steps, "stopping on stagnation");
                }
                tracing::info!(
                    search = %self.name,
                    %reason,
                    steps = self.steps,
                    best = self.best_evaluation,
                    elapsed_ms = self.elapsed().as_millis() as u64,
                    "search completed"
                );
                self.notify_progress(1.0);
                for listener in &mut self.listeners {
                    listener.search_completed(self.best.as_ref(), self.best_evaluation);
                }
                Ok(())
            }
            Err(error) => {
                self.status = SearchStatus::Failed;
                tracing::error!(search = %self.name, %error, "search failed");
                for listener in &mut self.listeners {
                    listener.search_failed(&error);
                }
                Err(error)
            }
        }
    }

    /// Counts one step and reports budget progress.
    pub(crate) fn step(&mut self) {
        self.steps += 1;
        if let Some(fraction) = self.budget_fraction() {
            self.report_progress(fraction);
        }
    }

    /// Records `solution` if it lies in the size window and strictly
    /// improves the best evaluation. Returns whether it did.
    pub(crate) fn offer(&mut self, solution: &SubsetSolution, evaluation: f64) -> bool {
        if !self.bounds().contains(solution.size()) || evaluation.is_nan() {
            return false;
        }
        let direction = self.direction();
        if self
            .best_evaluation
            .is_some_and(|best| !direction.is_better(evaluation, best))
        {
            return false;
        }
        let progression = self
            .progression_reference
            .map_or(f64::INFINITY, |reference| -direction.worsening(reference, evaluation));
        if progression >= self.config.min_progression {
            self.improved_at = Some(Instant::now());
            self.improved_step = self.steps;
            self.progression_reference = Some(evaluation);
        }
        match &mut self.best {
            Some(best) => best.clone_from(solution),
            None => self.best = Some(solution.clone()),
        }
        self.best_evaluation = Some(evaluation);
        for listener in &mut self.listeners {
            listener.new_best_solution(solution, evaluation);
        }
        true
    }

    /// First limit the run has hit, if any.
    pub(crate) fn limit_reached(&self) -> Option<StopReason> {
        let config = &self.config;
        if config.runtime_limit.is_some_and(|limit| self.elapsed() >= limit) {
            return Some(StopReason::RuntimeLimit);
        }
        if config.max_steps.is_some_and(|limit| self.steps >= limit) {
            return Some(StopReason::StepLimit);
        }
        let stalled_for = self.improved_at.map_or(Duration::ZERO, |at| at.elapsed());
        if config
            .max_time_without_improvement
            .is_some_and(|limit| stalled_for >= limit)
        {
            return Some(StopReason::Stagnation);
        }
        if config
            .max_steps_without_improvement
            .is_some_and(|limit| self.steps - self.improved_step >= limit)
        {
            return Some(StopReason::Stagnation);
        }
        None
    }

    /// Fraction of the runtime or step budget used, the larger of the two.
    fn budget_fraction(&self) -> Option<f64> {
        let by_time = self
            .config
            .runtime_limit
            .map(|limit| self.elapsed().as_secs_f64() / limit.as_secs_f64());
        let by_steps = self
            .config
            .max_steps
            .map(|limit| self.steps as f64 / limit.max(1) as f64);
        match (by_time, by_steps) {
            (Some(t), Some(s)) => Some(t.max(s)),
            (t, s) => t.or(s),
        }
    }

    /// Notifies listeners when progress moved by at least one percent.
    pub(crate) fn report_progress(&mut self, fraction: f64) {
        let fraction = fraction.clamp(0.0, 1.0);
        if fraction - self.reported_progress >= PROGRESS_RESOLUTION {
            self.notify_progress(fraction);
        }
    }

    fn notify_progress(&mut self, fraction: f64) {
        self.reported_progress = fraction;
        for listener in &mut self.listeners {
            listener.search_progress(fraction);
        }
    }

    pub(crate) fn message(&mut self, message: &str) {
        tracing::debug!(search = %self.name, "{message}");
        for listener in &mut self.listeners {
            listener.search_message(message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{random_objective, Event, Recorder};

    fn core(config: SearchConfig) -> SearchCore {
        SearchCore::new("test", random_objective(8, 3), 8, config, false).unwrap()
    }

    fn solution(items: &[usize]) -> SubsetSolution {
        SubsetSolution::new(8, items.iter().copied()).unwrap()
    }

    #[test]
    fn test_rejects_mismatched_universe() {
        let err = SearchCore::new("x", random_objective(8, 3), 9, SearchConfig::new(1, 2), false);
        assert!(matches!(err, Err(CoreError::Config(_))));
    }

    #[test]
    fn test_bounded_requires_limit() {
        let err = SearchCore::new("x", random_objective(8, 3), 8, SearchConfig::new(1, 2), true);
        assert!(err.is_err());
    }

    #[test]
    fn test_lifecycle_is_one_shot() {
        let mut c = core(SearchConfig::new(1, 3));
        assert_eq!(c.status(), SearchStatus::Created);
        c.begin().unwrap();
        assert_eq!(c.status(), SearchStatus::Running);
        c.finish(Ok(StopReason::Exhausted)).unwrap();
        assert_eq!(c.status(), SearchStatus::Completed);
        assert_eq!(c.stop_reason(), Some(StopReason::Exhausted));
        assert_eq!(
            c.begin(),
            Err(CoreError::InvalidState {
                expected: SearchStatus::Created,
                actual: SearchStatus::Completed
            })
        );
    }

    #[test]
    fn test_failure_notifies() {
        let recorder = Recorder::default();
        let mut c = core(SearchConfig::new(1, 3));
        c.add_listener(Box::new(recorder.clone()));
        c.begin().unwrap();
        let err = c.finish(Err(CoreError::internal("boom")));
        assert!(err.is_err());
        assert_eq!(c.status(), SearchStatus::Failed);
        assert_eq!(recorder.events(), vec![Event::Started, Event::Failed]);
    }

    #[test]
    fn test_offer_keeps_strict_improvements_in_window() {
        let recorder = Recorder::default();
        let mut c = core(SearchConfig::new(2, 3));
        c.add_listener(Box::new(recorder.clone()));
        c.begin().unwrap();

        assert!(!c.offer(&solution(&[0]), 10.0), "below the window");
        assert!(c.offer(&solution(&[0, 1]), 1.0));
        assert!(!c.offer(&solution(&[0, 2]), 1.0), "ties do not count");
        assert!(!c.offer(&solution(&[0, 3]), 0.5));
        assert!(c.offer(&solution(&[0, 1, 4]), 2.0));
        assert_eq!(c.best_evaluation(), Some(2.0));
        assert_eq!(c.best_solution().unwrap().selected_sorted(), vec![0, 1, 4]);

        c.finish(Ok(StopReason::StepLimit)).unwrap();
        recorder.assert_lifecycle(true);
    }

    #[test]
    fn test_step_limit_and_progress() {
        let recorder = Recorder::default();
        let mut c = core(SearchConfig::new(1, 3).with_max_steps(4));
        c.add_listener(Box::new(recorder.clone()));
        c.begin().unwrap();
        for _ in 0..3 {
            c.step();
            assert_eq!(c.limit_reached(), None);
        }
        c.step();
        assert_eq!(c.limit_reached(), Some(StopReason::StepLimit));
        let progress: Vec<f64> = recorder
            .events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Progress(p) => Some(p),
                _ => None,
            })
            .collect();
        assert_eq!(progress, vec![0.25, 0.5, 0.75, 1.0]);
    }

    #[test]
    fn test_stagnation_respects_min_progression() {
        let mut c = core(
            SearchConfig::new(1, 3)
                .with_max_steps_without_improvement(2)
                .with_min_progression(0.5),
        );
        c.begin().unwrap();
        c.offer(&solution(&[0]), 1.0);
        c.step();
        // too small to reset the stagnation clock
        assert!(c.offer(&solution(&[1]), 1.2));
        c.step();
        assert_eq!(c.limit_reached(), Some(StopReason::Stagnation));
    }

    #[test]
    fn test_stagnation_reset_by_sufficient_progress() {
        let mut c = core(
            SearchConfig::new(1, 3)
                .with_max_steps_without_improvement(2)
                .with_min_progression(0.5),
        );
        c.begin().unwrap();
        c.offer(&solution(&[0]), 1.0);
        c.step();
        assert!(c.offer(&solution(&[1]), 1.6));
        c.step();
        assert_eq!(c.limit_reached(), None);
    }

    #[test]
    fn test_initial_solution() {
        let c = core(SearchConfig::new(2, 4));
        let mut rng = create_rng(Some(5));
        for _ in 0..20 {
            let s = c.initial_solution(None, &mut rng).unwrap();
            assert!((2..=4).contains(&s.size()));
        }
        assert!(c.initial_solution(Some(&solution(&[1])), &mut rng).is_err());
        let wrong = SubsetSolution::new(9, [1, 2]).unwrap();
        assert!(c.check_initial(&wrong).is_err());
        let ok = solution(&[1, 2, 3]);
        assert_eq!(c.initial_solution(Some(&ok), &mut rng).unwrap(), ok);
    }
}
