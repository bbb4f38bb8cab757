//! Shared fixtures for unit tests.

use std::sync::Arc;

use rand::Rng;

use crate::data::FrequencyData;
use crate::objective::{Aggregation, ModifiedRogers, ObjectiveFunction};
use crate::rng::create_rng;
use crate::search::SearchListener;
use crate::solution::SubsetSolution;

/// Four accessions over two three-allele loci; A3 misses the first locus.
pub(crate) fn toy_data() -> Arc<FrequencyData> {
    Arc::new(
        FrequencyData::new(
            vec!["A1".into(), "A2".into(), "A3".into(), "A4".into()],
            vec![
                vec![Some(vec![0.0, 0.0, 1.0]), Some(vec![0.1, 0.4, 0.5])],
                vec![Some(vec![0.0, 0.3, 0.7]), Some(vec![0.3, 0.7, 0.0])],
                vec![None, Some(vec![0.0, 0.5, 0.5])],
                vec![Some(vec![0.0, 0.4, 0.6]), Some(vec![0.3, 0.0, 0.7])],
            ],
        )
        .unwrap(),
    )
}

/// Random two-allele data with an occasional missing locus.
pub(crate) fn random_data(accessions: usize, loci: usize, seed: u64) -> Arc<FrequencyData> {
    let mut rng = create_rng(Some(seed));
    let rows = (0..accessions)
        .map(|_| {
            (0..loci)
                .map(|_| {
                    if rng.random_range(0.0..1.0) < 0.05 {
                        None
                    } else {
                        let p: f64 = rng.random_range(0.0..1.0);
                        Some(vec![p, 1.0 - p])
                    }
                })
                .collect()
        })
        .collect();
    let names = (0..accessions).map(|i| format!("acc{i}")).collect();
    Arc::new(FrequencyData::new(names, rows).unwrap())
}

/// Mean Modified Rogers objective over [`random_data`].
pub(crate) fn random_objective(accessions: usize, seed: u64) -> ObjectiveFunction {
    ObjectiveFunction::new(
        Arc::new(ModifiedRogers::new(random_data(accessions, 12, seed))),
        Aggregation::Mean,
    )
}

/// Best evaluation over every subset with size in `[min, max]`, by plain
/// bitmask enumeration.
pub(crate) fn brute_force_best(objective: &ObjectiveFunction, n: usize, min: usize, max: usize) -> f64 {
    let mut best = objective.direction().worst();
    for mask in 1u32..(1 << n) {
        let size = mask.count_ones() as usize;
        if size < min || size > max {
            continue;
        }
        let sel: Vec<usize> = (0..n).filter(|i| mask & (1 << i) != 0).collect();
        let v = objective.calculate(&sel);
        if objective.direction().is_better(v, best) {
            best = v;
        }
    }
    best
}

/// Listener event, recorded for lifecycle assertions.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Event {
    Started,
    Completed,
    Failed,
    NewBest(f64),
    Progress(f64),
    Message(String),
}

/// Listener that records every event into a shared log.
#[derive(Debug, Clone, Default)]
pub(crate) struct Recorder {
    pub(crate) events: Arc<parking_lot::Mutex<Vec<Event>>>,
}

impl Recorder {
    pub(crate) fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    /// Asserts one start first, one terminal event last, and monotone bests.
    pub(crate) fn assert_lifecycle(&self, maximizing: bool) {
        let events = self.events();
        assert_eq!(events.first(), Some(&Event::Started), "{events:?}");
        assert!(
            matches!(events.last(), Some(Event::Completed) | Some(Event::Failed)),
            "{events:?}"
        );
        let starts = events.iter().filter(|e| **e == Event::Started).count();
        let ends = events
            .iter()
            .filter(|e| matches!(e, Event::Completed | Event::Failed))
            .count();
        assert_eq!((starts, ends), (1, 1));
        let bests: Vec<f64> = events
            .iter()
            .filter_map(|e| match e {
                Event::NewBest(v) => Some(*v),
                _ => None,
            })
            .collect();
        for w in bests.windows(2) {
            if maximizing {
                assert!(w[1] > w[0], "{bests:?}");
            } else {
                assert!(w[1] < w[0], "{bests:?}");
            }
        }
        for e in &events {
            if let Event::Progress(p) = e {
                assert!((0.0..=1.0).contains(p), "progress {p}");
            }
        }
    }
}

impl SearchListener for Recorder {
    fn search_started(&mut self, _name: &str) {
        self.events.lock().push(Event::Started);
    }

    fn search_completed(&mut self, _best: Option<&SubsetSolution>, _evaluation: Option<f64>) {
        self.events.lock().push(Event::Completed);
    }

    fn search_failed(&mut self, _error: &crate::error::CoreError) {
        self.events.lock().push(Event::Failed);
    }

    fn new_best_solution(&mut self, _solution: &SubsetSolution, evaluation: f64) {
        self.events.lock().push(Event::NewBest(evaluation));
    }

    fn search_progress(&mut self, fraction: f64) {
        self.events.lock().push(Event::Progress(fraction));
    }

    fn search_message(&mut self, message: &str) {
        self.events.lock().push(Event::Message(message.to_string()));
    }
}
