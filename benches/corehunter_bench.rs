//! Criterion benchmarks for corehunter evaluation and searches.
//!
//! Uses random two-allele frequency data so timings reflect evaluation
//! and search overhead only.

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use corehunter::data::FrequencyData;
use corehunter::objective::{Aggregation, ModifiedRogers, ObjectiveFunction};
use corehunter::remc::{RemcConfig, RemcSearch};
use corehunter::search::{Search, SearchConfig};
use corehunter::solution::SubsetSolution;
use corehunter::tabu::{TabuConfig, TabuSearch};

fn objective(accessions: usize, loci: usize) -> ObjectiveFunction {
    let mut rng = StdRng::seed_from_u64(42);
    let rows = (0..accessions)
        .map(|_| {
            (0..loci)
                .map(|_| {
                    let p: f64 = rng.random_range(0.0..1.0);
                    Some(vec![p, 1.0 - p])
                })
                .collect()
        })
        .collect();
    let names = (0..accessions).map(|i| format!("acc{i}")).collect();
    let data = FrequencyData::new(names, rows).expect("valid data");
    ObjectiveFunction::new(Arc::new(ModifiedRogers::new(Arc::new(data))), Aggregation::Mean)
}

// ===========================================================================
// Evaluation: scratch vs incremental
// ===========================================================================

fn bench_swap_evaluation(c: &mut Criterion) {
    let mut group = c.benchmark_group("swap_evaluation");
    group.sample_size(20);

    for &k in &[10usize, 40] {
        let n = 200;
        let obj = objective(n, 20);
        let base = SubsetSolution::new(n, 0..k).expect("valid subset");

        group.bench_with_input(BenchmarkId::new("scratch", k), &k, |b, _| {
            let mut s = base.clone();
            let mut next = k;
            b.iter(|| {
                s.swap(next, next % k);
                let v = obj.calculate(&s);
                s.swap(next % k, next);
                next = if next + 1 < n { next + 1 } else { k };
                black_box(v)
            })
        });

        group.bench_with_input(BenchmarkId::new("incremental", k), &k, |b, _| {
            let mut s = base.clone();
            let mut context = obj.new_context();
            obj.evaluate(&s, &mut context).expect("evaluates");
            let mut next = k;
            b.iter(|| {
                s.swap(next, next % k);
                let v = obj.evaluate(&s, &mut context).expect("evaluates");
                s.swap(next % k, next);
                next = if next + 1 < n { next + 1 } else { k };
                black_box(v)
            })
        });
    }
    group.finish();
}

// ===========================================================================
// Searches
// ===========================================================================

fn bench_tabu(c: &mut Criterion) {
    let mut group = c.benchmark_group("tabu");
    group.sample_size(10);

    for &n in &[50usize, 150] {
        let obj = objective(n, 20);
        group.bench_with_input(BenchmarkId::from_parameter(n), &obj, |b, obj| {
            b.iter(|| {
                let config = SearchConfig::new(n / 10, n / 10).with_max_steps(50).with_seed(42);
                let mut search =
                    TabuSearch::new(obj.clone(), n, config, TabuConfig::default()).expect("valid config");
                search.start().expect("search completes");
                black_box(search.best_solution_evaluation())
            })
        });
    }
    group.finish();
}

fn bench_remc(c: &mut Criterion) {
    let mut group = c.benchmark_group("remc");
    group.sample_size(10);

    for &replicas in &[4usize, 10] {
        let n = 100;
        let obj = objective(n, 20);
        group.bench_with_input(BenchmarkId::from_parameter(replicas), &obj, |b, obj| {
            b.iter(|| {
                let config = SearchConfig::new(10, 10).with_max_steps(20).with_seed(42);
                let remc = RemcConfig::default().with_replicas(replicas);
                let mut search = RemcSearch::new(obj.clone(), n, config, remc).expect("valid config");
                search.start().expect("search completes");
                black_box(search.best_solution_evaluation())
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_swap_evaluation, bench_tabu, bench_remc);
criterion_main!(benches);
