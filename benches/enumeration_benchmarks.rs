//! Benchmarks for the enumeration engines

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use lattice_enum::{
    utils::*, EnumParams, Enumeration, EnumerationConfig, FastEvaluator, GramSchmidt, GsoProvider,
    ParallelEnumerator, SequentialEnumerator,
};

fn bench_sequential_svp(c: &mut Criterion) {
    let mut group = c.benchmark_group("Sequential SVP");

    for size in [10, 20, 30, 40].iter() {
        group.bench_with_input(BenchmarkId::new("reduced", size), size, |b, &size| {
            let gso = random_reduced_gso(size, Some(42)).unwrap();
            let radius = gso.r(0) * 1.01;
            let params = EnumParams::new();

            b.iter(|| {
                let mut engine = SequentialEnumerator::new(&gso);
                let mut evaluator = FastEvaluator::best(1);
                let mut bound = radius;
                engine
                    .enumerate(&mut evaluator, 0, None, &mut bound, 0, black_box(&params))
                    .unwrap();
                black_box((bound, engine.get_nodes()))
            });
        });
    }

    group.finish();
}

fn bench_pruned_svp(c: &mut Criterion) {
    let mut group = c.benchmark_group("Pruned SVP");

    for size in [30, 40, 50].iter() {
        group.bench_with_input(BenchmarkId::new("linear", size), size, |b, &size| {
            let gso = random_reduced_gso(size, Some(7)).unwrap();
            let radius = gso.r(0) * 1.01;
            let params = EnumParams::new().with_pruning(linear_pruning(size, 0.3));

            b.iter(|| {
                let mut engine = SequentialEnumerator::new(&gso);
                let mut evaluator = FastEvaluator::best(1);
                let mut bound = radius;
                engine
                    .enumerate(&mut evaluator, 0, None, &mut bound, 0, black_box(&params))
                    .unwrap();
                black_box(bound)
            });
        });
    }

    group.finish();
}

fn bench_parallel_threads(c: &mut Criterion) {
    let mut group = c.benchmark_group("Parallel SVP");
    let size = 36;
    let gso = random_reduced_gso(size, Some(99)).unwrap();
    let radius = gso.r(0) * 1.01;
    let params = EnumParams::new();

    for threads in [1, 2, 4, 8].iter() {
        group.bench_with_input(BenchmarkId::new("threads", threads), threads, |b, &threads| {
            b.iter(|| {
                let mut engine = ParallelEnumerator::new(&gso).with_threads(threads);
                let mut evaluator = FastEvaluator::best(1);
                let mut bound = radius;
                engine
                    .enumerate(&mut evaluator, 0, None, &mut bound, 0, None, black_box(&params))
                    .unwrap();
                black_box(engine.get_nodes())
            });
        });
    }

    group.finish();
}

fn bench_split_levels(c: &mut Criterion) {
    let mut group = c.benchmark_group("Split Level");
    let basis = identity_like_basis(30, Some(30));
    let gso = GramSchmidt::from_basis(&basis).unwrap();
    let params = EnumParams::new();

    for split in [2, 4, 6, 8].iter() {
        group.bench_with_input(BenchmarkId::new("split", split), split, |b, &split| {
            b.iter(|| {
                let mut engine = ParallelEnumerator::new(&gso).with_threads(4);
                let mut evaluator = FastEvaluator::best(1);
                let mut bound = 2.0;
                engine
                    .enumerate(&mut evaluator, 0, None, &mut bound, 0, Some(split), black_box(&params))
                    .unwrap();
                black_box(bound)
            });
        });
    }

    group.finish();
}

fn bench_facade_cvp(c: &mut Criterion) {
    let mut group = c.benchmark_group("Facade CVP");

    for size in [16, 24, 32].iter() {
        group.bench_with_input(BenchmarkId::new("CVP", size), size, |b, &size| {
            let gso = random_reduced_gso(size, Some(3)).unwrap();
            let target: Vec<f64> = (0..size).map(|i| (i % 4) as f64 * 0.25).collect();
            let params = EnumParams::new().with_target(target);
            let radius = gaussian_heuristic(&gso, 0, size).unwrap() * 1.2;

            b.iter(|| {
                let mut enumeration = Enumeration::new(&gso).with_config(EnumerationConfig::default());
                let mut evaluator = FastEvaluator::best(1);
                let mut bound = radius;
                black_box(
                    enumeration
                        .enumerate(&mut evaluator, 0, None, &mut bound, 0, black_box(&params))
                        .unwrap(),
                )
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_sequential_svp,
    bench_pruned_svp,
    bench_parallel_threads,
    bench_split_levels,
    bench_facade_cvp
);
criterion_main!(benches);
