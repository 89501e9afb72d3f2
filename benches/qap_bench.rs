//! Criterion benchmarks for the QAP engine.
//!
//! Uses generated Taillard-style instances to measure the numerical
//! kernels (Sinkhorn projection, FFT preconditioning, discretization) and
//! short end-to-end solves for representative methods of both families.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::Rng;
use u_qap::matrix::SquareMatrix;
use u_qap::novel::fft_laplace::LaplacePreconditioner;
use u_qap::pipeline::{solve, SolveConfig};
use u_qap::problem::generate;
use u_qap::projection::{discretize, ProjectionConfig};
use u_qap::random::create_rng;
use u_qap::registry::MethodRegistry;

fn random_positive(n: usize, seed: u64) -> SquareMatrix {
    let mut rng = create_rng(seed);
    let data = (0..n * n).map(|_| rng.random_range(0.01..1.0)).collect();
    SquareMatrix::from_vec(n, data).unwrap()
}

fn bench_sinkhorn(c: &mut Criterion) {
    let mut group = c.benchmark_group("sinkhorn");
    group.sample_size(20);

    let projector = ProjectionConfig::default().projector();
    for &n in &[16, 64, 128] {
        let m = random_positive(n, 1);
        group.bench_with_input(BenchmarkId::from_parameter(n), &m, |b, m| {
            b.iter(|| {
                let mut x = m.clone();
                black_box(projector.project(black_box(&mut x)).unwrap())
            })
        });
    }
    group.finish();
}

fn bench_laplace_preconditioner(c: &mut Criterion) {
    let mut group = c.benchmark_group("laplace_preconditioner");
    group.sample_size(20);

    for &n in &[16, 64, 128] {
        let mut pre = LaplacePreconditioner::new(n, 1.0);
        let m = random_positive(n, 2);
        group.bench_with_input(BenchmarkId::from_parameter(n), &m, |b, m| {
            b.iter(|| {
                let mut x = m.clone();
                pre.apply(black_box(&mut x));
                black_box(x)
            })
        });
    }
    group.finish();
}

fn bench_discretize(c: &mut Criterion) {
    let mut group = c.benchmark_group("discretize");
    group.sample_size(10);

    let config = ProjectionConfig::default();
    for &n in &[16, 64, 128] {
        let m = random_positive(n, 3);
        group.bench_with_input(BenchmarkId::from_parameter(n), &m, |b, m| {
            b.iter(|| black_box(discretize(black_box(m), &config)))
        });
    }
    group.finish();
}

fn bench_solve(c: &mut Criterion) {
    let mut group = c.benchmark_group("solve_n20");
    group.sample_size(10);

    let registry = MethodRegistry::with_builtin();
    let problem = generate::random_uniform(20, 100, 42).unwrap();
    let config = SolveConfig::default().with_max_iterations(100).with_seed(42);
    for method in ["fft_laplace", "entropic_mirror", "simulated_annealing", "tabu_search"] {
        group.bench_with_input(BenchmarkId::from_parameter(method), &method, |b, &m| {
            b.iter(|| black_box(solve(&registry, black_box(&problem), m, &config).unwrap()))
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_sinkhorn,
    bench_laplace_preconditioner,
    bench_discretize,
    bench_solve
);
criterion_main!(benches);
