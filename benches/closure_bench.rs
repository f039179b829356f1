//! Benchmarks for the Newton closure.
//!
//! Run with: `cargo bench --bench closure_bench`
//!
//! Measures a batch closure over a line-source field, cold and warm started,
//! at several moment degrees.

use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use mn_rs::mesh::Mesh1D;
use mn_rs::{
    ClosureProvider, InitialCondition, MomentBasis, NewtonClosure, NewtonClosureConfig,
    NewtonConfig, QuadratureRule, solve_multiplier,
};

/// Line-source moments on `n_cells` cells.
fn setup_problem(degree: usize, n_cells: usize) -> (NewtonClosure, Vec<f64>) {
    let quadrature = Arc::new(QuadratureRule::gauss_legendre_1d(50).unwrap());
    let basis = Arc::new(MomentBasis::monomial(&quadrature, degree).unwrap());
    let mesh = Mesh1D::uniform_periodic(-1.5, 1.5, n_cells).unwrap();
    let field = InitialCondition::LineSource
        .build(&mesh, &basis, &quadrature)
        .unwrap();
    let closure =
        NewtonClosure::new(quadrature, basis, NewtonClosureConfig::default()).unwrap();
    (closure, field.moments)
}

/// Single-cell dual solve.
fn bench_single_cell(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_cell");
    let quadrature = QuadratureRule::gauss_legendre_1d(50).unwrap();

    for degree in [1, 2, 3, 4] {
        let basis = MomentBasis::monomial(&quadrature, degree).unwrap();
        let u = InitialCondition::Periodic.shape(&basis, &quadrature);
        let zeros = vec![0.0; basis.size()];
        let config = NewtonConfig::default();

        group.bench_with_input(BenchmarkId::new("M", degree), &degree, |b, _| {
            b.iter(|| {
                solve_multiplier(
                    black_box(&u),
                    black_box(&basis),
                    black_box(&quadrature),
                    black_box(0.0),
                    black_box(&zeros),
                    &config,
                )
            });
        });
    }

    group.finish();
}

/// Batch closure over a whole field, with and without warm start.
fn bench_batch_closure(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch_closure");
    group.sample_size(30);

    for degree in [2, 3] {
        let (closure, moments) = setup_problem(degree, 150);
        let warm = closure.compute_closure(&moments, None).unwrap().alpha;

        group.bench_with_input(BenchmarkId::new("cold", degree), &degree, |b, _| {
            b.iter(|| closure.compute_closure(black_box(&moments), None));
        });

        group.bench_with_input(BenchmarkId::new("warm", degree), &degree, |b, _| {
            b.iter(|| closure.compute_closure(black_box(&moments), Some(black_box(&warm))));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_single_cell, bench_batch_closure);
criterion_main!(benches);
