//! Line-source scenario for the 1D M_N transport solver.
//!
//! A narrow Gaussian pulse in a periodic slab with isotropic scattering,
//! closed with the Newton dual solver.

use std::sync::Arc;

use mn_rs::analysis::{FieldDiagnostics, total_density};
use mn_rs::{
    InitialCondition, MNSolver1D, MomentBasis, NewtonClosure, NewtonClosureConfig, QuadratureRule,
    TransportConfig,
};

fn create_solver(config: TransportConfig, degree: usize) -> (MNSolver1D, NewtonClosure) {
    let quadrature = Arc::new(QuadratureRule::gauss_legendre_1d(50).unwrap());
    let basis = Arc::new(MomentBasis::monomial(&quadrature, degree).unwrap());
    let solver = MNSolver1D::new(config, quadrature.clone(), basis.clone()).unwrap();
    let closure = NewtonClosure::new(quadrature, basis, NewtonClosureConfig::default()).unwrap();
    (solver, closure)
}

#[test]
fn test_single_step_stays_positive() {
    let (solver, closure) = create_solver(TransportConfig::default(), 2);
    assert_eq!(solver.mesh().n_cells, 150);
    assert!((solver.dt() - 0.006).abs() < 1e-15);

    let mut field = solver.initial_field(InitialCondition::LineSource).unwrap();
    let report = solver.step(&mut field, &closure, 0).unwrap();

    assert!(report.success());
    assert!(report.failed_cells.is_empty());
    assert!(report.max_iterations <= 200);
    for (i, rho) in field.density().iter().enumerate() {
        assert!(*rho >= 0.0, "negative density {rho} in cell {i}");
    }
    assert_eq!(field.entropy.len(), 150);
    assert!(field.alpha.iter().all(|a| a.is_finite()));
}

#[test]
fn test_mass_is_conserved_with_scattering() {
    let config = TransportConfig::default().with_max_iter(10);
    let (solver, closure) = create_solver(config, 2);
    let mut field = solver.initial_field(InitialCondition::LineSource).unwrap();
    let mass = total_density(&field, solver.mesh());

    let mut step = 0;
    while solver.should_continue(step) {
        solver.step(&mut field, &closure, step).unwrap();
        step += 1;
    }
    assert_eq!(step, 10);

    let after = total_density(&field, solver.mesh());
    assert!((after - mass).abs() < 1e-10 * mass, "mass {mass} -> {after}");
}

#[test]
fn test_pulse_spreads_symmetrically() {
    let config = TransportConfig::default().with_max_iter(5);
    let (solver, closure) = create_solver(config, 2);
    let mut field = solver.initial_field(InitialCondition::LineSource).unwrap();
    let peak_before = field.density().iter().cloned().fold(0.0, f64::max);

    for step in 0..5 {
        solver.step(&mut field, &closure, step).unwrap();
    }

    let rho = field.density();
    let peak_after = rho.iter().cloned().fold(0.0, f64::max);
    assert!(peak_after < peak_before);

    // cell centers are symmetric about x = 0, so the density profile is too
    let n = rho.len();
    for i in 0..n / 2 {
        let (a, b) = (rho[i], rho[n - 1 - i]);
        assert!((a - b).abs() < 1e-5 * peak_before, "cells {i} and {}: {a} vs {b}", n - 1 - i);
    }

    let diag = FieldDiagnostics::compute(&field, solver.mesh(), solver.basis());
    assert!(diag.min_density > 0.0);
    assert!(diag.max_realizability_ratio <= 1.0 + 1e-9);
}
