//! Closure providers through the public API.
//!
//! Checks the Newton closure across bases and dimensions, and runs a surrogate
//! closure side by side with the Newton reference.

use std::sync::Arc;

use approx::assert_relative_eq;
use mn_rs::analysis::FieldComparison;
use mn_rs::optimization::{consistency_residual, density_at_nodes};
use mn_rs::{
    BasisKind, ClosureProvider, DivergencePolicy, InitialCondition, MNSolver1D, MnError,
    MomentBasis, NewtonClosure, NewtonClosureConfig, NewtonConfig, QuadratureRule, Result,
    Simulation, SurrogateClosure, SurrogateConfig, SurrogateModel, TransportConfig,
    TransportField, build_quadrature_and_basis, solve_multiplier,
};

/// Surrogate that predicts by solving the normalized dual problem exactly.
struct DualSolverModel {
    quadrature: Arc<QuadratureRule>,
    basis: Arc<MomentBasis>,
}

impl SurrogateModel for DualSolverModel {
    fn name(&self) -> &str {
        "dual-solver"
    }

    fn predict(&self, moments: &[f64], n_system: usize) -> Result<Vec<f64>> {
        let zeros = vec![0.0; n_system];
        let mut alpha = Vec::with_capacity(moments.len());
        for u in moments.chunks_exact(n_system) {
            let solution = solve_multiplier(
                u,
                &self.basis,
                &self.quadrature,
                0.0,
                &zeros,
                &NewtonConfig::default(),
            )?;
            alpha.extend(solution.alpha);
        }
        Ok(alpha)
    }
}

/// Predicts with the dual solver, but returns NaN in the first component of
/// one cell.
struct NanCellModel {
    inner: DualSolverModel,
    cell: usize,
}

impl SurrogateModel for NanCellModel {
    fn predict(&self, moments: &[f64], n_system: usize) -> Result<Vec<f64>> {
        let mut alpha = self.inner.predict(moments, n_system)?;
        alpha[self.cell * n_system + 1] = f64::NAN;
        Ok(alpha)
    }
}

fn nan_cell_run(policy: DivergencePolicy) -> (Simulation, TransportField) {
    let quadrature = Arc::new(QuadratureRule::gauss_legendre_1d(20).unwrap());
    let basis = Arc::new(MomentBasis::monomial(&quadrature, 2).unwrap());
    let config = TransportConfig::default().with_cells(12).with_max_iter(3);
    let solver = MNSolver1D::new(config, quadrature.clone(), basis.clone()).unwrap();
    let field = solver.initial_field(InitialCondition::Zero).unwrap();

    let model = NanCellModel {
        inner: DualSolverModel {
            quadrature: quadrature.clone(),
            basis: basis.clone(),
        },
        cell: 5,
    };
    let config = SurrogateConfig::default().with_divergence_policy(policy);
    let surrogate = SurrogateClosure::new(model, quadrature, basis, config).unwrap();
    let sim = Simulation::new(solver)
        .with_lane("broken", field.clone(), Box::new(surrogate))
        .unwrap();
    (sim, field)
}

#[test]
fn test_non_finite_surrogate_fails_in_its_cell_and_step() {
    let (mut sim, initial) = nan_cell_run(DivergencePolicy::Abort);
    let result = sim.run();

    assert!(!result.success);
    assert_eq!(result.n_steps, 0);
    let err = result.error.unwrap();
    assert_eq!(err.step(), Some(0));
    assert_eq!(err.cell(), Some(5));
    assert!(matches!(err.root(), MnError::OptimizationDivergence { .. }));
    // the failed step leaves the field untouched
    assert_eq!(sim.field(0).unwrap().moments, initial.moments);
}

#[test]
fn test_non_finite_surrogate_retains_previous_multiplier() {
    let (mut sim, _) = nan_cell_run(DivergencePolicy::RetainPrevious);
    let mut failed = Vec::new();
    let result = sim.run_with_callback(|record| failed.push(record.report.failed_cells.clone()));

    assert!(result.success, "{:?}", result.error);
    assert_eq!(failed, vec![vec![5]; 3]);
    assert_eq!(result.lanes[0].retained_cells, 3);
    let field = sim.field(0).unwrap();
    assert!(field.moments.iter().all(|v| v.is_finite()));
    assert!(field.min_density() > 0.0);
}

#[test]
fn test_newton_closure_reproduces_moments_up_to_degree_four() {
    let quadrature = Arc::new(QuadratureRule::gauss_legendre_1d(60).unwrap());
    for degree in 1..=4 {
        let basis = Arc::new(MomentBasis::monomial(&quadrature, degree).unwrap());
        // moments of f(μ) = 1 + 0.5 μ, which is positive on [-1, 1]
        let f: Vec<f64> = quadrature.mu().iter().map(|&mu| 1.0 + 0.5 * mu).collect();
        let u = mn_rs::entropy::moments_of_density(&f, &basis, &quadrature);

        let closure =
            NewtonClosure::new(quadrature.clone(), basis.clone(), NewtonClosureConfig::default())
                .unwrap();
        let batch = closure.compute_closure(&u, None).unwrap();
        assert!(batch.success());
        for (a, b) in batch.u(0).iter().zip(&u) {
            assert_relative_eq!(*a, *b, epsilon = 1e-5);
        }
        assert!(consistency_residual(batch.alpha(0), &u, &basis, &quadrature) < 1e-5);
        assert!(density_at_nodes(batch.alpha(0), &basis, &quadrature)
            .iter()
            .all(|&f| f > 0.0));
    }
}

#[test]
fn test_spherical_harmonic_closure_in_two_dimensions() {
    let (quadrature, basis) =
        build_quadrature_and_basis(2, 2, 10, BasisKind::SphericalHarmonic).unwrap();
    // moments of a mildly anisotropic density 1 + 0.3 Ω_x
    let f: Vec<f64> = (0..quadrature.nq())
        .map(|q| 1.0 + 0.3 * quadrature.direction_x(q))
        .collect();
    let u = mn_rs::entropy::moments_of_density(&f, &basis, &quadrature);

    let closure = NewtonClosure::new(
        Arc::new(quadrature),
        Arc::new(basis),
        NewtonClosureConfig::default(),
    )
    .unwrap();
    let batch = closure.compute_closure(&u, None).unwrap();
    for (a, b) in batch.u(0).iter().zip(&u) {
        assert_relative_eq!(*a, *b, epsilon = 1e-5);
    }
}

#[test]
fn test_regularized_closure_batch() {
    let quadrature = Arc::new(QuadratureRule::gauss_legendre_1d(40).unwrap());
    let basis = Arc::new(MomentBasis::monomial(&quadrature, 2).unwrap());
    let config = NewtonClosureConfig::default().with_gamma(0.1);
    let closure = NewtonClosure::new(quadrature.clone(), basis.clone(), config).unwrap();

    let u = [1.0, 0.3, 0.4, 0.5, 0.0, 1.0 / 6.0];
    let batch = closure.compute_closure(&u, None).unwrap();
    for cell in 0..2 {
        // u_rec = <m f> + γ α̃ matches the input
        for (a, b) in batch.u(cell).iter().zip(&u[cell * 3..cell * 3 + 3]) {
            assert_relative_eq!(*a, *b, epsilon = 1e-5);
        }
    }
}

#[test]
fn test_surrogate_lane_tracks_newton_lane() {
    let quadrature = Arc::new(QuadratureRule::gauss_legendre_1d(30).unwrap());
    let basis = Arc::new(MomentBasis::monomial(&quadrature, 2).unwrap());
    let config = TransportConfig::default().with_cells(30).with_max_iter(5);
    let solver = MNSolver1D::new(config, quadrature.clone(), basis.clone()).unwrap();
    let field = solver.initial_field(InitialCondition::Periodic).unwrap();

    let newton =
        NewtonClosure::new(quadrature.clone(), basis.clone(), NewtonClosureConfig::default())
            .unwrap();
    let model = DualSolverModel {
        quadrature: quadrature.clone(),
        basis: basis.clone(),
    };
    let surrogate =
        SurrogateClosure::new(model, quadrature, basis, SurrogateConfig::default()).unwrap();

    let mut sim = Simulation::new(solver)
        .with_lane("newton", field.clone(), Box::new(newton))
        .unwrap()
        .with_lane("surrogate", field, Box::new(surrogate))
        .unwrap();

    let mut max_gap: f64 = 0.0;
    let mut newton_u = Vec::new();
    let result = sim.run_with_callback(|record| {
        if record.label == "newton" {
            newton_u = record.field.moments.clone();
        } else {
            let gap = record
                .field
                .moments
                .iter()
                .zip(&newton_u)
                .map(|(a, b)| (a - b).abs())
                .fold(0.0, f64::max);
            max_gap = max_gap.max(gap);
        }
    });

    assert!(result.success, "{:?}", result.error);
    assert_eq!(result.n_steps, 5);
    assert!(max_gap < 1e-5, "lanes drifted by {max_gap}");

    let cmp = FieldComparison::compute(
        sim.field_by_label("surrogate").unwrap(),
        sim.field_by_label("newton").unwrap(),
    )
    .unwrap();
    assert!(cmp.max_error < 1e-5);
    assert!(cmp.entropy_error.iter().all(|&e| e < 1e-4));
}
