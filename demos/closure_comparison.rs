//! Newton closure against a surrogate closure on the same problem.
//!
//! The surrogate here is a cheap stand-in for a trained network: it predicts
//! the multipliers of the normalized moments with a loose Newton tolerance.
//! Both runs start from the same periodic field; the per-cell gap is reported
//! at the end.
//!
//! Run with: `cargo run --release --example closure_comparison`

use std::sync::Arc;

use mn_rs::analysis::FieldComparison;
use mn_rs::{
    InitialCondition, MNSolver1D, MomentBasis, NewtonClosure, NewtonClosureConfig, NewtonConfig,
    QuadratureRule, Result, Simulation, SurrogateClosure, SurrogateConfig, SurrogateModel,
    TransportConfig, solve_multiplier,
};

struct LooseNewtonModel {
    quadrature: Arc<QuadratureRule>,
    basis: Arc<MomentBasis>,
    config: NewtonConfig,
}

impl SurrogateModel for LooseNewtonModel {
    fn name(&self) -> &str {
        "loose-newton"
    }

    fn predict(&self, moments: &[f64], n_system: usize) -> Result<Vec<f64>> {
        let zeros = vec![0.0; n_system];
        let mut alpha = Vec::with_capacity(moments.len());
        for u in moments.chunks_exact(n_system) {
            let solution =
                solve_multiplier(u, &self.basis, &self.quadrature, 0.0, &zeros, &self.config)?;
            alpha.extend(solution.alpha);
        }
        Ok(alpha)
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let quadrature = Arc::new(QuadratureRule::gauss_legendre_1d(40)?);
    let basis = Arc::new(MomentBasis::monomial(&quadrature, 3)?);
    let config = TransportConfig::default().with_cells(100).with_max_iter(50);
    let solver = MNSolver1D::new(config, quadrature.clone(), basis.clone())?;
    let field = solver.initial_field(InitialCondition::Periodic)?;

    let newton = NewtonClosure::new(quadrature.clone(), basis.clone(), NewtonClosureConfig::default())?;
    let model = LooseNewtonModel {
        quadrature: quadrature.clone(),
        basis: basis.clone(),
        config: NewtonConfig::default().with_gradient_tolerance(1e-3),
    };
    let surrogate = SurrogateClosure::new(model, quadrature, basis, SurrogateConfig::default())?;

    let mut sim = Simulation::new(solver)
        .with_lane("newton", field.clone(), Box::new(newton))?
        .with_lane("surrogate", field, Box::new(surrogate))?;
    let result = sim.run();

    println!("Newton vs surrogate closure");
    println!("===========================");
    println!("Steps: {}, wall time {:.2}s", result.n_steps, result.wall_time);
    for lane in &result.lanes {
        println!(
            "  {:<10} max Newton iterations {:>3}, min density {:.4e}",
            lane.label, lane.max_iterations, lane.min_density
        );
    }
    if let Some(err) = result.error {
        println!("Lane {:?} failed: {}", result.failed_lane, err);
        return Err(err);
    }

    if let (Some(a), Some(b)) = (sim.field_by_label("surrogate"), sim.field_by_label("newton")) {
        let cmp = FieldComparison::compute(a, b)?;
        println!();
        println!("Max moment gap: {:.3e} (cell {})", cmp.max_error, cmp.max_error_cell);
        println!("RMS moment gap: {:.3e}", cmp.rms_error);
    }

    Ok(())
}
