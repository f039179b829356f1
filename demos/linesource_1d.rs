//! 1D line-source example with the M_2 closure.
//!
//! A narrow Gaussian pulse of particles in a periodic slab [-1.5, 1.5] with
//! isotropic scattering σ_s = 1. The angular distribution in every cell is
//! closed with the minimum-entropy density exp(α · m(μ)).
//!
//! Run with: `RUST_LOG=info cargo run --release --example linesource_1d`

use std::sync::Arc;

use mn_rs::analysis::FieldDiagnostics;
use mn_rs::{
    InitialCondition, MNSolver1D, MomentBasis, NewtonClosure, NewtonClosureConfig,
    QuadratureRule, Simulation, TransportConfig,
};

fn main() -> mn_rs::Result<()> {
    env_logger::init();

    // Parameters
    let degree = 2;
    let quadrature_order = 50;
    let config = TransportConfig::default()
        .with_cells(150)
        .with_cfl(0.3)
        .with_sigma_s(1.0)
        .with_t_end(0.5)
        .with_max_iter(1000);

    println!("1D M_N Line Source");
    println!("==================");
    println!("Moment degree: {}", degree);
    println!("Quadrature points: {}", quadrature_order);
    println!("Cells: {}", config.nx);
    println!("Domain: [{}, {}]", config.x0, config.x1);
    println!("Scattering: {}", config.sigma_s);
    println!("Final time: {}", config.t_end);
    println!();

    let quadrature = Arc::new(QuadratureRule::gauss_legendre_1d(quadrature_order)?);
    let basis = Arc::new(MomentBasis::monomial(&quadrature, degree)?);
    let solver = MNSolver1D::new(config, quadrature.clone(), basis.clone())?;
    let closure = NewtonClosure::new(quadrature, basis, NewtonClosureConfig::default())?;

    let field = solver.initial_field(InitialCondition::LineSource)?;
    let initial = FieldDiagnostics::compute(&field, solver.mesh(), solver.basis());
    println!("Time step: {:.4e}", solver.dt());
    println!("Initial mass: {:.6}", initial.total_density);
    println!();

    let mut sim = Simulation::new(solver)
        .with_lane("newton", field, Box::new(closure))?
        .with_callback_interval(20);

    println!("{:>6} {:>8} {:>12} {:>10} {:>12}", "step", "t", "min rho", "newton it", "entropy");
    let result = sim.run_with_callback(|record| {
        let entropy: f64 = record.field.entropy.iter().sum();
        println!(
            "{:>6} {:>8.4} {:>12.4e} {:>10} {:>12.6}",
            record.report.step,
            record.report.time,
            record.report.min_density,
            record.report.max_iterations,
            entropy
        );
    });

    println!();
    if let Some(err) = &result.error {
        println!("Run failed in lane {:?}: {}", result.failed_lane, err);
        return Err(err.clone());
    }

    let solver = sim.solver();
    if let Some(field) = sim.field(0) {
        let final_diag = FieldDiagnostics::compute(field, solver.mesh(), solver.basis());
        println!("Steps: {}", result.n_steps);
        println!("Final time: {:.4}", result.final_time);
        println!("Wall time: {:.2}s", result.wall_time);
        println!(
            "Mass drift: {:.2e}",
            (final_diag.total_density - initial.total_density).abs()
        );
        println!(
            "Max realizability ratio: {:.4} (cell {})",
            final_diag.max_realizability_ratio, final_diag.worst_cell
        );

        println!();
        println!("Density profile (every 10th cell):");
        let centers = solver.mesh().cell_centers();
        for (i, rho) in field.density().iter().enumerate().step_by(10) {
            println!("  x = {:>7.3}  rho = {:.5e}", centers[i], rho);
        }
    }

    Ok(())
}
