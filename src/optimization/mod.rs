//! Dual optimization: find the multiplier of the minimum-entropy ansatz.
//!
//! Given a moment vector u, [`solve_multiplier`] minimizes the regularized dual
//! functional (see [`DualProblem`]) with a damped Newton method and returns the
//! multiplier together with the reconstructed moments and the entropy value.

mod dual;
mod newton;

pub use dual::{DualEvaluation, DualProblem};
pub use newton::NewtonConfig;

use crate::basis::MomentBasis;
use crate::error::{MnError, Result};
use crate::quadrature::QuadratureRule;

/// A converged multiplier and the quantities derived from it.
#[derive(Clone, Debug)]
pub struct DualSolution {
    /// Optimal multiplier α.
    pub alpha: Vec<f64>,
    /// <m f(α)> + γ α̃
    pub u_reconstructed: Vec<f64>,
    /// h = -J(α)
    pub entropy: f64,
    /// Newton steps taken.
    pub iterations: usize,
    /// ‖∇J(α)‖₂ at termination.
    pub gradient_norm: f64,
    /// Normalized realizability ratio of the input moments.
    pub realizability_ratio: f64,
}

/// Check the density component of a moment vector.
pub(crate) fn check_density(u: &[f64]) -> Result<()> {
    let density = u.first().copied().unwrap_or(f64::NAN);
    if !(density > 0.0) || !density.is_finite() || u.iter().any(|v| !v.is_finite()) {
        return Err(MnError::DegenerateMoment {
            density,
            moments: u.to_vec(),
        });
    }
    Ok(())
}

/// Minimize the dual problem for one validated moment vector.
///
/// No realizability logging happens here; callers decide how to report it.
pub(crate) fn solve_prepared(
    problem: &DualProblem<'_>,
    basis: &MomentBasis,
    u: &[f64],
    alpha_init: &[f64],
    config: &NewtonConfig,
) -> Result<DualSolution> {
    check_density(u)?;
    let outcome = newton::minimize(problem, u, alpha_init.to_vec(), config)?;
    let u_reconstructed = problem.reconstruct_u(&outcome.alpha);
    Ok(DualSolution {
        u_reconstructed,
        entropy: -outcome.objective,
        iterations: outcome.iterations,
        gradient_norm: outcome.gradient_norm,
        realizability_ratio: basis.realizability_ratio(u),
        alpha: outcome.alpha,
    })
}

/// Solve for the multiplier of moment vector `u`, starting from `alpha_init`.
///
/// Fails with [`MnError::DegenerateMoment`] if u[0] is not strictly positive,
/// and with [`MnError::OptimizationDivergence`] if the gradient tolerance is not
/// reached within the iteration budget. A warning is logged when the moments lie
/// close to the realizability boundary.
pub fn solve_multiplier(
    u: &[f64],
    basis: &MomentBasis,
    quadrature: &QuadratureRule,
    gamma: f64,
    alpha_init: &[f64],
    config: &NewtonConfig,
) -> Result<DualSolution> {
    basis.check_compatible(quadrature)?;
    config.validate()?;
    if !(gamma >= 0.0) || !gamma.is_finite() {
        return Err(MnError::InvalidConfig(format!(
            "regularization gamma must be non-negative, got {}",
            gamma
        )));
    }
    let n = basis.size();
    if u.len() != n {
        return Err(MnError::size_mismatch("moment vector", n, u.len()));
    }
    if alpha_init.len() != n {
        return Err(MnError::size_mismatch("initial multiplier", n, alpha_init.len()));
    }

    let problem = DualProblem::new(basis, quadrature, gamma);
    let solution = solve_prepared(&problem, basis, u, alpha_init, config)?;
    if solution.realizability_ratio > config.realizability_threshold {
        log::warn!(
            "moment vector close to the realizability boundary (ratio {:.4}): {:?}",
            solution.realizability_ratio,
            u
        );
    }
    Ok(solution)
}

/// Ansatz density exp(α·m) at every quadrature node.
pub fn density_at_nodes(alpha: &[f64], basis: &MomentBasis, quadrature: &QuadratureRule) -> Vec<f64> {
    DualProblem::new(basis, quadrature, 0.0).density(alpha)
}

/// Consistency error ‖<m f(α)> - u‖₂ of the kinetic density.
///
/// Zero (up to the solver tolerance) for γ = 0; equal to γ‖α̃‖ otherwise.
pub fn consistency_residual(
    alpha: &[f64],
    u: &[f64],
    basis: &MomentBasis,
    quadrature: &QuadratureRule,
) -> f64 {
    DualProblem::new(basis, quadrature, 0.0)
        .kinetic_moments(alpha)
        .iter()
        .zip(u)
        .map(|(a, b)| (a - b) * (a - b))
        .sum::<f64>()
        .sqrt()
}
