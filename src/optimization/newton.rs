//! Damped Newton method for the dual problem.
//!
//! Each iteration solves H d = -∇J with a fully pivoted LU factorization and
//! backtracks along d until the Armijo condition holds. If the Newton direction
//! is not a descent direction (loss of positive definiteness in finite
//! precision) the step falls back to steepest descent.

use faer::Mat;
use faer::linalg::solvers::Solve;

use crate::error::{MnError, Result};

use super::dual::DualProblem;

/// Newton solver settings.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NewtonConfig {
    /// Stop when ‖∇J‖₂ drops below this value.
    pub gradient_tolerance: f64,
    /// Maximum number of Newton steps.
    pub max_iterations: usize,
    /// Sufficient decrease constant c₁ of the Armijo condition.
    pub armijo: f64,
    /// Maximum number of step halvings per iteration.
    pub max_line_search: usize,
    /// Realizability ratio above which a warning is logged.
    pub realizability_threshold: f64,
}

impl Default for NewtonConfig {
    fn default() -> Self {
        Self {
            gradient_tolerance: 1e-6,
            max_iterations: 200,
            armijo: 1e-4,
            max_line_search: 60,
            realizability_threshold: 0.95,
        }
    }
}

impl NewtonConfig {
    /// Set the gradient tolerance.
    pub fn with_gradient_tolerance(mut self, tolerance: f64) -> Self {
        self.gradient_tolerance = tolerance;
        self
    }

    /// Set the maximum number of Newton steps.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the realizability warning threshold.
    pub fn with_realizability_threshold(mut self, threshold: f64) -> Self {
        self.realizability_threshold = threshold;
        self
    }

    /// Reject non-positive tolerances and empty budgets.
    pub fn validate(&self) -> Result<()> {
        if !(self.gradient_tolerance > 0.0) {
            return Err(MnError::InvalidConfig(format!(
                "gradient tolerance must be positive, got {}",
                self.gradient_tolerance
            )));
        }
        if self.max_iterations == 0 || self.max_line_search == 0 {
            return Err(MnError::InvalidConfig(
                "Newton iteration and line-search budgets must be non-zero".into(),
            ));
        }
        if !(self.armijo > 0.0 && self.armijo < 0.5) {
            return Err(MnError::InvalidConfig(format!(
                "Armijo constant must lie in (0, 0.5), got {}",
                self.armijo
            )));
        }
        Ok(())
    }
}

/// Outcome of a converged minimization.
#[derive(Clone, Debug)]
pub(crate) struct NewtonOutcome {
    pub alpha: Vec<f64>,
    pub objective: f64,
    pub gradient_norm: f64,
    pub iterations: usize,
}

fn norm(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}

/// Minimize J starting from `alpha`.
pub(crate) fn minimize(
    problem: &DualProblem<'_>,
    u: &[f64],
    mut alpha: Vec<f64>,
    config: &NewtonConfig,
) -> Result<NewtonOutcome> {
    let n = problem.size();
    let divergence = |iterations: usize, gradient_norm: f64| MnError::OptimizationDivergence {
        iterations,
        gradient_norm,
        moments: u.to_vec(),
    };

    let mut eval = problem.evaluate(&alpha, u);
    if !eval.objective.is_finite() {
        return Err(divergence(0, f64::INFINITY));
    }

    for iteration in 0..config.max_iterations {
        let gradient_norm = norm(&eval.gradient);
        if gradient_norm < config.gradient_tolerance {
            return Ok(NewtonOutcome {
                alpha,
                objective: eval.objective,
                gradient_norm,
                iterations: iteration,
            });
        }

        // Newton direction: H d = -g
        let hessian = problem.hessian_with_density(&eval.density);
        let mut rhs = Mat::zeros(n, 1);
        for i in 0..n {
            rhs[(i, 0)] = -eval.gradient[i];
        }
        let lu = hessian.as_ref().full_piv_lu();
        let solution = lu.solve(&rhs);
        let mut direction: Vec<f64> = (0..n).map(|i| solution[(i, 0)]).collect();

        let mut slope: f64 = direction.iter().zip(&eval.gradient).map(|(d, g)| d * g).sum();
        if !(slope.is_finite() && slope < 0.0) {
            direction = eval.gradient.iter().map(|g| -g).collect();
            slope = -gradient_norm * gradient_norm;
        }

        // Backtracking with a round-off allowance on the decrease test
        let slack = 1e-14 * eval.objective.abs().max(1.0);
        let mut step = 1.0;
        let mut accepted = None;
        for _ in 0..config.max_line_search {
            let trial: Vec<f64> = alpha
                .iter()
                .zip(&direction)
                .map(|(a, d)| a + step * d)
                .collect();
            let trial_eval = problem.evaluate(&trial, u);
            if trial_eval.objective.is_finite()
                && trial_eval.objective <= eval.objective + config.armijo * step * slope + slack
            {
                accepted = Some((trial, trial_eval));
                break;
            }
            step *= 0.5;
        }

        match accepted {
            Some((trial, trial_eval)) => {
                alpha = trial;
                eval = trial_eval;
            }
            None => return Err(divergence(iteration, gradient_norm)),
        }
    }

    let gradient_norm = norm(&eval.gradient);
    if gradient_norm < config.gradient_tolerance {
        return Ok(NewtonOutcome {
            alpha,
            objective: eval.objective,
            gradient_norm,
            iterations: config.max_iterations,
        });
    }
    Err(divergence(config.max_iterations, gradient_norm))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basis::MomentBasis;
    use crate::quadrature::QuadratureRule;

    #[test]
    fn test_default_config_is_valid() {
        NewtonConfig::default().validate().unwrap();
        assert!(NewtonConfig::default().with_gradient_tolerance(0.0).validate().is_err());
        assert!(NewtonConfig::default().with_max_iterations(0).validate().is_err());
    }

    #[test]
    fn test_converges_from_zero() {
        let quadrature = QuadratureRule::gauss_legendre_1d(30).unwrap();
        let basis = MomentBasis::monomial(&quadrature, 2).unwrap();
        let problem = DualProblem::new(&basis, &quadrature, 0.0);
        let u = [1.0, 0.3, 0.4];

        let outcome = minimize(&problem, &u, vec![0.0; 3], &NewtonConfig::default()).unwrap();
        assert!(outcome.gradient_norm < 1e-6);
        assert!(outcome.iterations > 0);
        assert!(outcome.iterations < 50);
    }

    #[test]
    fn test_non_realizable_moment_diverges() {
        // |u_1| > u_0 cannot be the moment of a non-negative density on [-1, 1]
        let quadrature = QuadratureRule::gauss_legendre_1d(30).unwrap();
        let basis = MomentBasis::monomial(&quadrature, 1).unwrap();
        let problem = DualProblem::new(&basis, &quadrature, 0.0);
        let u = [1.0, 1.2];

        let config = NewtonConfig::default().with_max_iterations(50);
        let err = minimize(&problem, &u, vec![0.0; 2], &config).unwrap_err();
        match err {
            MnError::OptimizationDivergence { moments, .. } => assert_eq!(moments, vec![1.0, 1.2]),
            other => panic!("unexpected error {:?}", other),
        }
    }
}
