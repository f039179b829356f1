//! Closure by per-cell Newton solves of the dual problem.

use std::sync::Arc;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::basis::MomentBasis;
use crate::error::{MnError, Result};
use crate::optimization::{DualProblem, DualSolution, NewtonConfig, solve_prepared};
use crate::quadrature::QuadratureRule;

use super::{ClosureBatch, ClosureProvider, DensityPolicy, DivergencePolicy, batch_cells};

/// Settings of the Newton closure.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NewtonClosureConfig {
    /// Regularization γ >= 0.
    pub gamma: f64,
    /// Settings of the per-cell solver.
    pub newton: NewtonConfig,
    /// Handling of non-positive densities.
    pub density_policy: DensityPolicy,
    /// Handling of cells that fail to converge.
    pub divergence_policy: DivergencePolicy,
}

impl Default for NewtonClosureConfig {
    fn default() -> Self {
        Self {
            gamma: 0.0,
            newton: NewtonConfig::default(),
            density_policy: DensityPolicy::Reject,
            divergence_policy: DivergencePolicy::Abort,
        }
    }
}

impl NewtonClosureConfig {
    /// Set the regularization γ.
    pub fn with_gamma(mut self, gamma: f64) -> Self {
        self.gamma = gamma;
        self
    }

    /// Set the per-cell Newton settings.
    pub fn with_newton(mut self, newton: NewtonConfig) -> Self {
        self.newton = newton;
        self
    }

    /// Set the density policy.
    pub fn with_density_policy(mut self, policy: DensityPolicy) -> Self {
        self.density_policy = policy;
        self
    }

    /// Set the policy for cells that fail to converge.
    pub fn with_divergence_policy(mut self, policy: DivergencePolicy) -> Self {
        self.divergence_policy = policy;
        self
    }

    /// Check γ and the nested settings.
    pub fn validate(&self) -> Result<()> {
        if !(self.gamma >= 0.0) || !self.gamma.is_finite() {
            return Err(MnError::InvalidConfig(format!(
                "regularization gamma must be non-negative, got {}",
                self.gamma
            )));
        }
        self.newton.validate()?;
        self.density_policy.validate()
    }
}

/// Result of closing one cell.
struct CellClosure {
    solution: DualSolution,
    retained: bool,
}

/// Minimum-entropy closure computed by Newton's method in every cell.
///
/// The quadrature rule and basis are shared read-only between all cells.
#[derive(Clone, Debug)]
pub struct NewtonClosure {
    quadrature: Arc<QuadratureRule>,
    basis: Arc<MomentBasis>,
    config: NewtonClosureConfig,
}

impl NewtonClosure {
    /// Create the closure after checking the basis against the quadrature.
    pub fn new(
        quadrature: Arc<QuadratureRule>,
        basis: Arc<MomentBasis>,
        config: NewtonClosureConfig,
    ) -> Result<Self> {
        basis.check_compatible(&quadrature)?;
        config.validate()?;
        Ok(Self {
            quadrature,
            basis,
            config,
        })
    }

    pub fn config(&self) -> &NewtonClosureConfig {
        &self.config
    }

    pub fn basis(&self) -> &MomentBasis {
        &self.basis
    }

    pub fn quadrature(&self) -> &QuadratureRule {
        &self.quadrature
    }

    fn problem(&self) -> DualProblem<'_> {
        DualProblem::new(&self.basis, &self.quadrature, self.config.gamma)
    }

    fn close_cell(&self, cell: usize, u: &[f64], warm: Option<&[f64]>) -> Result<CellClosure> {
        let n = self.basis.size();
        let mut u = u.to_vec();
        self.config
            .density_policy
            .apply(&mut u)
            .map_err(|e| e.in_cell(cell))?;

        let zeros = vec![0.0; n];
        let init = warm.unwrap_or(zeros.as_slice());
        let problem = self.problem();

        match solve_prepared(&problem, &self.basis, &u, init, &self.config.newton) {
            Ok(solution) => Ok(CellClosure {
                solution,
                retained: false,
            }),
            Err(err @ MnError::OptimizationDivergence { .. }) => {
                match (self.config.divergence_policy, warm) {
                    (DivergencePolicy::RetainPrevious, Some(previous)) => {
                        log::warn!("cell {}: {}; keeping previous multiplier", cell, err);
                        let alpha = previous.to_vec();
                        Ok(CellClosure {
                            solution: DualSolution {
                                u_reconstructed: problem.reconstruct_u(&alpha),
                                entropy: problem.entropy_value(&alpha, &u),
                                iterations: self.config.newton.max_iterations,
                                gradient_norm: f64::NAN,
                                realizability_ratio: self.basis.realizability_ratio(&u),
                                alpha,
                            },
                            retained: true,
                        })
                    }
                    _ => {
                        log::warn!("cell {}: {}", cell, err);
                        Err(err.in_cell(cell))
                    }
                }
            }
            Err(err) => Err(err.in_cell(cell)),
        }
    }

    /// Close one moment vector. Convenience wrapper over a batch of one.
    pub fn close(&self, u: &[f64], warm_start: Option<&[f64]>) -> Result<DualSolution> {
        let n = self.basis.size();
        if u.len() != n {
            return Err(MnError::size_mismatch("moment vector", n, u.len()));
        }
        self.close_cell(0, u, warm_start).map(|c| c.solution)
    }
}

impl ClosureProvider for NewtonClosure {
    fn name(&self) -> &str {
        "newton"
    }

    fn basis_size(&self) -> usize {
        self.basis.size()
    }

    fn compute_closure(&self, moments: &[f64], warm_start: Option<&[f64]>) -> Result<ClosureBatch> {
        let n = self.basis.size();
        let n_cells = batch_cells(n, moments, warm_start)?;

        let close = |i: usize| {
            let warm = warm_start.map(|w| &w[i * n..(i + 1) * n]);
            self.close_cell(i, &moments[i * n..(i + 1) * n], warm)
        };

        #[cfg(feature = "parallel")]
        let cells: Vec<Result<CellClosure>> = (0..n_cells).into_par_iter().map(close).collect();
        #[cfg(not(feature = "parallel"))]
        let cells: Vec<Result<CellClosure>> = (0..n_cells).map(close).collect();

        let mut batch = ClosureBatch::with_capacity(n, n_cells);
        for (i, cell) in cells.into_iter().enumerate() {
            let cell = cell?;
            let s = &cell.solution;
            batch.push(&s.u_reconstructed, &s.alpha, s.entropy);
            batch.max_iterations = batch.max_iterations.max(s.iterations);
            if cell.retained {
                batch.failed_cells.push(i);
            }
            if s.realizability_ratio > self.config.newton.realizability_threshold {
                log::warn!(
                    "cell {}: moments close to the realizability boundary (ratio {:.4})",
                    i,
                    s.realizability_ratio
                );
                batch.near_boundary_cells.push(i);
            }
        }
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn closure(config: NewtonClosureConfig) -> NewtonClosure {
        let quadrature = QuadratureRule::gauss_legendre_1d(40).unwrap();
        let basis = MomentBasis::monomial(&quadrature, 2).unwrap();
        NewtonClosure::new(Arc::new(quadrature), Arc::new(basis), config).unwrap()
    }

    #[test]
    fn test_batch_round_trip() {
        let closure = closure(NewtonClosureConfig::default());
        let moments = [1.0, 0.3, 0.4, 0.5, 0.0, 1.0 / 6.0, 2.0, -0.5, 0.9];
        let batch = closure.compute_closure(&moments, None).unwrap();

        assert_eq!(batch.n_cells(), 3);
        assert!(batch.success());
        for (a, b) in batch.u_reconstructed.iter().zip(&moments) {
            assert!((a - b).abs() < 1e-6);
        }
        assert!(batch.max_iterations > 0);
    }

    #[test]
    fn test_warm_start_reduces_iterations() {
        let closure = closure(NewtonClosureConfig::default());
        let moments = [1.0, 0.3, 0.4];
        let cold = closure.compute_closure(&moments, None).unwrap();
        let warm = closure.compute_closure(&moments, Some(&cold.alpha)).unwrap();
        assert!(warm.max_iterations <= 1);
        for (a, b) in warm.alpha.iter().zip(&cold.alpha) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn test_degenerate_cell_is_attributed() {
        let closure = closure(NewtonClosureConfig::default());
        let moments = [1.0, 0.0, 0.3, 0.0, 0.0, 0.0];
        let err = closure.compute_closure(&moments, None).unwrap_err();
        assert_eq!(err.cell(), Some(1));
        assert!(matches!(err.root(), MnError::DegenerateMoment { .. }));
    }

    #[test]
    fn test_density_floor() {
        let closure = closure(
            NewtonClosureConfig::default().with_density_policy(DensityPolicy::ClampToFloor(1e-4)),
        );
        let batch = closure.compute_closure(&[0.0, 0.0, 3e-5], None).unwrap();
        assert!((batch.u(0)[0] - 1e-4).abs() < 1e-6);
        assert!((batch.u(0)[2] - 3e-5).abs() < 1e-6);
    }

    #[test]
    fn test_divergence_policies() {
        // |u_1| > u_0 is not realizable
        let moments = [1.0, 1.2, 1.1];
        let newton = NewtonConfig::default().with_max_iterations(30);

        let abort = closure(NewtonClosureConfig::default().with_newton(newton));
        let err = abort.compute_closure(&moments, Some(&[0.0; 3])).unwrap_err();
        assert_eq!(err.cell(), Some(0));
        assert!(matches!(err.root(), MnError::OptimizationDivergence { .. }));

        let retain = closure(
            NewtonClosureConfig::default()
                .with_newton(newton)
                .with_divergence_policy(DivergencePolicy::RetainPrevious),
        );
        let previous = [0.1, 0.2, 0.3];
        let batch = retain.compute_closure(&moments, Some(&previous)).unwrap();
        assert_eq!(batch.failed_cells, vec![0]);
        assert_eq!(batch.alpha(0), &previous);
        assert!(!batch.success());
        let problem = DualProblem::new(retain.basis(), retain.quadrature(), 0.0);
        assert_eq!(batch.entropy[0], problem.entropy_value(&previous, &moments));
    }

    #[test]
    fn test_close_single_vector() {
        let closure = closure(NewtonClosureConfig::default());
        let u = [2.0, -0.5, 0.9];
        let solution = closure.close(&u, None).unwrap();
        let batch = closure.compute_closure(&u, None).unwrap();
        assert_eq!(solution.alpha, batch.alpha);
        assert_eq!(solution.entropy, batch.entropy[0]);

        let warm = closure.close(&u, Some(&solution.alpha)).unwrap();
        assert!(warm.iterations <= 1);

        let err = closure.close(&u[..2], None).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_near_boundary_cells_are_reported() {
        let closure = closure(NewtonClosureConfig::default());
        // density concentrated near μ = 1
        let moments = [1.0, 0.96, 0.94];
        let batch = closure.compute_closure(&moments, None).unwrap();
        assert_eq!(batch.near_boundary_cells, vec![0]);
    }

    #[test]
    fn test_invalid_gamma() {
        let quadrature = QuadratureRule::gauss_legendre_1d(10).unwrap();
        let basis = MomentBasis::monomial(&quadrature, 1).unwrap();
        let result = NewtonClosure::new(
            Arc::new(quadrature),
            Arc::new(basis),
            NewtonClosureConfig::default().with_gamma(-1.0),
        );
        assert!(matches!(result, Err(MnError::InvalidConfig(_))));
    }
}
