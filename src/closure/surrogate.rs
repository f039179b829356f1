//! Closure driven by a learned multiplier predictor.
//!
//! The model itself (network architecture, weights, training) lives outside this
//! crate; anything implementing [`SurrogateModel`] can be plugged in. The model
//! only predicts multipliers. Reconstructed moments and entropy values are
//! evaluated from those multipliers with the same kernel as [`super::NewtonClosure`],
//! so the two providers produce element-wise comparable batches.

use std::sync::Arc;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::basis::MomentBasis;
use crate::error::{MnError, Result};
use crate::optimization::DualProblem;
use crate::quadrature::QuadratureRule;

use super::{ClosureBatch, ClosureProvider, DensityPolicy, DivergencePolicy, batch_cells};

/// A multiplier predictor.
pub trait SurrogateModel: Send + Sync {
    /// Label used in logs.
    fn name(&self) -> &str {
        "surrogate"
    }

    /// Predict one multiplier per moment vector.
    ///
    /// Input and output are flat and cell-major with `n_system` entries per cell.
    fn predict(&self, moments: &[f64], n_system: usize) -> Result<Vec<f64>>;
}

/// Settings of the surrogate closure.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurrogateConfig {
    /// The model was trained on moments divided by their density.
    pub normalized: bool,
    /// Handling of non-positive densities.
    pub density_policy: DensityPolicy,
    /// Handling of cells whose predicted multiplier is not finite.
    pub divergence_policy: DivergencePolicy,
}

impl Default for SurrogateConfig {
    fn default() -> Self {
        Self {
            normalized: true,
            density_policy: DensityPolicy::ClampToFloor(1e-4),
            divergence_policy: DivergencePolicy::Abort,
        }
    }
}

impl SurrogateConfig {
    /// Set whether the model expects moments divided by their density.
    pub fn with_normalized(mut self, normalized: bool) -> Self {
        self.normalized = normalized;
        self
    }

    /// Set the density policy.
    pub fn with_density_policy(mut self, policy: DensityPolicy) -> Self {
        self.density_policy = policy;
        self
    }

    /// Set the policy for non-finite predictions.
    pub fn with_divergence_policy(mut self, policy: DivergencePolicy) -> Self {
        self.divergence_policy = policy;
        self
    }
}

/// Closure provider backed by a [`SurrogateModel`].
pub struct SurrogateClosure<M> {
    model: M,
    quadrature: Arc<QuadratureRule>,
    basis: Arc<MomentBasis>,
    config: SurrogateConfig,
}

impl<M: SurrogateModel> SurrogateClosure<M> {
    pub fn new(
        model: M,
        quadrature: Arc<QuadratureRule>,
        basis: Arc<MomentBasis>,
        config: SurrogateConfig,
    ) -> Result<Self> {
        basis.check_compatible(&quadrature)?;
        config.density_policy.validate()?;
        Ok(Self {
            model,
            quadrature,
            basis,
            config,
        })
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn config(&self) -> &SurrogateConfig {
        &self.config
    }

    /// Turn a prediction for normalized moments into the multiplier of `u`.
    ///
    /// The higher components are kept, α_0 is recomputed for unit density and
    /// then shifted by ln(u_0)/m_0 to restore the original density.
    fn denormalize(&self, problem: &DualProblem<'_>, predicted: &[f64], u0: f64) -> Vec<f64> {
        let mut alpha = problem.reconstruct_alpha(&predicted[1..]);
        alpha[0] += u0.ln() / self.basis.m0();
        alpha
    }
}

impl<M: SurrogateModel> ClosureProvider for SurrogateClosure<M> {
    fn name(&self) -> &str {
        self.model.name()
    }

    fn basis_size(&self) -> usize {
        self.basis.size()
    }

    /// The warm start is not passed to the model. It only replaces non-finite
    /// predictions under [`DivergencePolicy::RetainPrevious`].
    fn compute_closure(&self, moments: &[f64], warm_start: Option<&[f64]>) -> Result<ClosureBatch> {
        let n = self.basis.size();
        let n_cells = batch_cells(n, moments, warm_start)?;

        let mut inputs = moments.to_vec();
        for (i, u) in inputs.chunks_exact_mut(n).enumerate() {
            self.config
                .density_policy
                .apply(u)
                .map_err(|e| e.in_cell(i))?;
        }
        // clamped moments, before normalization
        let clamped = inputs.clone();
        if self.config.normalized {
            for u in inputs.chunks_exact_mut(n) {
                let u0 = u[0];
                u.iter_mut().for_each(|v| *v /= u0);
            }
        }

        let predicted = self.model.predict(&inputs, n)?;
        if predicted.len() != moments.len() {
            return Err(MnError::size_mismatch(
                "surrogate prediction",
                moments.len(),
                predicted.len(),
            ));
        }

        let problem = DualProblem::new(&self.basis, &self.quadrature, 0.0);
        let evaluate = |i: usize| {
            let u = &clamped[i * n..(i + 1) * n];
            let raw = &predicted[i * n..(i + 1) * n];
            let alpha = if self.config.normalized {
                self.denormalize(&problem, raw, u[0])
            } else {
                raw.to_vec()
            };
            let u_rec = problem.reconstruct_u(&alpha);
            let h = problem.entropy_value(&alpha, u);
            (u_rec, alpha, h)
        };

        #[cfg(feature = "parallel")]
        let cells: Vec<(Vec<f64>, Vec<f64>, f64)> = (0..n_cells).into_par_iter().map(evaluate).collect();
        #[cfg(not(feature = "parallel"))]
        let cells: Vec<(Vec<f64>, Vec<f64>, f64)> = (0..n_cells).map(evaluate).collect();

        let mut batch = ClosureBatch::with_capacity(n, n_cells);
        for (i, (u_rec, alpha, h)) in cells.into_iter().enumerate() {
            let finite = h.is_finite()
                && alpha.iter().all(|a| a.is_finite())
                && u_rec.iter().all(|v| v.is_finite());
            if finite {
                batch.push(&u_rec, &alpha, h);
                continue;
            }

            let u = &clamped[i * n..(i + 1) * n];
            match (self.config.divergence_policy, warm_start) {
                (DivergencePolicy::RetainPrevious, Some(warm)) => {
                    log::warn!(
                        "cell {}: {} predicted a non-finite multiplier; keeping previous multiplier",
                        i,
                        self.model.name()
                    );
                    let previous = &warm[i * n..(i + 1) * n];
                    batch.push(
                        &problem.reconstruct_u(previous),
                        previous,
                        problem.entropy_value(previous, u),
                    );
                    batch.failed_cells.push(i);
                }
                _ => {
                    log::warn!("cell {}: {} predicted a non-finite multiplier", i, self.model.name());
                    return Err(MnError::OptimizationDivergence {
                        iterations: 0,
                        gradient_norm: f64::NAN,
                        moments: u.to_vec(),
                    }
                    .in_cell(i));
                }
            }
        }
        Ok(batch)
    }
}
