//! The regularized dual entropy functional.
//!
//! For a moment vector u and multiplier α:
//!
//! J(α)   = <η*(α·m)> - α·u + γ/2 ‖α[1:]‖²
//! ∇J(α)  = <m (η*)'(α·m)> - u + γ α̃
//! H(α)   = <m ⊗ m (η*)'(α·m)> + γ Ĩ
//!
//! where α̃ is α with the zeroth component set to zero and Ĩ the identity with
//! its (0, 0) entry removed. H is symmetric positive definite for γ >= 0 as
//! long as the basis functions are linearly independent on the nodes.

use faer::Mat;

use crate::basis::MomentBasis;
use crate::entropy::entropy_dual_prime;
use crate::quadrature::QuadratureRule;

/// Objective value, gradient and nodal density at one multiplier.
#[derive(Clone, Debug)]
pub struct DualEvaluation {
    /// J(α)
    pub objective: f64,
    /// ∇J(α)
    pub gradient: Vec<f64>,
    /// f_q = (η*)'(α·m_q)
    pub density: Vec<f64>,
}

/// The dual problem for a fixed basis, quadrature and regularization.
#[derive(Clone, Copy, Debug)]
pub struct DualProblem<'a> {
    basis: &'a MomentBasis,
    quadrature: &'a QuadratureRule,
    gamma: f64,
}

impl<'a> DualProblem<'a> {
    /// Create the problem. The basis must be tabulated at the quadrature nodes.
    pub fn new(basis: &'a MomentBasis, quadrature: &'a QuadratureRule, gamma: f64) -> Self {
        debug_assert_eq!(basis.nq(), quadrature.nq());
        Self {
            basis,
            quadrature,
            gamma,
        }
    }

    /// Number of unknowns.
    pub fn size(&self) -> usize {
        self.basis.size()
    }

    /// Ansatz density f_q = exp(α·m_q) at every node.
    pub fn density(&self, alpha: &[f64]) -> Vec<f64> {
        (0..self.quadrature.nq())
            .map(|q| entropy_dual_prime(self.basis.potential(alpha, q)))
            .collect()
    }

    fn regularization(&self, alpha: &[f64]) -> f64 {
        0.5 * self.gamma * alpha.iter().skip(1).map(|a| a * a).sum::<f64>()
    }

    /// J(α) for moment vector u.
    pub fn objective(&self, alpha: &[f64], u: &[f64]) -> f64 {
        let density = self.density(alpha);
        self.objective_with_density(alpha, u, &density)
    }

    fn objective_with_density(&self, alpha: &[f64], u: &[f64], density: &[f64]) -> f64 {
        // η* = (η*)' for Maxwell-Boltzmann
        let mass = self.quadrature.integrate(density);
        let alpha_u: f64 = alpha.iter().zip(u).map(|(a, b)| a * b).sum();
        mass - alpha_u + self.regularization(alpha)
    }

    /// Moments of the ansatz density, <m f(α)>, without the regularization term.
    pub fn kinetic_moments(&self, alpha: &[f64]) -> Vec<f64> {
        let density = self.density(alpha);
        crate::entropy::moments_of_density(&density, self.basis, self.quadrature)
    }

    /// Regularized moment map <m f(α)> + γ α̃.
    ///
    /// At a stationary point of J this equals u exactly.
    pub fn reconstruct_u(&self, alpha: &[f64]) -> Vec<f64> {
        let mut u = self.kinetic_moments(alpha);
        for (k, uk) in u.iter_mut().enumerate().skip(1) {
            *uk += self.gamma * alpha[k];
        }
        u
    }

    /// Objective, gradient and density in one pass.
    pub fn evaluate(&self, alpha: &[f64], u: &[f64]) -> DualEvaluation {
        let density = self.density(alpha);
        let objective = self.objective_with_density(alpha, u, &density);

        let mut gradient = crate::entropy::moments_of_density(&density, self.basis, self.quadrature);
        for (k, g) in gradient.iter_mut().enumerate() {
            *g -= u[k];
            if k > 0 {
                *g += self.gamma * alpha[k];
            }
        }

        DualEvaluation {
            objective,
            gradient,
            density,
        }
    }

    /// ∇J(α).
    pub fn gradient(&self, alpha: &[f64], u: &[f64]) -> Vec<f64> {
        self.evaluate(alpha, u).gradient
    }

    /// H(α) from a precomputed nodal density.
    pub fn hessian_with_density(&self, density: &[f64]) -> Mat<f64> {
        let n = self.size();
        let m = self.basis.values();
        let w = self.quadrature.weights();

        let mut h = Mat::zeros(n, n);
        for q in 0..density.len() {
            let fw = density[q] * w[q];
            for i in 0..n {
                let mi = m[(i, q)] * fw;
                for j in 0..=i {
                    h[(i, j)] += mi * m[(j, q)];
                }
            }
        }
        for i in 0..n {
            for j in 0..i {
                h[(j, i)] = h[(i, j)];
            }
            if i > 0 {
                h[(i, i)] += self.gamma;
            }
        }
        h
    }

    /// H(α).
    pub fn hessian(&self, alpha: &[f64]) -> Mat<f64> {
        self.hessian_with_density(&self.density(alpha))
    }

    /// Entropy value h = -J(α).
    pub fn entropy_value(&self, alpha: &[f64], u: &[f64]) -> f64 {
        -self.objective(alpha, u)
    }

    /// Complete a multiplier from its higher components.
    ///
    /// Chooses α_0 so that the ansatz density has unit density moment:
    /// α_0 = -(ln m_0 + ln <exp(α_tail·m_tail)>) / m_0.
    pub fn reconstruct_alpha(&self, alpha_tail: &[f64]) -> Vec<f64> {
        let m0 = self.basis.m0();
        let mut alpha = Vec::with_capacity(alpha_tail.len() + 1);
        alpha.push(0.0);
        alpha.extend_from_slice(alpha_tail);

        let tail_density = self.density(&alpha);
        let mass = self.quadrature.integrate(&tail_density);
        alpha[0] = -(m0.ln() + mass.ln()) / m0;
        alpha
    }
}
