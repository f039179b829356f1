//! Maxwell-Boltzmann entropy kernel.
//!
//! η(f) = f ln f - f, with Legendre dual η*(y) = exp(y) and (η*)'(y) = exp(y).
//! All quantities are evaluated pointwise at quadrature nodes and integrated
//! with the quadrature weights; the kinetic density is never tabulated
//! anywhere else.

use crate::basis::MomentBasis;
use crate::quadrature::QuadratureRule;

/// Entropy density η(f) = f ln f - f.
///
/// Uses the continuous extension η(0) = 0.
#[inline]
pub fn entropy(f: f64) -> f64 {
    if f == 0.0 { 0.0 } else { f * f.ln() - f }
}

/// η'(f) = ln f.
#[inline]
pub fn entropy_prime(f: f64) -> f64 {
    f.ln()
}

/// Dual entropy η*(y) = exp(y).
#[inline]
pub fn entropy_dual(y: f64) -> f64 {
    y.exp()
}

/// (η*)'(y) = exp(y), the ansatz density for multiplier potential y = α·m.
#[inline]
pub fn entropy_dual_prime(y: f64) -> f64 {
    y.exp()
}

/// Quadrature sum Σ_q values[q] · weights[q].
pub fn integrate(values: &[f64], weights: &[f64]) -> f64 {
    debug_assert_eq!(values.len(), weights.len());
    values.iter().zip(weights).map(|(v, w)| v * w).sum()
}

/// Moments <m f> of a density tabulated at the quadrature nodes.
pub fn moments_of_density(f: &[f64], basis: &MomentBasis, quadrature: &QuadratureRule) -> Vec<f64> {
    let w = quadrature.weights();
    let m = basis.values();
    (0..basis.size())
        .map(|k| (0..f.len()).map(|q| m[(k, q)] * f[q] * w[q]).sum())
        .collect()
}

/// Primal entropy <η(f)> of a tabulated density.
pub fn primal_entropy(f: &[f64], quadrature: &QuadratureRule) -> f64 {
    let eta: Vec<f64> = f.iter().map(|&v| entropy(v)).collect();
    quadrature.integrate(&eta)
}

/// L1 norm <|f|> of a tabulated density.
pub fn l1_norm(f: &[f64], quadrature: &QuadratureRule) -> f64 {
    let abs: Vec<f64> = f.iter().map(|v| v.abs()).collect();
    quadrature.integrate(&abs)
}
