//! Isotropic scattering operator.
//!
//! Scattering relaxes every cell toward the isotropic state with the same density:
//!
//! du/dt = σ_s (s u_0 - u),   s_k = <m_k> / <m_0>
//!
//! s vanishes at every odd monomial index, so odd moments are fully absorbed.

use crate::basis::MomentBasis;
use crate::quadrature::QuadratureRule;

use super::field::TransportField;

/// Scatter vector s_k = <m_k> / <m_0> (entries below 1e-14 set to zero).
pub fn scatter_vector(basis: &MomentBasis, quadrature: &QuadratureRule) -> Vec<f64> {
    basis.isotropic_moments(quadrature, 1.0)
}

/// Explicit Euler scattering update of one cell.
#[inline]
pub fn scatter_cell(u: &mut [f64], scatter: &[f64], dt: f64, sigma_s: f64) {
    let u0 = u[0];
    for (uk, sk) in u.iter_mut().zip(scatter) {
        *uk += dt * sigma_s * (sk * u0 - *uk);
    }
}

/// Apply the scattering update to every cell of a field.
pub fn apply_scattering(field: &mut TransportField, scatter: &[f64], dt: f64, sigma_s: f64) {
    if sigma_s == 0.0 {
        return;
    }
    for u in field.moments.chunks_exact_mut(field.n_system) {
        scatter_cell(u, scatter, dt, sigma_s);
    }
}
