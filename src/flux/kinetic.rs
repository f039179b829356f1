//! Kinetic upwind flux for the moment system.
//!
//! The ansatz densities on either side of a face are f^L = exp(α^L·m) and
//! f^R = exp(α^R·m). Each velocity node is upwinded on its own and the result is
//! projected onto the basis:
//!
//! F_k = Σ_q w_q m_k(Ω_q) upwind(f^L_q, f^R_q, Ω_x,q)

use crate::basis::MomentBasis;
use crate::entropy::entropy_dual_prime;
use crate::quadrature::QuadratureRule;

use super::upwind::upwind_flux;

/// Moment flux through a face, written into `out` (length = basis size).
pub fn kinetic_upwind_flux_into(
    alpha_left: &[f64],
    alpha_right: &[f64],
    basis: &MomentBasis,
    quadrature: &QuadratureRule,
    out: &mut [f64],
) {
    let m = basis.values();
    let w = quadrature.weights();
    out.iter_mut().for_each(|v| *v = 0.0);

    for q in 0..quadrature.nq() {
        let f_left = entropy_dual_prime(basis.potential(alpha_left, q));
        let f_right = entropy_dual_prime(basis.potential(alpha_right, q));
        let flux = upwind_flux(f_left, f_right, quadrature.direction_x(q)) * w[q];
        for (k, o) in out.iter_mut().enumerate() {
            *o += flux * m[(k, q)];
        }
    }
}

/// Moment flux through a face.
pub fn kinetic_upwind_flux(
    alpha_left: &[f64],
    alpha_right: &[f64],
    basis: &MomentBasis,
    quadrature: &QuadratureRule,
) -> Vec<f64> {
    let mut out = vec![0.0; basis.size()];
    kinetic_upwind_flux_into(alpha_left, alpha_right, basis, quadrature, &mut out);
    out
}
