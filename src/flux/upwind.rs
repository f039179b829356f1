//! Upwind numerical flux for linear advection along one velocity direction.
//!
//! For du/dt + a du/dx = 0 at a face separating a left state u^L from a right
//! state u^R:
//! F^* = a u^L if a > 0 (information flows right, use left state)
//! F^* = a u^R if a <= 0 (information flows left, use right state)

/// Upwind flux of a single advected value.
///
/// # Arguments
/// * `u_left` - Value in the cell left of the face
/// * `u_right` - Value in the cell right of the face
/// * `a` - Advection velocity along +x
pub fn upwind_flux(u_left: f64, u_right: f64, a: f64) -> f64 {
    if a > 0.0 { a * u_left } else { a * u_right }
}
