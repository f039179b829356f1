//! Polynomial evaluation and node generation.
//!
//! This module provides:
//! - Legendre polynomials P_n(x) and their derivatives
//! - Associated Legendre functions P_l^m(x) (Condon-Shortley phase)
//! - Gauss-Legendre nodes and weights on [-1, 1]

mod gauss_legendre;
mod legendre;

pub use gauss_legendre::gauss_legendre;
pub use legendre::{associated_legendre, legendre, legendre_and_derivative};
