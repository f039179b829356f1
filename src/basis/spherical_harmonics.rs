//! Real spherical harmonics.
//!
//! Convention (orthonormal on the unit sphere, Condon-Shortley phase in P_l^m):
//!
//! - k = 0: Y_l^0 = N_l^0 P_l^0(μ)
//! - k > 0: √2 N_l^k P_l^k(μ) cos(kφ)
//! - k < 0: √2 N_l^|k| P_l^|k|(μ) sin(|k|φ)
//!
//! with N_l^m = sqrt((2l+1)/(4π) · (l-m)!/(l+m)!). For 2D only the harmonics
//! with (k + l) even are used; these are even in μ, so the projected
//! hemisphere quadrature integrates their products exactly.

use std::f64::consts::PI;

use crate::polynomial::associated_legendre;

/// 2D basis sizes for degrees 1..=5.
const SH_SIZE_2D: [(usize, usize); 5] = [(1, 3), (2, 6), (3, 10), (4, 15), (5, 21)];

pub(super) fn sh_size_2d(degree: usize) -> Option<usize> {
    SH_SIZE_2D
        .iter()
        .find(|(d, _)| *d == degree)
        .map(|(_, size)| *size)
}

/// (l, k) pairs of the 3D basis: l = 0..=N, k = -l..=l.
pub fn sh_indices_3d(degree: usize) -> Vec<(usize, isize)> {
    let mut indices = Vec::with_capacity((degree + 1) * (degree + 1));
    for l in 0..=degree {
        let li = l as isize;
        for k in -li..=li {
            indices.push((l, k));
        }
    }
    indices
}

/// (l, k) pairs of the 2D basis: the 3D ordering filtered to (k + l) even.
pub fn sh_indices_2d(degree: usize) -> Vec<(usize, isize)> {
    sh_indices_3d(degree)
        .into_iter()
        .filter(|&(l, k)| (k + l as isize).rem_euclid(2) == 0)
        .collect()
}

/// Evaluate the real spherical harmonic (l, k) at μ = cos θ and azimuth φ.
pub fn real_spherical_harmonic(l: usize, k: isize, mu: f64, phi: f64) -> f64 {
    let m = k.unsigned_abs();
    let p = normalization(l, m) * associated_legendre(l, m, mu);
    match k {
        0 => p,
        k if k > 0 => std::f64::consts::SQRT_2 * p * (m as f64 * phi).cos(),
        _ => std::f64::consts::SQRT_2 * p * (m as f64 * phi).sin(),
    }
}

fn normalization(l: usize, m: usize) -> f64 {
    // (l-m)!/(l+m)! = 1 / Π_{i=l-m+1}^{l+m} i
    let ratio: f64 = ((l - m + 1)..=(l + m)).map(|i| 1.0 / i as f64).product();
    ((2 * l + 1) as f64 / (4.0 * PI) * ratio).sqrt()
}
