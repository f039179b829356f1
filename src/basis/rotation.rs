//! Rotations of the 2D spherical-harmonic moment system about the z axis.
//!
//! Rotating the velocity frame by θ maps the basis as G m(φ) = m(φ + θ).
//! Degree-l harmonics with azimuthal index ±k mix through a 2×2 rotation by kθ;
//! the k = 0 harmonics are invariant.

use faer::Mat;

use crate::error::{MnError, Result};

use super::{BasisKind, basis_size};

/// Rotation matrix G(θ) for the 2D spherical-harmonic basis of degree 1 or 2.
pub fn sh_rotation_2d(degree: usize, theta: f64) -> Result<Mat<f64>> {
    if !(1..=2).contains(&degree) {
        return Err(MnError::UnsupportedDegree {
            dimension: 2,
            kind: BasisKind::SphericalHarmonic,
            degree,
        });
    }
    let n = basis_size(BasisKind::SphericalHarmonic, 2, degree)?;
    let mut g = Mat::zeros(n, n);
    g[(0, 0)] = 1.0;

    // (1, -1) and (1, 1) at rows 1, 2
    let (s, c) = theta.sin_cos();
    g[(1, 1)] = c;
    g[(1, 2)] = s;
    g[(2, 1)] = -s;
    g[(2, 2)] = c;

    if degree == 2 {
        // (2, -2), (2, 0), (2, 2) at rows 3, 4, 5
        let (s2, c2) = (2.0 * theta).sin_cos();
        g[(3, 3)] = c2;
        g[(3, 5)] = s2;
        g[(4, 4)] = 1.0;
        g[(5, 3)] = -s2;
        g[(5, 5)] = c2;
    }
    Ok(g)
}

/// Azimuth of the first-order moments (u_1, u_2) of a 2D spherical-harmonic state.
///
/// Rotating by this angle aligns the first-order moments with one basis direction.
pub fn alignment_angle_2d(u: &[f64]) -> Result<f64> {
    if u.len() < 3 {
        return Err(MnError::size_mismatch("first-order moments", 3, u.len()));
    }
    Ok(u[2].atan2(u[1]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basis::{MomentBasis, real_spherical_harmonic, sh_indices_2d};
    use crate::quadrature::QuadratureRule;

    #[test]
    fn test_rotation_shifts_azimuth() {
        let quadrature = QuadratureRule::gauss_legendre_2d(6).unwrap();
        let theta = 0.37;
        for degree in 1..=2 {
            let mut basis = MomentBasis::spherical_harmonic(&quadrature, degree).unwrap();
            basis.rotate(&sh_rotation_2d(degree, theta).unwrap()).unwrap();

            let indices = sh_indices_2d(degree);
            for q in 0..quadrature.nq() {
                let (mu, phi) = (quadrature.mu()[q], quadrature.phi()[q]);
                for (row, &(l, k)) in indices.iter().enumerate() {
                    let expected = real_spherical_harmonic(l, k, mu, phi + theta);
                    assert!(
                        (basis.values()[(row, q)] - expected).abs() < 1e-13,
                        "degree {}, row {}",
                        degree,
                        row
                    );
                }
            }
        }
    }

    #[test]
    fn test_rotation_is_orthogonal() {
        let g = sh_rotation_2d(2, 1.3).unwrap();
        for i in 0..6 {
            for j in 0..6 {
                let dot: f64 = (0..6).map(|k| g[(k, i)] * g[(k, j)]).sum();
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!((dot - expected).abs() < 1e-14);
            }
        }
    }

    #[test]
    fn test_unsupported_degree() {
        assert!(sh_rotation_2d(3, 0.1).is_err());
        assert!(alignment_angle_2d(&[1.0, 0.2]).is_err());
        let theta = alignment_angle_2d(&[1.0, 0.0, 0.5]).unwrap();
        assert!((theta - std::f64::consts::FRAC_PI_2).abs() < 1e-15);
    }
}
