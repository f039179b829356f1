//! Moment bases evaluated at quadrature nodes.
//!
//! A [`MomentBasis`] is the `(basis_size × nq)` matrix m[k, q] = m_k(Ω_q).
//! Row 0 is always the constant function; it fixes the zeroth multiplier when
//! reconstructing α and is strictly positive at every node.
//!
//! Supported combinations:
//!
//! | kind | 1D | 2D | 3D |
//! |---|---|---|---|
//! | [`BasisKind::Monomial`] | any degree | any degree | any degree |
//! | [`BasisKind::SphericalHarmonic`] | - | degree 1..=5 | any degree |
//!
//! The basis kind is resolved once when the basis is built; nothing
//! downstream dispatches on it again.

mod monomial;
mod rotation;
mod spherical_harmonics;

pub use monomial::{monomial_basis_size, monomial_exponents};
pub use rotation::{alignment_angle_2d, sh_rotation_2d};
pub use spherical_harmonics::{real_spherical_harmonic, sh_indices_2d, sh_indices_3d};

use std::fmt;
use std::str::FromStr;

use faer::Mat;

use crate::error::{MnError, Result};
use crate::quadrature::QuadratureRule;

/// Family of basis functions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BasisKind {
    /// Monomials Ω_x^a Ω_y^b Ω_z^c of total degree <= N.
    Monomial,
    /// Real spherical harmonics up to degree N.
    SphericalHarmonic,
}

impl fmt::Display for BasisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Monomial => write!(f, "monomial"),
            Self::SphericalHarmonic => write!(f, "spherical harmonic"),
        }
    }
}

impl FromStr for BasisKind {
    type Err = MnError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "monomial" => Ok(Self::Monomial),
            "spherical_harmonics" | "spherical-harmonics" | "spherical harmonic" | "sh" => {
                Ok(Self::SphericalHarmonic)
            }
            other => Err(MnError::InvalidConfig(format!("unknown basis kind '{}'", other))),
        }
    }
}

/// Number of basis functions for a (kind, dimension, degree) triple.
///
/// Returns a configuration error for unsupported combinations.
pub fn basis_size(kind: BasisKind, dimension: usize, degree: usize) -> Result<usize> {
    if !(1..=3).contains(&dimension) {
        return Err(MnError::InvalidDimension(dimension));
    }
    match (kind, dimension) {
        (BasisKind::Monomial, d) => Ok(monomial_basis_size(degree, d)),
        (BasisKind::SphericalHarmonic, 1) => Err(MnError::UnsupportedBasis { dimension, kind }),
        (BasisKind::SphericalHarmonic, 2) => spherical_harmonics::sh_size_2d(degree).ok_or(
            MnError::UnsupportedDegree {
                dimension,
                kind,
                degree,
            },
        ),
        (BasisKind::SphericalHarmonic, _) => Ok(2 * degree + degree * degree + 1),
    }
}

/// Moment basis tabulated at the nodes of a quadrature rule.
#[derive(Clone, Debug)]
pub struct MomentBasis {
    kind: BasisKind,
    dimension: usize,
    degree: usize,
    /// m[k, q]: basis function k at node q
    values: Mat<f64>,
    /// m_0 / max_q |m_k(q)| per row, used for the realizability ratio
    realizability_scale: Vec<f64>,
}

impl MomentBasis {
    /// Evaluate a basis of the given kind and degree at the nodes of `quadrature`.
    pub fn new(kind: BasisKind, quadrature: &QuadratureRule, degree: usize) -> Result<Self> {
        match kind {
            BasisKind::Monomial => Self::monomial(quadrature, degree),
            BasisKind::SphericalHarmonic => Self::spherical_harmonic(quadrature, degree),
        }
    }

    /// Monomial basis. Ordering: increasing total degree, then increasing
    /// exponent of Ω_x, then of Ω_y.
    pub fn monomial(quadrature: &QuadratureRule, degree: usize) -> Result<Self> {
        let dimension = quadrature.dimension();
        let exponents = monomial_exponents(degree, dimension);
        let nq = quadrature.nq();

        let mut values = Mat::zeros(exponents.len(), nq);
        for q in 0..nq {
            let node = quadrature.node(q);
            for (k, exps) in exponents.iter().enumerate() {
                values[(k, q)] = monomial::evaluate(exps, node);
            }
        }
        Ok(Self::from_values(BasisKind::Monomial, dimension, degree, values))
    }

    /// Real spherical-harmonic basis, orthonormal on the unit sphere.
    ///
    /// 2D keeps the harmonics with (k + l) even, which are the ones that do not
    /// vanish for a density symmetric about the transport plane.
    pub fn spherical_harmonic(quadrature: &QuadratureRule, degree: usize) -> Result<Self> {
        let dimension = quadrature.dimension();
        let kind = BasisKind::SphericalHarmonic;
        let size = basis_size(kind, dimension, degree)?;
        let indices = if dimension == 2 {
            sh_indices_2d(degree)
        } else {
            sh_indices_3d(degree)
        };
        debug_assert_eq!(indices.len(), size);

        let nq = quadrature.nq();
        let (mu, phi) = (quadrature.mu(), quadrature.phi());
        let mut values = Mat::zeros(size, nq);
        for q in 0..nq {
            for (row, &(l, k)) in indices.iter().enumerate() {
                values[(row, q)] = real_spherical_harmonic(l, k, mu[q], phi[q]);
            }
        }
        Ok(Self::from_values(kind, dimension, degree, values))
    }

    fn from_values(kind: BasisKind, dimension: usize, degree: usize, values: Mat<f64>) -> Self {
        let mut basis = Self {
            kind,
            dimension,
            degree,
            values,
            realizability_scale: Vec::new(),
        };
        basis.update_realizability_scale();
        basis
    }

    fn update_realizability_scale(&mut self) {
        let nq = self.values.ncols();
        let m0 = if nq > 0 { self.values[(0, 0)] } else { 0.0 };
        self.realizability_scale = (0..self.size())
            .map(|k| {
                let max = (0..nq).map(|q| self.values[(k, q)].abs()).fold(0.0, f64::max);
                if max > 0.0 { m0 / max } else { 0.0 }
            })
            .collect();
    }

    /// Basis family.
    pub fn kind(&self) -> BasisKind {
        self.kind
    }

    /// Spatial dimension.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Polynomial degree N.
    pub fn degree(&self) -> usize {
        self.degree
    }

    /// Number of basis functions (length of u and α).
    pub fn size(&self) -> usize {
        self.values.nrows()
    }

    /// Number of quadrature nodes the basis is tabulated at.
    pub fn nq(&self) -> usize {
        self.values.ncols()
    }

    /// The full `(size × nq)` matrix.
    pub fn values(&self) -> &Mat<f64> {
        &self.values
    }

    /// Value of the constant basis function m_0.
    pub fn m0(&self) -> f64 {
        self.values[(0, 0)]
    }

    /// Multiplier potential α·m(Ω_q) at node q.
    #[inline]
    pub fn potential(&self, alpha: &[f64], q: usize) -> f64 {
        alpha
            .iter()
            .enumerate()
            .map(|(k, a)| a * self.values[(k, q)])
            .sum()
    }

    /// Normalized realizability ratio max_k |u_k| m_0 / (u_0 max_q |m_k|), k >= 1.
    ///
    /// Every moment vector of a non-negative density has a ratio <= 1.
    pub fn realizability_ratio(&self, u: &[f64]) -> f64 {
        if u.is_empty() || u[0] <= 0.0 {
            return f64::INFINITY;
        }
        u.iter()
            .zip(&self.realizability_scale)
            .skip(1)
            .map(|(uk, s)| uk.abs() * s / u[0])
            .fold(0.0, f64::max)
    }

    /// Isotropic moments of density `density`: u_k = density <m_k> / <m_0>.
    pub fn isotropic_moments(&self, quadrature: &QuadratureRule, density: f64) -> Vec<f64> {
        let ones = vec![1.0; self.nq()];
        let mean = crate::entropy::moments_of_density(&ones, self, quadrature);
        mean.iter()
            .map(|&mk| {
                let v = density * mk / mean[0];
                if v.abs() < 1e-14 * density.abs() { 0.0 } else { v }
            })
            .collect()
    }

    /// Replace the basis by R m (rotation of the moment system).
    ///
    /// Row 0 of R must be the first unit vector so the constant function is kept.
    pub fn rotate(&mut self, rotation: &Mat<f64>) -> Result<()> {
        let n = self.size();
        if rotation.nrows() != n || rotation.ncols() != n {
            return Err(MnError::size_mismatch("rotation matrix", n, rotation.nrows()));
        }
        let keeps_constant =
            rotation[(0, 0)] == 1.0 && (1..n).all(|j| rotation[(0, j)] == 0.0);
        if !keeps_constant {
            return Err(MnError::InvalidConfig(
                "rotation must map the constant basis function to itself".into(),
            ));
        }

        let nq = self.nq();
        let mut rotated = Mat::zeros(n, nq);
        for q in 0..nq {
            for i in 0..n {
                let mut sum = 0.0;
                for j in 0..n {
                    sum += rotation[(i, j)] * self.values[(j, q)];
                }
                rotated[(i, q)] = sum;
            }
        }
        self.values = rotated;
        self.update_realizability_scale();
        Ok(())
    }

    /// Check that the basis is tabulated at the nodes of `quadrature`.
    pub fn check_compatible(&self, quadrature: &QuadratureRule) -> Result<()> {
        if self.nq() != quadrature.nq() {
            return Err(MnError::size_mismatch(
                "basis columns vs quadrature nodes",
                quadrature.nq(),
                self.nq(),
            ));
        }
        if self.dimension != quadrature.dimension() {
            return Err(MnError::size_mismatch(
                "basis vs quadrature dimension",
                quadrature.dimension(),
                self.dimension,
            ));
        }
        Ok(())
    }
}

/// Build the quadrature rule and the moment basis for a closure.
///
/// The (dimension, kind, degree) combination is validated before any
/// quadrature is constructed.
pub fn build_quadrature_and_basis(
    dimension: usize,
    degree: usize,
    order: usize,
    kind: BasisKind,
) -> Result<(QuadratureRule, MomentBasis)> {
    basis_size(kind, dimension, degree)?;
    let quadrature = QuadratureRule::new(dimension, order)?;
    let basis = MomentBasis::new(kind, &quadrature, degree)?;
    basis.check_compatible(&quadrature)?;
    Ok((quadrature, basis))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn gram(basis: &MomentBasis, quadrature: &QuadratureRule) -> Mat<f64> {
        let n = basis.size();
        let m = basis.values();
        let w = quadrature.weights();
        let mut g = Mat::zeros(n, n);
        for i in 0..n {
            for j in 0..n {
                g[(i, j)] = (0..quadrature.nq()).map(|q| m[(i, q)] * m[(j, q)] * w[q]).sum();
            }
        }
        g
    }

    #[test]
    fn test_basis_sizes() {
        assert_eq!(basis_size(BasisKind::Monomial, 1, 0).unwrap(), 1);
        assert_eq!(basis_size(BasisKind::Monomial, 1, 3).unwrap(), 4);
        assert_eq!(basis_size(BasisKind::Monomial, 2, 2).unwrap(), 6);
        assert_eq!(basis_size(BasisKind::Monomial, 3, 2).unwrap(), 10);
        for (degree, size) in [(1, 3), (2, 6), (3, 10), (4, 15), (5, 21)] {
            assert_eq!(basis_size(BasisKind::SphericalHarmonic, 2, degree).unwrap(), size);
        }
        assert_eq!(basis_size(BasisKind::SphericalHarmonic, 3, 2).unwrap(), 9);
        assert_eq!(basis_size(BasisKind::SphericalHarmonic, 3, 4).unwrap(), 25);
    }

    #[test]
    fn test_unsupported_combinations() {
        let err = build_quadrature_and_basis(1, 2, 10, BasisKind::SphericalHarmonic).unwrap_err();
        assert_eq!(
            err,
            MnError::UnsupportedBasis {
                dimension: 1,
                kind: BasisKind::SphericalHarmonic
            }
        );
        assert!(err.is_configuration());

        assert!(matches!(
            basis_size(BasisKind::SphericalHarmonic, 2, 6),
            Err(MnError::UnsupportedDegree { degree: 6, .. })
        ));
        assert!(matches!(
            build_quadrature_and_basis(0, 1, 10, BasisKind::Monomial),
            Err(MnError::InvalidDimension(0))
        ));
    }

    #[test]
    fn test_row_zero_constant_positive() {
        let cases = [
            (1, 3, BasisKind::Monomial),
            (2, 2, BasisKind::Monomial),
            (3, 2, BasisKind::Monomial),
            (2, 3, BasisKind::SphericalHarmonic),
            (3, 3, BasisKind::SphericalHarmonic),
        ];
        for (dimension, degree, kind) in cases {
            let (quadrature, basis) = build_quadrature_and_basis(dimension, degree, 8, kind).unwrap();
            let m0 = basis.m0();
            assert!(m0 > 0.0);
            for q in 0..quadrature.nq() {
                assert_eq!(basis.values()[(0, q)], m0, "{} {}D", kind, dimension);
            }
        }
    }

    #[test]
    fn test_monomial_ordering_2d() {
        let quadrature = QuadratureRule::gauss_legendre_2d(4).unwrap();
        let basis = MomentBasis::monomial(&quadrature, 2).unwrap();
        let q = 3;
        let (x, y) = (quadrature.node(q)[0], quadrature.node(q)[1]);
        // 1, y, x, y^2, xy, x^2
        let expected = [1.0, y, x, y * y, x * y, x * x];
        for (k, e) in expected.iter().enumerate() {
            assert!((basis.values()[(k, q)] - e).abs() < 1e-15, "row {}", k);
        }
    }

    #[test]
    fn test_spherical_harmonics_orthonormal() {
        for (dimension, degree) in [(2, 1), (2, 3), (2, 5), (3, 2), (3, 4)] {
            let (quadrature, basis) =
                build_quadrature_and_basis(dimension, degree, 12, BasisKind::SphericalHarmonic)
                    .unwrap();
            let g = gram(&basis, &quadrature);
            for i in 0..basis.size() {
                for j in 0..basis.size() {
                    let expected = if i == j { 1.0 } else { 0.0 };
                    assert!(
                        (g[(i, j)] - expected).abs() < 1e-12,
                        "{}D degree {}: G[{},{}] = {}",
                        dimension,
                        degree,
                        i,
                        j,
                        g[(i, j)]
                    );
                }
            }
            assert!((basis.m0() - (1.0 / (4.0 * PI)).sqrt()).abs() < 1e-15);
        }
    }

    #[test]
    fn test_deterministic_ordering() {
        let (_, a) = build_quadrature_and_basis(3, 3, 6, BasisKind::SphericalHarmonic).unwrap();
        let (_, b) = build_quadrature_and_basis(3, 3, 6, BasisKind::SphericalHarmonic).unwrap();
        for k in 0..a.size() {
            for q in 0..a.nq() {
                assert_eq!(a.values()[(k, q)], b.values()[(k, q)]);
            }
        }
    }

    #[test]
    fn test_realizability_ratio() {
        let quadrature = QuadratureRule::gauss_legendre_1d(30).unwrap();
        let basis = MomentBasis::monomial(&quadrature, 2).unwrap();

        // largest Gauss node is slightly below 1
        let mu_max = *quadrature.mu().last().unwrap();
        assert!((basis.realizability_ratio(&[1.0, 0.5, 0.4]) - 0.5 / mu_max).abs() < 1e-14);
        assert!((basis.realizability_ratio(&[2.0, -1.9, 1.0]) - 0.95 / mu_max).abs() < 1e-14);
        assert!(basis.realizability_ratio(&[0.0, 0.1, 0.1]).is_infinite());
    }

    #[test]
    fn test_isotropic_moments() {
        let quadrature = QuadratureRule::gauss_legendre_1d(30).unwrap();
        let basis = MomentBasis::monomial(&quadrature, 3).unwrap();
        let u = basis.isotropic_moments(&quadrature, 2.0);
        let expected = [2.0, 0.0, 2.0 / 3.0, 0.0];
        for (a, b) in u.iter().zip(expected) {
            assert!((a - b).abs() < 1e-13);
        }
    }

    #[test]
    fn test_basis_kind_parse() {
        assert_eq!("monomial".parse::<BasisKind>().unwrap(), BasisKind::Monomial);
        assert_eq!(
            "spherical_harmonics".parse::<BasisKind>().unwrap(),
            BasisKind::SphericalHarmonic
        );
        assert!("legendre".parse::<BasisKind>().is_err());
    }
}
