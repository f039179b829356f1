//! Initial conditions for the 1D moment system.
//!
//! Every condition is a density profile u_0(x) times a fixed normalized moment
//! vector s (s_0 = 1), so u(x) = u_0(x) s. The components of s listed per
//! condition refer to the monomial basis 1, μ, μ², μ³; any further component
//! takes its isotropic value <m_k>/<m_0>.

use std::f64::consts::PI;

use crate::basis::{BasisKind, MomentBasis};
use crate::error::{MnError, Result};
use crate::mesh::Mesh1D;
use crate::quadrature::QuadratureRule;

use super::field::TransportField;
use super::transport::BoundaryMode;

/// Initial moment distributions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InitialCondition {
    /// Uniform isotropic background of density 0.01, for inflow problems.
    Zero,
    /// u_0 = 1.5 + cos(2πx), s = (1, 0, 0.5, 0).
    Periodic,
    /// Narrow Gaussian (sd 0.01) above a 0.001 floor, s = (1, 0, 0.3, 0.005).
    LineSource,
    /// cos²(x) plateau on |x| < 0.49 above a 0.01 floor, s = (1, 0, 0.05, 0).
    SoftLineSource,
    /// Density 1 on |x| < 1 and 0.5 elsewhere, s = (1, 0, 0.5, s_3) with s_3 in
    /// the middle of its realizable interval.
    Bump,
}

impl InitialCondition {
    /// Density u_0 at position x.
    pub fn density(&self, x: f64) -> f64 {
        match self {
            Self::Zero => 0.01,
            Self::Periodic => 1.5 + (2.0 * PI * x).cos(),
            Self::LineSource => {
                let sd = 0.01;
                let gaussian = 1.0 / (4.0 * PI * sd) * (-0.5 * (x / sd).powi(2)).exp();
                gaussian.max(0.001)
            }
            Self::SoftLineSource => {
                if x.abs() < 0.49 {
                    x.cos().powi(2)
                } else {
                    0.01
                }
            }
            Self::Bump => {
                if x.abs() < 1.0 {
                    1.0
                } else {
                    0.5
                }
            }
        }
    }

    /// Normalized moment vector s with s_0 = 1.
    pub fn shape(&self, basis: &MomentBasis, quadrature: &QuadratureRule) -> Vec<f64> {
        let mut s = basis.isotropic_moments(quadrature, 1.0);
        let leading: &[f64] = match self {
            Self::Zero => &[],
            Self::Periodic => &[1.0, 0.0, 0.5, 0.0],
            Self::LineSource => &[1.0, 0.0, 0.3, 0.005],
            Self::SoftLineSource => &[1.0, 0.0, 0.05, 0.0],
            Self::Bump => &[1.0, 0.0, 0.5, mid_realizable_third(0.0, 0.5)],
        };
        for (sk, &v) in s.iter_mut().zip(leading) {
            *sk = v;
        }
        s
    }

    /// Boundary treatment the condition is meant to run with.
    pub fn default_boundary(&self) -> BoundaryMode {
        match self {
            Self::Zero => BoundaryMode::default_dirichlet(),
            _ => BoundaryMode::Periodic,
        }
    }

    /// Fill a field on `mesh` with this condition, evaluated at cell centers.
    pub fn build(
        &self,
        mesh: &Mesh1D,
        basis: &MomentBasis,
        quadrature: &QuadratureRule,
    ) -> Result<TransportField> {
        if basis.dimension() != 1 || basis.kind() != BasisKind::Monomial {
            return Err(MnError::InvalidConfig(format!(
                "initial conditions are defined for the 1D monomial basis, got {} in dimension {}",
                basis.kind(),
                basis.dimension()
            )));
        }
        let n = basis.size();
        let shape = self.shape(basis, quadrature);
        let mut field = TransportField::new(mesh.n_cells, n);
        for i in 0..mesh.n_cells {
            let rho = self.density(mesh.cell_center(i));
            for (u, s) in field.cell_mut(i).iter_mut().zip(&shape) {
                *u = rho * s;
            }
        }
        Ok(field)
    }
}

/// Midpoint of the realizable interval of the normalized third moment on
/// [-1, 1], given normalized first and second moments n1, n2.
fn mid_realizable_third(n1: f64, n2: f64) -> f64 {
    let upper = n2 - (n1 - n2).powi(2) / (1.0 - n1);
    let lower = -n2 + (n1 + n2).powi(2) / (1.0 + n1);
    0.5 * (upper + lower)
}
