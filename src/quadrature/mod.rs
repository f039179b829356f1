//! Velocity-space quadrature rules.
//!
//! - 1D: Gauss-Legendre rule on μ ∈ [-1, 1] (measure 2)
//! - 2D: hemisphere product rule (Gauss-Legendre in μ > 0, midpoint in φ),
//!   weights doubled so that the rule integrates over the full sphere (measure 4π)
//!   for functions that are even in μ, which is the case for all 2D bases
//! - 3D: full-sphere product rule (measure 4π)
//!
//! Nodes are stored flattened with layout `[nq, dimension]`, so `node(q)` is a
//! slice of length `dimension`: μ in 1D, (Ω_x, Ω_y) in 2D, (Ω_x, Ω_y, Ω_z) in 3D.

use std::f64::consts::PI;

use crate::error::{MnError, Result};
use crate::polynomial::gauss_legendre;

/// An immutable quadrature rule: nodes, non-negative weights, and the polar
/// coordinates (μ = cos θ, φ) of every node.
#[derive(Clone, Debug)]
pub struct QuadratureRule {
    dimension: usize,
    order: usize,
    nodes: Vec<f64>,
    weights: Vec<f64>,
    mu: Vec<f64>,
    phi: Vec<f64>,
}

impl QuadratureRule {
    /// Build the rule for a spatial dimension in 1..=3.
    pub fn new(dimension: usize, order: usize) -> Result<Self> {
        match dimension {
            1 => Self::gauss_legendre_1d(order),
            2 => Self::gauss_legendre_2d(order),
            3 => Self::gauss_legendre_3d(order),
            d => Err(MnError::InvalidDimension(d)),
        }
    }

    /// Gauss-Legendre rule of the given order on [-1, 1].
    pub fn gauss_legendre_1d(order: usize) -> Result<Self> {
        check_order(order)?;
        let (mu, weights) = gauss_legendre(order);
        let phi = vec![0.0; mu.len()];

        Ok(Self {
            dimension: 1,
            order,
            nodes: mu.clone(),
            weights,
            mu,
            phi,
        })
    }

    /// Projected rule for 2D transport.
    ///
    /// Uses the latitudes with μ > 0 and `2 * order` longitudes
    /// φ_k = π (k + 1/2) / order, with weights 2π/order · w_i. For odd orders the
    /// equator latitude μ = 0 is kept with half weight.
    pub fn gauss_legendre_2d(order: usize) -> Result<Self> {
        check_order(order)?;
        let (mu_gl, w_gl) = gauss_legendre(order);
        let n_phi = 2 * order;

        // Ascending μ: equator (odd order only), then the upper half.
        let mut latitudes: Vec<(f64, f64)> = Vec::new();
        if order % 2 == 1 {
            latitudes.push((0.0, 0.5 * w_gl[order / 2]));
        }
        for i in (order - order / 2)..order {
            latitudes.push((mu_gl[i], w_gl[i]));
        }

        let nq = latitudes.len() * n_phi;
        let mut rule = Self::with_capacity(2, order, nq);
        for &(mu, w) in &latitudes {
            let sin_theta = (1.0 - mu * mu).sqrt();
            for k in 0..n_phi {
                let phi = longitude(k, order);
                rule.nodes.push(sin_theta * phi.cos());
                rule.nodes.push(sin_theta * phi.sin());
                rule.weights.push(2.0 * PI / order as f64 * w);
                rule.mu.push(mu);
                rule.phi.push(phi);
            }
        }
        Ok(rule)
    }

    /// Full-sphere product rule: `order` latitudes × `2 * order` longitudes,
    /// weights π/order · w_i.
    pub fn gauss_legendre_3d(order: usize) -> Result<Self> {
        check_order(order)?;
        let (mu_gl, w_gl) = gauss_legendre(order);
        let n_phi = 2 * order;

        let mut rule = Self::with_capacity(3, order, order * n_phi);
        for (&mu, &w) in mu_gl.iter().zip(&w_gl) {
            let sin_theta = (1.0 - mu * mu).sqrt();
            for k in 0..n_phi {
                let phi = longitude(k, order);
                rule.nodes.push(sin_theta * phi.cos());
                rule.nodes.push(sin_theta * phi.sin());
                rule.nodes.push(mu);
                rule.weights.push(PI / order as f64 * w);
                rule.mu.push(mu);
                rule.phi.push(phi);
            }
        }
        Ok(rule)
    }

    fn with_capacity(dimension: usize, order: usize, nq: usize) -> Self {
        Self {
            dimension,
            order,
            nodes: Vec::with_capacity(nq * dimension),
            weights: Vec::with_capacity(nq),
            mu: Vec::with_capacity(nq),
            phi: Vec::with_capacity(nq),
        }
    }

    /// Spatial dimension of the rule.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Order the rule was built with.
    pub fn order(&self) -> usize {
        self.order
    }

    /// Number of quadrature nodes.
    pub fn nq(&self) -> usize {
        self.weights.len()
    }

    /// Coordinates of node q (length = dimension).
    pub fn node(&self, q: usize) -> &[f64] {
        let start = q * self.dimension;
        &self.nodes[start..start + self.dimension]
    }

    /// Transport direction component along the first axis (μ in 1D, Ω_x otherwise).
    pub fn direction_x(&self, q: usize) -> f64 {
        self.nodes[q * self.dimension]
    }

    /// Quadrature weights.
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// μ = cos θ of every node.
    pub fn mu(&self) -> &[f64] {
        &self.mu
    }

    /// Azimuth φ of every node (zero in 1D).
    pub fn phi(&self) -> &[f64] {
        &self.phi
    }

    /// Sum of the weights: 2 in 1D, 4π in 2D and 3D.
    pub fn measure(&self) -> f64 {
        self.weights.iter().sum()
    }

    /// Integrate values tabulated at the nodes.
    pub fn integrate(&self, values: &[f64]) -> f64 {
        crate::entropy::integrate(values, &self.weights)
    }
}

fn longitude(k: usize, order: usize) -> f64 {
    PI * (k as f64 + 0.5) / order as f64
}

fn check_order(order: usize) -> Result<()> {
    if order == 0 {
        return Err(MnError::InvalidConfig(
            "quadrature order must be at least 1".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measures() {
        for order in [1, 2, 5, 10, 50, 100] {
            let rule = QuadratureRule::gauss_legendre_1d(order).unwrap();
            assert!((rule.measure() - 2.0).abs() < 1e-12, "1D order {}", order);
        }
        for order in [1, 2, 3, 4, 7, 12] {
            let rule = QuadratureRule::gauss_legendre_2d(order).unwrap();
            assert!(
                (rule.measure() - 4.0 * PI).abs() < 1e-12,
                "2D order {}: {}",
                order,
                rule.measure()
            );
            let rule = QuadratureRule::gauss_legendre_3d(order).unwrap();
            assert!((rule.measure() - 4.0 * PI).abs() < 1e-12, "3D order {}", order);
        }
    }

    #[test]
    fn test_node_counts() {
        assert_eq!(QuadratureRule::gauss_legendre_1d(50).unwrap().nq(), 50);
        // even order: order/2 latitudes × 2 order longitudes
        assert_eq!(QuadratureRule::gauss_legendre_2d(6).unwrap().nq(), 36);
        // odd order keeps the equator
        assert_eq!(QuadratureRule::gauss_legendre_2d(5).unwrap().nq(), 30);
        assert_eq!(QuadratureRule::gauss_legendre_3d(6).unwrap().nq(), 72);
    }

    #[test]
    fn test_nodes_on_unit_sphere() {
        let rule = QuadratureRule::gauss_legendre_3d(8).unwrap();
        for q in 0..rule.nq() {
            let n = rule.node(q);
            let r2 = n[0] * n[0] + n[1] * n[1] + n[2] * n[2];
            assert!((r2 - 1.0).abs() < 1e-13);
        }

        let rule = QuadratureRule::gauss_legendre_2d(8).unwrap();
        for q in 0..rule.nq() {
            let n = rule.node(q);
            assert!(n[0] * n[0] + n[1] * n[1] <= 1.0 + 1e-13);
            assert!(rule.mu()[q] >= 0.0);
        }
    }

    #[test]
    fn test_sphere_second_moments() {
        // ∫ Ω_x^2 dΩ = 4π/3 on the sphere
        for rule in [
            QuadratureRule::gauss_legendre_2d(6).unwrap(),
            QuadratureRule::gauss_legendre_3d(6).unwrap(),
        ] {
            let values: Vec<f64> = (0..rule.nq()).map(|q| rule.direction_x(q).powi(2)).collect();
            let integral = rule.integrate(&values);
            assert!((integral - 4.0 * PI / 3.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_invalid_input() {
        assert!(matches!(
            QuadratureRule::new(4, 10),
            Err(MnError::InvalidDimension(4))
        ));
        assert!(QuadratureRule::new(1, 0).is_err());
    }
}
