//! Gauss-Legendre nodes and weights.
//!
//! The n Gauss-Legendre nodes are the roots of P_n(x) in (-1, 1). The rule
//! integrates polynomials up to degree 2n-1 exactly and has strictly positive
//! weights w_j = 2 / ((1 - x_j^2) [P'_n(x_j)]^2).

use super::legendre::legendre_and_derivative;
use std::f64::consts::PI;

/// Compute the n-point Gauss-Legendre rule on [-1, 1].
///
/// Returns `(nodes, weights)` with nodes in ascending order.
/// Uses Newton iteration started from the asymptotic guess
/// x_j ≈ cos(π (j + 3/4) / (n + 1/2)); both halves are filled by symmetry.
pub fn gauss_legendre(n: usize) -> (Vec<f64>, Vec<f64>) {
    if n == 0 {
        return (Vec::new(), Vec::new());
    }

    let mut nodes = vec![0.0; n];
    let mut weights = vec![0.0; n];

    // Roots come in ± pairs; only the first half needs Newton.
    let half = n.div_ceil(2);
    for j in 0..half {
        let mut x = (PI * (j as f64 + 0.75) / (n as f64 + 0.5)).cos();

        for _ in 0..100 {
            let (p, dp) = legendre_and_derivative(n, x);
            let update = p / dp;
            x -= update;
            if update.abs() < 1e-15 {
                break;
            }
        }

        let (_, dp) = legendre_and_derivative(n, x);
        let w = 2.0 / ((1.0 - x * x) * dp * dp);

        // x is the j-th largest root
        nodes[n - 1 - j] = x;
        nodes[j] = -x;
        weights[n - 1 - j] = w;
        weights[j] = w;
    }

    if n % 2 == 1 {
        nodes[n / 2] = 0.0;
    }

    (nodes, weights)
}
