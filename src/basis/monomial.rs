//! Monomial moment bases.
//!
//! The number of monomials of total degree exactly n in d variables is
//! C(n + d - 1, d - 1); the basis of degree <= N is the sum over n = 0..=N.

/// Number of monomials of total degree <= `degree` in `dimension` variables.
pub fn monomial_basis_size(degree: usize, dimension: usize) -> usize {
    (0..=degree).map(|n| binomial(n + dimension - 1, dimension - 1)).sum()
}

/// Exponent triples (a, b, c) of Ω_x^a Ω_y^b Ω_z^c in basis order.
///
/// Ordering: increasing total degree n, then increasing a, then increasing b.
/// In 2D this yields x^a y^(n-a); in 1D simply μ^n.
pub fn monomial_exponents(degree: usize, dimension: usize) -> Vec<[usize; 3]> {
    let mut exponents = Vec::with_capacity(monomial_basis_size(degree, dimension));
    for n in 0..=degree {
        match dimension {
            1 => exponents.push([n, 0, 0]),
            2 => {
                for a in 0..=n {
                    exponents.push([a, n - a, 0]);
                }
            }
            _ => {
                for a in 0..=n {
                    for b in 0..=(n - a) {
                        exponents.push([a, b, n - a - b]);
                    }
                }
            }
        }
    }
    exponents
}

/// Evaluate one monomial at a node (coordinates beyond the node's dimension are unused).
pub(super) fn evaluate(exponents: &[usize; 3], node: &[f64]) -> f64 {
    node.iter()
        .zip(exponents)
        .map(|(&x, &e)| x.powi(e as i32))
        .product()
}

fn binomial(n: usize, k: usize) -> usize {
    let k = k.min(n - k);
    (0..k).fold(1, |acc, i| acc * (n - i) / (i + 1))
}
