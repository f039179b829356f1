//! Legendre polynomial and associated Legendre function evaluation.
//!
//! Legendre polynomials P_n(x) are orthogonal on [-1, 1] with weight 1:
//! ∫_{-1}^{1} P_m(x) P_n(x) dx = 2/(2n+1) δ_{mn}

/// Evaluate Legendre polynomial P_n(x) using the three-term recurrence.
///
/// (n+1) P_{n+1}(x) = (2n+1) x P_n(x) - n P_{n-1}(x)
pub fn legendre(n: usize, x: f64) -> f64 {
    legendre_and_derivative(n, x).0
}

/// Evaluate both P_n(x) and P'_n(x) with a single recurrence pass.
///
/// The derivative uses P'_n(x) = n (x P_n(x) - P_{n-1}(x)) / (x^2 - 1),
/// with the closed forms at x = ±1.
pub fn legendre_and_derivative(n: usize, x: f64) -> (f64, f64) {
    if n == 0 {
        return (1.0, 0.0);
    }

    let mut p_prev = 1.0;
    let mut p_curr = x;
    for k in 1..n {
        let p_next = ((2 * k + 1) as f64 * x * p_curr - k as f64 * p_prev) / (k + 1) as f64;
        p_prev = p_curr;
        p_curr = p_next;
    }

    let edge = (n * (n + 1)) as f64 / 2.0;
    let dp = if (x - 1.0).abs() < 1e-14 {
        edge
    } else if (x + 1.0).abs() < 1e-14 {
        if n % 2 == 0 { -edge } else { edge }
    } else {
        n as f64 * (x * p_curr - p_prev) / (x * x - 1.0)
    };

    (p_curr, dp)
}

/// Associated Legendre function P_l^m(x) for 0 <= m <= l, |x| <= 1.
///
/// Includes the Condon-Shortley phase (-1)^m:
/// P_m^m(x) = (-1)^m (2m-1)!! (1-x^2)^{m/2}
/// P_{m+1}^m(x) = x (2m+1) P_m^m(x)
/// (l-m) P_l^m(x) = (2l-1) x P_{l-1}^m(x) - (l+m-1) P_{l-2}^m(x)
///
/// Returns 0 for m > l.
pub fn associated_legendre(l: usize, m: usize, x: f64) -> f64 {
    if m > l {
        return 0.0;
    }

    let sin_theta = (1.0 - x * x).max(0.0).sqrt();
    let mut p_mm = 1.0;
    let mut odd = 1.0;
    for _ in 0..m {
        p_mm *= -odd * sin_theta;
        odd += 2.0;
    }
    if l == m {
        return p_mm;
    }

    let mut p_prev = p_mm;
    let mut p_curr = x * (2 * m + 1) as f64 * p_mm;
    for ll in (m + 2)..=l {
        let p_next = ((2 * ll - 1) as f64 * x * p_curr - (ll + m - 1) as f64 * p_prev)
            / (ll - m) as f64;
        p_prev = p_curr;
        p_curr = p_next;
    }
    p_curr
}
