//! Legendre polynomial evaluation.
//!
//! P_n is orthogonal on [-1, 1] with unit weight. Only what the
//! Gauss-Lobatto construction needs is provided.

/// Evaluate P_n(x) with the three-term recurrence
/// `(k+1) P_{k+1} = (2k+1) x P_k - k P_{k-1}`.
pub fn legendre(n: usize, x: f64) -> f64 {
    legendre_pair(n, x).0
}

/// Evaluate `(P_n(x), P_{n-1}(x))` in a single recurrence sweep.
///
/// For `n == 0` the second entry is 0.
pub fn legendre_pair(n: usize, x: f64) -> (f64, f64) {
    if n == 0 {
        return (1.0, 0.0);
    }
    let mut p_prev = 1.0;
    let mut p_curr = x;
    for k in 1..n {
        let kf = k as f64;
        let p_next = ((2.0 * kf + 1.0) * x * p_curr - kf * p_prev) / (kf + 1.0);
        p_prev = p_curr;
        p_curr = p_next;
    }
    (p_curr, p_prev)
}

/// Evaluate P'_n(x).
///
/// Away from the endpoints `P'_n = n (x P_n - P_{n-1}) / (x² - 1)`; at x = ±1 the
/// closed form `(±1)^{n+1} n (n+1) / 2` is used.
pub fn legendre_derivative(n: usize, x: f64) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let nn = (n * (n + 1)) as f64 / 2.0;
    if (x - 1.0).abs() < 1e-14 {
        return nn;
    }
    if (x + 1.0).abs() < 1e-14 {
        return if n % 2 == 0 { -nn } else { nn };
    }
    let (p_n, p_nm1) = legendre_pair(n, x);
    n as f64 * (x * p_n - p_nm1) / (x * x - 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_low_order_closed_forms() {
        for &x in &[-0.9, -0.3, 0.0, 0.4, 1.0] {
            assert!((legendre(2, x) - 0.5 * (3.0 * x * x - 1.0)).abs() < 1e-14);
            assert!((legendre(3, x) - 0.5 * (5.0 * x * x * x - 3.0 * x)).abs() < 1e-14);
        }
    }

    #[test]
    fn test_derivative_matches_finite_difference() {
        let h = 1e-6;
        for n in 1..6 {
            for &x in &[-0.7, 0.1, 0.55] {
                let fd = (legendre(n, x + h) - legendre(n, x - h)) / (2.0 * h);
                assert!((legendre_derivative(n, x) - fd).abs() < 1e-6, "n={n}, x={x}");
            }
        }
    }

    #[test]
    fn test_endpoint_derivatives() {
        assert!((legendre_derivative(3, 1.0) - 6.0).abs() < 1e-14);
        assert!((legendre_derivative(2, -1.0) + 3.0).abs() < 1e-14);
    }
}
