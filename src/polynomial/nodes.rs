//! Gauss-Lobatto-Legendre nodes and weights.
//!
//! The N+1 GLL nodes are the roots of (1 - x²) P'_N(x). They contain both
//! endpoints, which makes the element-boundary nodes coincide with the
//! subcell faces at the element edges.

use super::legendre::{legendre, legendre_pair};
use std::f64::consts::PI;

const NEWTON_TOL: f64 = 1e-15;
const NEWTON_MAX_ITER: usize = 100;

/// Gauss-Lobatto-Legendre nodes for polynomial order `order` (ascending).
///
/// Interior nodes are found with Newton's method from Chebyshev-Lobatto
/// initial guesses, using `L_N = (1-x²) P'_N` and `L'_N = -N(N+1) P_N`.
pub fn gauss_lobatto_nodes(order: usize) -> Vec<f64> {
    if order == 0 {
        return vec![0.0];
    }

    let n = order;
    let nf = n as f64;
    let mut nodes: Vec<f64> = (0..=n).map(|j| -(PI * j as f64 / nf).cos()).collect();
    nodes[0] = -1.0;
    nodes[n] = 1.0;

    for x in nodes.iter_mut().take(n).skip(1) {
        for _ in 0..NEWTON_MAX_ITER {
            let (p_n, p_nm1) = legendre_pair(n, *x);
            // (1 - x²) P'_N = N (P_{N-1} - x P_N)
            let lobatto = nf * (p_nm1 - *x * p_n);
            let update = lobatto / (nf * (nf + 1.0) * p_n);
            *x += update;
            if update.abs() < NEWTON_TOL {
                break;
            }
        }
    }

    nodes
}

/// Gauss-Lobatto-Legendre weights `w_j = 2 / (N (N+1) P_N(x_j)²)`.
pub fn gauss_lobatto_weights(order: usize, nodes: &[f64]) -> Vec<f64> {
    if order == 0 {
        return vec![2.0];
    }
    let denom = (order * (order + 1)) as f64;
    nodes
        .iter()
        .map(|&x| {
            let p = legendre(order, x);
            2.0 / (denom * p * p)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nodes_symmetric_with_endpoints() {
        for order in 1..=7 {
            let nodes = gauss_lobatto_nodes(order);
            assert_eq!(nodes.len(), order + 1);
            assert_eq!(nodes[0], -1.0);
            assert_eq!(nodes[order], 1.0);
            for j in 0..=order {
                assert!((nodes[j] + nodes[order - j]).abs() < 1e-13);
            }
        }
    }

    #[test]
    fn test_weights_sum_to_two() {
        for order in 1..=7 {
            let nodes = gauss_lobatto_nodes(order);
            let sum: f64 = gauss_lobatto_weights(order, &nodes).iter().sum();
            assert!((sum - 2.0).abs() < 1e-13, "order {order}: {sum}");
        }
    }

    #[test]
    fn test_order_two_values() {
        let nodes = gauss_lobatto_nodes(2);
        let w = gauss_lobatto_weights(2, &nodes);
        assert!(nodes[1].abs() < 1e-15);
        assert!((w[0] - 1.0 / 3.0).abs() < 1e-14);
        assert!((w[1] - 4.0 / 3.0).abs() < 1e-14);
    }

    #[test]
    fn test_quadrature_exact_for_degree_2n_minus_1() {
        let order = 4;
        let nodes = gauss_lobatto_nodes(order);
        let w = gauss_lobatto_weights(order, &nodes);
        // ∫ x^6 dx over [-1, 1] = 2/7
        let integral: f64 = nodes.iter().zip(&w).map(|(x, w)| w * x.powi(6)).sum();
        assert!((integral - 2.0 / 7.0).abs() < 1e-13);
    }
}
