//! Nodal differentiation operators.
//!
//! The Lagrange differentiation matrix `D[i,j] = l'_j(x_i)` is built from
//! barycentric weights, which avoids forming a Vandermonde matrix:
//!
//! - `D[i,j] = (λ_j / λ_i) / (x_i - x_j)` for `i ≠ j`
//! - `D[i,i] = -Σ_{j≠i} D[i,j]` (negative sum trick, exact on constants)

use faer::Mat;

/// Barycentric weights `λ_j = 1 / Π_{k≠j} (x_j - x_k)`.
pub fn barycentric_weights(nodes: &[f64]) -> Vec<f64> {
    let n = nodes.len();
    (0..n)
        .map(|j| {
            let prod: f64 = (0..n)
                .filter(|&k| k != j)
                .map(|k| nodes[j] - nodes[k])
                .product();
            1.0 / prod
        })
        .collect()
}

/// Lagrange differentiation matrix `(du/dx)_i = Σ_j D[i,j] u_j`.
pub fn differentiation_matrix(nodes: &[f64]) -> Mat<f64> {
    let n = nodes.len();
    let bary = barycentric_weights(nodes);
    let mut d = Mat::zeros(n, n);

    for i in 0..n {
        let mut diag = 0.0;
        for j in 0..n {
            if i != j {
                let value = (bary[j] / bary[i]) / (nodes[i] - nodes[j]);
                d[(i, j)] = value;
                diag -= value;
            }
        }
        d[(i, i)] = diag;
    }

    d
}

/// Split-form operator used for flux differencing on GLL nodes.
///
/// `Dsplit = 2 D` with the boundary corrections `Dsplit[0,0] += 1/w_0` and
/// `Dsplit[n-1,n-1] -= 1/w_{n-1}`. With the SBP property `W D + (W D)^T = B`
/// this makes `Σ_i w_i Σ_m Dsplit[i,m] f(u_i, u_m) = 0` for any symmetric
/// two-point flux, so the cumulative subcell flux vanishes at both element ends.
pub fn split_differentiation_matrix(d: &Mat<f64>, weights: &[f64]) -> Mat<f64> {
    let n = d.nrows();
    let mut split = Mat::zeros(n, n);
    for i in 0..n {
        for j in 0..n {
            split[(i, j)] = 2.0 * d[(i, j)];
        }
    }
    split[(0, 0)] += 1.0 / weights[0];
    split[(n - 1, n - 1)] -= 1.0 / weights[n - 1];
    split
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polynomial::{gauss_lobatto_nodes, gauss_lobatto_weights};

    #[test]
    fn test_differentiation_exact_for_polynomials() {
        for order in 1..=6 {
            let nodes = gauss_lobatto_nodes(order);
            let d = differentiation_matrix(&nodes);
            let n = order + 1;
            // u = x^order, u' = order x^(order-1)
            for i in 0..n {
                let mut deriv = 0.0;
                for j in 0..n {
                    deriv += d[(i, j)] * nodes[j].powi(order as i32);
                }
                let exact = order as f64 * nodes[i].powi(order as i32 - 1);
                assert!((deriv - exact).abs() < 1e-10, "order {order}, node {i}");
            }
        }
    }

    #[test]
    fn test_sbp_property() {
        for order in 1..=6 {
            let nodes = gauss_lobatto_nodes(order);
            let w = gauss_lobatto_weights(order, &nodes);
            let d = differentiation_matrix(&nodes);
            let n = order + 1;
            for i in 0..n {
                for j in 0..n {
                    let q = w[i] * d[(i, j)] + w[j] * d[(j, i)];
                    let b = if i == 0 && j == 0 {
                        -1.0
                    } else if i == n - 1 && j == n - 1 {
                        1.0
                    } else {
                        0.0
                    };
                    assert!((q - b).abs() < 1e-12, "order {order}, ({i},{j}): {q}");
                }
            }
        }
    }

    #[test]
    fn test_split_rows_with_weights_cancel() {
        let order = 4;
        let nodes = gauss_lobatto_nodes(order);
        let w = gauss_lobatto_weights(order, &nodes);
        let d = differentiation_matrix(&nodes);
        let split = split_differentiation_matrix(&d, &w);
        // Constant two-point flux: Σ_i w_i Σ_m Dsplit[i,m] = 0
        let mut total = 0.0;
        for i in 0..=order {
            for m in 0..=order {
                total += w[i] * split[(i, m)];
            }
        }
        assert!(total.abs() < 1e-12);
    }
}
