//! Tensor-product GLL operators for subcell flux differencing.

use super::differentiation::{differentiation_matrix, split_differentiation_matrix};
use crate::error::ConfigError;
use crate::polynomial::{gauss_lobatto_nodes, gauss_lobatto_weights};
use faer::Mat;

/// Nodal basis data needed by the subcell limiting engine.
///
/// The element is the tensor product of `n_nodes_1d` GLL nodes per direction;
/// node `(i, j)` has flat index `j * n_nodes_1d + i`. Subcell faces in a
/// direction are numbered `0..=n_nodes_1d`, where face `i` separates node
/// `i - 1` from node `i` and faces `0`, `n_nodes_1d` lie on the element edges.
#[derive(Clone)]
pub struct SubcellOperators {
    /// Polynomial order N
    pub order: usize,
    /// Nodes per direction (N + 1)
    pub n_nodes_1d: usize,
    /// Nodes per element ((N + 1)²)
    pub n_nodes: usize,
    /// GLL nodes in [-1, 1]
    pub nodes: Vec<f64>,
    /// GLL quadrature weights (sum to 2)
    pub weights: Vec<f64>,
    /// Reciprocal quadrature weights
    pub inverse_weights: Vec<f64>,
    /// Lagrange differentiation matrix
    pub derivative: Mat<f64>,
    /// Split-form matrix for flux differencing
    pub derivative_split: Mat<f64>,
}

impl std::fmt::Debug for SubcellOperators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubcellOperators")
            .field("order", &self.order)
            .field("n_nodes_1d", &self.n_nodes_1d)
            .finish()
    }
}

impl SubcellOperators {
    /// Build operators for polynomial order `order` (at least 1).
    pub fn new(order: usize) -> Result<Self, ConfigError> {
        if order == 0 {
            return Err(ConfigError::InvalidOrder(order));
        }
        let nodes = gauss_lobatto_nodes(order);
        let weights = gauss_lobatto_weights(order, &nodes);
        let inverse_weights = weights.iter().map(|w| 1.0 / w).collect();
        let derivative = differentiation_matrix(&nodes);
        let derivative_split = split_differentiation_matrix(&derivative, &weights);
        let n_nodes_1d = order + 1;

        Ok(Self {
            order,
            n_nodes_1d,
            n_nodes: n_nodes_1d * n_nodes_1d,
            nodes,
            weights,
            inverse_weights,
            derivative,
            derivative_split,
        })
    }

    /// Flat node index of `(i, j)`.
    #[inline(always)]
    pub fn node(&self, i: usize, j: usize) -> usize {
        j * self.n_nodes_1d + i
    }

    /// Smallest quadrature weight (the endpoint weight for GLL).
    pub fn min_weight(&self) -> f64 {
        self.weights.iter().copied().fold(f64::INFINITY, f64::min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_zero_rejected() {
        assert!(SubcellOperators::new(0).is_err());
    }

    #[test]
    fn test_node_layout() {
        let ops = SubcellOperators::new(3).unwrap();
        assert_eq!(ops.n_nodes, 16);
        assert_eq!(ops.node(0, 0), 0);
        assert_eq!(ops.node(3, 0), 3);
        assert_eq!(ops.node(0, 1), 4);
        assert!((ops.min_weight() - ops.weights[0]).abs() < 1e-15);
    }

    #[test]
    fn test_inverse_weights() {
        let ops = SubcellOperators::new(4).unwrap();
        for (w, iw) in ops.weights.iter().zip(&ops.inverse_weights) {
            assert!((w * iw - 1.0).abs() < 1e-14);
        }
    }
}
