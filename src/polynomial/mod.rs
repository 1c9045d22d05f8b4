//! Polynomial evaluation and node generation.
//!
//! - 1D Legendre polynomials and their derivatives
//! - 1D Gauss-Lobatto-Legendre (GLL) nodes and weights

mod legendre;
mod nodes;

pub use legendre::{legendre, legendre_derivative, legendre_pair};
pub use nodes::{gauss_lobatto_nodes, gauss_lobatto_weights};
