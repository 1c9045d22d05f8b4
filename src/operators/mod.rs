//! Nodal DG operators on GLL nodes.
//!
//! - [`SubcellOperators`]: weights, inverse weights and the split-form
//!   derivative matrix used to build high-order subcell fluxes
//! - free functions for the Lagrange and split differentiation matrices

mod differentiation;
mod subcell;

pub use differentiation::{
    barycentric_weights, differentiation_matrix, split_differentiation_matrix,
};
pub use subcell::SubcellOperators;
