//! Boundary conditions.
//!
//! - [`BoundaryCondition2D`]: trait producing the exterior state at a boundary node
//! - [`FixedState2D`], [`Dirichlet2D`], [`Extrapolation2D`], [`SlipWall2D`]
//! - [`BoundaryConditions2D`]: one condition per domain side

mod conditions;

pub use conditions::{
    BoundaryCondition2D, BoundaryConditions2D, BoundaryContext, BoxedBoundaryCondition2D,
    Dirichlet2D, Extrapolation2D, FixedState2D, SlipWall2D,
};
