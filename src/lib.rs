//! # dg-subcell
//!
//! Subcell flux limiting for discontinuous Galerkin spectral-element schemes
//! in flux-differencing form.
//!
//! A high-order DGSEM volume integral is rewritten as subcell fluxes between
//! neighbouring Gauss-Lobatto nodes and blended, face by face, with a robust
//! low-order local Lax-Friedrichs scheme. The blending keeps every node inside
//! local bounds (positivity of density and pressure, local maximum principles,
//! entropy bounds) at every Runge-Kutta stage.
//!
//! This crate provides:
//! - Gauss-Lobatto nodes, weights and the split-form derivative operator
//! - A structured Cartesian mesh with periodic or physical boundaries
//! - The compressible Euler equations behind the [`Equations2D`] trait
//! - Bar states, antidiffusive fluxes and local bounds of subcell faces
//! - Two limiters: invariant-domain preserving ([`IdpLimiter`]) and
//!   monolithic convex limiting ([`MclLimiter`])
//! - A bounds check writing `deviations.txt`
//! - SSP-RK3 time integration with the limiter stage hook
//!
//! # Example
//!
//! ```no_run
//! use dg_subcell::{
//!     BoundaryConditions2D, CompressibleEuler2D, Equations2D, IdpConfig, IdpLimiter,
//!     StructuredMesh2D, SubcellConfig, SubcellOperators, SubcellSolver, SubcellTimeConfig,
//!     SystemSolution2D, run_subcell_simulation,
//! };
//!
//! let mesh = StructuredMesh2D::periodic((0.0, 1.0), (0.0, 1.0), 16, 16)?;
//! let ops = SubcellOperators::new(3)?;
//! let eq = CompressibleEuler2D::new(1.4);
//! let limiter = IdpLimiter::new(IdpConfig::positivity(), &eq.varnames(), mesh.n_elements, ops.n_nodes_1d)?;
//! let mut u = SystemSolution2D::from_function(&mesh, &ops, |x, _| eq.prim2cons(1.0 + 0.5 * x, 0.1, 0.0, 1.0));
//! let mut solver = SubcellSolver::new(mesh, ops, eq, BoundaryConditions2D::periodic(), limiter, SubcellConfig::default())?;
//! run_subcell_simulation(&mut solver, &mut u, &SubcellTimeConfig::new(0.1, 0.5))?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod boundary;
pub mod equations;
pub mod error;
pub mod flux;
pub mod mesh;
pub mod operators;
pub mod polynomial;
pub mod solver;
pub mod time;
pub mod types;

// Re-export main types for convenience
pub use boundary::{
    BoundaryCondition2D, BoundaryConditions2D, BoundaryContext, Dirichlet2D, Extrapolation2D,
    FixedState2D, SlipWall2D,
};
pub use equations::{CompressibleEuler2D, Equations2D};
pub use error::{ConfigError, DiagnosticsError, LimiterError, SimulationError};
pub use flux::{VolumeFlux, lax_friedrichs_flux};
pub use mesh::StructuredMesh2D;
pub use operators::SubcellOperators;
pub use solver::{
    AlphaRecorder, BoundKey, BoundSource, BoundsCheckCallback, BoundsCheckConfig, IdpConfig,
    IdpLimiter, LimiterConfig, LimiterObserver, MclConfig, MclLimiter, NoObserver,
    PressureLimiter, StandardSubcellLimiter, SubcellConfig, SubcellLimiter, SubcellSolver,
    SystemSolution2D,
};
pub use time::{RunSummary, SubcellTimeConfig, run_subcell_simulation, ssp_rk3_subcell_step};
pub use types::{Direction, ElementIndex, Side, SideBoundaries};
