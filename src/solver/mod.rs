//! Subcell-limited DG solver components.
//!
//! # Submodules
//!
//! - [`state`]: solution container ([`SystemSolution2D`])
//! - [`containers`]: per-stage subcell face data
//! - [`bar_states`]: bar states and signal speeds of subcell faces
//! - [`antidiffusive`]: high-order and low-order subcell fluxes
//! - [`bounds`]: local bounds of the limited quantities
//! - [`limiters`]: IDP and MCL subcell limiters
//! - [`diagnostics`]: bounds check of the limited solution
//! - [`semidiscretization`]: the per-stage pipeline ([`SubcellSolver`])
//!
//! # Limiter Traits
//!
//! The [`SubcellLimiter`] trait is the seam between the semidiscretization and
//! the limiting policy:
//!
//! - [`IdpLimiter`]: a-posteriori blending with Zalesak and Newton-bisection
//! - [`MclLimiter`]: inline clamping of the antidiffusive fluxes
//! - [`StandardSubcellLimiter`]: enum for zero-cost dispatch

pub mod antidiffusive;
pub mod bar_states;
pub mod bounds;
pub mod containers;
pub mod diagnostics;
pub mod limiters;
mod parallel;
pub mod scratch;
pub mod semidiscretization;
pub mod state;

pub use antidiffusive::FluxSign;
pub use bar_states::LAMBDA_FLOOR;
pub use bounds::{BoundKey, BoundKind, BoundSource, BoundsCalculator, BoundsLayout, VariableBounds};
pub use containers::{ElementSubcellData, FaceBarStates, SubcellData};
pub use diagnostics::{BoundsCheckCallback, BoundsCheckConfig, DeviationTracker};
pub use limiters::{
    AlphaRecorder, CorrectionStage, IdpConfig, IdpLimiter, LimiterConfig, LimiterContext,
    LimiterObserver, MclConfig, MclLimiter, NoObserver, PressureLimiter, StandardSubcellLimiter,
    SubcellLimiter,
};
pub use scratch::{FluxScratch, ScratchArena};
pub use semidiscretization::{SubcellConfig, SubcellSolver};
pub use state::SystemSolution2D;
