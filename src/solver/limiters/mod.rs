//! Subcell flux limiters.
//!
//! Both limiters blend the high-order flux-differencing fluxes with the
//! low-order local Lax-Friedrichs fluxes face by face:
//!
//! - [`IdpLimiter`]: invariant-domain preserving, corrects the low-order
//!   update a posteriori through face blending coefficients α
//! - [`MclLimiter`]: monolithic convex limiting, clamps the antidiffusive
//!   fluxes inline before they enter the residual
//!
//! - [`SubcellLimiter`]: common trait used by the semidiscretization
//! - [`StandardSubcellLimiter`]: enum for zero-cost runtime selection

mod config;
mod idp;
mod mcl;
mod newton;
mod observer;
mod standard;
mod traits;

pub use config::{IdpConfig, MclConfig, PressureLimiter};
pub use idp::{IdpLimiter, NonlinearConstraint, commit_newton_alpha, zalesak_coefficient};
pub use mcl::{MclLimiter, clamp_to_bounds};
pub use newton::{GoalCheck, NewtonOutcome, NewtonSettings, solve_beta};
pub use observer::{AlphaRecord, AlphaRecorder, LimitedQuantity, LimiterObserver, NoObserver};
pub use standard::{LimiterConfig, StandardSubcellLimiter};
pub use traits::{CorrectionStage, LimiterContext, SubcellLimiter};
