//! Numerical flux functions.
//!
//! - Two-point volume fluxes for flux differencing ([`VolumeFlux`])
//! - Local Lax-Friedrichs surface flux with an externally supplied signal speed
//!
//! The low-order subcell scheme and the element-interface coupling both use
//! [`lax_friedrichs_flux`] with the same signal speed as the bar states, so the
//! low-order update stays a convex combination of bar states.

mod surface;
mod volume;

pub use surface::lax_friedrichs_flux;
pub use volume::VolumeFlux;
