//! Runtime diagnostics of the limiting engine.
//!
//! - [`BoundsCheckCallback`]: deviation of the corrected solution from the
//!   limiter bounds, logged and optionally written to `deviations.txt`
//! - [`node_deviations`], [`face_deviations`]: the per-stage measurements
//!   behind it, for node-based (IDP) and face-based (MCL) limiters

mod bounds_check;

pub use bounds_check::{
    BoundsCheckCallback, BoundsCheckConfig, DEVIATIONS_FILE, DeviationTracker, face_deviations,
    node_deviations,
};
