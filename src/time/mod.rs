//! Time integration.
//!
//! - [`ssp_rk3_subcell_step`]: one SSP-RK3 step with the limiter stage hook
//! - [`run_subcell_simulation`]: CFL-limited run loop with bounds-check reporting

mod ssp_rk3_subcell;

pub use ssp_rk3_subcell::{
    RunSummary, SubcellTimeConfig, run_subcell_simulation, ssp_rk3_subcell_step,
};
