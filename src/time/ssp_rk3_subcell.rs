//! SSP-RK3 time integration with subcell limiting.
//!
//! Shu-Osher form, every stage a forward Euler step followed by the stage hook
//! of the solver, then the convex combination:
//!
//! ```text
//! u1 = hook(u  + dt L(u))
//! u2 = 3/4 u + 1/4 hook(u1 + dt L(u1))
//! u  = 1/3 u + 2/3 hook(u2 + dt L(u2))
//! ```
//!
//! The hook applies a-posteriori limiting to the forward Euler state, so the
//! bounds of every stage hold before the convex combination and are kept by it.

use crate::equations::Equations2D;
use crate::error::{ConfigError, SimulationError};
use crate::solver::{SubcellLimiter, SubcellSolver, SystemSolution2D};

/// Configuration of a subcell-limited run.
#[derive(Clone, Debug, PartialEq)]
pub struct SubcellTimeConfig {
    /// End time
    pub t_final: f64,
    /// CFL number of the low-order scheme, in (0, 1]
    pub cfl: f64,
    /// Optional cap on the number of steps
    pub max_steps: Option<usize>,
}

impl SubcellTimeConfig {
    pub fn new(t_final: f64, cfl: f64) -> Self {
        Self {
            t_final,
            cfl,
            max_steps: None,
        }
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = Some(max_steps);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.cfl > 0.0 && self.cfl <= 1.0) {
            return Err(ConfigError::Cfl(self.cfl));
        }
        Ok(())
    }
}

/// Outcome of [`run_subcell_simulation`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RunSummary {
    /// Final time reached
    pub time: f64,
    /// Number of steps taken
    pub steps: usize,
    /// Smallest time step used
    pub min_dt: f64,
    /// Largest time step used
    pub max_dt: f64,
}

/// Advance `u` from `t` to `t + dt` with one SSP-RK3 step.
pub fn ssp_rk3_subcell_step<const N: usize, E, L>(
    solver: &mut SubcellSolver<N, E, L>,
    u: &mut SystemSolution2D<N>,
    t: f64,
    dt: f64,
) -> Result<(), SimulationError>
where
    E: Equations2D<N> + 'static,
    L: SubcellLimiter<N, E>,
{
    if !(dt > 0.0 && dt.is_finite()) {
        return Err(SimulationError::InvalidTimeStep { dt, time: t });
    }
    let mut du = solver.zero_solution();

    // Stage 1: u1 = u + dt L(u)
    solver.rhs(u, t, &mut du)?;
    let mut u1 = u.clone();
    u1.axpy(dt, &du);
    solver.limit_and_correct(&mut u1, t + dt, dt)?;

    // Stage 2: u2 = 3/4 u + 1/4 (u1 + dt L(u1))
    solver.rhs(&u1, t + dt, &mut du)?;
    let mut u2 = u1;
    u2.axpy(dt, &du);
    solver.limit_and_correct(&mut u2, t + dt, dt)?;
    u2.combine(0.25, 0.75, u);

    // Stage 3: u = 1/3 u + 2/3 (u2 + dt L(u2))
    solver.rhs(&u2, t + 0.5 * dt, &mut du)?;
    let mut u3 = u2;
    u3.axpy(dt, &du);
    solver.limit_and_correct(&mut u3, t + 0.5 * dt, dt)?;
    u.combine(1.0 / 3.0, 2.0 / 3.0, &u3);

    Ok(())
}

/// Run from `t = 0` to `config.t_final` with CFL-limited steps.
///
/// Opens the bounds check before the first step, reports after every step and
/// logs its summary at the end.
pub fn run_subcell_simulation<const N: usize, E, L>(
    solver: &mut SubcellSolver<N, E, L>,
    u: &mut SystemSolution2D<N>,
    config: &SubcellTimeConfig,
) -> Result<RunSummary, SimulationError>
where
    E: Equations2D<N> + 'static,
    L: SubcellLimiter<N, E>,
{
    config.validate()?;
    solver.init_diagnostics()?;

    let mut summary = RunSummary {
        time: 0.0,
        steps: 0,
        min_dt: f64::INFINITY,
        max_dt: 0.0,
    };
    let end_tolerance = f64::EPSILON * config.t_final.abs().max(1.0);
    while config.t_final - summary.time > end_tolerance {
        if config.max_steps.is_some_and(|max| summary.steps >= max) {
            log::warn!(
                "Stopping after {} steps at t = {:.6e} before t_final = {:.6e}",
                summary.steps,
                summary.time,
                config.t_final
            );
            break;
        }
        let t = summary.time;
        let remaining = config.t_final - t;
        let dt = solver.max_dt(u, config.cfl).min(remaining);
        ssp_rk3_subcell_step(solver, u, t, dt)?;

        summary.time = if dt == remaining { config.t_final } else { t + dt };
        summary.steps += 1;
        summary.min_dt = summary.min_dt.min(dt);
        summary.max_dt = summary.max_dt.max(dt);
        solver.report_step(summary.steps, summary.time)?;
    }

    solver.finalize_diagnostics()?;
    log::info!(
        "Reached t = {:.6e} in {} steps (dt in [{:.3e}, {:.3e}])",
        summary.time,
        summary.steps,
        summary.min_dt,
        summary.max_dt
    );
    Ok(summary)
}
