//! Error types.
//!
//! Setup problems are reported eagerly as [`ConfigError`] before any step runs.
//! [`LimiterError`] covers runtime conditions that abort a stage, and
//! [`DiagnosticsError`] the deviation log. [`SimulationError`] aggregates all of
//! them for the time loop.

use thiserror::Error;

use crate::types::ElementIndex;

/// Invalid configuration, detected at setup time.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Polynomial order below 1.
    #[error("Polynomial order must be at least 1, got {0}")]
    InvalidOrder(usize),

    /// Mesh without elements or with a degenerate extent.
    #[error("Invalid mesh: {0}")]
    InvalidMesh(String),

    /// Two options that cannot be active at the same time.
    #[error("Mutually exclusive options: {first} and {second}")]
    MutuallyExclusive {
        first: &'static str,
        second: &'static str,
    },

    /// Positivity correction factor outside [0, 1).
    #[error("Positivity correction factor must lie in [0, 1), got {0}")]
    CorrectionFactor(f64),

    /// Newton iteration cap of zero.
    #[error("Maximum number of Newton iterations must be positive")]
    NewtonIterations,

    /// Non-positive or non-finite Newton tolerance.
    #[error("Newton tolerance {name} must be positive and finite, got {value}")]
    NewtonTolerance { name: &'static str, value: f64 },

    /// Variable index outside `0..n_vars`.
    #[error("Variable index {index} out of range for {n_vars} variables")]
    VariableIndex { index: usize, n_vars: usize },

    /// Ratio bounds requested for the density itself.
    #[error("Variable {0} is the density and cannot be limited as a ratio")]
    RatioOfDensity(usize),

    /// Report interval of zero.
    #[error("Report interval must be positive")]
    ReportInterval,

    /// CFL number outside (0, 1].
    #[error("CFL number must lie in (0, 1], got {0}")]
    Cfl(f64),

    /// Limiter cannot be used with this mesh.
    #[error(
        "Limiter sized for {elements} elements of {nodes} nodes, mesh has {expected_elements} elements of {expected_nodes} nodes"
    )]
    LimiterSize {
        elements: usize,
        nodes: usize,
        expected_elements: usize,
        expected_nodes: usize,
    },

    /// Limiter configured without any constraint.
    #[error("Limiter has no active constraint")]
    NothingToLimit,
}

/// Runtime failure of the limiting engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LimiterError {
    /// A constraint pass tried to lower an already finalized α.
    ///
    /// This signals a non-monotone limiter and is never tolerated.
    #[error(
        "Limiting coefficient decreased at {element} node {node}: old {old:.6e}, new {new:.6e}"
    )]
    NonMonotoneAlpha {
        element: ElementIndex,
        node: usize,
        old: f64,
        new: f64,
    },

    /// The safe low-order state violates positivity itself.
    #[error("Low-order state is not admissible at {element} node {node}: {quantity} = {value:.6e}")]
    InvalidLowOrderState {
        element: ElementIndex,
        node: usize,
        quantity: &'static str,
        value: f64,
    },
}

/// Failure while writing the deviation log.
#[derive(Error, Debug)]
pub enum DiagnosticsError {
    /// Underlying file error.
    #[error("Deviation log I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Any error raised while advancing a simulation.
#[derive(Error, Debug)]
pub enum SimulationError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Limiter(#[from] LimiterError),

    #[error(transparent)]
    Diagnostics(#[from] DiagnosticsError),

    /// Time step became non-positive or non-finite.
    #[error("Invalid time step {dt:.6e} at t = {time:.6e}")]
    InvalidTimeStep { dt: f64, time: f64 },
}
