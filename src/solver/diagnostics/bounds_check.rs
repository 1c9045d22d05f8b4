//! Bounds check of the limited solution.
//!
//! After every stage the corrected quantities are compared against the bounds
//! the limiter computed for that stage. Deviations are only reported, never
//! treated as errors: a tiny positive deviation is round-off, a large one
//! points at a limiter or time-step problem.
//!
//! # Output
//!
//! With `save_errors` enabled, `deviations.txt` in the output directory gets
//! the header `# iter, simu_time, <key>, ...` and one row per report holding
//! the largest deviation of every key since the previous report.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use crate::equations::Equations2D;
use crate::error::{ConfigError, DiagnosticsError};
use crate::types::{Direction, ElementIndex};

use super::super::bounds::{BoundKey, BoundsLayout, VariableBounds};
use super::super::containers::SubcellData;
use super::super::limiters::LimiterContext;
use super::super::state::SystemSolution2D;

/// Name of the deviation log inside the output directory.
pub const DEVIATIONS_FILE: &str = "deviations.txt";

#[inline]
fn deviation(key: BoundKey, bound: f64, value: f64) -> f64 {
    if key.is_lower() { bound - value } else { value - bound }
}

/// Largest deviation of node values of `u` from node bounds, per key.
///
/// Used by limiters that correct node values (IDP). `out` has one slot per key
/// of `layout` and is overwritten; deviations inside the bounds count as 0.
pub fn node_deviations<const N: usize, E: Equations2D<N>>(
    ctx: &LimiterContext<'_, E>,
    layout: &BoundsLayout,
    bounds: &VariableBounds,
    u: &SystemSolution2D<N>,
    out: &mut [f64],
) {
    out.fill(0.0);
    let n_nodes = ctx.ops.n_nodes;
    for k in ElementIndex::iter(u.n_elements) {
        for node in 0..n_nodes {
            let state = u.get(k, node);
            for (q, key) in layout.keys().iter().enumerate() {
                let value = key.quantity(ctx.equations, &state);
                let d = deviation(*key, bounds.get(q, k, node), value);
                out[q] = out[q].max(d);
            }
        }
    }
}

/// Largest deviation of the limited bar states from node bounds, per key.
///
/// Used by limiters that clamp face fluxes (MCL). Both limited bar states
/// `ū ± a/λ` of every interior subcell face are checked against the bounds of
/// their node. Positivity keys compare against `beta` times the bar state
/// value, the pressure key against `beta ρ̄ p̄` in terms of `ρ p`.
pub fn face_deviations<const N: usize, E: Equations2D<N>>(
    ctx: &LimiterContext<'_, E>,
    layout: &BoundsLayout,
    bounds: &VariableBounds,
    data: &SubcellData<N>,
    beta: f64,
    out: &mut [f64],
) {
    out.fill(0.0);
    let equations = ctx.equations;
    let n = ctx.ops.n_nodes_1d;
    let rho_p = |u: &[f64; N]| equations.density(u) * equations.pressure(u);
    for (k, elem) in data.elements.iter().enumerate() {
        let k = ElementIndex::new(k);
        for dir in Direction::ALL {
            for line in 0..n {
                for position in 1..n {
                    let f = elem.face(dir, position, line);
                    let (node_l, node_r) = match dir {
                        Direction::X => (line * n + position - 1, line * n + position),
                        Direction::Y => ((position - 1) * n + line, position * n + line),
                    };
                    let lambda = elem.lambdas(dir)[f];
                    let bar = &elem.bar_states(dir)[f];
                    let a = &elem.antiflux(dir)[f];
                    let left: [f64; N] = std::array::from_fn(|v| bar[v] + a[v] / lambda);
                    let right: [f64; N] = std::array::from_fn(|v| bar[v] - a[v] / lambda);
                    for (q, key) in layout.keys().iter().enumerate() {
                        for (state, node) in [(&left, node_l), (&right, node_r)] {
                            let d = match *key {
                                BoundKey::Positivity(v) => beta * bar[v] - state[v],
                                BoundKey::PressurePositivity => beta * rho_p(bar) - rho_p(state),
                                _ => deviation(
                                    *key,
                                    bounds.get(q, k, node),
                                    key.quantity(equations, state),
                                ),
                            };
                            out[q] = out[q].max(d);
                        }
                    }
                }
            }
        }
    }
}

/// Per key, the largest deviation of the current report interval and of the run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DeviationTracker {
    current: Vec<f64>,
    max: Vec<f64>,
}

impl DeviationTracker {
    pub fn new(n_keys: usize) -> Self {
        Self {
            current: vec![0.0; n_keys],
            max: vec![0.0; n_keys],
        }
    }

    /// Fold one stage's deviations into both maxima.
    pub fn record(&mut self, deviations: &[f64]) {
        for ((current, max), &d) in self.current.iter_mut().zip(&mut self.max).zip(deviations) {
            *current = current.max(d);
            *max = max.max(d);
        }
    }

    /// Start a new report interval.
    pub fn reset_current(&mut self) {
        self.current.fill(0.0);
    }

    pub fn current(&self) -> &[f64] {
        &self.current
    }

    /// Running maximum over the whole run.
    pub fn max(&self) -> &[f64] {
        &self.max
    }

    pub fn len(&self) -> usize {
        self.current.len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }
}

/// Configuration of the bounds check.
#[derive(Clone, Debug, PartialEq)]
pub struct BoundsCheckConfig {
    /// Write `deviations.txt`
    pub save_errors: bool,
    /// Report every `interval` time steps
    pub interval: usize,
    /// Directory of the deviation log
    pub output_directory: PathBuf,
    /// Deviations above this value are logged as warnings
    pub tolerance: f64,
}

impl Default for BoundsCheckConfig {
    fn default() -> Self {
        Self {
            save_errors: false,
            interval: 1,
            output_directory: PathBuf::from("out"),
            tolerance: 1e-10,
        }
    }
}

impl BoundsCheckConfig {
    /// Enable the deviation log in `directory`.
    pub fn with_output(mut self, directory: impl Into<PathBuf>) -> Self {
        self.save_errors = true;
        self.output_directory = directory.into();
        self
    }

    pub fn with_interval(mut self, interval: usize) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval == 0 {
            return Err(ConfigError::ReportInterval);
        }
        Ok(())
    }
}

/// Accumulates limiter deviations over stages and reports them per interval.
#[derive(Debug)]
pub struct BoundsCheckCallback {
    config: BoundsCheckConfig,
    names: Vec<String>,
    tracker: DeviationTracker,
    log: Option<BufWriter<File>>,
}

impl BoundsCheckCallback {
    pub fn new(config: BoundsCheckConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            names: Vec::new(),
            tracker: DeviationTracker::default(),
            log: None,
        })
    }

    /// Prepare for a run over the bound keys `names`.
    ///
    /// Creates the output directory and writes the log header when
    /// `save_errors` is set.
    pub fn init(&mut self, names: &[String]) -> Result<(), DiagnosticsError> {
        self.names = names.to_vec();
        self.tracker = DeviationTracker::new(names.len());
        if self.config.save_errors {
            fs::create_dir_all(&self.config.output_directory)?;
            let path = self.config.output_directory.join(DEVIATIONS_FILE);
            let mut writer = BufWriter::new(File::create(&path)?);
            write!(writer, "# iter, simu_time")?;
            for name in &self.names {
                write!(writer, ", {name}")?;
            }
            writeln!(writer)?;
            writer.flush()?;
            log::info!("Bounds check writes {}", path.display());
            self.log = Some(writer);
        }
        Ok(())
    }

    /// Fold the deviations of one stage.
    pub fn record(&mut self, deviations: &[f64]) {
        self.tracker.record(deviations);
    }

    /// End of time step `iter`: report the interval maxima if due.
    pub fn report(&mut self, iter: usize, time: f64) -> Result<(), DiagnosticsError> {
        if iter % self.config.interval != 0 {
            return Ok(());
        }
        let current = self.tracker.current();
        let row = self
            .names
            .iter()
            .zip(current)
            .map(|(name, d)| format!("{name}={d:.3e}"))
            .collect::<Vec<_>>()
            .join(" ");
        log::debug!("Bounds check iter={iter} t={time:.6e} {row}");
        for (name, &d) in self.names.iter().zip(current) {
            if d > self.config.tolerance {
                log::warn!(
                    "Bound {name} exceeded by {d:.3e} at iter={iter} t={time:.6e} (tolerance {:.1e})",
                    self.config.tolerance
                );
            }
        }
        if let Some(writer) = self.log.as_mut() {
            write!(writer, "{iter}, {time:.12e}")?;
            for d in current {
                write!(writer, ", {d:.12e}")?;
            }
            writeln!(writer)?;
            writer.flush()?;
        }
        self.tracker.reset_current();
        Ok(())
    }

    /// Log the run maxima and close the log.
    pub fn finalize(&mut self) -> Result<(), DiagnosticsError> {
        log::info!("Maximum deviation from bounds:");
        for (name, d) in self.names.iter().zip(self.tracker.max()) {
            log::info!("  {name}: {d:.6e}");
        }
        if let Some(mut writer) = self.log.take() {
            writer.flush()?;
        }
        Ok(())
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn tracker(&self) -> &DeviationTracker {
        &self.tracker
    }

    pub fn config(&self) -> &BoundsCheckConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equations::CompressibleEuler2D;
    use crate::mesh::StructuredMesh2D;
    use crate::operators::SubcellOperators;
    use crate::solver::bounds::BoundKey;

    fn names() -> Vec<String> {
        vec!["rho_min".to_string(), "rho_max".to_string()]
    }

    #[test]
    fn test_tracker_current_resets_max_persists() {
        let mut tracker = DeviationTracker::new(2);
        tracker.record(&[1e-3, 0.0]);
        tracker.record(&[5e-4, 2e-3]);
        assert_eq!(tracker.current(), &[1e-3, 2e-3]);
        tracker.reset_current();
        tracker.record(&[1e-5, 0.0]);
        assert_eq!(tracker.current(), &[1e-5, 0.0]);
        assert_eq!(tracker.max(), &[1e-3, 2e-3]);
    }

    #[test]
    fn test_zero_interval_rejected() {
        let config = BoundsCheckConfig::default().with_interval(0);
        assert_eq!(
            BoundsCheckCallback::new(config).unwrap_err(),
            ConfigError::ReportInterval
        );
    }

    #[test]
    fn test_log_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("run");
        let config = BoundsCheckConfig::default().with_output(&out).with_interval(2);
        let mut callback = BoundsCheckCallback::new(config).unwrap();
        callback.init(&names()).unwrap();

        callback.record(&[1e-3, 0.0]);
        callback.report(1, 0.1).unwrap();
        callback.record(&[0.0, 4e-4]);
        callback.report(2, 0.2).unwrap();
        callback.record(&[2e-5, 0.0]);
        callback.report(4, 0.4).unwrap();
        callback.finalize().unwrap();

        let text = fs::read_to_string(out.join(DEVIATIONS_FILE)).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "# iter, simu_time, rho_min, rho_max");
        assert_eq!(lines.len(), 3);
        let row: Vec<f64> = lines[1].split(", ").map(|v| v.parse().unwrap()).collect();
        assert_eq!(row[0], 2.0);
        assert!((row[1] - 0.2).abs() < 1e-12);
        // step 1 was not reported, its deviation carries into the row of step 2
        assert_eq!(row[2], 1e-3);
        assert_eq!(row[3], 4e-4);
        let row: Vec<f64> = lines[2].split(", ").map(|v| v.parse().unwrap()).collect();
        assert_eq!(row[2], 2e-5);
        assert_eq!(row[3], 0.0);
        assert_eq!(callback.tracker().max(), &[1e-3, 4e-4]);
    }

    #[test]
    fn test_no_file_without_save_errors() {
        let dir = tempfile::tempdir().unwrap();
        let config = BoundsCheckConfig {
            output_directory: dir.path().join("never"),
            ..BoundsCheckConfig::default()
        };
        let mut callback = BoundsCheckCallback::new(config).unwrap();
        callback.init(&names()).unwrap();
        callback.record(&[1.0, 1.0]);
        callback.report(1, 0.0).unwrap();
        assert!(!dir.path().join("never").exists());
    }

    #[test]
    fn test_node_deviations_measure_outside_only() {
        let mesh = StructuredMesh2D::periodic((0.0, 1.0), (0.0, 1.0), 1, 1).unwrap();
        let ops = SubcellOperators::new(1).unwrap();
        let eq = CompressibleEuler2D::new(1.4);
        let ctx = LimiterContext::new(&mesh, &ops, &eq);
        let layout = BoundsLayout::new(
            vec![BoundKey::LocalMin(0), BoundKey::LocalMax(0)],
            &["rho", "rho_v1", "rho_v2", "rho_e"],
        );
        let mut bounds = VariableBounds::new(1, ops.n_nodes, 2);
        bounds.data[..4].fill(0.9);
        bounds.data[4..].fill(1.1);
        let mut u = SystemSolution2D::<4>::new(1, ops.n_nodes);
        for node in 0..ops.n_nodes {
            u.set(ElementIndex::new(0), node, eq.prim2cons(1.0, 0.0, 0.0, 1.0));
        }
        u.set(ElementIndex::new(0), 3, eq.prim2cons(1.25, 0.0, 0.0, 1.0));
        let mut out = [0.0; 2];
        node_deviations(&ctx, &layout, &bounds, &u, &mut out);
        assert_eq!(out[0], 0.0);
        assert!((out[1] - 0.15).abs() < 1e-14);
    }
}
