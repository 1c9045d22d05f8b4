//! Trait definitions for subcell flux limiters.

use crate::equations::Equations2D;
use crate::error::LimiterError;
use crate::mesh::StructuredMesh2D;
use crate::operators::SubcellOperators;

use super::super::antidiffusive::FluxSign;
use super::super::bounds::{BoundsLayout, VariableBounds};
use super::super::containers::SubcellData;
use super::super::state::SystemSolution2D;

/// Read-only inputs shared by all limiter computations.
pub struct LimiterContext<'a, E> {
    /// The mesh
    pub mesh: &'a StructuredMesh2D,
    /// Subcell operators
    pub ops: &'a SubcellOperators,
    /// Physics
    pub equations: &'a E,
    /// `[2/dx, 2/dy]`
    pub inverse_jacobian: [f64; 2],
}

impl<'a, E> Clone for LimiterContext<'a, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, E> Copy for LimiterContext<'a, E> {}

impl<'a, E> std::fmt::Debug for LimiterContext<'a, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LimiterContext")
            .field("n_elements", &self.mesh.n_elements)
            .field("order", &self.ops.order)
            .finish()
    }
}

impl<'a, E> LimiterContext<'a, E> {
    /// Create a new limiter context.
    pub fn new(mesh: &'a StructuredMesh2D, ops: &'a SubcellOperators, equations: &'a E) -> Self {
        Self {
            mesh,
            ops,
            equations,
            inverse_jacobian: mesh.inverse_jacobian(),
        }
    }
}

/// When a limiter's correction is applied within a Runge-Kutta stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CorrectionStage {
    /// Limited antidiffusive fluxes are added to the residual before the update
    Inline,
    /// The low-order update is computed first and corrected afterwards
    APosteriori,
}

/// A subcell flux limiter.
///
/// Per stage the solver computes bar states and the antidiffusive fluxes
/// (oriented by [`SubcellLimiter::flux_sign`]), then calls
/// [`compute_bounds`](SubcellLimiter::compute_bounds),
/// [`limit`](SubcellLimiter::limit) and [`correct`](SubcellLimiter::correct)
/// in this order, either on the residual ([`CorrectionStage::Inline`]) or on
/// the low-order updated state ([`CorrectionStage::APosteriori`]).
///
/// # Implementation Notes
///
/// - `limit` must never let a constraint pass relax limiting that an earlier
///   pass required
/// - none of the methods allocate in the hot path or log
pub trait SubcellLimiter<const N: usize, E: Equations2D<N>>: Send + Sync {
    /// Human-readable name for logging.
    fn name(&self) -> &'static str;

    /// Where the correction is applied.
    fn stage(&self) -> CorrectionStage;

    /// Orientation of the stored antidiffusive flux.
    fn flux_sign(&self) -> FluxSign;

    /// Antidiffusive flux of the subcell flux pair (fhat, fstar).
    #[inline]
    fn build_antidiffusive_flux(&self, fhat: &[f64; N], fstar: &[f64; N]) -> [f64; N] {
        self.flux_sign().apply(fhat, fstar)
    }

    /// Keys of the node bounds, in deviation-log order.
    fn bounds_layout(&self) -> &BoundsLayout;

    /// Node bounds of the current stage.
    fn bounds(&self) -> &VariableBounds;

    /// Compute the node bounds from `u` and the stage's bar states.
    fn compute_bounds(&mut self, ctx: &LimiterContext<'_, E>, data: &SubcellData<N>, u: &SystemSolution2D<N>);

    /// Limit the antidiffusive fluxes of `data`.
    ///
    /// `u` is the stage state (inline) or the low-order updated state
    /// (a posteriori).
    fn limit(
        &mut self,
        ctx: &LimiterContext<'_, E>,
        data: &mut SubcellData<N>,
        u: &SystemSolution2D<N>,
        dt: f64,
    ) -> Result<(), LimiterError>;

    /// Add `dt` times the divergence of the limited antidiffusive fluxes to `target`.
    fn correct(
        &self,
        ctx: &LimiterContext<'_, E>,
        data: &SubcellData<N>,
        target: &mut SystemSolution2D<N>,
        dt: f64,
    );

    /// Largest deviation of the corrected state from the bounds, per key.
    ///
    /// `u` is the corrected state, `deviations` has one slot per key of
    /// [`SubcellLimiter::bounds_layout`] and is overwritten.
    fn measure_deviations(
        &self,
        ctx: &LimiterContext<'_, E>,
        data: &SubcellData<N>,
        u: &SystemSolution2D<N>,
        deviations: &mut [f64],
    );
}
