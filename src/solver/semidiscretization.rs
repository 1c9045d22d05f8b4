//! Subcell-limited flux-differencing semidiscretization.
//!
//! Per stage:
//! 1. bar states and signal speeds of all subcell faces
//! 2. per element: high-order and low-order subcell fluxes, the antidiffusive
//!    flux (oriented by the limiter) and the low-order residual
//! 3. inline limiters (MCL) compute bounds, limit and add the limited
//!    antidiffusive fluxes to the residual
//!
//! A-posteriori limiters (IDP) act after the time integrator has applied the
//! low-order residual, through [`SubcellSolver::limit_and_correct`], which also
//! feeds the bounds check.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::boundary::BoundaryConditions2D;
use crate::equations::Equations2D;
use crate::error::{ConfigError, DiagnosticsError, LimiterError};
use crate::flux::VolumeFlux;
use crate::mesh::StructuredMesh2D;
use crate::operators::SubcellOperators;
use crate::types::Direction;

use super::antidiffusive::{compute_element_fluxes, low_order_residual};
use super::bar_states::compute_bar_states;
use super::containers::SubcellData;
use super::diagnostics::{BoundsCheckCallback, BoundsCheckConfig};
use super::limiters::{CorrectionStage, LimiterContext, SubcellLimiter};
use super::parallel::{element_chunks, element_chunks_mut, elements_mut};
use super::scratch::ScratchArena;
use super::state::SystemSolution2D;

/// Configuration of the semidiscretization.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SubcellConfig {
    /// Two-point flux of the high-order volume integral
    pub volume_flux: VolumeFlux,
    /// Bounds check after every stage, disabled if `None`
    pub bounds_check: Option<BoundsCheckConfig>,
}

impl SubcellConfig {
    pub fn with_volume_flux(mut self, volume_flux: VolumeFlux) -> Self {
        self.volume_flux = volume_flux;
        self
    }

    pub fn with_bounds_check(mut self, config: BoundsCheckConfig) -> Self {
        self.bounds_check = Some(config);
        self
    }
}

/// DGSEM semidiscretization with subcell flux limiting.
pub struct SubcellSolver<const N: usize, E: Equations2D<N>, L: SubcellLimiter<N, E>> {
    pub mesh: StructuredMesh2D,
    pub ops: SubcellOperators,
    pub equations: E,
    pub boundary_conditions: BoundaryConditions2D<N, E>,
    pub limiter: L,
    volume_flux: VolumeFlux,
    data: SubcellData<N>,
    scratch: ScratchArena<N>,
    bounds_check: Option<BoundsCheckCallback>,
    deviations: Vec<f64>,
}

impl<const N: usize, E, L> SubcellSolver<N, E, L>
where
    E: Equations2D<N> + 'static,
    L: SubcellLimiter<N, E>,
{
    /// Create the solver. The limiter must be sized for `mesh` and `ops`.
    pub fn new(
        mesh: StructuredMesh2D,
        ops: SubcellOperators,
        equations: E,
        boundary_conditions: BoundaryConditions2D<N, E>,
        limiter: L,
        config: SubcellConfig,
    ) -> Result<Self, ConfigError> {
        let bounds_check = config.bounds_check.map(BoundsCheckCallback::new).transpose()?;
        let bounds = limiter.bounds();
        if bounds.n_elements() != mesh.n_elements || bounds.n_nodes != ops.n_nodes {
            return Err(ConfigError::LimiterSize {
                elements: bounds.n_elements(),
                nodes: bounds.n_nodes,
                expected_elements: mesh.n_elements,
                expected_nodes: ops.n_nodes,
            });
        }
        let n = ops.n_nodes_1d;
        let data = SubcellData::new(mesh.n_elements, mesh.n_interfaces(), mesh.n_boundaries(), n);

        log::info!(
            "Subcell solver: {} elements ({} x {}), order {}, {} limiter, {} volume flux",
            mesh.n_elements,
            mesh.nx,
            mesh.ny,
            ops.order,
            limiter.name(),
            config.volume_flux.name()
        );
        log::info!("Limited quantities: {}", limiter.bounds_layout().names().join(", "));

        Ok(Self {
            data,
            scratch: ScratchArena::new(n),
            deviations: vec![0.0; limiter.bounds_layout().len()],
            volume_flux: config.volume_flux,
            bounds_check,
            mesh,
            ops,
            equations,
            boundary_conditions,
            limiter,
        })
    }

    /// Subcell data of the last evaluated stage.
    pub fn data(&self) -> &SubcellData<N> {
        &self.data
    }

    pub fn bounds_check(&self) -> Option<&BoundsCheckCallback> {
        self.bounds_check.as_ref()
    }

    /// Zero solution on the solver's mesh.
    pub fn zero_solution(&self) -> SystemSolution2D<N> {
        SystemSolution2D::new(self.mesh.n_elements, self.ops.n_nodes)
    }

    /// Time derivative `du` of the stage state `u` at time `t`.
    ///
    /// For a-posteriori limiters this is the low-order residual.
    pub fn rhs(
        &mut self,
        u: &SystemSolution2D<N>,
        t: f64,
        du: &mut SystemSolution2D<N>,
    ) -> Result<(), LimiterError> {
        compute_bar_states(
            &self.mesh,
            &self.ops,
            &self.equations,
            &self.boundary_conditions,
            u,
            t,
            &mut self.data,
        );

        let (ops, equations, scratch, limiter) =
            (&self.ops, &self.equations, &self.scratch, &self.limiter);
        let volume_flux = self.volume_flux;
        let inverse_jacobian = self.mesh.inverse_jacobian();
        let len = u.element_len();
        elements_mut!(self.data.elements)
            .zip(element_chunks!(u.data, len))
            .zip(element_chunks_mut!(du.data, len))
            .for_each(|((elem, u_elem), du_elem)| {
                let mut slot = scratch.slot();
                compute_element_fluxes(
                    elem,
                    u_elem,
                    ops,
                    equations,
                    volume_flux,
                    &|fhat, fstar| limiter.build_antidiffusive_flux(fhat, fstar),
                    &mut slot,
                );
                low_order_residual(elem, du_elem, ops, inverse_jacobian);
            });

        if self.limiter.stage() == CorrectionStage::Inline {
            let ctx = LimiterContext::new(&self.mesh, &self.ops, &self.equations);
            self.limiter.compute_bounds(&ctx, &self.data, u);
            self.limiter.limit(&ctx, &mut self.data, u, 1.0)?;
            self.limiter.correct(&ctx, &self.data, du, 1.0);
        }
        Ok(())
    }

    /// Stage hook after the time integrator formed `u = u_stage + dt du`.
    ///
    /// Applies the a-posteriori correction if the limiter has one, then
    /// records the deviation from the stage bounds.
    pub fn limit_and_correct(
        &mut self,
        u: &mut SystemSolution2D<N>,
        _t: f64,
        dt: f64,
    ) -> Result<(), LimiterError> {
        let ctx = LimiterContext::new(&self.mesh, &self.ops, &self.equations);
        if self.limiter.stage() == CorrectionStage::APosteriori {
            self.limiter.compute_bounds(&ctx, &self.data, u);
            self.limiter.limit(&ctx, &mut self.data, u, dt)?;
            self.limiter.correct(&ctx, &self.data, u, dt);
        }
        if let Some(callback) = self.bounds_check.as_mut() {
            self.limiter
                .measure_deviations(&ctx, &self.data, u, &mut self.deviations);
            callback.record(&self.deviations);
        }
        Ok(())
    }

    /// Largest stable time step of the low-order scheme times `cfl`.
    ///
    /// The low-order update is a convex combination of bar states if
    /// `dt Σ_d 2 J⁻¹_d λ_d / w_min ≤ 1`.
    pub fn max_dt(&self, u: &SystemSolution2D<N>, cfl: f64) -> f64 {
        let mut lambda = [0.0_f64; 2];
        for node in u.data.chunks_exact(N) {
            let state: [f64; N] = std::array::from_fn(|v| node[v]);
            for dir in Direction::ALL {
                let speed = self.equations.max_wave_speed(&state, dir);
                lambda[dir.index()] = lambda[dir.index()].max(speed);
            }
        }
        let [inv_jx, inv_jy] = self.mesh.inverse_jacobian();
        let rate = 2.0 * (inv_jx * lambda[0] + inv_jy * lambda[1]) / self.ops.min_weight();
        if rate > 0.0 { cfl / rate } else { f64::INFINITY }
    }

    /// Open the bounds check for a new run.
    pub fn init_diagnostics(&mut self) -> Result<(), DiagnosticsError> {
        let names = self.limiter.bounds_layout().names().to_vec();
        self.deviations = vec![0.0; names.len()];
        if let Some(callback) = self.bounds_check.as_mut() {
            callback.init(&names)?;
        }
        Ok(())
    }

    /// End of time step `iter` at time `t`.
    pub fn report_step(&mut self, iter: usize, t: f64) -> Result<(), DiagnosticsError> {
        match self.bounds_check.as_mut() {
            Some(callback) => callback.report(iter, t),
            None => Ok(()),
        }
    }

    /// Summarize the bounds check of the run.
    pub fn finalize_diagnostics(&mut self) -> Result<(), DiagnosticsError> {
        match self.bounds_check.as_mut() {
            Some(callback) => callback.finalize(),
            None => Ok(()),
        }
    }
}
