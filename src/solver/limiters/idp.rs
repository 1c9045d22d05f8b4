//! Invariant-domain-preserving (IDP) subcell limiter.
//!
//! A-posteriori correction of the low-order update `u_low`:
//!
//! ```text
//! u_i = u_low_i + dt J⁻¹ w_i⁻¹ [(1 − α_i) a_i − (1 − α_{i+1}) a_{i+1}]
//! ```
//!
//! per direction, with the antidiffusive flux `a = fhat − fstar` and the
//! face blending coefficient α (1 = low order). Node coefficients are the
//! maximum over all active constraints:
//! - linear constraints (two-sided bounds, positivity of conservative
//!   variables) by Zalesak's flux-corrected transport ratio
//! - nonlinear constraints (pressure positivity, entropy bounds) by a
//!   Newton-bisection search for the admissible fraction of every face flux
//!
//! A face takes the larger coefficient of its two nodes.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::equations::{Equations2D, dot};
use crate::error::{ConfigError, LimiterError};
use crate::operators::SubcellOperators;
use crate::types::ElementIndex;

use super::super::antidiffusive::FluxSign;
use super::super::bounds::{BoundKey, BoundsCalculator, BoundsLayout, VariableBounds};
use super::super::containers::{ElementSubcellData, SubcellData};
use super::super::diagnostics::node_deviations;
use super::super::parallel::{element_chunks, element_chunks_mut, elements_ref};
use super::super::state::{SystemSolution2D, node_state};
use super::config::IdpConfig;
use super::newton::{GoalCheck, NewtonSettings, solve_beta};
use super::traits::{CorrectionStage, LimiterContext, SubcellLimiter};

/// Nonlinear constraints solved by Newton-bisection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NonlinearConstraint {
    PressurePositivity,
    SpecEntropy,
    MathEntropy,
}

impl NonlinearConstraint {
    fn check(self) -> GoalCheck {
        match self {
            NonlinearConstraint::PressurePositivity => GoalCheck::NonNegative,
            NonlinearConstraint::SpecEntropy => GoalCheck::Min,
            NonlinearConstraint::MathEntropy => GoalCheck::Max,
        }
    }

    fn name(self) -> &'static str {
        match self {
            NonlinearConstraint::PressurePositivity => "pressure",
            NonlinearConstraint::SpecEntropy => "specific entropy",
            NonlinearConstraint::MathEntropy => "mathematical entropy",
        }
    }

    #[inline]
    fn value<const N: usize, E: Equations2D<N>>(self, equations: &E, u: &[f64; N]) -> f64 {
        match self {
            NonlinearConstraint::PressurePositivity => equations.pressure(u),
            NonlinearConstraint::SpecEntropy => equations.entropy_spec(u),
            NonlinearConstraint::MathEntropy => equations.entropy_math(u),
        }
    }

    #[inline]
    fn gradient<const N: usize, E: Equations2D<N>>(self, equations: &E, u: &[f64; N]) -> [f64; N] {
        match self {
            NonlinearConstraint::PressurePositivity => equations.dpdu(u),
            NonlinearConstraint::SpecEntropy => equations.dentropy_spec_du(u),
            NonlinearConstraint::MathEntropy => equations.cons2entropy(u),
        }
    }

    /// Whether the constraint function is defined at `u`.
    ///
    /// The pressure is defined for any positive density, which lets the
    /// Newton iteration see negative pressures instead of bisecting.
    #[inline]
    fn defined<const N: usize, E: Equations2D<N>>(self, equations: &E, u: &[f64; N]) -> bool {
        match self {
            NonlinearConstraint::PressurePositivity => equations.density(u) > 0.0,
            _ => equations.is_valid_state(u),
        }
    }
}

/// One constraint pass with its resolved bound slots.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ConstraintPass {
    TwoSided { var: usize, min: usize, max: usize },
    Positivity { var: usize, key: usize },
    Nonlinear { key: usize, constraint: NonlinearConstraint },
}

fn constraint_passes(layout: &BoundsLayout) -> Vec<ConstraintPass> {
    let mut passes = Vec::new();
    for (q, key) in layout.keys().iter().enumerate() {
        let pass = match *key {
            // LocalMax(v) directly follows LocalMin(v), see IdpConfig::bound_keys
            BoundKey::LocalMin(var) => ConstraintPass::TwoSided {
                var,
                min: q,
                max: q + 1,
            },
            BoundKey::Positivity(var) => ConstraintPass::Positivity { var, key: q },
            BoundKey::PressurePositivity => ConstraintPass::Nonlinear {
                key: q,
                constraint: NonlinearConstraint::PressurePositivity,
            },
            BoundKey::SpecEntropyMin => ConstraintPass::Nonlinear {
                key: q,
                constraint: NonlinearConstraint::SpecEntropy,
            },
            BoundKey::MathEntropyMax => ConstraintPass::Nonlinear {
                key: q,
                constraint: NonlinearConstraint::MathEntropy,
            },
            BoundKey::LocalMax(_) | BoundKey::RatioMin(_) | BoundKey::RatioMax(_) => continue,
        };
        passes.push(pass);
    }
    passes
}

/// Zalesak coefficient of one node, the admissible fraction in [0, 1].
///
/// `contributions` are the `J⁻¹ w⁻¹`-scaled antidiffusive fluxes entering the
/// node through its four faces, signed as they change the node value.
/// A side without any contribution admits everything.
pub fn zalesak_coefficient(
    value: f64,
    bound_min: Option<f64>,
    bound_max: Option<f64>,
    contributions: &[f64; 4],
    dt: f64,
) -> f64 {
    let ratio = |q: f64, p: f64, bound: f64| {
        if p == 0.0 {
            1.0
        } else {
            q.abs() / (p.abs() + 100.0 * f64::EPSILON * bound.abs())
        }
    };
    let mut coefficient = 1.0_f64;
    if let Some(max) = bound_max {
        let q_plus = ((max - value) / dt).max(0.0);
        let p_plus: f64 = contributions.iter().map(|c| c.max(0.0)).sum();
        coefficient = coefficient.min(ratio(q_plus, p_plus, max));
    }
    if let Some(min) = bound_min {
        let q_minus = ((min - value) / dt).min(0.0);
        let p_minus: f64 = contributions.iter().map(|c| c.min(0.0)).sum();
        coefficient = coefficient.min(ratio(q_minus, p_minus, min));
    }
    coefficient
}

/// Store the α found by a Newton solve.
///
/// A Newton solve starts from the admissible fraction left by earlier passes,
/// so its α can only be larger. Anything smaller beyond `abstol` means the
/// passes are inconsistent and the stage is aborted.
pub fn commit_newton_alpha(
    alpha: &mut f64,
    new_alpha: f64,
    abstol: f64,
    element: ElementIndex,
    node: usize,
) -> Result<(), LimiterError> {
    if *alpha > new_alpha + abstol {
        return Err(LimiterError::NonMonotoneAlpha {
            element,
            node,
            old: *alpha,
            new: new_alpha,
        });
    }
    *alpha = alpha.max(new_alpha);
    Ok(())
}

/// `J⁻¹ w⁻¹`-scaled antidiffusive fluxes of the four faces of node `(i, j)`,
/// signed as they enter the node update.
#[inline(always)]
fn node_face_updates<const N: usize>(
    elem: &ElementSubcellData<N>,
    ops: &SubcellOperators,
    inverse_jacobian: [f64; 2],
    i: usize,
    j: usize,
) -> [[f64; N]; 4] {
    let cx = inverse_jacobian[0] * ops.inverse_weights[i];
    let cy = inverse_jacobian[1] * ops.inverse_weights[j];
    let a_w = &elem.antiflux_x[elem.x_face(i, j)];
    let a_e = &elem.antiflux_x[elem.x_face(i + 1, j)];
    let a_s = &elem.antiflux_y[elem.y_face(i, j)];
    let a_n = &elem.antiflux_y[elem.y_face(i, j + 1)];
    [
        std::array::from_fn(|v| cx * a_w[v]),
        std::array::from_fn(|v| -cx * a_e[v]),
        std::array::from_fn(|v| cy * a_s[v]),
        std::array::from_fn(|v| -cy * a_n[v]),
    ]
}

#[inline(always)]
fn key_slice(bounds: &[f64], key: usize, n_nodes: usize) -> &[f64] {
    &bounds[key * n_nodes..(key + 1) * n_nodes]
}

/// Face coefficients from node coefficients; element-boundary faces are 0.
fn face_alphas(alpha: &[f64], alpha_x: &mut [f64], alpha_y: &mut [f64], n: usize) {
    for j in 0..n {
        alpha_x[j * (n + 1)] = 0.0;
        alpha_x[j * (n + 1) + n] = 0.0;
        for i in 1..n {
            alpha_x[j * (n + 1) + i] = alpha[j * n + i - 1].max(alpha[j * n + i]);
        }
    }
    for i in 0..n {
        alpha_y[i] = 0.0;
        alpha_y[n * n + i] = 0.0;
        for j in 1..n {
            alpha_y[j * n + i] = alpha[(j - 1) * n + i].max(alpha[j * n + i]);
        }
    }
}

/// Invariant-domain-preserving subcell limiter.
#[derive(Clone, Debug)]
pub struct IdpLimiter {
    config: IdpConfig,
    layout: BoundsLayout,
    passes: Vec<ConstraintPass>,
    calculator: BoundsCalculator,
    settings: NewtonSettings,
    bounds: VariableBounds,
    n_nodes_1d: usize,
    alpha: Vec<f64>,
    alpha_x: Vec<f64>,
    alpha_y: Vec<f64>,
}

impl IdpLimiter {
    /// Create the limiter for a mesh of `n_elements` elements.
    ///
    /// # Arguments
    /// * `varnames` - Names of the conserved variables (defines `N`)
    /// * `n_nodes_1d` - Nodes per direction
    pub fn new(
        config: IdpConfig,
        varnames: &[&str],
        n_elements: usize,
        n_nodes_1d: usize,
    ) -> Result<Self, ConfigError> {
        config.validate(varnames.len())?;
        let layout = BoundsLayout::new(config.bound_keys(), varnames);
        let passes = constraint_passes(&layout);
        let n_nodes = n_nodes_1d * n_nodes_1d;
        let n_faces = (n_nodes_1d + 1) * n_nodes_1d;
        Ok(Self {
            calculator: BoundsCalculator::new(config.bound_source, config.positivity_correction_factor),
            settings: NewtonSettings {
                max_iterations: config.max_iterations_newton,
                reltol: config.newton_reltol,
                abstol: config.newton_abstol,
            },
            bounds: VariableBounds::new(n_elements, n_nodes, layout.len()),
            alpha: vec![0.0; n_elements * n_nodes],
            alpha_x: vec![0.0; n_elements * n_faces],
            alpha_y: vec![0.0; n_elements * n_faces],
            n_nodes_1d,
            config,
            layout,
            passes,
        })
    }

    pub fn config(&self) -> &IdpConfig {
        &self.config
    }

    /// Node coefficients of the last stage, element-major.
    pub fn alpha(&self) -> &[f64] {
        &self.alpha
    }

    /// x-face coefficients of the last stage, element-major.
    pub fn alpha_x(&self) -> &[f64] {
        &self.alpha_x
    }

    /// y-face coefficients of the last stage, element-major.
    pub fn alpha_y(&self) -> &[f64] {
        &self.alpha_y
    }

    #[allow(clippy::too_many_arguments)]
    fn limit_element<const N: usize, E: Equations2D<N>>(
        &self,
        ctx: &LimiterContext<'_, E>,
        k: ElementIndex,
        elem: &ElementSubcellData<N>,
        u_elem: &[f64],
        bounds: &[f64],
        dt: f64,
        alpha: &mut [f64],
    ) -> Result<(), LimiterError> {
        let n = self.n_nodes_1d;
        let n_nodes = n * n;
        let ops = ctx.ops;
        let equations = ctx.equations;
        let state = |node: usize| -> [f64; N] { node_state(&u_elem[node * N..(node + 1) * N]) };
        alpha.fill(0.0);

        for pass in &self.passes {
            match *pass {
                ConstraintPass::TwoSided { var, min, max } => {
                    let (b_min, b_max) = (key_slice(bounds, min, n_nodes), key_slice(bounds, max, n_nodes));
                    for j in 0..n {
                        for i in 0..n {
                            let node = j * n + i;
                            let updates = node_face_updates(elem, ops, ctx.inverse_jacobian, i, j);
                            let contributions = std::array::from_fn(|f| updates[f][var]);
                            let coefficient = zalesak_coefficient(
                                state(node)[var],
                                Some(b_min[node]),
                                Some(b_max[node]),
                                &contributions,
                                dt,
                            );
                            alpha[node] = alpha[node].max(1.0 - coefficient);
                        }
                    }
                }
                ConstraintPass::Positivity { var, key } => {
                    let b_min = key_slice(bounds, key, n_nodes);
                    for j in 0..n {
                        for i in 0..n {
                            let node = j * n + i;
                            let value = state(node)[var];
                            if value < 0.0 {
                                return Err(LimiterError::InvalidLowOrderState {
                                    element: k,
                                    node,
                                    quantity: equations.varnames()[var],
                                    value,
                                });
                            }
                            let updates = node_face_updates(elem, ops, ctx.inverse_jacobian, i, j);
                            let contributions = std::array::from_fn(|f| updates[f][var]);
                            let coefficient =
                                zalesak_coefficient(value, Some(b_min[node]), None, &contributions, dt);
                            alpha[node] = alpha[node].max(1.0 - coefficient);
                        }
                    }
                }
                ConstraintPass::Nonlinear { key, constraint } => {
                    let b = key_slice(bounds, key, n_nodes);
                    let scale = dt * self.config.gamma_constant_newton;
                    for j in 0..n {
                        for i in 0..n {
                            let node = j * n + i;
                            let u0 = state(node);
                            if !constraint.defined(equations, &u0)
                                || (constraint == NonlinearConstraint::PressurePositivity
                                    && equations.pressure(&u0) < 0.0)
                            {
                                return Err(LimiterError::InvalidLowOrderState {
                                    element: k,
                                    node,
                                    quantity: constraint.name(),
                                    value: constraint.value(equations, &u0),
                                });
                            }
                            let bound = b[node];
                            let updates = node_face_updates(elem, ops, ctx.inverse_jacobian, i, j);
                            for update in &updates {
                                if update.iter().all(|&a| a == 0.0) {
                                    continue;
                                }
                                let step: [f64; N] = std::array::from_fn(|v| scale * update[v]);
                                let eval = |beta: f64| {
                                    let u_curr: [f64; N] = std::array::from_fn(|v| u0[v] + beta * step[v]);
                                    if !constraint.defined(equations, &u_curr) {
                                        return None;
                                    }
                                    let goal = bound - constraint.value(equations, &u_curr);
                                    let dgoal = -dot(&constraint.gradient(equations, &u_curr), &step);
                                    Some((goal, dgoal))
                                };
                                let outcome = solve_beta(
                                    1.0 - alpha[node],
                                    bound,
                                    constraint.check(),
                                    &self.settings,
                                    eval,
                                );
                                commit_newton_alpha(
                                    &mut alpha[node],
                                    1.0 - outcome.beta,
                                    self.settings.abstol,
                                    k,
                                    node,
                                )?;
                            }
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

impl<const N: usize, E: Equations2D<N>> SubcellLimiter<N, E> for IdpLimiter {
    fn name(&self) -> &'static str {
        "idp"
    }

    fn stage(&self) -> CorrectionStage {
        CorrectionStage::APosteriori
    }

    fn flux_sign(&self) -> FluxSign {
        FluxSign::HighMinusLow
    }

    fn bounds_layout(&self) -> &BoundsLayout {
        &self.layout
    }

    fn bounds(&self) -> &VariableBounds {
        &self.bounds
    }

    fn compute_bounds(&mut self, ctx: &LimiterContext<'_, E>, data: &SubcellData<N>, u: &SystemSolution2D<N>) {
        if self.layout.is_empty() {
            return;
        }
        let len = self.bounds.element_len();
        let (layout, calculator) = (&self.layout, &self.calculator);
        element_chunks_mut!(self.bounds.data, len)
            .zip(elements_ref!(data.elements))
            .enumerate()
            .for_each(|(k, (out, elem))| {
                calculator.compute_element(ctx, layout, ElementIndex::new(k), elem, u, out);
            });
    }

    fn limit(
        &mut self,
        ctx: &LimiterContext<'_, E>,
        data: &mut SubcellData<N>,
        u: &SystemSolution2D<N>,
        dt: f64,
    ) -> Result<(), LimiterError> {
        let n = self.n_nodes_1d;
        let n_nodes = n * n;
        let n_faces = (n + 1) * n;
        let bounds_len = self.bounds.element_len();

        let mut alpha = std::mem::take(&mut self.alpha);
        let result = element_chunks_mut!(alpha, n_nodes)
            .zip(elements_ref!(data.elements))
            .zip(element_chunks!(self.bounds.data, bounds_len))
            .zip(element_chunks!(u.data, u.element_len()))
            .enumerate()
            .try_for_each(|(k, (((alpha_elem, elem), bounds), u_elem))| {
                self.limit_element(ctx, ElementIndex::new(k), elem, u_elem, bounds, dt, alpha_elem)
            });
        self.alpha = alpha;
        result?;

        let alpha = &self.alpha;
        element_chunks_mut!(self.alpha_x, n_faces)
            .zip(element_chunks_mut!(self.alpha_y, n_faces))
            .zip(element_chunks!(alpha, n_nodes))
            .for_each(|((ax, ay), a)| face_alphas(a, ax, ay, n));
        Ok(())
    }

    fn correct(
        &self,
        ctx: &LimiterContext<'_, E>,
        data: &SubcellData<N>,
        target: &mut SystemSolution2D<N>,
        dt: f64,
    ) {
        let n = self.n_nodes_1d;
        let n_faces = (n + 1) * n;
        let len = target.element_len();
        let ops = ctx.ops;
        let [inv_jx, inv_jy] = ctx.inverse_jacobian;
        element_chunks_mut!(target.data, len)
            .zip(elements_ref!(data.elements))
            .zip(element_chunks!(self.alpha_x, n_faces))
            .zip(element_chunks!(self.alpha_y, n_faces))
            .for_each(|(((u_elem, elem), ax), ay)| {
                for j in 0..n {
                    for i in 0..n {
                        let cx = dt * inv_jx * ops.inverse_weights[i];
                        let cy = dt * inv_jy * ops.inverse_weights[j];
                        let (fw, fe) = (elem.x_face(i, j), elem.x_face(i + 1, j));
                        let (fs, fn_) = (elem.y_face(i, j), elem.y_face(i, j + 1));
                        let base = (j * n + i) * N;
                        for v in 0..N {
                            u_elem[base + v] += cx
                                * ((1.0 - ax[fw]) * elem.antiflux_x[fw][v]
                                    - (1.0 - ax[fe]) * elem.antiflux_x[fe][v])
                                + cy * ((1.0 - ay[fs]) * elem.antiflux_y[fs][v]
                                    - (1.0 - ay[fn_]) * elem.antiflux_y[fn_][v]);
                        }
                    }
                }
            });
    }

    fn measure_deviations(
        &self,
        ctx: &LimiterContext<'_, E>,
        _data: &SubcellData<N>,
        u: &SystemSolution2D<N>,
        deviations: &mut [f64],
    ) {
        node_deviations(ctx, &self.layout, &self.bounds, u, deviations);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zalesak_degenerate_fluxes_leave_node_unchanged() {
        let c = zalesak_coefficient(1.0, Some(1.0), Some(1.0), &[0.0; 4], 1e-3);
        assert!(c.is_finite());
        assert_eq!(c, 1.0);
    }

    #[test]
    fn test_zalesak_clips_to_bound() {
        // value 1, max 1.5, dt 0.1: Q+ = 5, P+ = 10 → half the flux
        let c = zalesak_coefficient(1.0, Some(0.0), Some(1.5), &[4.0, 6.0, -1.0, 0.0], 0.1);
        assert!((c - 0.5).abs() < 1e-12);
        let updated = 1.0 + 0.1 * c * (4.0 + 6.0);
        assert!(updated <= 1.5 + 1e-12);
    }

    #[test]
    fn test_zalesak_at_bound_blocks_flux_towards_it() {
        let c = zalesak_coefficient(0.2, Some(0.2), None, &[1.0, -1e-3, 0.0, 0.0], 0.1);
        assert_eq!(c, 0.0);
        // flux away from the bound is not limited
        let c = zalesak_coefficient(0.2, Some(0.2), None, &[1.0, 0.0, 0.0, 0.0], 0.1);
        assert_eq!(c, 1.0);
    }

    #[test]
    fn test_newton_alpha_may_only_grow() {
        let mut alpha = 0.3;
        assert!(commit_newton_alpha(&mut alpha, 0.6, 1e-14, ElementIndex::new(0), 0).is_ok());
        assert_eq!(alpha, 0.6);
        let err = commit_newton_alpha(&mut alpha, 0.25, 1e-14, ElementIndex::new(7), 3).unwrap_err();
        assert_eq!(
            err,
            LimiterError::NonMonotoneAlpha {
                element: ElementIndex::new(7),
                node: 3,
                old: 0.6,
                new: 0.25
            }
        );
        // within tolerance is accepted and keeps the larger value
        assert!(commit_newton_alpha(&mut alpha, 0.6 - 1e-16, 1e-14, ElementIndex::new(0), 0).is_ok());
        assert_eq!(alpha, 0.6);
    }

    #[test]
    fn test_face_alphas_take_node_maximum() {
        let n = 2;
        let alpha = [0.1, 0.7, 0.4, 0.2];
        let mut ax = vec![9.0; 6];
        let mut ay = vec![9.0; 6];
        face_alphas(&alpha, &mut ax, &mut ay, n);
        assert_eq!(ax, vec![0.0, 0.7, 0.0, 0.0, 0.4, 0.0]);
        assert_eq!(ay, vec![0.0, 0.0, 0.4, 0.7, 0.0, 0.0]);
    }

    #[test]
    fn test_constraint_passes_follow_layout() {
        let cfg = IdpConfig::positivity().with_local_twosided(vec![0]);
        let layout = BoundsLayout::new(cfg.bound_keys(), &["rho", "m1", "m2", "E"]);
        let passes = constraint_passes(&layout);
        assert_eq!(
            passes,
            vec![
                ConstraintPass::TwoSided { var: 0, min: 0, max: 1 },
                ConstraintPass::Positivity { var: 0, key: 2 },
                ConstraintPass::Nonlinear {
                    key: 3,
                    constraint: NonlinearConstraint::PressurePositivity
                },
            ]
        );
    }
}
