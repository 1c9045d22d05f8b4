//! Two-point volume fluxes for flux differencing.

use crate::equations::Equations2D;
use crate::types::Direction;

/// Symmetric two-point flux `f_vol(u_i, u_m)` used in the split-form volume term.
///
/// Both choices are consistent, `f_vol(u, u) = f(u)`, which makes the
/// flux-differencing volume term reduce to the standard DGSEM derivative for
/// the central flux.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum VolumeFlux {
    /// Arithmetic mean of the physical fluxes
    Central,
    /// Entropy-conservative flux provided by the equations
    #[default]
    EntropyConservative,
}

impl VolumeFlux {
    /// Evaluate the two-point flux.
    #[inline]
    pub fn compute<const N: usize, E: Equations2D<N>>(
        &self,
        equations: &E,
        u_l: &[f64; N],
        u_r: &[f64; N],
        dir: Direction,
    ) -> [f64; N] {
        match self {
            VolumeFlux::Central => {
                let f_l = equations.flux(u_l, dir);
                let f_r = equations.flux(u_r, dir);
                std::array::from_fn(|v| 0.5 * (f_l[v] + f_r[v]))
            }
            VolumeFlux::EntropyConservative => equations.flux_entropy_conservative(u_l, u_r, dir),
        }
    }

    /// Name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            VolumeFlux::Central => "central",
            VolumeFlux::EntropyConservative => "entropy_conservative",
        }
    }
}
