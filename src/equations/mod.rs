//! Conservation law abstractions for the subcell limiting engine.
//!
//! The limiter never looks inside the physics. Everything it needs about
//! the equations (fluxes, wave-speed estimates, pressure, entropies and their
//! gradients, the admissibility predicate) goes through [`Equations2D`].
//!
//! Layout convention: variable 0 is the density. The MCL pressure limiter
//! additionally assumes the Euler layout `[ρ, m_1, .., m_d, E]`.

mod euler_2d;

pub use euler_2d::{CompressibleEuler2D, inv_ln_mean, ln_mean};

use crate::types::Direction;

/// A hyperbolic system of `N` conservation laws in 2D.
///
/// `∂u/∂t + ∂f(u)/∂x + ∂g(u)/∂y = 0`
pub trait Equations2D<const N: usize>: Clone + Send + Sync {
    /// Short names of the conserved variables, used in diagnostics headers.
    fn varnames(&self) -> [&'static str; N];

    /// Physical flux in direction `dir`.
    fn flux(&self, u: &[f64; N], dir: Direction) -> [f64; N];

    /// Largest absolute characteristic speed of `u` in direction `dir`.
    fn max_wave_speed(&self, u: &[f64; N], dir: Direction) -> f64;

    /// Upper bound of the characteristic speeds of the Riemann problem (u_l, u_r).
    ///
    /// The default is the Davis estimate `max(λ(u_l), λ(u_r))`.
    fn max_abs_speed(&self, u_l: &[f64; N], u_r: &[f64; N], dir: Direction) -> f64 {
        self.max_wave_speed(u_l, dir)
            .max(self.max_wave_speed(u_r, dir))
    }

    /// Symmetric, consistent two-point flux used for flux differencing.
    ///
    /// The default is the central flux; implementations override it with an
    /// entropy-conservative flux when one exists.
    fn flux_entropy_conservative(
        &self,
        u_l: &[f64; N],
        u_r: &[f64; N],
        dir: Direction,
    ) -> [f64; N] {
        let f_l = self.flux(u_l, dir);
        let f_r = self.flux(u_r, dir);
        std::array::from_fn(|v| 0.5 * (f_l[v] + f_r[v]))
    }

    /// Density.
    #[inline]
    fn density(&self, u: &[f64; N]) -> f64 {
        u[0]
    }

    /// Pressure.
    fn pressure(&self, u: &[f64; N]) -> f64;

    /// Gradient of the pressure with respect to the conserved variables.
    fn dpdu(&self, u: &[f64; N]) -> [f64; N];

    /// Specific entropy (bounded from below by a local minimum principle).
    fn entropy_spec(&self, u: &[f64; N]) -> f64;

    /// Gradient of [`Equations2D::entropy_spec`].
    fn dentropy_spec_du(&self, u: &[f64; N]) -> [f64; N];

    /// Mathematical (convex) entropy.
    fn entropy_math(&self, u: &[f64; N]) -> f64;

    /// Entropy variables, the gradient of [`Equations2D::entropy_math`].
    fn cons2entropy(&self, u: &[f64; N]) -> [f64; N];

    /// Entropy potential `ψ = v·f(u) - F(u)` in direction `dir`.
    fn entropy_potential(&self, u: &[f64; N], dir: Direction) -> f64;

    /// Whether `u` lies in the admissible set (positive density and pressure).
    fn is_valid_state(&self, u: &[f64; N]) -> bool;
}

/// Dot product of two state vectors.
#[inline(always)]
pub fn dot<const N: usize>(a: &[f64; N], b: &[f64; N]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_max_abs_speed_is_davis() {
        let eq = CompressibleEuler2D::new(1.4);
        let u_l = eq.prim2cons(1.0, 0.5, 0.0, 1.0);
        let u_r = eq.prim2cons(0.2, -0.3, 0.1, 0.1);
        let lambda = eq.max_abs_speed(&u_l, &u_r, Direction::X);
        let expected = eq
            .max_wave_speed(&u_l, Direction::X)
            .max(eq.max_wave_speed(&u_r, Direction::X));
        assert_eq!(lambda, expected);
    }

    #[test]
    fn test_dot() {
        assert_eq!(dot(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]), 32.0);
    }
}
