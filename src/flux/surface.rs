//! Local Lax-Friedrichs (Rusanov) flux.
//!
//! F^* = 0.5 * (f(u_l) + f(u_r)) - 0.5 * λ * (u_r - u_l)
//!
//! With λ the same signal speed used for the bar state ū this is equivalent to
//! F^* = f(u_l) + λ (u_l - ū) = f(u_r) + λ (ū - u_r).

use crate::equations::Equations2D;
use crate::types::Direction;

/// Local Lax-Friedrichs flux with a given signal speed.
///
/// # Arguments
/// * `u_l` - State on the left (west/south) of the face
/// * `u_r` - State on the right (east/north) of the face
/// * `lambda` - Signal speed, an upper bound of the local wave speeds
/// * `dir` - Face-normal direction
pub fn lax_friedrichs_flux<const N: usize, E: Equations2D<N>>(
    equations: &E,
    u_l: &[f64; N],
    u_r: &[f64; N],
    lambda: f64,
    dir: Direction,
) -> [f64; N] {
    let f_l = equations.flux(u_l, dir);
    let f_r = equations.flux(u_r, dir);
    std::array::from_fn(|v| 0.5 * (f_l[v] + f_r[v]) - 0.5 * lambda * (u_r[v] - u_l[v]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equations::CompressibleEuler2D;

    #[test]
    fn test_lax_friedrichs_consistent() {
        let eq = CompressibleEuler2D::new(1.4);
        let u = eq.prim2cons(1.2, 0.3, -0.1, 2.0);
        let lambda = eq.max_abs_speed(&u, &u, Direction::X);
        let f = lax_friedrichs_flux(&eq, &u, &u, lambda, Direction::X);
        let phys = eq.flux(&u, Direction::X);
        for v in 0..4 {
            assert!((f[v] - phys[v]).abs() < 1e-14);
        }
    }

    #[test]
    fn test_lax_friedrichs_conservative_swap() {
        // F(u_l, u_r) evaluated from either side is the same number
        let eq = CompressibleEuler2D::new(1.4);
        let u_l = eq.prim2cons(1.0, 0.1, 0.0, 1.0);
        let u_r = eq.prim2cons(0.125, 0.0, 0.2, 0.1);
        let lambda = eq.max_abs_speed(&u_l, &u_r, Direction::Y);
        let f = lax_friedrichs_flux(&eq, &u_l, &u_r, lambda, Direction::Y);
        let f_l = eq.flux(&u_l, Direction::Y);
        let f_r = eq.flux(&u_r, Direction::Y);
        for v in 0..4 {
            let from_left = f_l[v] - 0.5 * lambda * (u_r[v] - u_l[v]) + 0.5 * (f_r[v] - f_l[v]);
            let from_right = f_r[v] - 0.5 * lambda * (u_r[v] - u_l[v]) - 0.5 * (f_r[v] - f_l[v]);
            assert!((f[v] - from_left).abs() < 1e-14);
            assert!((f[v] - from_right).abs() < 1e-14);
        }
    }
}
