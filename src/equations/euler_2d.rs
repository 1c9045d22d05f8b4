//! Compressible Euler equations in 2D for an ideal gas.
//!
//! State vector `u = [ρ, ρv₁, ρv₂, ρe]` with total energy density `ρe`,
//! pressure `p = (γ - 1)(ρe - ½ρ|v|²)`.

use super::Equations2D;
use crate::types::Direction;

/// Compressible Euler equations with a constant ratio of specific heats.
#[derive(Clone, Copy, Debug)]
pub struct CompressibleEuler2D {
    /// Ratio of specific heats γ
    pub gamma: f64,
    inv_gamma_minus_one: f64,
}

impl CompressibleEuler2D {
    /// Create the equations for a given γ > 1.
    pub fn new(gamma: f64) -> Self {
        debug_assert!(gamma > 1.0);
        Self {
            gamma,
            inv_gamma_minus_one: 1.0 / (gamma - 1.0),
        }
    }

    /// Conserved variables from density, velocity and pressure.
    pub fn prim2cons(&self, rho: f64, v1: f64, v2: f64, p: f64) -> [f64; 4] {
        let rho_e = p * self.inv_gamma_minus_one + 0.5 * rho * (v1 * v1 + v2 * v2);
        [rho, rho * v1, rho * v2, rho_e]
    }

    /// Density, velocity and pressure from conserved variables.
    pub fn cons2prim(&self, u: &[f64; 4]) -> [f64; 4] {
        let rho = u[0];
        let v1 = u[1] / rho;
        let v2 = u[2] / rho;
        [rho, v1, v2, self.pressure(u)]
    }

    /// Speed of sound √(γp/ρ).
    #[inline]
    pub fn sound_speed(&self, rho: f64, p: f64) -> f64 {
        (self.gamma * p / rho).sqrt()
    }

    #[inline(always)]
    fn normal_velocity(u: &[f64; 4], dir: Direction) -> f64 {
        match dir {
            Direction::X => u[1] / u[0],
            Direction::Y => u[2] / u[0],
        }
    }
}

impl Default for CompressibleEuler2D {
    fn default() -> Self {
        Self::new(1.4)
    }
}

impl Equations2D<4> for CompressibleEuler2D {
    fn varnames(&self) -> [&'static str; 4] {
        ["rho", "rho_v1", "rho_v2", "rho_e"]
    }

    fn flux(&self, u: &[f64; 4], dir: Direction) -> [f64; 4] {
        let [rho, rho_v1, rho_v2, rho_e] = *u;
        let p = self.pressure(u);
        match dir {
            Direction::X => {
                let v1 = rho_v1 / rho;
                [rho_v1, rho_v1 * v1 + p, rho_v2 * v1, (rho_e + p) * v1]
            }
            Direction::Y => {
                let v2 = rho_v2 / rho;
                [rho_v2, rho_v1 * v2, rho_v2 * v2 + p, (rho_e + p) * v2]
            }
        }
    }

    fn max_wave_speed(&self, u: &[f64; 4], dir: Direction) -> f64 {
        let c = self.sound_speed(u[0], self.pressure(u).max(0.0));
        Self::normal_velocity(u, dir).abs() + c
    }

    /// Entropy-conservative and kinetic-energy-preserving flux of Ranocha (2018).
    fn flux_entropy_conservative(
        &self,
        u_l: &[f64; 4],
        u_r: &[f64; 4],
        dir: Direction,
    ) -> [f64; 4] {
        let [rho_ll, v1_ll, v2_ll, p_ll] = self.cons2prim(u_l);
        let [rho_rr, v1_rr, v2_rr, p_rr] = self.cons2prim(u_r);

        let rho_mean = ln_mean(rho_ll, rho_rr);
        // p / ρ averaged through the logarithmic mean of ρ / p
        let inv_rho_p_mean = p_ll * p_rr * inv_ln_mean(rho_ll * p_rr, rho_rr * p_ll);
        let v1_avg = 0.5 * (v1_ll + v1_rr);
        let v2_avg = 0.5 * (v2_ll + v2_rr);
        let p_avg = 0.5 * (p_ll + p_rr);
        let velocity_square_avg = 0.5 * (v1_ll * v1_rr + v2_ll * v2_rr);

        match dir {
            Direction::X => {
                let f1 = rho_mean * v1_avg;
                [
                    f1,
                    f1 * v1_avg + p_avg,
                    f1 * v2_avg,
                    f1 * (velocity_square_avg + inv_rho_p_mean * self.inv_gamma_minus_one)
                        + 0.5 * (p_ll * v1_rr + p_rr * v1_ll),
                ]
            }
            Direction::Y => {
                let f1 = rho_mean * v2_avg;
                [
                    f1,
                    f1 * v1_avg,
                    f1 * v2_avg + p_avg,
                    f1 * (velocity_square_avg + inv_rho_p_mean * self.inv_gamma_minus_one)
                        + 0.5 * (p_ll * v2_rr + p_rr * v2_ll),
                ]
            }
        }
    }

    #[inline]
    fn pressure(&self, u: &[f64; 4]) -> f64 {
        let [rho, rho_v1, rho_v2, rho_e] = *u;
        (self.gamma - 1.0) * (rho_e - 0.5 * (rho_v1 * rho_v1 + rho_v2 * rho_v2) / rho)
    }

    fn dpdu(&self, u: &[f64; 4]) -> [f64; 4] {
        let v1 = u[1] / u[0];
        let v2 = u[2] / u[0];
        let gm1 = self.gamma - 1.0;
        [gm1 * 0.5 * (v1 * v1 + v2 * v2), -gm1 * v1, -gm1 * v2, gm1]
    }

    /// `s = ρε · ρ^{-γ}` with internal energy density ρε (Guermond et al.).
    fn entropy_spec(&self, u: &[f64; 4]) -> f64 {
        let [rho, rho_v1, rho_v2, rho_e] = *u;
        let rho_e_internal = rho_e - 0.5 * (rho_v1 * rho_v1 + rho_v2 * rho_v2) / rho;
        rho_e_internal * rho.powf(-self.gamma)
    }

    fn dentropy_spec_du(&self, u: &[f64; 4]) -> [f64; 4] {
        let [rho, rho_v1, rho_v2, rho_e] = *u;
        let v1 = rho_v1 / rho;
        let v2 = rho_v2 / rho;
        let rho_e_internal = rho_e - 0.5 * rho * (v1 * v1 + v2 * v2);
        let rho_pow = rho.powf(-self.gamma);
        [
            rho_pow * (0.5 * (v1 * v1 + v2 * v2) - self.gamma * rho_e_internal / rho),
            -v1 * rho_pow,
            -v2 * rho_pow,
            rho_pow,
        ]
    }

    /// `S = -ρ s / (γ - 1)` with physical entropy `s = ln p - γ ln ρ`.
    fn entropy_math(&self, u: &[f64; 4]) -> f64 {
        let rho = u[0];
        let s = self.pressure(u).ln() - self.gamma * rho.ln();
        -rho * s * self.inv_gamma_minus_one
    }

    fn cons2entropy(&self, u: &[f64; 4]) -> [f64; 4] {
        let [rho, v1, v2, p] = self.cons2prim(u);
        let s = p.ln() - self.gamma * rho.ln();
        let rho_p = rho / p;
        [
            (self.gamma - s) * self.inv_gamma_minus_one - 0.5 * rho_p * (v1 * v1 + v2 * v2),
            rho_p * v1,
            rho_p * v2,
            -rho_p,
        ]
    }

    fn entropy_potential(&self, u: &[f64; 4], dir: Direction) -> f64 {
        match dir {
            Direction::X => u[1],
            Direction::Y => u[2],
        }
    }

    fn is_valid_state(&self, u: &[f64; 4]) -> bool {
        u[0] > 0.0 && self.pressure(u) > 0.0
    }
}

/// Logarithmic mean `(y - x) / (ln y - ln x)`, stable for `x ≈ y`.
pub fn ln_mean(x: f64, y: f64) -> f64 {
    let f2 = (x * (x - 2.0 * y) + y * y) / (x * (x + 2.0 * y) + y * y);
    if f2 < 1.0e-4 {
        (x + y) * 52.5 / (105.0 + f2 * (35.0 + f2 * (21.0 + f2 * 15.0)))
    } else {
        (y - x) / (y / x).ln()
    }
}

/// Reciprocal of [`ln_mean`].
pub fn inv_ln_mean(x: f64, y: f64) -> f64 {
    let f2 = (x * (x - 2.0 * y) + y * y) / (x * (x + 2.0 * y) + y * y);
    if f2 < 1.0e-4 {
        (105.0 + f2 * (35.0 + f2 * (21.0 + f2 * 15.0))) / (52.5 * (x + y))
    } else {
        (y / x).ln() / (y - x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equations::dot;

    fn sample() -> (CompressibleEuler2D, [f64; 4]) {
        let eq = CompressibleEuler2D::new(1.4);
        let u = eq.prim2cons(1.3, 0.4, -0.7, 2.1);
        (eq, u)
    }

    fn fd_gradient(f: impl Fn(&[f64; 4]) -> f64, u: &[f64; 4]) -> [f64; 4] {
        let h = 1e-7;
        std::array::from_fn(|v| {
            let mut up = *u;
            let mut um = *u;
            up[v] += h;
            um[v] -= h;
            (f(&up) - f(&um)) / (2.0 * h)
        })
    }

    #[test]
    fn test_prim_cons_roundtrip() {
        let (eq, u) = sample();
        let prim = eq.cons2prim(&u);
        assert!((prim[0] - 1.3).abs() < 1e-14);
        assert!((prim[1] - 0.4).abs() < 1e-14);
        assert!((prim[2] + 0.7).abs() < 1e-14);
        assert!((prim[3] - 2.1).abs() < 1e-13);
    }

    #[test]
    fn test_dpdu_matches_finite_difference() {
        let (eq, u) = sample();
        let fd = fd_gradient(|w| eq.pressure(w), &u);
        let exact = eq.dpdu(&u);
        for v in 0..4 {
            assert!((fd[v] - exact[v]).abs() < 1e-6, "component {v}");
        }
    }

    #[test]
    fn test_entropy_gradients_match_finite_difference() {
        let (eq, u) = sample();
        let fd = fd_gradient(|w| eq.entropy_spec(w), &u);
        let exact = eq.dentropy_spec_du(&u);
        for v in 0..4 {
            assert!((fd[v] - exact[v]).abs() < 1e-6, "specific entropy component {v}");
        }
        let fd = fd_gradient(|w| eq.entropy_math(w), &u);
        let exact = eq.cons2entropy(&u);
        for v in 0..4 {
            assert!((fd[v] - exact[v]).abs() < 1e-6, "math component {v}");
        }
    }

    #[test]
    fn test_entropy_potential_identity() {
        // ψ = w·f - F with entropy flux F = S v
        let (eq, u) = sample();
        let w = eq.cons2entropy(&u);
        let v1 = u[1] / u[0];
        let psi = dot(&w, &eq.flux(&u, Direction::X)) - eq.entropy_math(&u) * v1;
        assert!((psi - eq.entropy_potential(&u, Direction::X)).abs() < 1e-12);
    }

    #[test]
    fn test_entropy_conservative_flux_consistent() {
        let (eq, u) = sample();
        for dir in Direction::ALL {
            let f = eq.flux_entropy_conservative(&u, &u, dir);
            let phys = eq.flux(&u, dir);
            for v in 0..4 {
                assert!((f[v] - phys[v]).abs() < 1e-12, "{dir:?} component {v}");
            }
        }
    }

    #[test]
    fn test_entropy_conservative_flux_tadmor_condition() {
        // (w_r - w_l)·F = ψ_r - ψ_l
        let eq = CompressibleEuler2D::new(1.4);
        let u_l = eq.prim2cons(1.0, 0.2, 0.1, 1.0);
        let u_r = eq.prim2cons(0.6, -0.3, 0.5, 0.4);
        for dir in Direction::ALL {
            let f = eq.flux_entropy_conservative(&u_l, &u_r, dir);
            let dw: [f64; 4] =
                std::array::from_fn(|v| eq.cons2entropy(&u_r)[v] - eq.cons2entropy(&u_l)[v]);
            let dpsi = eq.entropy_potential(&u_r, dir) - eq.entropy_potential(&u_l, dir);
            assert!((dot(&dw, &f) - dpsi).abs() < 1e-12, "{dir:?}");
        }
    }

    #[test]
    fn test_ln_mean_limits() {
        assert!((ln_mean(2.0, 2.0) - 2.0).abs() < 1e-14);
        let exact = (3.0 - 1.0) / 3.0_f64.ln();
        assert!((ln_mean(1.0, 3.0) - exact).abs() < 1e-14);
        assert!((ln_mean(1.0, 3.0) * inv_ln_mean(1.0, 3.0) - 1.0).abs() < 1e-14);
    }

    #[test]
    fn test_validity() {
        let eq = CompressibleEuler2D::new(1.4);
        assert!(eq.is_valid_state(&eq.prim2cons(1.0, 0.0, 0.0, 1e-5)));
        assert!(!eq.is_valid_state(&[1.0, 0.0, 0.0, -1.0]));
        assert!(!eq.is_valid_state(&[-1.0, 0.0, 0.0, 1.0]));
    }
}
