//! High-order and low-order subcell fluxes and their difference.
//!
//! Along one line of nodes the flux-differencing volume term is rewritten as
//! differences of subcell fluxes:
//!
//! ```text
//! flux_temp[i] = Σ_m Dsplit[i,m] f_vol(u_i, u_m)
//! fhat[0] = 0,  fhat[i+1] = fhat[i] + w_i flux_temp[i]
//! fstar[i] = LLF(u_{i-1}, u_i)          (interior faces 1..n-1)
//! ```
//!
//! The surface flux enters on faces `0` and `n`, so the high-order update is
//! `-J⁻¹ w_i⁻¹ (F_{i+1} - F_i)` with `F = fhat` inside and `F = fstar` on
//! the element boundary, and the antidiffusive flux vanishes there.

use crate::equations::Equations2D;
use crate::flux::{VolumeFlux, lax_friedrichs_flux};
use crate::operators::SubcellOperators;
use crate::types::Direction;

use super::containers::ElementSubcellData;
use super::scratch::FluxScratch;
use super::state::node_state;

/// Orientation of the stored antidiffusive flux.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FluxSign {
    /// `a = fhat - fstar`, the high-order flux is `fstar + a`
    HighMinusLow,
    /// `a = fstar - fhat`, the high-order flux is `fstar - a`
    LowMinusHigh,
}

impl FluxSign {
    /// Antidiffusive flux of the pair (fhat, fstar).
    #[inline(always)]
    pub fn apply<const N: usize>(self, fhat: &[f64; N], fstar: &[f64; N]) -> [f64; N] {
        match self {
            FluxSign::HighMinusLow => std::array::from_fn(|v| fhat[v] - fstar[v]),
            FluxSign::LowMinusHigh => std::array::from_fn(|v| fstar[v] - fhat[v]),
        }
    }
}

/// High-order subcell fluxes along one line of nodes.
///
/// # Arguments
/// * `line` - The `n` states along the line
/// * `flux_temp` - Output, `n` entries
/// * `fhat` - Output, `n + 1` entries; `fhat[0] = 0` and `fhat[n] ≈ 0`
pub fn high_order_line_fluxes<const N: usize, E: Equations2D<N>>(
    line: &[[f64; N]],
    ops: &SubcellOperators,
    equations: &E,
    volume_flux: VolumeFlux,
    dir: Direction,
    flux_temp: &mut [[f64; N]],
    fhat: &mut [[f64; N]],
) {
    let n = line.len();
    let ds = &ops.derivative_split;
    flux_temp[..n].fill([0.0; N]);

    for i in 0..n {
        let d_ii = ds[(i, i)];
        if d_ii != 0.0 {
            let f = equations.flux(&line[i], dir);
            for v in 0..N {
                flux_temp[i][v] += d_ii * f[v];
            }
        }
        for m in (i + 1)..n {
            // f_vol is symmetric: one evaluation serves both nodes
            let f = volume_flux.compute(equations, &line[i], &line[m], dir);
            let (d_im, d_mi) = (ds[(i, m)], ds[(m, i)]);
            for v in 0..N {
                flux_temp[i][v] += d_im * f[v];
                flux_temp[m][v] += d_mi * f[v];
            }
        }
    }

    fhat[0] = [0.0; N];
    for i in 0..n {
        let w = ops.weights[i];
        fhat[i + 1] = std::array::from_fn(|v| fhat[i][v] + w * flux_temp[i][v]);
    }
}

/// Low-order fluxes on the interior faces and the antidiffusive flux of one element.
///
/// Requires the signal speeds of the element (bar-state pass) and the surface
/// fluxes on faces `0` and `n` (gather pass). `antidiffusive(fhat, fstar)`
/// forms the stored flux of an interior face.
pub fn compute_element_fluxes<const N: usize, E, A>(
    elem: &mut ElementSubcellData<N>,
    u_elem: &[f64],
    ops: &SubcellOperators,
    equations: &E,
    volume_flux: VolumeFlux,
    antidiffusive: &A,
    scratch: &mut FluxScratch<N>,
) where
    E: Equations2D<N>,
    A: Fn(&[f64; N], &[f64; N]) -> [f64; N],
{
    let n = ops.n_nodes_1d;
    for dir in Direction::ALL {
        for line in 0..n {
            for t in 0..n {
                let node = match dir {
                    Direction::X => line * n + t,
                    Direction::Y => t * n + line,
                };
                scratch.line[t] = node_state(&u_elem[node * N..(node + 1) * N]);
            }
            high_order_line_fluxes(
                &scratch.line,
                ops,
                equations,
                volume_flux,
                dir,
                &mut scratch.flux_temp,
                &mut scratch.fhat,
            );

            let boundary_faces = [elem.face(dir, 0, line), elem.face(dir, n, line)];
            let (fstar, lambdas, antiflux) = match dir {
                Direction::X => (&mut elem.fstar_x, &elem.lambda_x, &mut elem.antiflux_x),
                Direction::Y => (&mut elem.fstar_y, &elem.lambda_y, &mut elem.antiflux_y),
            };
            for f in boundary_faces {
                antiflux[f] = [0.0; N];
            }
            for face in 1..n {
                let f = match dir {
                    Direction::X => line * (n + 1) + face,
                    Direction::Y => face * n + line,
                };
                fstar[f] = lax_friedrichs_flux(
                    equations,
                    &scratch.line[face - 1],
                    &scratch.line[face],
                    lambdas[f],
                    dir,
                );
                antiflux[f] = antidiffusive(&scratch.fhat[face], &fstar[f]);
            }
        }
    }
}

/// Low-order residual of one element, `du = -Σ_d J⁻¹_d w⁻¹ (F_{i+1} - F_i)`.
///
/// Overwrites `du_elem`.
pub fn low_order_residual<const N: usize>(
    elem: &ElementSubcellData<N>,
    du_elem: &mut [f64],
    ops: &SubcellOperators,
    inverse_jacobian: [f64; 2],
) {
    let n = ops.n_nodes_1d;
    let [inv_jx, inv_jy] = inverse_jacobian;
    for j in 0..n {
        for i in 0..n {
            let fx_l = &elem.fstar_x[elem.x_face(i, j)];
            let fx_r = &elem.fstar_x[elem.x_face(i + 1, j)];
            let fy_l = &elem.fstar_y[elem.y_face(i, j)];
            let fy_r = &elem.fstar_y[elem.y_face(i, j + 1)];
            let cx = inv_jx * ops.inverse_weights[i];
            let cy = inv_jy * ops.inverse_weights[j];
            let base = (j * n + i) * N;
            for v in 0..N {
                du_elem[base + v] = -cx * (fx_r[v] - fx_l[v]) - cy * (fy_r[v] - fy_l[v]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equations::CompressibleEuler2D;

    fn smooth_line(eq: &CompressibleEuler2D, ops: &SubcellOperators) -> Vec<[f64; 4]> {
        ops.nodes
            .iter()
            .map(|&x| eq.prim2cons(1.0 + 0.2 * x, 0.3 - 0.1 * x * x, 0.05 * x, 1.0 + 0.1 * x))
            .collect()
    }

    #[test]
    fn test_fhat_vanishes_on_element_boundary() {
        let eq = CompressibleEuler2D::new(1.4);
        for order in 1..6 {
            let ops = SubcellOperators::new(order).unwrap();
            let line = smooth_line(&eq, &ops);
            let n = ops.n_nodes_1d;
            let mut flux_temp = vec![[0.0; 4]; n];
            let mut fhat = vec![[0.0; 4]; n + 1];
            for flux in [VolumeFlux::Central, VolumeFlux::EntropyConservative] {
                high_order_line_fluxes(&line, &ops, &eq, flux, Direction::X, &mut flux_temp, &mut fhat);
                for v in 0..4 {
                    assert_eq!(fhat[0][v], 0.0);
                    assert!(fhat[n][v].abs() < 1e-12, "order {order}: fhat[n] = {}", fhat[n][v]);
                }
            }
        }
    }

    #[test]
    fn test_central_fhat_matches_strong_form_derivative() {
        // With the central volume flux the subcell divergence is D f plus the
        // boundary correction of the split operator.
        let eq = CompressibleEuler2D::new(1.4);
        let ops = SubcellOperators::new(4).unwrap();
        let line = smooth_line(&eq, &ops);
        let n = ops.n_nodes_1d;
        let mut flux_temp = vec![[0.0; 4]; n];
        let mut fhat = vec![[0.0; 4]; n + 1];
        high_order_line_fluxes(&line, &ops, &eq, VolumeFlux::Central, Direction::X, &mut flux_temp, &mut fhat);
        let phys: Vec<[f64; 4]> = line.iter().map(|u| eq.flux(u, Direction::X)).collect();
        for i in 0..n {
            for v in 0..4 {
                let mut df = 0.0;
                for m in 0..n {
                    df += ops.derivative[(i, m)] * phys[m][v];
                }
                let mut expected = df;
                if i == 0 {
                    expected += phys[0][v] * ops.inverse_weights[0];
                }
                if i == n - 1 {
                    expected -= phys[n - 1][v] * ops.inverse_weights[n - 1];
                }
                let divergence = (fhat[i + 1][v] - fhat[i][v]) * ops.inverse_weights[i];
                assert!((divergence - expected).abs() < 1e-10);
            }
        }
    }

    #[test]
    fn test_constant_state_has_no_antidiffusive_flux() {
        let eq = CompressibleEuler2D::new(1.4);
        let ops = SubcellOperators::new(3).unwrap();
        let n = ops.n_nodes_1d;
        let state = eq.prim2cons(1.0, 0.5, -0.25, 2.0);
        let u_elem: Vec<f64> = (0..ops.n_nodes).flat_map(|_| state).collect();
        let mut elem = ElementSubcellData::<4>::new(n);
        elem.lambda_x.fill(2.0);
        elem.lambda_y.fill(2.0);
        let mut scratch = FluxScratch::new(n);
        compute_element_fluxes(
            &mut elem,
            &u_elem,
            &ops,
            &eq,
            VolumeFlux::EntropyConservative,
            &|fhat, fstar| FluxSign::HighMinusLow.apply(fhat, fstar),
            &mut scratch,
        );
        for a in elem.antiflux_x.iter().chain(&elem.antiflux_y) {
            for v in 0..4 {
                assert!(a[v].abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_flux_sign_orientation() {
        let fhat = [3.0, 1.0];
        let fstar = [1.0, 2.0];
        assert_eq!(FluxSign::HighMinusLow.apply(&fhat, &fstar), [2.0, -1.0]);
        assert_eq!(FluxSign::LowMinusHigh.apply(&fhat, &fstar), [-2.0, 1.0]);
    }

    #[test]
    fn test_low_order_residual_of_uniform_fluxes_is_zero() {
        let ops = SubcellOperators::new(2).unwrap();
        let mut elem = ElementSubcellData::<2>::new(ops.n_nodes_1d);
        elem.fstar_x.fill([1.0, -2.0]);
        elem.fstar_y.fill([0.5, 0.5]);
        let mut du = vec![1.0; ops.n_nodes * 2];
        low_order_residual(&elem, &mut du, &ops, [4.0, 4.0]);
        assert!(du.iter().all(|d| d.abs() < 1e-15));
    }
}
