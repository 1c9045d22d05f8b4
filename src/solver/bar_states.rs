//! Bar states and signal speeds on every subcell face.
//!
//! For a node pair (u_l, u_r) across a face with normal `d`:
//!
//! ```text
//! λ  = max_abs_speed(u_l, u_r, d)
//! ū  = ½ (u_l + u_r) − ½ (f(u_r) − f(u_l)) / λ
//! ```
//!
//! Three ordered passes per stage:
//! 1. element-interior faces, per element
//! 2. mesh interfaces and physical boundary faces, per face entry
//! 3. gather of the element-boundary faces into the element arrays
//!
//! Each pass writes disjoint storage and is data-parallel.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::boundary::{BoundaryConditions2D, BoundaryContext};
use crate::equations::Equations2D;
use crate::flux::lax_friedrichs_flux;
use crate::mesh::{FaceLink, StructuredMesh2D};
use crate::operators::SubcellOperators;
use crate::types::{Direction, ElementIndex, Side};

use super::containers::{ElementSubcellData, FaceBarStates, SubcellData};
use super::parallel::{element_chunks, elements_mut, elements_ref};
use super::state::{SystemSolution2D, node_state};

/// Smallest signal speed stored on a face.
///
/// Below it the bar state degenerates to the arithmetic mean.
pub const LAMBDA_FLOOR: f64 = 1e-14;

/// Bar state and signal speed of the pair (u_l, u_r).
#[inline]
pub fn bar_state<const N: usize, E: Equations2D<N>>(
    equations: &E,
    u_l: &[f64; N],
    u_r: &[f64; N],
    dir: Direction,
) -> ([f64; N], f64) {
    let lambda = equations.max_abs_speed(u_l, u_r, dir);
    // also catches NaN
    if !(lambda > LAMBDA_FLOOR) {
        return (std::array::from_fn(|v| 0.5 * (u_l[v] + u_r[v])), LAMBDA_FLOOR);
    }
    let f_l = equations.flux(u_l, dir);
    let f_r = equations.flux(u_r, dir);
    let inv_lambda = 1.0 / lambda;
    let bar = std::array::from_fn(|v| {
        0.5 * (u_l[v] + u_r[v]) - 0.5 * (f_r[v] - f_l[v]) * inv_lambda
    });
    (bar, lambda)
}

#[inline(always)]
fn element_node<const N: usize>(u_elem: &[f64], node: usize) -> [f64; N] {
    node_state(&u_elem[node * N..(node + 1) * N])
}

/// Bar states on the interior faces `1..n` of one element.
pub fn compute_interior_bar_states<const N: usize, E: Equations2D<N>>(
    elem: &mut ElementSubcellData<N>,
    u_elem: &[f64],
    equations: &E,
) {
    let n = elem.n_nodes_1d();
    for j in 0..n {
        for i in 1..n {
            let u_l = element_node::<N>(u_elem, j * n + i - 1);
            let u_r = element_node::<N>(u_elem, j * n + i);
            let (bar, lambda) = bar_state(equations, &u_l, &u_r, Direction::X);
            let f = elem.x_face(i, j);
            elem.bar_states_x[f] = bar;
            elem.lambda_x[f] = lambda;
        }
    }
    for j in 1..n {
        for i in 0..n {
            let u_l = element_node::<N>(u_elem, (j - 1) * n + i);
            let u_r = element_node::<N>(u_elem, j * n + i);
            let (bar, lambda) = bar_state(equations, &u_l, &u_r, Direction::Y);
            let f = elem.y_face(i, j);
            elem.bar_states_y[f] = bar;
            elem.lambda_y[f] = lambda;
        }
    }
}

/// Node `(i, j)` of element side `side` at position `t` along the side.
#[inline(always)]
fn side_node(side: Side, t: usize, n: usize) -> (usize, usize) {
    match side {
        Side::West => (0, t),
        Side::East => (n - 1, t),
        Side::South => (t, 0),
        Side::North => (t, n - 1),
    }
}

fn fill_face<const N: usize, E: Equations2D<N>>(
    face: &mut FaceBarStates<N>,
    t: usize,
    equations: &E,
    u_l: &[f64; N],
    u_r: &[f64; N],
    dir: Direction,
) {
    let (bar, lambda) = bar_state(equations, u_l, u_r, dir);
    face.bar_states[t] = bar;
    face.lambdas[t] = lambda;
    face.surface_flux[t] = lax_friedrichs_flux(equations, u_l, u_r, lambda, dir);
}

/// Bar states and surface fluxes on all mesh interfaces.
pub fn compute_interface_bar_states<const N: usize, E: Equations2D<N>>(
    mesh: &StructuredMesh2D,
    equations: &E,
    u: &SystemSolution2D<N>,
    faces: &mut [FaceBarStates<N>],
    n: usize,
) {
    elements_mut!(faces)
        .zip(elements_ref!(mesh.interfaces))
        .for_each(|(face, interface)| {
            let (left_side, right_side) = match interface.direction {
                Direction::X => (Side::East, Side::West),
                Direction::Y => (Side::North, Side::South),
            };
            for t in 0..n {
                let (il, jl) = side_node(left_side, t, n);
                let (ir, jr) = side_node(right_side, t, n);
                let u_l = u.get(interface.left, jl * n + il);
                let u_r = u.get(interface.right, jr * n + ir);
                fill_face(face, t, equations, &u_l, &u_r, interface.direction);
            }
        });
}

/// Bar states and surface fluxes on all physical boundary faces.
///
/// The exterior state comes from the boundary condition of the face's side.
pub fn compute_boundary_bar_states<const N: usize, E: Equations2D<N> + 'static>(
    mesh: &StructuredMesh2D,
    ops: &SubcellOperators,
    equations: &E,
    boundary_conditions: &BoundaryConditions2D<N, E>,
    u: &SystemSolution2D<N>,
    time: f64,
    faces: &mut [FaceBarStates<N>],
) {
    let n = ops.n_nodes_1d;
    elements_mut!(faces)
        .zip(elements_ref!(mesh.boundaries))
        .for_each(|(face, boundary)| {
            let side = boundary.side;
            for t in 0..n {
                let (i, j) = side_node(side, t, n);
                let inner = u.get(boundary.element, ops.node(i, j));
                let ctx = BoundaryContext {
                    time,
                    position: mesh.node_coordinates(boundary.element, ops, i, j),
                    side,
                };
                let outer = boundary_conditions.outer_state(&inner, &ctx, equations);
                let (u_l, u_r) = if side.is_positive() {
                    (inner, outer)
                } else {
                    (outer, inner)
                };
                fill_face(face, t, equations, &u_l, &u_r, side.direction());
            }
        });
}

/// Copy the element-boundary face data into the element arrays.
pub fn gather_face_bar_states<const N: usize>(mesh: &StructuredMesh2D, data: &mut SubcellData<N>) {
    let SubcellData {
        elements,
        interfaces,
        boundaries,
    } = data;
    let (interfaces, boundaries) = (&*interfaces, &*boundaries);
    elements_mut!(elements)
        .enumerate()
        .for_each(|(k, elem)| {
            let n = elem.n_nodes_1d();
            for side in Side::ALL {
                let face = match mesh.face_link(ElementIndex::new(k), side) {
                    FaceLink::Interface(id) => &interfaces[id.as_usize()],
                    FaceLink::Boundary(id) => &boundaries[id.as_usize()],
                };
                let position = if side.is_positive() { n } else { 0 };
                let dir = side.direction();
                for t in 0..n {
                    let f = elem.face(dir, position, t);
                    let (bars, lambdas, fstar) = match dir {
                        Direction::X => (&mut elem.bar_states_x, &mut elem.lambda_x, &mut elem.fstar_x),
                        Direction::Y => (&mut elem.bar_states_y, &mut elem.lambda_y, &mut elem.fstar_y),
                    };
                    bars[f] = face.bar_states[t];
                    lambdas[f] = face.lambdas[t];
                    fstar[f] = face.surface_flux[t];
                }
            }
        });
}

/// All bar-state passes for one stage.
#[allow(clippy::too_many_arguments)]
pub fn compute_bar_states<const N: usize, E: Equations2D<N> + 'static>(
    mesh: &StructuredMesh2D,
    ops: &SubcellOperators,
    equations: &E,
    boundary_conditions: &BoundaryConditions2D<N, E>,
    u: &SystemSolution2D<N>,
    time: f64,
    data: &mut SubcellData<N>,
) {
    let n = ops.n_nodes_1d;
    elements_mut!(data.elements)
        .zip(element_chunks!(u.data, u.element_len()))
        .for_each(|(elem, u_elem)| compute_interior_bar_states(elem, u_elem, equations));

    compute_interface_bar_states(mesh, equations, u, &mut data.interfaces, n);
    compute_boundary_bar_states(
        mesh,
        ops,
        equations,
        boundary_conditions,
        u,
        time,
        &mut data.boundaries,
    );
    gather_face_bar_states(mesh, data);
}
