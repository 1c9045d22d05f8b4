//! Per-stage storage of the subcell quantities.
//!
//! Inside an element with `n` nodes per direction:
//! - x-faces `(i, j)`, `i ∈ 0..=n`, `j ∈ 0..n`, stored at `j * (n + 1) + i`
//! - y-faces `(i, j)`, `i ∈ 0..n`, `j ∈ 0..=n`, stored at `j * n + i`
//!
//! Faces `0` and `n` of each line lie on the element boundary. Their bar
//! states and surface fluxes are computed once per mesh interface or boundary
//! face ([`FaceBarStates`]) and then gathered into the element arrays, so
//! that everything downstream reads element-local data only.

use crate::types::Direction;

/// Subcell face data of one element.
#[derive(Clone, Debug)]
pub struct ElementSubcellData<const N: usize> {
    n: usize,
    /// Bar states on x-faces
    pub bar_states_x: Vec<[f64; N]>,
    /// Signal speeds on x-faces
    pub lambda_x: Vec<f64>,
    /// Low-order flux on x-faces (surface flux on the element boundary)
    pub fstar_x: Vec<[f64; N]>,
    /// Antidiffusive flux on x-faces (zero on the element boundary)
    pub antiflux_x: Vec<[f64; N]>,
    /// Bar states on y-faces
    pub bar_states_y: Vec<[f64; N]>,
    /// Signal speeds on y-faces
    pub lambda_y: Vec<f64>,
    /// Low-order flux on y-faces
    pub fstar_y: Vec<[f64; N]>,
    /// Antidiffusive flux on y-faces
    pub antiflux_y: Vec<[f64; N]>,
}

impl<const N: usize> ElementSubcellData<N> {
    pub fn new(n_nodes_1d: usize) -> Self {
        let n_faces = (n_nodes_1d + 1) * n_nodes_1d;
        Self {
            n: n_nodes_1d,
            bar_states_x: vec![[0.0; N]; n_faces],
            lambda_x: vec![0.0; n_faces],
            fstar_x: vec![[0.0; N]; n_faces],
            antiflux_x: vec![[0.0; N]; n_faces],
            bar_states_y: vec![[0.0; N]; n_faces],
            lambda_y: vec![0.0; n_faces],
            fstar_y: vec![[0.0; N]; n_faces],
            antiflux_y: vec![[0.0; N]; n_faces],
        }
    }

    /// Nodes per direction.
    #[inline]
    pub fn n_nodes_1d(&self) -> usize {
        self.n
    }

    /// Storage index of x-face `(i, j)`.
    #[inline(always)]
    pub fn x_face(&self, i: usize, j: usize) -> usize {
        j * (self.n + 1) + i
    }

    /// Storage index of y-face `(i, j)`.
    #[inline(always)]
    pub fn y_face(&self, i: usize, j: usize) -> usize {
        j * self.n + i
    }

    /// Storage index of the `face`-th face along line `line` in direction `dir`.
    ///
    /// For x, `face` runs along i and `line` is j; for y the roles swap.
    #[inline(always)]
    pub fn face(&self, dir: Direction, face: usize, line: usize) -> usize {
        match dir {
            Direction::X => self.x_face(face, line),
            Direction::Y => self.y_face(line, face),
        }
    }

    /// Bar states of direction `dir`.
    #[inline]
    pub fn bar_states(&self, dir: Direction) -> &[[f64; N]] {
        match dir {
            Direction::X => &self.bar_states_x,
            Direction::Y => &self.bar_states_y,
        }
    }

    /// Signal speeds of direction `dir`.
    #[inline]
    pub fn lambdas(&self, dir: Direction) -> &[f64] {
        match dir {
            Direction::X => &self.lambda_x,
            Direction::Y => &self.lambda_y,
        }
    }

    /// Low-order fluxes of direction `dir`.
    #[inline]
    pub fn fstar(&self, dir: Direction) -> &[[f64; N]] {
        match dir {
            Direction::X => &self.fstar_x,
            Direction::Y => &self.fstar_y,
        }
    }

    /// Antidiffusive fluxes of direction `dir`.
    #[inline]
    pub fn antiflux(&self, dir: Direction) -> &[[f64; N]] {
        match dir {
            Direction::X => &self.antiflux_x,
            Direction::Y => &self.antiflux_y,
        }
    }

    /// Antidiffusive fluxes of direction `dir`, mutable.
    #[inline]
    pub fn antiflux_mut(&mut self, dir: Direction) -> &mut [[f64; N]] {
        match dir {
            Direction::X => &mut self.antiflux_x,
            Direction::Y => &mut self.antiflux_y,
        }
    }

    /// Bar states of the (up to) four faces around node `(i, j)`.
    #[inline]
    pub fn node_bar_states(&self, i: usize, j: usize) -> [&[f64; N]; 4] {
        [
            &self.bar_states_x[self.x_face(i, j)],
            &self.bar_states_x[self.x_face(i + 1, j)],
            &self.bar_states_y[self.y_face(i, j)],
            &self.bar_states_y[self.y_face(i, j + 1)],
        ]
    }
}

/// Bar states, signal speeds and surface fluxes along one element-boundary face.
///
/// One entry per face node, ordered along the face (j for x-normal faces,
/// i for y-normal faces).
#[derive(Clone, Debug)]
pub struct FaceBarStates<const N: usize> {
    pub bar_states: Vec<[f64; N]>,
    pub lambdas: Vec<f64>,
    pub surface_flux: Vec<[f64; N]>,
}

impl<const N: usize> FaceBarStates<N> {
    pub fn new(n_nodes_1d: usize) -> Self {
        Self {
            bar_states: vec![[0.0; N]; n_nodes_1d],
            lambdas: vec![0.0; n_nodes_1d],
            surface_flux: vec![[0.0; N]; n_nodes_1d],
        }
    }
}

/// All subcell data of a mesh for one stage.
#[derive(Clone, Debug)]
pub struct SubcellData<const N: usize> {
    pub elements: Vec<ElementSubcellData<N>>,
    pub interfaces: Vec<FaceBarStates<N>>,
    pub boundaries: Vec<FaceBarStates<N>>,
}

impl<const N: usize> SubcellData<N> {
    pub fn new(n_elements: usize, n_interfaces: usize, n_boundaries: usize, n_nodes_1d: usize) -> Self {
        Self {
            elements: vec![ElementSubcellData::new(n_nodes_1d); n_elements],
            interfaces: vec![FaceBarStates::new(n_nodes_1d); n_interfaces],
            boundaries: vec![FaceBarStates::new(n_nodes_1d); n_boundaries],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_face_indexing_is_bijective() {
        let data = ElementSubcellData::<1>::new(4);
        let mut seen_x = vec![false; data.lambda_x.len()];
        let mut seen_y = vec![false; data.lambda_y.len()];
        for line in 0..4 {
            for face in 0..=4 {
                let ix = data.face(Direction::X, face, line);
                let iy = data.face(Direction::Y, face, line);
                assert!(!seen_x[ix] && !seen_y[iy]);
                seen_x[ix] = true;
                seen_y[iy] = true;
            }
        }
        assert!(seen_x.iter().all(|&s| s) && seen_y.iter().all(|&s| s));
    }

    #[test]
    fn test_node_bar_states_are_incident_faces() {
        let mut data = ElementSubcellData::<1>::new(3);
        let (ix0, ix1) = (data.x_face(1, 2), data.x_face(2, 2));
        let (iy0, iy1) = (data.y_face(1, 2), data.y_face(1, 3));
        data.bar_states_x[ix0] = [1.0];
        data.bar_states_x[ix1] = [2.0];
        data.bar_states_y[iy0] = [3.0];
        data.bar_states_y[iy1] = [4.0];
        let bars = data.node_bar_states(1, 2);
        assert_eq!([bars[0][0], bars[1][0], bars[2][0], bars[3][0]], [1.0, 2.0, 3.0, 4.0]);
    }
}
