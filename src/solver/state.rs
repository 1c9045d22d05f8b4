//! Nodal solution storage for systems of conservation laws on 2D elements.

use crate::mesh::StructuredMesh2D;
use crate::operators::SubcellOperators;
use crate::types::ElementIndex;

/// Solution storage for 2D systems of `N` conservation laws.
///
/// Interleaved layout `data[(k * n_nodes + node) * N + var]`, so that all
/// variables of a node are contiguous and an element is one contiguous chunk.
#[derive(Clone, Debug, PartialEq)]
pub struct SystemSolution2D<const N: usize> {
    /// Nodal values in interleaved layout
    pub data: Vec<f64>,
    /// Number of elements
    pub n_elements: usize,
    /// Number of nodes per element
    pub n_nodes: usize,
}

impl<const N: usize> SystemSolution2D<N> {
    /// Zero-initialized storage.
    pub fn new(n_elements: usize, n_nodes: usize) -> Self {
        Self {
            data: vec![0.0; n_elements * n_nodes * N],
            n_elements,
            n_nodes,
        }
    }

    /// Zero-initialized storage with the same shape.
    pub fn zeros_like(&self) -> Self {
        Self::new(self.n_elements, self.n_nodes)
    }

    /// Fill from a function of physical position.
    pub fn from_function<F>(mesh: &StructuredMesh2D, ops: &SubcellOperators, f: F) -> Self
    where
        F: Fn(f64, f64) -> [f64; N],
    {
        let mut u = Self::new(mesh.n_elements, ops.n_nodes);
        for k in ElementIndex::iter(mesh.n_elements) {
            for j in 0..ops.n_nodes_1d {
                for i in 0..ops.n_nodes_1d {
                    let (x, y) = mesh.node_coordinates(k, ops, i, j);
                    u.set(k, ops.node(i, j), f(x, y));
                }
            }
        }
        u
    }

    /// Elements' worth of values per chunk, for per-element iteration.
    #[inline]
    pub fn element_len(&self) -> usize {
        self.n_nodes * N
    }

    /// State at `node` of element `k`.
    #[inline]
    pub fn get(&self, k: ElementIndex, node: usize) -> [f64; N] {
        let base = (k.as_usize() * self.n_nodes + node) * N;
        node_state(&self.data[base..base + N])
    }

    /// Overwrite the state at `node` of element `k`.
    #[inline]
    pub fn set(&mut self, k: ElementIndex, node: usize, values: [f64; N]) {
        let base = (k.as_usize() * self.n_nodes + node) * N;
        self.data[base..base + N].copy_from_slice(&values);
    }

    /// Contiguous data of element `k`.
    #[inline]
    pub fn element_data(&self, k: ElementIndex) -> &[f64] {
        let len = self.element_len();
        &self.data[k.as_usize() * len..(k.as_usize() + 1) * len]
    }

    /// Scale all values: `self <- c * self`.
    pub fn scale(&mut self, c: f64) {
        for v in &mut self.data {
            *v *= c;
        }
    }

    /// `self <- self + c * other`.
    pub fn axpy(&mut self, c: f64, other: &Self) {
        debug_assert_eq!(self.data.len(), other.data.len());
        for (a, b) in self.data.iter_mut().zip(&other.data) {
            *a += c * b;
        }
    }

    /// `self <- a * self + b * other`.
    pub fn combine(&mut self, a: f64, b: f64, other: &Self) {
        debug_assert_eq!(self.data.len(), other.data.len());
        for (x, y) in self.data.iter_mut().zip(&other.data) {
            *x = a * *x + b * y;
        }
    }

    /// Set all values to zero.
    pub fn fill_zero(&mut self) {
        self.data.fill(0.0);
    }

    /// Minimum of a scalar quantity over all nodes.
    pub fn min_of<F: Fn(&[f64; N]) -> f64>(&self, quantity: F) -> f64 {
        self.data
            .chunks_exact(N)
            .map(|c| quantity(&node_state(c)))
            .fold(f64::INFINITY, f64::min)
    }

    /// Integral of variable `var` over the domain (GLL quadrature).
    pub fn integral(&self, var: usize, mesh: &StructuredMesh2D, ops: &SubcellOperators) -> f64 {
        let area_factor = 0.25 * mesh.dx * mesh.dy;
        let mut total = 0.0;
        for k in ElementIndex::iter(self.n_elements) {
            let elem = self.element_data(k);
            for j in 0..ops.n_nodes_1d {
                for i in 0..ops.n_nodes_1d {
                    let node = ops.node(i, j);
                    total += ops.weights[i] * ops.weights[j] * elem[node * N + var];
                }
            }
        }
        total * area_factor
    }

    /// Discrete L1 norm of variable `var` (quadrature weighted).
    pub fn l1_norm(&self, var: usize, mesh: &StructuredMesh2D, ops: &SubcellOperators) -> f64 {
        let area_factor = 0.25 * mesh.dx * mesh.dy;
        let mut total = 0.0;
        for k in ElementIndex::iter(self.n_elements) {
            let elem = self.element_data(k);
            for j in 0..ops.n_nodes_1d {
                for i in 0..ops.n_nodes_1d {
                    let node = ops.node(i, j);
                    total += ops.weights[i] * ops.weights[j] * elem[node * N + var].abs();
                }
            }
        }
        total * area_factor
    }

    /// Whether every value is finite.
    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|v| v.is_finite())
    }
}

/// Copy one node's variables out of an interleaved slice.
#[inline(always)]
pub fn node_state<const N: usize>(slice: &[f64]) -> [f64; N] {
    std::array::from_fn(|v| slice[v])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_set_roundtrip_layout() {
        let mut u = SystemSolution2D::<4>::new(2, 9);
        u.set(ElementIndex::new(1), 3, [1.0, 2.0, 3.0, 4.0]);
        assert_eq!(u.get(ElementIndex::new(1), 3), [1.0, 2.0, 3.0, 4.0]);
        assert_eq!(u.data[(9 + 3) * 4 + 2], 3.0);
        assert_eq!(u.element_data(ElementIndex::new(1)).len(), 36);
    }

    #[test]
    fn test_combine_and_axpy() {
        let mut a = SystemSolution2D::<1>::new(1, 2);
        a.data = vec![1.0, 2.0];
        let mut b = a.clone();
        b.data = vec![10.0, 20.0];
        a.axpy(0.5, &b);
        assert_eq!(a.data, vec![6.0, 12.0]);
        a.combine(0.5, 1.0, &b);
        assert_eq!(a.data, vec![13.0, 26.0]);
    }

    #[test]
    fn test_integral_of_constant() {
        let mesh = StructuredMesh2D::periodic((0.0, 2.0), (0.0, 3.0), 2, 3).unwrap();
        let ops = SubcellOperators::new(3).unwrap();
        let u = SystemSolution2D::<2>::from_function(&mesh, &ops, |_, _| [1.5, -1.0]);
        assert!((u.integral(0, &mesh, &ops) - 9.0).abs() < 1e-12);
        assert!((u.l1_norm(1, &mesh, &ops) - 6.0).abs() < 1e-12);
        assert!((u.min_of(|s| s[1]) + 1.0).abs() < 1e-15);
    }
}
