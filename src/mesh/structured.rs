//! Structured Cartesian mesh of quadrilateral elements.
//!
//! Elements are numbered lexicographically, `k = ey * nx + ex`. Each element
//! side links either to an interior [`Interface`] (shared with a neighbour,
//! possibly through periodicity) or to a physical [`BoundaryFace`].
//!
//! Interface convention: `left` is the element on the negative side of the
//! face (west or south), `right` the one on the positive side.

use crate::error::ConfigError;
use crate::operators::SubcellOperators;
use crate::types::{BoundaryIndex, Direction, ElementIndex, InterfaceIndex, Side};

/// Interior face shared by two elements.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Interface {
    /// Element on the negative side (its east or north side touches the face)
    pub left: ElementIndex,
    /// Element on the positive side (its west or south side touches the face)
    pub right: ElementIndex,
    /// Normal direction of the face
    pub direction: Direction,
}

/// Element side on the domain boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoundaryFace {
    /// Owning element
    pub element: ElementIndex,
    /// Which side of the element (and of the domain) the face lies on
    pub side: Side,
}

/// What an element side is connected to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FaceLink {
    /// Interior interface
    Interface(InterfaceIndex),
    /// Physical boundary face
    Boundary(BoundaryIndex),
}

/// Uniform structured mesh of `[x_min, x_max] × [y_min, y_max]`.
#[derive(Clone, Debug)]
pub struct StructuredMesh2D {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
    /// Elements in x
    pub nx: usize,
    /// Elements in y
    pub ny: usize,
    /// Element width
    pub dx: f64,
    /// Element height
    pub dy: f64,
    /// Periodicity in x and y
    pub periodic: [bool; 2],
    /// Number of elements
    pub n_elements: usize,
    /// Interior interfaces
    pub interfaces: Vec<Interface>,
    /// Physical boundary faces
    pub boundaries: Vec<BoundaryFace>,
    /// Per element, the link of each side in [`Side::index`] order
    pub element_faces: Vec<[FaceLink; 4]>,
}

impl StructuredMesh2D {
    /// Create a uniform mesh with `nx × ny` elements.
    ///
    /// # Arguments
    /// * `x_range`, `y_range` - domain extent
    /// * `nx`, `ny` - elements per direction
    /// * `periodic` - periodicity in x and y
    pub fn uniform(
        x_range: (f64, f64),
        y_range: (f64, f64),
        nx: usize,
        ny: usize,
        periodic: [bool; 2],
    ) -> Result<Self, ConfigError> {
        if nx == 0 || ny == 0 {
            return Err(ConfigError::InvalidMesh(format!(
                "need at least one element per direction, got {nx} x {ny}"
            )));
        }
        let (x_min, x_max) = x_range;
        let (y_min, y_max) = y_range;
        if !(x_max > x_min && y_max > y_min) {
            return Err(ConfigError::InvalidMesh(format!(
                "degenerate domain [{x_min}, {x_max}] x [{y_min}, {y_max}]"
            )));
        }

        let n_elements = nx * ny;
        let element = |ex: usize, ey: usize| ElementIndex::new(ey * nx + ex);

        let mut interfaces = Vec::new();
        let mut boundaries = Vec::new();
        // Filled below; the placeholder is overwritten for every side.
        let mut element_faces =
            vec![[FaceLink::Boundary(BoundaryIndex::new(usize::MAX)); 4]; n_elements];

        let mut push_interface =
            |left: ElementIndex, right: ElementIndex, direction: Direction| {
                let id = InterfaceIndex::new(interfaces.len());
                interfaces.push(Interface {
                    left,
                    right,
                    direction,
                });
                let (left_side, right_side) = match direction {
                    Direction::X => (Side::East, Side::West),
                    Direction::Y => (Side::North, Side::South),
                };
                element_faces[left.as_usize()][left_side.index()] = FaceLink::Interface(id);
                element_faces[right.as_usize()][right_side.index()] = FaceLink::Interface(id);
            };

        // x-normal faces, nx + 1 per element row
        for ey in 0..ny {
            for fx in 0..=nx {
                if fx > 0 && fx < nx {
                    push_interface(element(fx - 1, ey), element(fx, ey), Direction::X);
                } else if periodic[0] && fx == 0 {
                    // The wrapped face is generated once, at fx == 0
                    push_interface(element(nx - 1, ey), element(0, ey), Direction::X);
                }
            }
        }
        // y-normal faces, ny + 1 per element column
        for fy in 0..=ny {
            for ex in 0..nx {
                if fy > 0 && fy < ny {
                    push_interface(element(ex, fy - 1), element(ex, fy), Direction::Y);
                } else if periodic[1] && fy == 0 {
                    push_interface(element(ex, ny - 1), element(ex, 0), Direction::Y);
                }
            }
        }

        // Physical boundaries on non-periodic sides
        let mut push_boundary = |k: ElementIndex, side: Side| {
            let id = BoundaryIndex::new(boundaries.len());
            boundaries.push(BoundaryFace { element: k, side });
            element_faces[k.as_usize()][side.index()] = FaceLink::Boundary(id);
        };
        if !periodic[0] {
            for ey in 0..ny {
                push_boundary(element(0, ey), Side::West);
                push_boundary(element(nx - 1, ey), Side::East);
            }
        }
        if !periodic[1] {
            for ex in 0..nx {
                push_boundary(element(ex, 0), Side::South);
                push_boundary(element(ex, ny - 1), Side::North);
            }
        }

        Ok(Self {
            x_min,
            x_max,
            y_min,
            y_max,
            nx,
            ny,
            dx: (x_max - x_min) / nx as f64,
            dy: (y_max - y_min) / ny as f64,
            periodic,
            n_elements,
            interfaces,
            boundaries,
            element_faces,
        })
    }

    /// Fully periodic mesh.
    pub fn periodic(
        x_range: (f64, f64),
        y_range: (f64, f64),
        nx: usize,
        ny: usize,
    ) -> Result<Self, ConfigError> {
        Self::uniform(x_range, y_range, nx, ny, [true, true])
    }

    /// Number of interior interfaces.
    pub fn n_interfaces(&self) -> usize {
        self.interfaces.len()
    }

    /// Number of physical boundary faces.
    pub fn n_boundaries(&self) -> usize {
        self.boundaries.len()
    }

    /// Link of side `side` of element `k`.
    #[inline]
    pub fn face_link(&self, k: ElementIndex, side: Side) -> FaceLink {
        self.element_faces[k.as_usize()][side.index()]
    }

    /// `(ex, ey)` position of element `k`.
    #[inline]
    pub fn element_position(&self, k: ElementIndex) -> (usize, usize) {
        (k.as_usize() % self.nx, k.as_usize() / self.nx)
    }

    /// Inverse Jacobian of the reference map per direction, `[2/dx, 2/dy]`.
    #[inline]
    pub fn inverse_jacobian(&self) -> [f64; 2] {
        [2.0 / self.dx, 2.0 / self.dy]
    }

    /// Physical coordinates of node `(i, j)` of element `k`.
    pub fn node_coordinates(
        &self,
        k: ElementIndex,
        ops: &SubcellOperators,
        i: usize,
        j: usize,
    ) -> (f64, f64) {
        let (ex, ey) = self.element_position(k);
        let x0 = self.x_min + ex as f64 * self.dx;
        let y0 = self.y_min + ey as f64 * self.dy;
        (
            x0 + 0.5 * (1.0 + ops.nodes[i]) * self.dx,
            y0 + 0.5 * (1.0 + ops.nodes[j]) * self.dy,
        )
    }

    /// Smallest element extent.
    pub fn h_min(&self) -> f64 {
        self.dx.min(self.dy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_periodic_counts() {
        let mesh = StructuredMesh2D::periodic((0.0, 1.0), (0.0, 1.0), 3, 2).unwrap();
        assert_eq!(mesh.n_elements, 6);
        assert_eq!(mesh.n_interfaces(), 2 * 6);
        assert_eq!(mesh.n_boundaries(), 0);
    }

    #[test]
    fn test_bounded_counts() {
        let mesh = StructuredMesh2D::uniform((0.0, 1.0), (0.0, 1.0), 3, 2, [false, false]).unwrap();
        // x-interfaces: 2 per row * 2 rows, y-interfaces: 1 per column * 3 columns
        assert_eq!(mesh.n_interfaces(), 4 + 3);
        assert_eq!(mesh.n_boundaries(), 2 * 2 + 2 * 3);
    }

    #[test]
    fn test_every_side_linked_consistently() {
        let mesh = StructuredMesh2D::uniform((0.0, 2.0), (0.0, 1.0), 4, 3, [true, false]).unwrap();
        for k in ElementIndex::iter(mesh.n_elements) {
            for side in Side::ALL {
                match mesh.face_link(k, side) {
                    FaceLink::Interface(id) => {
                        let iface = mesh.interfaces[id];
                        assert_eq!(iface.direction, side.direction());
                        if side.is_positive() {
                            assert_eq!(iface.left, k);
                        } else {
                            assert_eq!(iface.right, k);
                        }
                    }
                    FaceLink::Boundary(id) => {
                        let face = mesh.boundaries[id];
                        assert_eq!(face.element, k);
                        assert_eq!(face.side, side);
                    }
                }
            }
        }
    }

    #[test]
    fn test_single_periodic_column_links_to_itself() {
        let mesh = StructuredMesh2D::uniform((0.0, 1.0), (0.0, 0.1), 5, 1, [true, true]).unwrap();
        let k = ElementIndex::new(2);
        let FaceLink::Interface(id) = mesh.face_link(k, Side::North) else {
            panic!("expected interface");
        };
        assert_eq!(mesh.interfaces[id].left, k);
        assert_eq!(mesh.interfaces[id].right, k);
    }

    #[test]
    fn test_node_coordinates_span_element() {
        let mesh = StructuredMesh2D::periodic((0.0, 2.0), (0.0, 1.0), 2, 1).unwrap();
        let ops = SubcellOperators::new(2).unwrap();
        let k = ElementIndex::new(1);
        let (x0, y0) = mesh.node_coordinates(k, &ops, 0, 0);
        let (x1, y1) = mesh.node_coordinates(k, &ops, 2, 2);
        assert!((x0 - 1.0).abs() < 1e-14 && y0.abs() < 1e-14);
        assert!((x1 - 2.0).abs() < 1e-14 && (y1 - 1.0).abs() < 1e-14);
    }

    #[test]
    fn test_invalid_mesh_rejected() {
        assert!(StructuredMesh2D::periodic((0.0, 1.0), (0.0, 1.0), 0, 1).is_err());
        assert!(StructuredMesh2D::periodic((1.0, 1.0), (0.0, 1.0), 1, 1).is_err());
    }
}
