//! Mesh representation.
//!
//! The limiting engine needs a structured grid of subcells per element and an
//! enumerated interface graph; [`StructuredMesh2D`] provides both for uniform
//! Cartesian meshes with optional periodicity per direction.

mod structured;

pub use structured::{BoundaryFace, FaceLink, Interface, StructuredMesh2D};
