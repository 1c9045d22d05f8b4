//! Strongly-typed domain types.
//!
//! - [`ElementIndex`], [`InterfaceIndex`], [`BoundaryIndex`]: mesh entity ids
//! - [`Direction`], [`Side`]: coordinate directions and element sides
//! - [`SideBoundaries`]: one value per domain side with named fields

mod indices;
mod sides;

pub use indices::{BoundaryIndex, ElementIndex, InterfaceIndex};
pub use sides::{Direction, Side, SideBoundaries};
