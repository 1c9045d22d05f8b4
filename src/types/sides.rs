//! Coordinate directions and element sides.

use std::fmt;

/// Coordinate direction of a flux or a subcell face normal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// ξ / x direction
    X,
    /// η / y direction
    Y,
}

impl Direction {
    /// Both directions, x first.
    pub const ALL: [Direction; 2] = [Direction::X, Direction::Y];

    /// Position of the direction in `[x, y]` arrays.
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Direction::X => 0,
            Direction::Y => 1,
        }
    }
}

/// Side of a quadrilateral element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    /// x = x_min of the element
    West,
    /// x = x_max of the element
    East,
    /// y = y_min of the element
    South,
    /// y = y_max of the element
    North,
}

impl Side {
    /// All sides in the order west, east, south, north.
    pub const ALL: [Side; 4] = [Side::West, Side::East, Side::South, Side::North];

    /// Normal direction of the side.
    #[inline]
    pub const fn direction(self) -> Direction {
        match self {
            Side::West | Side::East => Direction::X,
            Side::South | Side::North => Direction::Y,
        }
    }

    /// Whether the outward normal points in the positive coordinate direction.
    #[inline]
    pub const fn is_positive(self) -> bool {
        matches!(self, Side::East | Side::North)
    }

    /// Position in `[west, east, south, north]` arrays.
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Side::West => 0,
            Side::East => 1,
            Side::South => 2,
            Side::North => 3,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Side::West => "west",
            Side::East => "east",
            Side::South => "south",
            Side::North => "north",
        };
        f.write_str(name)
    }
}

/// One value per domain side, with named fields.
///
/// Avoids having to remember an index convention for boundary specifications.
///
/// ```
/// use dg_subcell::types::{Side, SideBoundaries};
///
/// let sides = SideBoundaries::new(1, 2, 3, 4);
/// assert_eq!(*sides.get(Side::South), 3);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SideBoundaries<T> {
    /// West boundary (x = x_min)
    pub west: T,
    /// East boundary (x = x_max)
    pub east: T,
    /// South boundary (y = y_min)
    pub south: T,
    /// North boundary (y = y_max)
    pub north: T,
}

impl<T> SideBoundaries<T> {
    /// Create from explicit values: west, east, south, north.
    pub fn new(west: T, east: T, south: T, north: T) -> Self {
        Self {
            west,
            east,
            south,
            north,
        }
    }

    /// Same value on every side.
    pub fn uniform(value: T) -> Self
    where
        T: Clone,
    {
        Self {
            west: value.clone(),
            east: value.clone(),
            south: value.clone(),
            north: value,
        }
    }

    /// Value on a given side.
    pub fn get(&self, side: Side) -> &T {
        match side {
            Side::West => &self.west,
            Side::East => &self.east,
            Side::South => &self.south,
            Side::North => &self.north,
        }
    }

    /// Map a function over all sides.
    pub fn map<U, F>(self, mut f: F) -> SideBoundaries<U>
    where
        F: FnMut(T) -> U,
    {
        SideBoundaries {
            west: f(self.west),
            east: f(self.east),
            south: f(self.south),
            north: f(self.north),
        }
    }
}

impl<T: Default> Default for SideBoundaries<T> {
    fn default() -> Self {
        Self {
            west: T::default(),
            east: T::default(),
            south: T::default(),
            north: T::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_direction_and_orientation() {
        assert_eq!(Side::West.direction(), Direction::X);
        assert_eq!(Side::North.direction(), Direction::Y);
        assert!(Side::East.is_positive());
        assert!(!Side::South.is_positive());
    }

    #[test]
    fn test_side_indices_are_distinct() {
        let mut seen = [false; 4];
        for side in Side::ALL {
            seen[side.index()] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_map_and_get() {
        let sides = SideBoundaries::new(1, 2, 3, 4).map(|x| x * 10);
        assert_eq!(*sides.get(Side::West), 10);
        assert_eq!(*sides.get(Side::North), 40);
    }
}
