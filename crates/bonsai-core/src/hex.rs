//! Hex coordinate system using axial coordinates (q, r).
//!
//! Every bonsai is grown on its own pointy-top hex grid. The pot sits on the
//! row `r = 0` and the tree grows upwards (towards negative `r`). Axial
//! coordinates make neighbor calculations trivial and keep the sparse grid
//! keyed by two small integers.

use serde::{Deserialize, Serialize};

/// Direction from a hex to one of its six neighbors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    East,
    NorthEast,
    NorthWest,
    West,
    SouthWest,
    SouthEast,
}

impl Direction {
    /// All directions in counter-clockwise order starting from East
    pub const ALL: [Direction; 6] = [
        Direction::East,
        Direction::NorthEast,
        Direction::NorthWest,
        Direction::West,
        Direction::SouthWest,
        Direction::SouthEast,
    ];

    /// Axial offset `(dq, dr)` for this direction
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Direction::East => (1, 0),
            Direction::NorthEast => (1, -1),
            Direction::NorthWest => (0, -1),
            Direction::West => (-1, 0),
            Direction::SouthWest => (-1, 1),
            Direction::SouthEast => (0, 1),
        }
    }
}

/// Axial coordinate for hex grid.
///
/// In axial coordinates:
/// - `q` increases going east (right)
/// - `r` increases going southeast (down, towards the pot)
/// - The third coordinate `s` (not stored) satisfies: q + r + s = 0
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct HexCoord {
    /// Column (increases going east)
    pub q: i32,
    /// Row (increases going southeast)
    pub r: i32,
}

impl HexCoord {
    /// Create a new hex coordinate
    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    /// The implicit third coordinate (s = -q - r)
    pub const fn s(&self) -> i32 {
        -self.q - self.r
    }

    /// The six neighboring hexes in counter-clockwise order starting from East
    pub fn neighbors(&self) -> [HexCoord; 6] {
        Direction::ALL.map(|dir| self.neighbor(dir))
    }

    /// Get the neighbor in a specific direction
    pub fn neighbor(&self, direction: Direction) -> HexCoord {
        let (dq, dr) = direction.offset();
        HexCoord::new(self.q + dq, self.r + dr)
    }

    /// Whether `other` is one of the six neighbors of this hex
    pub fn is_adjacent(&self, other: &HexCoord) -> bool {
        self.distance_to(other) == 1
    }

    /// Distance to another hex (in hex steps)
    pub fn distance_to(&self, other: &HexCoord) -> u32 {
        let dq = (self.q - other.q).abs();
        let dr = (self.r - other.r).abs();
        let ds = (self.s() - other.s()).abs();
        ((dq + dr + ds) / 2) as u32
    }

    /// Horizontal position of the hex center in half-hex units.
    ///
    /// For pointy-top hexes the center lies at `x = q + r / 2`, so doubling
    /// gives an integer. Used to decide which side of the pot a tile is on.
    pub const fn doubled_x(&self) -> i32 {
        2 * self.q + self.r
    }

    /// Whether both axial components lie within `[-size, size]`
    pub const fn within(&self, size: i32) -> bool {
        self.q >= -size && self.q <= size && self.r >= -size && self.r <= size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_hex_neighbors() {
        let center = HexCoord::new(0, 0);
        let neighbors = center.neighbors();

        // Should have 6 unique neighbors
        let unique: HashSet<_> = neighbors.iter().collect();
        assert_eq!(unique.len(), 6);

        // Each neighbor should be distance 1 away
        for neighbor in &neighbors {
            assert_eq!(center.distance_to(neighbor), 1);
            assert!(center.is_adjacent(neighbor));
        }
    }

    #[test]
    fn test_hex_distance() {
        let a = HexCoord::new(0, 0);
        let b = HexCoord::new(2, -1);
        assert_eq!(a.distance_to(&b), 2);

        let c = HexCoord::new(-3, 3);
        assert_eq!(a.distance_to(&c), 3);
    }

    #[test]
    fn test_neighbor_relation_is_symmetric() {
        let hex = HexCoord::new(2, -3);
        for neighbor in hex.neighbors() {
            assert!(neighbor.neighbors().contains(&hex));
        }
    }

    #[test]
    fn test_doubled_x() {
        assert_eq!(HexCoord::new(0, 0).doubled_x(), 0);
        assert_eq!(HexCoord::new(0, -1).doubled_x(), -1);
        assert_eq!(HexCoord::new(-2, 0).doubled_x(), -4);
        assert_eq!(HexCoord::new(3, -2).doubled_x(), 4);
    }

    #[test]
    fn test_within() {
        assert!(HexCoord::new(3, -3).within(8));
        assert!(HexCoord::new(-8, 8).within(8));
        assert!(!HexCoord::new(9, 0).within(8));
        assert!(!HexCoord::new(0, -9).within(8));
    }
}
