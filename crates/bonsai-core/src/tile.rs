//! Bonsai tiles and per-kind tallies.
//!
//! Tiles are small values: a kind plus an identity. Identity is a [`TileId`]
//! handed out by the owning game, so two wood tiles are never equal even
//! though they look the same on screen.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of a bonsai tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TileKind {
    /// Trunk and branches
    Wood,
    /// Foliage, grows on wood
    Leaf,
    /// Blossoms, grow on leaves
    Flower,
    /// Fruit, sits between two leaves
    Fruit,
    /// Wildcard marker. Names an "any kind" slot or pick; never placed.
    Generic,
}

impl TileKind {
    /// The four kinds that can actually be grown
    pub const PLAYABLE: [TileKind; 4] = [
        TileKind::Wood,
        TileKind::Leaf,
        TileKind::Flower,
        TileKind::Fruit,
    ];

    /// All kinds including the generic marker
    pub const ALL: [TileKind; 5] = [
        TileKind::Wood,
        TileKind::Leaf,
        TileKind::Flower,
        TileKind::Fruit,
        TileKind::Generic,
    ];

    pub fn is_playable(&self) -> bool {
        !matches!(self, TileKind::Generic)
    }
}

impl fmt::Display for TileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TileKind::Wood => "wood",
            TileKind::Leaf => "leaf",
            TileKind::Flower => "flower",
            TileKind::Fruit => "fruit",
            TileKind::Generic => "generic",
        };
        f.write_str(name)
    }
}

/// Stable identity of a tile within one game
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TileId(pub u32);

/// A single tile instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tile {
    pub id: TileId,
    pub kind: TileKind,
}

impl Tile {
    pub const fn new(id: TileId, kind: TileKind) -> Self {
        Self { id, kind }
    }
}

/// A count per tile kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileCounts {
    pub wood: u32,
    pub leaf: u32,
    pub flower: u32,
    pub fruit: u32,
    pub generic: u32,
}

impl TileCounts {
    /// Create an empty tally
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a tally with specific amounts
    pub fn with_amounts(wood: u32, leaf: u32, flower: u32, fruit: u32, generic: u32) -> Self {
        Self {
            wood,
            leaf,
            flower,
            fruit,
            generic,
        }
    }

    /// The fixed starting allowance printed on every player's Seishi:
    /// one generic, one wood and one leaf placement per cultivate turn.
    pub fn seishi() -> Self {
        Self::with_amounts(1, 1, 0, 0, 1)
    }

    /// Tally the kinds of a set of tiles
    pub fn tally<'a>(tiles: impl IntoIterator<Item = &'a Tile>) -> Self {
        let mut counts = Self::new();
        for tile in tiles {
            counts.add(tile.kind, 1);
        }
        counts
    }

    /// Total over all kinds
    pub fn total(&self) -> u32 {
        self.wood + self.leaf + self.flower + self.fruit + self.generic
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Get count of a specific kind
    pub fn get(&self, kind: TileKind) -> u32 {
        match kind {
            TileKind::Wood => self.wood,
            TileKind::Leaf => self.leaf,
            TileKind::Flower => self.flower,
            TileKind::Fruit => self.fruit,
            TileKind::Generic => self.generic,
        }
    }

    fn slot_mut(&mut self, kind: TileKind) -> &mut u32 {
        match kind {
            TileKind::Wood => &mut self.wood,
            TileKind::Leaf => &mut self.leaf,
            TileKind::Flower => &mut self.flower,
            TileKind::Fruit => &mut self.fruit,
            TileKind::Generic => &mut self.generic,
        }
    }

    /// Add to the count of a kind
    pub fn add(&mut self, kind: TileKind, amount: u32) {
        *self.slot_mut(kind) += amount;
    }

    /// Subtract from the count of a kind, returning false if insufficient
    pub fn try_subtract(&mut self, kind: TileKind, amount: u32) -> bool {
        let slot = self.slot_mut(kind);
        if *slot < amount {
            return false;
        }
        *slot -= amount;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_identity_is_not_value() {
        let a = Tile::new(TileId(1), TileKind::Wood);
        let b = Tile::new(TileId(2), TileKind::Wood);
        assert_ne!(a, b);
        assert_eq!(a, a);
    }

    #[test]
    fn test_counts_add_and_subtract() {
        let mut counts = TileCounts::new();
        counts.add(TileKind::Leaf, 2);
        counts.add(TileKind::Fruit, 1);
        assert_eq!(counts.total(), 3);
        assert!(counts.try_subtract(TileKind::Leaf, 1));
        assert!(!counts.try_subtract(TileKind::Fruit, 2));
        assert_eq!(counts, TileCounts::with_amounts(0, 1, 0, 1, 0));
    }

    #[test]
    fn test_tally() {
        let tiles = [
            Tile::new(TileId(0), TileKind::Wood),
            Tile::new(TileId(1), TileKind::Wood),
            Tile::new(TileId(2), TileKind::Flower),
        ];
        let counts = TileCounts::tally(&tiles);
        assert_eq!(counts.get(TileKind::Wood), 2);
        assert_eq!(counts.get(TileKind::Flower), 1);
        assert_eq!(counts.get(TileKind::Leaf), 0);
    }

    #[test]
    fn test_seishi_allowance() {
        let seishi = TileCounts::seishi();
        assert_eq!(seishi.get(TileKind::Generic), 1);
        assert_eq!(seishi.get(TileKind::Wood), 1);
        assert_eq!(seishi.get(TileKind::Leaf), 1);
        assert_eq!(seishi.get(TileKind::Flower), 0);
    }
}
