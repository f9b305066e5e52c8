//! Sparse hex grid holding the tiles of one bonsai.
//!
//! Cells map coordinates to [`Tile`] values and a reverse index maps tile ids
//! back to coordinates. Because both sides store ids rather than references,
//! `clone()` produces a fully independent grid whose neighbor queries can only
//! ever return tiles of the clone.

use crate::hex::HexCoord;
use crate::tile::{Tile, TileId, TileKind};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

/// Default half-width of a bonsai grid
pub const GRID_SIZE: i32 = 8;

/// The three hexes forming the rim of the pot. The trunk starts next to them.
pub const POT_RIM: [HexCoord; 3] = [
    HexCoord::new(-1, 0),
    HexCoord::new(0, 0),
    HexCoord::new(1, 0),
];

/// Whether a coordinate is covered by the pot: the rim itself, or anything
/// below the rim and horizontally within the pot's width. Never playable.
pub fn is_pot(coord: &HexCoord) -> bool {
    let x = coord.doubled_x().abs();
    (coord.r == 0 && x <= 2) || (coord.r >= 1 && x <= 3)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("no tile at ({q}, {r})")]
    NotFound { q: i32, r: i32 },

    #[error("({q}, {r}) is not a playable coordinate")]
    NotPlayable { q: i32, r: i32 },
}

/// The hex grid of a single bonsai
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "GridRepr", into = "GridRepr")]
pub struct HexGrid {
    size: i32,
    cells: BTreeMap<HexCoord, Tile>,
    positions: HashMap<TileId, HexCoord>,
}

/// Serialized form: JSON object keys must be strings, so cells travel as a
/// list ordered by coordinate.
#[derive(Serialize, Deserialize)]
struct GridRepr {
    size: i32,
    cells: Vec<(HexCoord, Tile)>,
}

impl From<GridRepr> for HexGrid {
    fn from(repr: GridRepr) -> Self {
        let mut grid = HexGrid::new(repr.size);
        for (coord, tile) in repr.cells {
            grid.cells.insert(coord, tile);
            grid.positions.insert(tile.id, coord);
        }
        grid
    }
}

impl From<HexGrid> for GridRepr {
    fn from(grid: HexGrid) -> Self {
        GridRepr {
            size: grid.size,
            cells: grid.cells.into_iter().collect(),
        }
    }
}

impl Default for HexGrid {
    fn default() -> Self {
        Self::new(GRID_SIZE)
    }
}

impl HexGrid {
    /// Create an empty grid covering `[-size, size]` on both axes
    pub fn new(size: i32) -> Self {
        Self {
            size,
            cells: BTreeMap::new(),
            positions: HashMap::new(),
        }
    }

    pub fn size(&self) -> i32 {
        self.size
    }

    /// Whether a coordinate can ever hold a tile
    pub fn is_playable(&self, coord: &HexCoord) -> bool {
        coord.within(self.size) && !is_pot(coord)
    }

    fn check_playable(&self, coord: &HexCoord) -> Result<(), GridError> {
        if self.is_playable(coord) {
            Ok(())
        } else {
            Err(GridError::NotPlayable {
                q: coord.q,
                r: coord.r,
            })
        }
    }

    /// Get the tile at a coordinate
    pub fn get(&self, coord: HexCoord) -> Result<Tile, GridError> {
        self.check_playable(&coord)?;
        self.cells.get(&coord).copied().ok_or(GridError::NotFound {
            q: coord.q,
            r: coord.r,
        })
    }

    /// Put a tile at a coordinate.
    ///
    /// Overwrites whatever was there; callers check occupancy first. If the
    /// tile already sat somewhere else it is moved.
    pub fn set(&mut self, coord: HexCoord, tile: Tile) -> Result<(), GridError> {
        self.check_playable(&coord)?;
        if let Some(old_coord) = self.positions.remove(&tile.id) {
            self.cells.remove(&old_coord);
        }
        if let Some(previous) = self.cells.insert(coord, tile) {
            self.positions.remove(&previous.id);
        }
        self.positions.insert(tile.id, coord);
        Ok(())
    }

    /// Detach a tile from the grid, returning whether it was present
    pub fn remove(&mut self, tile: &Tile) -> bool {
        match self.positions.remove(&tile.id) {
            Some(coord) => {
                self.cells.remove(&coord);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, tile: &Tile) -> bool {
        self.positions.contains_key(&tile.id)
    }

    pub fn is_occupied(&self, coord: &HexCoord) -> bool {
        self.cells.contains_key(coord)
    }

    /// Where a tile currently sits
    pub fn coordinate_of(&self, tile: &Tile) -> Option<HexCoord> {
        self.positions.get(&tile.id).copied()
    }

    /// Tiles adjacent to a coordinate (occupied or not)
    pub fn neighbors_at(&self, coord: &HexCoord) -> Vec<Tile> {
        coord
            .neighbors()
            .iter()
            .filter_map(|n| self.cells.get(n).copied())
            .collect()
    }

    /// The up to six tiles adjacent to a placed tile
    pub fn neighbors(&self, tile: &Tile) -> Vec<Tile> {
        match self.coordinate_of(tile) {
            Some(coord) => self.neighbors_at(&coord),
            None => Vec::new(),
        }
    }

    /// Playable, unoccupied coordinates next to a placed tile
    pub fn empty_neighbor_coordinates(&self, tile: &Tile) -> Vec<HexCoord> {
        match self.coordinate_of(tile) {
            Some(coord) => coord
                .neighbors()
                .into_iter()
                .filter(|n| self.is_playable(n) && !self.is_occupied(n))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Whether any tile of `kind` is adjacent to `coord`
    pub fn touches_kind(&self, coord: &HexCoord, kind: TileKind) -> bool {
        self.neighbors_at(coord).iter().any(|t| t.kind == kind)
    }

    /// All placed tiles in coordinate order
    pub fn tiles(&self) -> impl Iterator<Item = (HexCoord, Tile)> + '_ {
        self.cells.iter().map(|(coord, tile)| (*coord, *tile))
    }

    /// Every coordinate that could hold a tile
    pub fn playable_coordinates(&self) -> impl Iterator<Item = HexCoord> + '_ {
        (-self.size..=self.size)
            .flat_map(move |q| (-self.size..=self.size).map(move |r| HexCoord::new(q, r)))
            .filter(move |c| !is_pot(c))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn tile(id: u32, kind: TileKind) -> Tile {
        Tile::new(TileId(id), kind)
    }

    #[test]
    fn test_get_empty_and_out_of_range() {
        let grid = HexGrid::new(3);
        assert_eq!(
            grid.get(HexCoord::new(0, -1)),
            Err(GridError::NotFound { q: 0, r: -1 })
        );
        assert_eq!(
            grid.get(HexCoord::new(4, 0)),
            Err(GridError::NotPlayable { q: 4, r: 0 })
        );
    }

    #[test]
    fn test_pot_shape() {
        for rim in POT_RIM {
            assert!(is_pot(&rim));
        }
        assert!(is_pot(&HexCoord::new(-2, 1)));
        assert!(is_pot(&HexCoord::new(0, 3)));
        assert!(!is_pot(&HexCoord::new(2, 0)));
        assert!(!is_pot(&HexCoord::new(2, 1)));
        assert!(!is_pot(&HexCoord::new(0, -1)));
    }

    #[test]
    fn test_pot_is_reserved() {
        let mut grid = HexGrid::default();
        let result = grid.set(HexCoord::new(0, 0), tile(0, TileKind::Wood));
        assert_eq!(result, Err(GridError::NotPlayable { q: 0, r: 0 }));
        assert!(grid.is_empty());
    }

    #[test]
    fn test_set_overwrites_and_keeps_reverse_index() {
        let mut grid = HexGrid::default();
        let wood = tile(0, TileKind::Wood);
        let leaf = tile(1, TileKind::Leaf);
        let coord = HexCoord::new(0, -1);

        grid.set(coord, wood).unwrap();
        grid.set(coord, leaf).unwrap();

        assert_eq!(grid.get(coord).unwrap(), leaf);
        assert!(!grid.contains(&wood));
        assert_eq!(grid.len(), 1);
    }

    #[test]
    fn test_set_moves_existing_tile() {
        let mut grid = HexGrid::default();
        let wood = tile(0, TileKind::Wood);
        grid.set(HexCoord::new(0, -1), wood).unwrap();
        grid.set(HexCoord::new(0, -2), wood).unwrap();

        assert_eq!(grid.len(), 1);
        assert_eq!(grid.coordinate_of(&wood), Some(HexCoord::new(0, -2)));
    }

    #[test]
    fn test_remove() {
        let mut grid = HexGrid::default();
        let wood = tile(0, TileKind::Wood);
        grid.set(HexCoord::new(0, -1), wood).unwrap();

        assert!(grid.remove(&wood));
        assert!(!grid.remove(&wood));
        assert!(grid.is_empty());
    }

    #[test]
    fn test_neighbors_and_empty_neighbors() {
        let mut grid = HexGrid::default();
        let trunk = tile(0, TileKind::Wood);
        let branch = tile(1, TileKind::Wood);
        let leaf = tile(2, TileKind::Leaf);
        grid.set(HexCoord::new(0, -1), trunk).unwrap();
        grid.set(HexCoord::new(0, -2), branch).unwrap();
        grid.set(HexCoord::new(1, -2), leaf).unwrap();

        let neighbors: HashSet<_> = grid.neighbors(&trunk).into_iter().collect();
        assert_eq!(neighbors, HashSet::from([branch, leaf]));

        // (0,-1) touches two pot hexes, two tiles, and two free hexes
        let empty = grid.empty_neighbor_coordinates(&trunk);
        assert_eq!(empty.len(), 2);
        assert!(empty.contains(&HexCoord::new(-1, -1)));
        assert!(empty.contains(&HexCoord::new(1, -1)));
    }

    #[test]
    fn test_clone_is_independent() {
        let mut grid = HexGrid::default();
        let trunk = tile(0, TileKind::Wood);
        let leaf = tile(1, TileKind::Leaf);
        grid.set(HexCoord::new(0, -1), trunk).unwrap();
        grid.set(HexCoord::new(0, -2), leaf).unwrap();

        let mut copy = grid.clone();
        assert_eq!(copy, grid);

        copy.remove(&leaf);
        assert!(copy.neighbors(&trunk).is_empty());
        assert_eq!(grid.neighbors(&trunk), vec![leaf]);
    }

    #[test]
    fn test_serde_round_trip() {
        let mut grid = HexGrid::default();
        grid.set(HexCoord::new(0, -1), tile(0, TileKind::Wood)).unwrap();
        grid.set(HexCoord::new(1, -2), tile(1, TileKind::Leaf)).unwrap();

        let json = serde_json::to_string(&grid).unwrap();
        let decoded: HexGrid = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, grid);
        assert_eq!(
            decoded.coordinate_of(&tile(1, TileKind::Leaf)),
            Some(HexCoord::new(1, -2))
        );
    }
}
