//! Goal cards and the pure evaluators that run over a bonsai's grid.
//!
//! Nothing in here mutates state. The engine asks two questions:
//! - which tiles may be pruned right now ([`removable_tiles`])
//! - which goal cards a bonsai currently satisfies ([`is_reached`])

use crate::grid::HexGrid;
use crate::hex::HexCoord;
use crate::tile::{Tile, TileKind};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};

/// Goal color, one per family of shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GoalColor {
    /// Amount of wood
    Wood,
    /// Leaves split over two groups
    Leaf,
    /// Flowers hanging off one side of the pot
    Flower,
    /// Fruits resting on leaf pairs
    Fruit,
    /// Tree reaching past the pot's edges
    Protrusion,
}

impl GoalColor {
    pub const ALL: [GoalColor; 5] = [
        GoalColor::Wood,
        GoalColor::Leaf,
        GoalColor::Flower,
        GoalColor::Fruit,
        GoalColor::Protrusion,
    ];
}

/// Difficulty tier of a goal card
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GoalTier {
    Small,
    Medium,
    Large,
}

impl GoalTier {
    pub const ALL: [GoalTier; 3] = [GoalTier::Small, GoalTier::Medium, GoalTier::Large];
}

/// A goal card. Value semantics: the pool never holds two cards with the
/// same color and tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GoalCard {
    pub color: GoalColor,
    pub tier: GoalTier,
    pub points: u32,
    /// Shape size the bonsai has to reach, interpreted per color
    pub threshold: u32,
}

impl GoalCard {
    /// Look up the card for a color and tier
    pub fn of(color: GoalColor, tier: GoalTier) -> Self {
        GOAL_TABLE
            .iter()
            .find(|card| card.color == color && card.tier == tier)
            .copied()
            // The table covers every combination; see `test_goal_table_is_complete`.
            .unwrap_or(GoalCard {
                color,
                tier,
                points: 0,
                threshold: u32::MAX,
            })
    }

    /// The three cards of one color, smallest first
    pub fn tiers_of(color: GoalColor) -> [GoalCard; 3] {
        GoalTier::ALL.map(|tier| GoalCard::of(color, tier))
    }
}

const fn goal(color: GoalColor, tier: GoalTier, threshold: u32, points: u32) -> GoalCard {
    GoalCard {
        color,
        tier,
        points,
        threshold,
    }
}

/// Points and thresholds for every goal card
pub const GOAL_TABLE: [GoalCard; 15] = [
    goal(GoalColor::Wood, GoalTier::Small, 8, 5),
    goal(GoalColor::Wood, GoalTier::Medium, 10, 10),
    goal(GoalColor::Wood, GoalTier::Large, 12, 15),
    goal(GoalColor::Leaf, GoalTier::Small, 5, 6),
    goal(GoalColor::Leaf, GoalTier::Medium, 7, 9),
    goal(GoalColor::Leaf, GoalTier::Large, 9, 12),
    goal(GoalColor::Flower, GoalTier::Small, 3, 8),
    goal(GoalColor::Flower, GoalTier::Medium, 4, 12),
    goal(GoalColor::Flower, GoalTier::Large, 5, 16),
    goal(GoalColor::Fruit, GoalTier::Small, 3, 9),
    goal(GoalColor::Fruit, GoalTier::Medium, 4, 11),
    goal(GoalColor::Fruit, GoalTier::Large, 5, 13),
    goal(GoalColor::Protrusion, GoalTier::Small, 1, 4),
    goal(GoalColor::Protrusion, GoalTier::Medium, 2, 7),
    goal(GoalColor::Protrusion, GoalTier::Large, 3, 10),
];

/// Tiles that may currently be pruned from the bonsai.
///
/// A tile qualifies when it touches wood, is not wood itself and is not fully
/// enclosed. Flowers and fruits always qualify. A leaf qualifies when it
/// carries no blossom, or when removing it leaves every neighboring flower
/// with another leaf and every neighboring fruit still resting on an adjacent
/// leaf pair drawn from `tiles`.
pub fn removable_tiles(tiles: &[Tile], grid: &HexGrid) -> Vec<Tile> {
    let candidates: HashSet<Tile> = tiles.iter().copied().collect();

    tiles
        .iter()
        .copied()
        .filter(|tile| {
            let Some(coord) = grid.coordinate_of(tile) else {
                return false;
            };
            let neighbors = grid.neighbors_at(&coord);

            if tile.kind == TileKind::Wood
                || neighbors.len() >= 6
                || !neighbors.iter().any(|n| n.kind == TileKind::Wood)
            {
                return false;
            }

            match tile.kind {
                TileKind::Flower | TileKind::Fruit => true,
                TileKind::Leaf => leaf_is_removable(tile, &neighbors, grid, &candidates),
                TileKind::Wood | TileKind::Generic => false,
            }
        })
        .collect()
}

fn leaf_is_removable(
    leaf: &Tile,
    neighbors: &[Tile],
    grid: &HexGrid,
    candidates: &HashSet<Tile>,
) -> bool {
    let mut blossoms = neighbors
        .iter()
        .filter(|n| matches!(n.kind, TileKind::Flower | TileKind::Fruit))
        .peekable();
    if blossoms.peek().is_none() {
        return true;
    }

    blossoms.all(|blossom| {
        let leaves: Vec<Tile> = grid
            .neighbors(blossom)
            .into_iter()
            .filter(|n| n.kind == TileKind::Leaf)
            .collect();
        match blossom.kind {
            TileKind::Flower => leaves.len() >= 2,
            _ => {
                let remaining: Vec<HexCoord> = leaves
                    .iter()
                    .filter(|l| l.id != leaf.id && candidates.contains(*l))
                    .filter_map(|l| grid.coordinate_of(l))
                    .collect();
                has_adjacent_pair(&remaining)
            }
        }
    })
}

/// Whether any two of the coordinates are neighbors of each other
pub fn has_adjacent_pair(coords: &[HexCoord]) -> bool {
    coords
        .iter()
        .enumerate()
        .any(|(i, a)| coords[i + 1..].iter().any(|b| a.is_adjacent(b)))
}

/// Whether a fruit (or a free spot) at `coord` rests on two adjacent leaves
pub fn flanked_by_leaf_pair(coord: &HexCoord, grid: &HexGrid) -> bool {
    let leaves: Vec<HexCoord> = coord
        .neighbors()
        .into_iter()
        .filter(|n| matches!(grid.get(*n), Ok(t) if t.kind == TileKind::Leaf))
        .collect();
    has_adjacent_pair(&leaves)
}

/// Sizes of the connected groups of leaves, largest first
pub fn leaf_components(grid: &HexGrid) -> Vec<usize> {
    let leaves: HashSet<HexCoord> = grid
        .tiles()
        .filter(|(_, t)| t.kind == TileKind::Leaf)
        .map(|(c, _)| c)
        .collect();

    let mut seen: HashSet<HexCoord> = HashSet::new();
    let mut sizes = Vec::new();
    let mut ordered: Vec<&HexCoord> = leaves.iter().collect();
    ordered.sort();

    for start in ordered {
        if !seen.insert(*start) {
            continue;
        }
        let mut size = 0;
        let mut queue = VecDeque::from([*start]);
        while let Some(coord) = queue.pop_front() {
            size += 1;
            for n in coord.neighbors() {
                if leaves.contains(&n) && seen.insert(n) {
                    queue.push_back(n);
                }
            }
        }
        sizes.push(size);
    }

    sizes.sort_unstable_by(|a, b| b.cmp(a));
    sizes
}

/// Which sides of the pot the tree reaches past
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Protrusion {
    pub left: u32,
    pub right: u32,
    pub below: u32,
}

/// Count tiles of `kind` (or of any kind when `None`) outside the pot's width
pub fn protrusion(grid: &HexGrid, kind: Option<TileKind>) -> Protrusion {
    let mut result = Protrusion::default();
    for (coord, tile) in grid.tiles() {
        if kind.is_some_and(|k| k != tile.kind) {
            continue;
        }
        let x = coord.doubled_x();
        if x <= -4 {
            result.left += 1;
        }
        if x >= 4 {
            result.right += 1;
        }
        if coord.r >= 1 {
            result.below += 1;
        }
    }
    result
}

/// 0: inside the pot's width, 1: past one side, 2: past both sides,
/// 3: past both sides and hanging below the rim
pub fn protrusion_level(grid: &HexGrid) -> u32 {
    let p = protrusion(grid, None);
    match (p.left > 0, p.right > 0, p.below > 0) {
        (true, true, true) => 3,
        (true, true, false) => 2,
        (false, false, _) => 0,
        _ => 1,
    }
}

/// Whether a bonsai grid satisfies a goal card
pub fn is_reached(goal: &GoalCard, grid: &HexGrid) -> bool {
    let counts: HashMap<TileKind, u32> = grid.tiles().fold(HashMap::new(), |mut acc, (_, t)| {
        *acc.entry(t.kind).or_default() += 1;
        acc
    });
    let count = |kind| counts.get(&kind).copied().unwrap_or(0);

    match goal.color {
        GoalColor::Wood => count(TileKind::Wood) >= goal.threshold,
        GoalColor::Leaf => {
            let groups = leaf_components(grid);
            groups.len() >= 2 && (groups[0] + groups[1]) as u32 >= goal.threshold
        }
        GoalColor::Flower => {
            let flowers = protrusion(grid, Some(TileKind::Flower));
            flowers.left.max(flowers.right) >= goal.threshold
        }
        GoalColor::Fruit => {
            let flanked = grid
                .tiles()
                .filter(|(c, t)| t.kind == TileKind::Fruit && flanked_by_leaf_pair(c, grid))
                .count() as u32;
            flanked >= goal.threshold
        }
        GoalColor::Protrusion => protrusion_level(grid) >= goal.threshold,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::TileId;

    /// Build a grid from `(q, r, kind)` triples, ids in order
    fn grid_of(cells: &[(i32, i32, TileKind)]) -> (HexGrid, Vec<Tile>) {
        let mut grid = HexGrid::default();
        let mut tiles = Vec::new();
        for (i, (q, r, kind)) in cells.iter().enumerate() {
            let tile = Tile::new(TileId(i as u32), *kind);
            grid.set(HexCoord::new(*q, *r), tile).unwrap();
            tiles.push(tile);
        }
        (grid, tiles)
    }

    #[test]
    fn test_goal_table_is_complete() {
        for color in GoalColor::ALL {
            for tier in GoalTier::ALL {
                let matches: Vec<_> = GOAL_TABLE
                    .iter()
                    .filter(|c| c.color == color && c.tier == tier)
                    .collect();
                assert_eq!(matches.len(), 1, "{color:?}/{tier:?} must appear once");
                assert!(matches[0].points > 0);
            }
        }
    }

    #[test]
    fn test_tiers_are_increasing() {
        for color in GoalColor::ALL {
            let [small, medium, large] = GoalCard::tiers_of(color);
            assert!(small.threshold < medium.threshold && medium.threshold < large.threshold);
            assert!(small.points < medium.points && medium.points < large.points);
        }
    }

    #[test]
    fn test_wood_is_never_removable() {
        let (grid, tiles) = grid_of(&[(0, -1, TileKind::Wood), (0, -2, TileKind::Wood)]);
        assert!(removable_tiles(&tiles, &grid).is_empty());
    }

    #[test]
    fn test_blossoms_need_wood_contact() {
        let (grid, tiles) = grid_of(&[
            (0, -1, TileKind::Wood),
            (0, -2, TileKind::Leaf),
            (0, -3, TileKind::Flower),
        ]);
        // The flower only touches the leaf, the leaf carries the flower alone
        let removable = removable_tiles(&tiles, &grid);
        assert!(removable.is_empty());
    }

    #[test]
    fn test_flower_touching_wood_is_removable() {
        let (grid, tiles) = grid_of(&[
            (0, -1, TileKind::Wood),
            (1, -2, TileKind::Leaf),
            (0, -2, TileKind::Flower),
        ]);
        let removable = removable_tiles(&tiles, &grid);
        assert!(removable.contains(&tiles[2]));
        // The leaf holds the flower's only leaf contact
        assert!(!removable.contains(&tiles[1]));
    }

    #[test]
    fn test_bare_leaf_is_removable() {
        let (grid, tiles) = grid_of(&[(0, -1, TileKind::Wood), (0, -2, TileKind::Leaf)]);
        assert_eq!(removable_tiles(&tiles, &grid), vec![tiles[1]]);
    }

    #[test]
    fn test_leaf_under_flower_with_backup_leaf() {
        let (grid, tiles) = grid_of(&[
            (0, -1, TileKind::Wood),
            (0, -2, TileKind::Leaf),
            (1, -2, TileKind::Leaf),
            (1, -3, TileKind::Flower),
        ]);
        // The flower touches both leaves, so either may go
        let removable = removable_tiles(&tiles, &grid);
        assert!(removable.contains(&tiles[1]));
        assert!(removable.contains(&tiles[2]));
    }

    #[test]
    fn test_leaf_under_fruit_needs_remaining_pair() {
        // Fruit at (0,-3) rests on leaves (0,-2) and (1,-3) which are adjacent.
        let (grid, tiles) = grid_of(&[
            (0, -1, TileKind::Wood),
            (0, -2, TileKind::Leaf),
            (1, -3, TileKind::Leaf),
            (1, -2, TileKind::Wood),
            (0, -3, TileKind::Fruit),
        ]);
        let removable = removable_tiles(&tiles, &grid);
        assert!(!removable.contains(&tiles[1]));
        assert!(!removable.contains(&tiles[2]));
        assert!(!removable.contains(&tiles[4]), "fruit touches no wood");

        // A third leaf next to the fruit, adjacent to (0,-2), frees (1,-3)
        let (grid, tiles) = grid_of(&[
            (0, -1, TileKind::Wood),
            (0, -2, TileKind::Leaf),
            (1, -3, TileKind::Leaf),
            (1, -2, TileKind::Wood),
            (0, -3, TileKind::Fruit),
            (-1, -2, TileKind::Leaf),
        ]);
        let removable = removable_tiles(&tiles, &grid);
        assert!(removable.contains(&tiles[2]));
        assert!(!removable.contains(&tiles[1]), "(0,-2) sits in every pair");
    }

    #[test]
    fn test_enclosed_tile_is_not_removable() {
        let (grid, tiles) = grid_of(&[
            (0, -3, TileKind::Leaf),
            (1, -3, TileKind::Wood),
            (1, -4, TileKind::Wood),
            (0, -4, TileKind::Wood),
            (-1, -3, TileKind::Wood),
            (-1, -2, TileKind::Wood),
            (0, -2, TileKind::Wood),
        ]);
        assert!(removable_tiles(&tiles, &grid).is_empty());
    }

    #[test]
    fn test_leaf_components() {
        let (grid, _) = grid_of(&[
            (0, -1, TileKind::Wood),
            (-1, -1, TileKind::Leaf),
            (-1, -2, TileKind::Leaf),
            (1, -1, TileKind::Leaf),
        ]);
        assert_eq!(leaf_components(&grid), vec![2, 1]);
    }

    #[test]
    fn test_leaf_goal_needs_two_groups() {
        let small = GoalCard::of(GoalColor::Leaf, GoalTier::Small);
        let (grid, _) = grid_of(&[
            (0, -1, TileKind::Wood),
            (0, -2, TileKind::Leaf),
            (1, -3, TileKind::Leaf),
            (0, -3, TileKind::Leaf),
            (-1, -2, TileKind::Leaf),
            (-1, -1, TileKind::Leaf),
        ]);
        // Five leaves, one group
        assert!(!is_reached(&small, &grid));

        let (grid, _) = grid_of(&[
            (0, -1, TileKind::Wood),
            (1, -1, TileKind::Wood),
            (0, -2, TileKind::Leaf),
            (-1, -2, TileKind::Leaf),
            (-1, -1, TileKind::Leaf),
            (2, -1, TileKind::Leaf),
            (2, -2, TileKind::Leaf),
        ]);
        assert_eq!(leaf_components(&grid), vec![3, 2]);
        assert!(is_reached(&small, &grid));
    }

    #[test]
    fn test_wood_goal() {
        let small = GoalCard::of(GoalColor::Wood, GoalTier::Small);
        let cells: Vec<_> = (1..=8).map(|r| (0, -r, TileKind::Wood)).collect();
        let (grid, _) = grid_of(&cells);
        assert!(is_reached(&small, &grid));
        assert!(!is_reached(&GoalCard::of(GoalColor::Wood, GoalTier::Medium), &grid));
    }

    #[test]
    fn test_flower_goal_counts_one_side() {
        let small = GoalCard::of(GoalColor::Flower, GoalTier::Small);
        let (grid, _) = grid_of(&[
            (-3, -1, TileKind::Flower),
            (-3, -2, TileKind::Flower),
            (3, -1, TileKind::Flower),
        ]);
        assert!(!is_reached(&small, &grid));

        let (grid, _) = grid_of(&[
            (-3, -1, TileKind::Flower),
            (-3, -2, TileKind::Flower),
            (-3, 0, TileKind::Flower),
        ]);
        assert!(is_reached(&small, &grid));
    }

    #[test]
    fn test_fruit_goal_counts_flanked_fruit() {
        let small = GoalCard::of(GoalColor::Fruit, GoalTier::Small);
        let (grid, _) = grid_of(&[
            (0, -2, TileKind::Leaf),
            (1, -3, TileKind::Leaf),
            (0, -3, TileKind::Fruit),
            (1, -2, TileKind::Fruit),
            (4, -4, TileKind::Fruit),
        ]);
        // Two fruits rest on the (0,-2)/(1,-3) pair, the third floats
        assert!(!is_reached(&small, &grid));

        let (grid, _) = grid_of(&[
            (0, -2, TileKind::Leaf),
            (1, -3, TileKind::Leaf),
            (0, -3, TileKind::Fruit),
            (1, -2, TileKind::Fruit),
            (4, -4, TileKind::Fruit),
            (4, -5, TileKind::Leaf),
            (5, -5, TileKind::Leaf),
        ]);
        assert!(is_reached(&small, &grid));
    }

    #[test]
    fn test_protrusion_levels() {
        let (grid, _) = grid_of(&[(0, -1, TileKind::Wood)]);
        assert_eq!(protrusion_level(&grid), 0);

        let (grid, _) = grid_of(&[(-3, -1, TileKind::Leaf)]);
        assert_eq!(protrusion_level(&grid), 1);

        let (grid, _) = grid_of(&[(-3, -1, TileKind::Leaf), (3, -1, TileKind::Leaf)]);
        assert_eq!(protrusion_level(&grid), 2);

        let (grid, _) = grid_of(&[
            (-3, -1, TileKind::Leaf),
            (3, -1, TileKind::Leaf),
            (2, 1, TileKind::Leaf),
        ]);
        assert_eq!(protrusion_level(&grid), 3);
        assert!(is_reached(
            &GoalCard::of(GoalColor::Protrusion, GoalTier::Large),
            &grid
        ));
    }
}
