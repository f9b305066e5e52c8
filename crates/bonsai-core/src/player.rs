//! Player state: supply, cards, goals and the bonsai itself.
//!
//! This module contains:
//! - Player struct with supply, card stacks and goal bookkeeping
//! - Bonsai, the grid plus its cached tally
//! - End-of-game score breakdown

use crate::cards::{CardType, GrowthCard, ParchmentTarget, ToolCard, ZenCard};
use crate::goals::GoalCard;
use crate::grid::{GridError, HexGrid};
use crate::hex::HexCoord;
use crate::tile::{Tile, TileCounts, TileKind};
use serde::{Deserialize, Serialize};

/// Seat index, 0-3
pub type PlayerId = u8;

/// Supply tiles a player may hold at the end of a turn
pub const SUPPLY_LIMIT: usize = 5;

/// Extra supply capacity per tool card
pub const TOOL_SUPPLY_BONUS: usize = 2;

/// Pot color, cosmetic only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PotColor {
    Red,
    Blue,
    Green,
    Purple,
}

impl PotColor {
    pub const ALL: [PotColor; 4] = [
        PotColor::Red,
        PotColor::Blue,
        PotColor::Green,
        PotColor::Purple,
    ];

    /// Default pot for a seat
    pub fn for_seat(seat: PlayerId) -> Self {
        Self::ALL[seat as usize % 4]
    }
}

/// Who drives a seat. The rules never look at this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerKind {
    /// Human at this instance
    Local,
    /// Human at another instance
    Remote,
    /// Picks uniformly among legal moves
    RandomBot,
    /// Driven by an external script through the action API
    ScriptedBot,
}

impl PlayerKind {
    pub fn is_bot(&self) -> bool {
        matches!(self, PlayerKind::RandomBot | PlayerKind::ScriptedBot)
    }
}

/// A player's tree. The tally is kept equal to the grid contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bonsai {
    grid: HexGrid,
    counts: TileCounts,
    /// Every tile ever placed, in order
    placed: Vec<Tile>,
}

impl Bonsai {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grid(&self) -> &HexGrid {
        &self.grid
    }

    pub fn counts(&self) -> &TileCounts {
        &self.counts
    }

    pub fn placed(&self) -> &[Tile] {
        &self.placed
    }

    /// Tiles currently on the grid
    pub fn tiles(&self) -> Vec<Tile> {
        self.grid.tiles().map(|(_, tile)| tile).collect()
    }

    /// Put a tile on a free coordinate
    pub fn place(&mut self, coord: HexCoord, tile: Tile) -> Result<(), GridError> {
        self.grid.set(coord, tile)?;
        self.counts.add(tile.kind, 1);
        self.placed.push(tile);
        Ok(())
    }

    /// Take a tile off the grid
    pub fn remove(&mut self, tile: &Tile) -> bool {
        if !self.grid.remove(tile) {
            return false;
        }
        self.counts.try_subtract(tile.kind, 1);
        true
    }
}

/// A single player's state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Display name, unique within a game
    pub name: String,
    pub pot_color: PotColor,
    pub kind: PlayerKind,
    /// Supply tiles allowed at the end of a turn
    pub supply_limit: usize,
    /// Per-turn placements allowed per kind (Seishi plus growth cards)
    pub tree_tile_limits: TileCounts,
    /// Held but unplaced tiles
    pub supply: Vec<Tile>,
    /// Helper, master and parchment cards
    pub hidden_deck: Vec<ZenCard>,
    pub tools: Vec<ToolCard>,
    pub growths: Vec<GrowthCard>,
    pub bonsai: Bonsai,
    pub accepted_goals: Vec<GoalCard>,
    pub declined_goals: Vec<GoalCard>,
    /// Goals this player can no longer claim after a same-color claim
    pub forbidden_goals: Vec<GoalCard>,
    pub has_drawn_card: bool,
    pub has_cultivated: bool,
}

impl Player {
    /// Create a new player with an empty supply
    pub fn new(name: String, pot_color: PotColor, kind: PlayerKind) -> Self {
        Self {
            name,
            pot_color,
            kind,
            supply_limit: SUPPLY_LIMIT,
            tree_tile_limits: TileCounts::seishi(),
            supply: Vec::new(),
            hidden_deck: Vec::new(),
            tools: Vec::new(),
            growths: Vec::new(),
            bonsai: Bonsai::new(),
            accepted_goals: Vec::new(),
            declined_goals: Vec::new(),
            forbidden_goals: Vec::new(),
            has_drawn_card: false,
            has_cultivated: false,
        }
    }

    /// Find a held tile by identity
    pub fn supply_tile(&self, tile: &Tile) -> Option<usize> {
        self.supply.iter().position(|t| t.id == tile.id)
    }

    /// First held tile of a kind
    pub fn first_of_kind(&self, kind: TileKind) -> Option<Tile> {
        self.supply.iter().find(|t| t.kind == kind).copied()
    }

    /// Take a tile out of the supply, returning whether it was held
    pub fn take_from_supply(&mut self, tile: &Tile) -> bool {
        match self.supply_tile(tile) {
            Some(index) => {
                self.supply.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn is_over_supply_limit(&self) -> bool {
        self.supply.len() > self.supply_limit
    }

    pub fn add_growth(&mut self, card: GrowthCard) {
        self.tree_tile_limits.add(card.kind, 1);
        self.growths.push(card);
    }

    pub fn add_tool(&mut self, card: ToolCard) {
        self.supply_limit += TOOL_SUPPLY_BONUS;
        self.tools.push(card);
    }

    /// Whether a goal is off the table for this player
    pub fn is_excluded(&self, goal: &GoalCard) -> bool {
        self.accepted_goals.contains(goal)
            || self.declined_goals.contains(goal)
            || self.forbidden_goals.contains(goal)
    }

    /// Called at end of turn
    pub fn reset_turn_flags(&mut self) {
        self.has_drawn_card = false;
        self.has_cultivated = false;
    }

    /// Number of owned cards of a type
    pub fn card_count(&self, card_type: CardType) -> u32 {
        match card_type {
            CardType::Growth => self.growths.len() as u32,
            CardType::Tool => self.tools.len() as u32,
            _ => self
                .hidden_deck
                .iter()
                .filter(|c| c.card_type() == card_type)
                .count() as u32,
        }
    }

    /// Score the bonsai, goals and parchments
    pub fn score(&self) -> ScoreBreakdown {
        let counts = self.bonsai.counts();
        let grid = self.bonsai.grid();

        let flowers = grid
            .tiles()
            .filter(|(_, t)| t.kind == TileKind::Flower)
            .map(|(_, t)| grid.empty_neighbor_coordinates(&t).len() as u32)
            .sum();

        let parchments = self
            .hidden_deck
            .iter()
            .filter_map(|card| match card {
                ZenCard::Parchment(p) => Some(p),
                _ => None,
            })
            .map(|p| {
                let matches = match p.target {
                    ParchmentTarget::Cards(card_type) => self.card_count(card_type),
                    ParchmentTarget::Tiles(kind) => counts.get(kind),
                };
                p.points * matches
            })
            .sum();

        ScoreBreakdown {
            leaves: counts.leaf * 3,
            fruits: counts.fruit * 7,
            flowers,
            goals: self.accepted_goals.iter().map(|g| g.points).sum(),
            parchments,
        }
    }
}

/// Points by source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub leaves: u32,
    pub fruits: u32,
    pub flowers: u32,
    pub goals: u32,
    pub parchments: u32,
}

impl ScoreBreakdown {
    pub fn total(&self) -> u32 {
        self.leaves + self.fruits + self.flowers + self.goals + self.parchments
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::ParchmentCard;
    use crate::goals::{GoalColor, GoalTier};
    use crate::tile::TileId;

    fn player() -> Player {
        Player::new("Test".to_string(), PotColor::Red, PlayerKind::Local)
    }

    #[test]
    fn test_new_player_has_seishi_allowance() {
        let p = player();
        assert_eq!(p.supply_limit, SUPPLY_LIMIT);
        assert_eq!(p.tree_tile_limits, TileCounts::seishi());
        assert!(!p.has_drawn_card && !p.has_cultivated);
    }

    #[test]
    fn test_bonsai_counts_follow_grid() {
        let mut bonsai = Bonsai::new();
        let wood = Tile::new(TileId(0), TileKind::Wood);
        let leaf = Tile::new(TileId(1), TileKind::Leaf);
        bonsai.place(HexCoord::new(0, -1), wood).unwrap();
        bonsai.place(HexCoord::new(0, -2), leaf).unwrap();
        assert_eq!(*bonsai.counts(), TileCounts::tally(&bonsai.tiles()));

        assert!(bonsai.remove(&leaf));
        assert!(!bonsai.remove(&leaf));
        assert_eq!(*bonsai.counts(), TileCounts::with_amounts(1, 0, 0, 0, 0));
        // History keeps both
        assert_eq!(bonsai.placed().len(), 2);
    }

    #[test]
    fn test_supply_by_identity() {
        let mut p = player();
        let a = Tile::new(TileId(1), TileKind::Wood);
        let b = Tile::new(TileId(2), TileKind::Wood);
        p.supply.push(a);
        assert!(!p.take_from_supply(&b));
        assert_eq!(p.first_of_kind(TileKind::Wood), Some(a));
        assert!(p.take_from_supply(&a));
        assert!(p.supply.is_empty());
    }

    #[test]
    fn test_growth_and_tool_cards() {
        let mut p = player();
        p.add_growth(GrowthCard {
            id: 16,
            kind: TileKind::Flower,
        });
        p.add_tool(ToolCard { id: 1 });
        assert_eq!(p.tree_tile_limits.get(TileKind::Flower), 1);
        assert_eq!(p.supply_limit, SUPPLY_LIMIT + TOOL_SUPPLY_BONUS);
        assert_eq!(p.card_count(CardType::Growth), 1);
        assert_eq!(p.card_count(CardType::Tool), 1);
    }

    #[test]
    fn test_goal_exclusion() {
        let mut p = player();
        let goal = GoalCard::of(GoalColor::Wood, GoalTier::Small);
        assert!(!p.is_excluded(&goal));
        p.declined_goals.push(goal);
        assert!(p.is_excluded(&goal));
    }

    #[test]
    fn test_score_breakdown() {
        let mut p = player();
        let tiles = [
            (0, -1, TileKind::Wood),
            (0, -2, TileKind::Leaf),
            (1, -2, TileKind::Leaf),
            (1, -3, TileKind::Flower),
        ];
        for (i, (q, r, kind)) in tiles.into_iter().enumerate() {
            p.bonsai
                .place(HexCoord::new(q, r), Tile::new(TileId(i as u32), kind))
                .unwrap();
        }
        p.accepted_goals
            .push(GoalCard::of(GoalColor::Leaf, GoalTier::Small));
        p.hidden_deck.push(ZenCard::Parchment(ParchmentCard {
            id: 63,
            target: ParchmentTarget::Tiles(TileKind::Leaf),
            points: 1,
        }));

        let score = p.score();
        assert_eq!(score.leaves, 6);
        // (1,-3) touches the two leaves and four free hexes
        assert_eq!(score.flowers, 4);
        assert_eq!(score.goals, 6);
        assert_eq!(score.parchments, 2);
        assert_eq!(score.total(), 18);
    }
}
