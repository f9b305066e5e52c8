//! Core game state and turn rules.
//!
//! `GameState` holds everything that has to be identical on every instance
//! of a game. Its action methods mutate in place and may leave the value
//! half-updated when they fail, so callers run them on a clone and keep the
//! clone only on success (see [`crate::engine::BonsaiGame`]).

use crate::actions::{ChoiceReason, GameEvent, PlayerScore, TilePick};
use crate::cards::{self, CardId, ZenCard};
use crate::goals::{self, GoalCard, GoalColor};
use crate::grid::{is_pot, GridError, POT_RIM};
use crate::hex::HexCoord;
use crate::player::{Bonsai, Player, PlayerId, PlayerKind, PotColor};
use crate::tile::{Tile, TileCounts, TileId, TileKind};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Width of the face-up card row
pub const OPEN_ROW_SIZE: usize = 4;

pub const MIN_PLAYERS: usize = 2;
pub const MAX_PLAYERS: usize = 4;

/// Tiles each seat starts with
const STARTING_SUPPLY: [&[TileKind]; MAX_PLAYERS] = [
    &[TileKind::Wood],
    &[TileKind::Wood, TileKind::Leaf],
    &[TileKind::Wood, TileKind::Leaf, TileKind::Flower],
    &[TileKind::Wood, TileKind::Leaf, TileKind::Flower, TileKind::Fruit],
];

/// Errors that can occur when applying actions
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum GameError {
    #[error("No active game")]
    NoActiveGame,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Illegal placement: {0}")]
    IllegalPlacement(String),

    #[error("Tile is not eligible for removal")]
    NotEligibleForRemoval,

    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),

    #[error("Nothing to undo or redo")]
    StackEmpty,
}

impl From<GridError> for GameError {
    fn from(err: GridError) -> Self {
        GameError::InvalidArgument(err.to_string())
    }
}

fn invalid(reason: impl Into<String>) -> GameError {
    GameError::InvalidArgument(reason.into())
}

fn illegal(reason: impl Into<String>) -> GameError {
    GameError::IllegalPlacement(reason.into())
}

/// Pacing of bot and remote turns. Cosmetic only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Speed {
    Slow,
    #[default]
    Normal,
    Fast,
    Instant,
}

impl Speed {
    pub const ALL: [Speed; 4] = [Speed::Slow, Speed::Normal, Speed::Fast, Speed::Instant];

    /// Delay before an automated turn is played out
    pub fn turn_delay(&self) -> Duration {
        match self {
            Speed::Slow => Duration::from_millis(2000),
            Speed::Normal => Duration::from_millis(1000),
            Speed::Fast => Duration::from_millis(300),
            Speed::Instant => Duration::ZERO,
        }
    }
}

impl FromStr for Speed {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "slow" => Ok(Speed::Slow),
            "normal" => Ok(Speed::Normal),
            "fast" => Ok(Speed::Fast),
            "instant" => Ok(Speed::Instant),
            other => Err(invalid(format!("unknown speed '{other}'"))),
        }
    }
}

/// One seat of a new game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSetup {
    pub name: String,
    pub pot_color: PotColor,
    pub kind: PlayerKind,
}

impl PlayerSetup {
    pub fn new(name: impl Into<String>, pot_color: PotColor, kind: PlayerKind) -> Self {
        Self {
            name: name.into(),
            pot_color,
            kind,
        }
    }
}

/// Everything needed to build the initial state of a game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSetup {
    pub players: Vec<PlayerSetup>,
    pub goal_colors: Vec<GoalColor>,
    /// Draw stack bottom to top, then the open row left to right
    pub cards: Vec<ZenCard>,
    pub speed: Speed,
}

impl GameSetup {
    /// A setup with the player-count deck shuffled
    pub fn shuffled<R: Rng>(
        players: Vec<PlayerSetup>,
        speed: Speed,
        goal_colors: Vec<GoalColor>,
        rng: &mut R,
    ) -> Self {
        let mut cards = cards::deck_for(players.len());
        cards.shuffle(rng);
        Self {
            players,
            goal_colors,
            cards,
            speed,
        }
    }
}

/// Per-turn scratch state, reset by `end_turn`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnState {
    /// Allowance consumed by ordinary placements
    pub used: TileCounts,
    /// Unused slots of a helper drawn this turn
    pub helper_slots: Vec<TileKind>,
    pub pending_picks: Vec<TilePick>,
    /// Closed by the first placement, draw or goal decision
    pub removals_closed: bool,
    /// Closed by the first goal decision
    pub placements_closed: bool,
}

/// What lets a placement happen
#[derive(Debug, Clone, Copy)]
enum Enabler {
    HelperSlot(usize),
    Allowance(TileKind),
}

/// The complete game state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub speed: Speed,
    pub players: Vec<Player>,
    /// Colors chosen at setup
    pub goal_colors: Vec<GoalColor>,
    /// Goals still up for grabs
    pub goal_pool: Vec<GoalCard>,
    /// Top of the stack is the last element
    pub draw_stack: Vec<ZenCard>,
    /// Always `OPEN_ROW_SIZE` slots
    pub open_cards: Vec<ZenCard>,
    pub current_player: PlayerId,
    /// Turns ended with an empty draw stack
    pub end_game_counter: u32,
    pub turn: TurnState,
    /// Final ranking, set once the game is over
    pub ranking: Option<Vec<PlayerScore>>,
    next_tile_id: u32,
}

impl GameState {
    /// Build the initial state from a setup.
    ///
    /// Tile ids are handed out in seat order, so two instances built from the
    /// same setup are identical.
    pub fn from_setup(setup: GameSetup) -> Result<Self, GameError> {
        let count = setup.players.len();
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&count) {
            return Err(invalid(format!(
                "a game needs {MIN_PLAYERS} to {MAX_PLAYERS} players, got {count}"
            )));
        }
        for (i, p) in setup.players.iter().enumerate() {
            if setup.players[..i].iter().any(|other| other.name == p.name) {
                return Err(invalid(format!("duplicate player name {}", p.name)));
            }
        }
        for (i, color) in setup.goal_colors.iter().enumerate() {
            if setup.goal_colors[..i].contains(color) {
                return Err(invalid(format!("duplicate goal color {color:?}")));
            }
        }
        if setup.cards.len() < OPEN_ROW_SIZE {
            return Err(invalid("not enough cards to fill the open row"));
        }

        let mut draw_stack = setup.cards;
        let open_cards = draw_stack.split_off(draw_stack.len() - OPEN_ROW_SIZE);

        let goal_pool = setup
            .goal_colors
            .iter()
            .flat_map(|color| GoalCard::tiers_of(*color))
            .collect();

        let mut state = Self {
            speed: setup.speed,
            players: Vec::with_capacity(count),
            goal_colors: setup.goal_colors,
            goal_pool,
            draw_stack,
            open_cards,
            current_player: 0,
            end_game_counter: 0,
            turn: TurnState::default(),
            ranking: None,
            next_tile_id: 0,
        };

        for (seat, p) in setup.players.into_iter().enumerate() {
            let mut player = Player::new(p.name, p.pot_color, p.kind);
            for kind in STARTING_SUPPLY[seat] {
                player.supply.push(state.new_tile(*kind));
            }
            state.players.push(player);
        }

        Ok(state)
    }

    /// The cards in setup order: draw stack bottom to top, then the open row
    pub fn card_order(&self) -> Vec<ZenCard> {
        self.draw_stack
            .iter()
            .chain(self.open_cards.iter())
            .cloned()
            .collect()
    }

    fn new_tile(&mut self, kind: TileKind) -> Tile {
        let tile = Tile::new(TileId(self.next_tile_id), kind);
        self.next_tile_id += 1;
        tile
    }

    /// Get the number of players
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Get a player by seat
    pub fn get_player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(id as usize)
    }

    /// The player whose turn it is
    pub fn current(&self) -> &Player {
        &self.players[self.current_player as usize]
    }

    fn current_mut(&mut self) -> &mut Player {
        &mut self.players[self.current_player as usize]
    }

    pub fn is_finished(&self) -> bool {
        self.ranking.is_some()
    }

    fn ensure_running(&self) -> Result<(), GameError> {
        if self.is_finished() {
            Err(invalid("the game is over"))
        } else {
            Ok(())
        }
    }

    // ==================== Queries ====================

    /// Pool goals the current player satisfies and has not decided on yet
    pub fn reached_goals(&self) -> Vec<GoalCard> {
        let player = self.current();
        self.goal_pool
            .iter()
            .filter(|goal| !player.is_excluded(goal))
            .filter(|goal| goals::is_reached(goal, player.bonsai.grid()))
            .copied()
            .collect()
    }

    /// Tiles of the current bonsai that may be removed right now
    pub fn removable_tiles(&self) -> Vec<Tile> {
        let bonsai = &self.current().bonsai;
        goals::removable_tiles(&bonsai.tiles(), bonsai.grid())
    }

    /// Coordinates where the current player may place a tile of `kind` now
    pub fn legal_placements(&self, kind: TileKind) -> Vec<HexCoord> {
        if self.is_finished()
            || self.turn.placements_closed
            || !self.turn.pending_picks.is_empty()
            || self.current().first_of_kind(kind).is_none()
            || self.enabler_for(kind).is_err()
        {
            return Vec::new();
        }
        let bonsai = &self.current().bonsai;
        bonsai
            .grid()
            .playable_coordinates()
            .filter(|coord| check_structure(bonsai, kind, coord).is_ok())
            .collect()
    }

    fn enabler_for(&self, kind: TileKind) -> Result<Enabler, GameError> {
        let slots = &self.turn.helper_slots;
        if let Some(index) = slots
            .iter()
            .position(|k| *k == kind)
            .or_else(|| slots.iter().position(|k| *k == TileKind::Generic))
        {
            return Ok(Enabler::HelperSlot(index));
        }

        let player = self.current();
        if player.has_drawn_card {
            return Err(illegal("cannot place after meditating without a helper"));
        }
        let limits = &player.tree_tile_limits;
        if self.turn.used.get(kind) < limits.get(kind) {
            return Ok(Enabler::Allowance(kind));
        }
        if self.turn.used.generic < limits.generic {
            return Ok(Enabler::Allowance(TileKind::Generic));
        }
        Err(illegal(format!("no {kind} placement left this turn")))
    }

    /// Current scores, best first
    pub fn standings(&self) -> Vec<PlayerScore> {
        let mut scores: Vec<PlayerScore> = self
            .players
            .iter()
            .enumerate()
            .map(|(seat, p)| {
                let breakdown = p.score();
                PlayerScore {
                    player: seat as PlayerId,
                    name: p.name.clone(),
                    total: breakdown.total(),
                    breakdown,
                }
            })
            .collect();
        // Higher total first; ties go to the later seat
        scores.sort_by(|a, b| b.total.cmp(&a.total).then(b.player.cmp(&a.player)));
        scores
    }

    // ==================== Actions ====================

    /// Place a supply tile into the current bonsai
    pub fn cultivate(&mut self, tile: Tile, coord: HexCoord) -> Result<Vec<GameEvent>, GameError> {
        self.ensure_running()?;
        let seat = self.current_player;
        let player = self.current();

        let held = player
            .supply_tile(&tile)
            .map(|index| player.supply[index])
            .ok_or_else(|| invalid("tile is not in the supply"))?;
        if !held.kind.is_playable() {
            return Err(invalid("generic tiles cannot be placed"));
        }
        if !coord.within(player.bonsai.grid().size()) {
            return Err(invalid(format!("({}, {}) is off the grid", coord.q, coord.r)));
        }
        if !self.turn.pending_picks.is_empty() {
            return Err(invalid("pending tile choices must be resolved first"));
        }
        if self.turn.placements_closed {
            return Err(invalid("placements must come before goal decisions"));
        }

        let enabler = self.enabler_for(held.kind)?;
        check_structure(&player.bonsai, held.kind, &coord)?;
        let reached_before = self.reached_goals();

        match enabler {
            Enabler::HelperSlot(index) => {
                self.turn.helper_slots.remove(index);
            }
            Enabler::Allowance(kind) => {
                self.turn.used.add(kind, 1);
            }
        }
        self.turn.removals_closed = true;

        let player = self.current_mut();
        player.take_from_supply(&held);
        player.bonsai.place(coord, held)?;
        if matches!(enabler, Enabler::Allowance(_)) {
            player.has_cultivated = true;
        }

        let mut events = vec![GameEvent::TilePlaced {
            player: seat,
            tile: held,
            coord,
        }];
        events.extend(
            self.reached_goals()
                .into_iter()
                .filter(|goal| !reached_before.contains(goal))
                .map(|goal| GameEvent::GoalReached { player: seat, goal }),
        );
        Ok(events)
    }

    /// Draw a card from the open row
    pub fn meditate(&mut self, card: &ZenCard) -> Result<Vec<GameEvent>, GameError> {
        self.ensure_running()?;
        if card.is_placeholder() {
            return Err(invalid("a placeholder cannot be drawn"));
        }
        let position = self
            .open_cards
            .iter()
            .position(|c| c == card)
            .ok_or_else(|| invalid(format!("card {} is not in the open row", card.id())))?;
        let player = self.current();
        if player.has_drawn_card || player.has_cultivated {
            return Err(invalid("the turn already has its primary action"));
        }

        let seat = self.current_player;
        let mut gained = Vec::new();
        let mut choices = Vec::new();

        match position {
            1 => choices.push((
                ChoiceReason::OpenRowPosition,
                TilePick {
                    options: vec![TileKind::Wood, TileKind::Leaf],
                    card_choice: false,
                },
            )),
            2 => gained.extend([TileKind::Wood, TileKind::Flower]),
            3 => gained.extend([TileKind::Leaf, TileKind::Fruit]),
            _ => {}
        }

        match card {
            ZenCard::Growth(growth) => self.current_mut().add_growth(*growth),
            ZenCard::Tool(tool) => self.current_mut().add_tool(*tool),
            ZenCard::Master(master) => {
                for kind in &master.tiles {
                    if kind.is_playable() {
                        gained.push(*kind);
                    } else {
                        choices.push((
                            ChoiceReason::MasterCard,
                            TilePick {
                                options: TileKind::PLAYABLE.to_vec(),
                                card_choice: true,
                            },
                        ));
                    }
                }
                self.current_mut().hidden_deck.push(card.clone());
            }
            ZenCard::Parchment(_) => self.current_mut().hidden_deck.push(card.clone()),
            ZenCard::Helper(helper) => {
                self.turn.helper_slots = helper.slots.to_vec();
                self.current_mut().hidden_deck.push(card.clone());
            }
            ZenCard::Placeholder => return Err(invalid("a placeholder cannot be drawn")),
        }

        for kind in &gained {
            let tile = self.new_tile(*kind);
            self.current_mut().supply.push(tile);
        }

        // Vacate the slot, slide everything left of it one step right, refill
        self.open_cards[position] = ZenCard::Placeholder;
        self.open_cards[..=position].rotate_right(1);
        self.open_cards[0] = self.draw_stack.pop().unwrap_or(ZenCard::Placeholder);

        self.current_mut().has_drawn_card = true;
        self.turn.removals_closed = true;

        let mut events = vec![GameEvent::CardDrawn {
            player: seat,
            card: card.id(),
            position,
            tiles: gained,
        }];
        for (reason, pick) in choices {
            events.push(GameEvent::TileChoiceNeeded {
                player: seat,
                reason,
                options: pick.options.clone(),
            });
            self.turn.pending_picks.push(pick);
        }
        if let ZenCard::Helper(helper) = card {
            events.push(GameEvent::TileChoiceNeeded {
                player: seat,
                reason: ChoiceReason::Helper,
                options: helper.slots.to_vec(),
            });
        }
        Ok(events)
    }

    /// Resolve a pending pick, adding a fresh tile to the supply
    pub fn apply_tile_choice(
        &mut self,
        kind: TileKind,
        is_card_choice: bool,
    ) -> Result<Vec<GameEvent>, GameError> {
        self.ensure_running()?;
        let index = self
            .turn
            .pending_picks
            .iter()
            .position(|pick| pick.card_choice == is_card_choice && pick.accepts(kind))
            .ok_or_else(|| invalid(format!("no pending choice accepts {kind}")))?;
        self.turn.pending_picks.remove(index);

        let tile = self.new_tile(kind);
        self.current_mut().supply.push(tile);
        Ok(vec![GameEvent::TileChosen {
            player: self.current_player,
            kind,
        }])
    }

    /// Prune a tile from the current bonsai back into the supply
    pub fn remove_tile(&mut self, tile: Tile) -> Result<Vec<GameEvent>, GameError> {
        self.ensure_running()?;
        if self.turn.removals_closed {
            return Err(invalid(
                "tiles must be removed before placing, drawing or deciding goals",
            ));
        }
        let grid = self.current().bonsai.grid();
        let coord = grid
            .coordinate_of(&tile)
            .ok_or(GameError::NotEligibleForRemoval)?;
        let placed = grid.get(coord)?;
        if !self.removable_tiles().contains(&placed) {
            return Err(GameError::NotEligibleForRemoval);
        }

        let player = self.current_mut();
        player.bonsai.remove(&placed);
        player.supply.push(placed);
        Ok(vec![GameEvent::TileRemoved {
            player: self.current_player,
            tile: placed,
            coord,
        }])
    }

    /// Return a supply tile to the reserve
    pub fn discard_tile(&mut self, tile: Tile) -> Result<Vec<GameEvent>, GameError> {
        self.ensure_running()?;
        let player = self.current_mut();
        let index = player
            .supply_tile(&tile)
            .ok_or_else(|| invalid("tile is not in the supply"))?;
        let tile = player.supply.remove(index);
        Ok(vec![GameEvent::TileDiscarded {
            player: self.current_player,
            tile,
        }])
    }

    /// Claim or renounce a goal the current player has reached
    pub fn decide_goal_claim(
        &mut self,
        goal: GoalCard,
        claim: bool,
    ) -> Result<Vec<GameEvent>, GameError> {
        self.ensure_running()?;
        if !self.reached_goals().contains(&goal) {
            return Err(invalid(format!(
                "{:?}/{:?} is not reached or already decided",
                goal.color, goal.tier
            )));
        }
        self.turn.removals_closed = true;
        self.turn.placements_closed = true;
        let seat = self.current_player;

        if !claim {
            self.current_mut().declined_goals.push(goal);
            return Ok(vec![GameEvent::GoalRenounced { player: seat, goal }]);
        }

        self.goal_pool.retain(|g| *g != goal);
        let forbidden: Vec<GoalCard> = self
            .goal_pool
            .iter()
            .filter(|g| g.color == goal.color)
            .copied()
            .collect();
        self.goal_pool.retain(|g| g.color != goal.color);

        let player = self.current_mut();
        player.accepted_goals.push(goal);
        // Forbidden supersedes declined
        player.declined_goals.retain(|g| g.color != goal.color);
        player.forbidden_goals.extend(forbidden.iter().copied());

        Ok(vec![GameEvent::GoalClaimed {
            player: seat,
            goal,
            forbidden,
        }])
    }

    /// Close the turn and advance the seat, or finish the game
    pub fn end_turn(&mut self) -> Result<Vec<GameEvent>, GameError> {
        self.ensure_running()?;
        let player = self.current();
        if player.is_over_supply_limit() {
            return Err(invalid(format!(
                "supply holds {} tiles, the limit is {}",
                player.supply.len(),
                player.supply_limit
            )));
        }
        if !self.turn.pending_picks.is_empty() {
            return Err(invalid("tile choices are still pending"));
        }
        if !self.reached_goals().is_empty() {
            return Err(invalid("reached goals must be claimed or renounced"));
        }

        let mut events = Vec::new();
        if self.draw_stack.is_empty() {
            self.end_game_counter += 1;
            events.push(GameEvent::EndGameCounterAdvanced {
                counter: self.end_game_counter,
            });
        }

        let seat = self.current_player;
        self.current_mut().reset_turn_flags();
        self.turn = TurnState::default();

        if self.end_game_counter as usize > self.player_count() {
            let ranking = self.finish();
            events.push(GameEvent::GameEnded { ranking });
        } else {
            let next_player = ((seat as usize + 1) % self.player_count()) as PlayerId;
            self.current_player = next_player;
            events.push(GameEvent::TurnEnded {
                player: seat,
                next_player,
            });
        }
        Ok(events)
    }

    /// Score everyone and freeze the game
    pub fn finish(&mut self) -> Vec<PlayerScore> {
        if let Some(ranking) = &self.ranking {
            return ranking.clone();
        }
        let ranking = self.standings();
        self.ranking = Some(ranking.clone());
        ranking
    }

    /// The parts of the state every instance must agree on.
    ///
    /// Tile ids are left out: replay picks the first supply tile of a kind,
    /// which need not be the same instance the author placed.
    pub fn sync_view(&self) -> SyncView {
        SyncView {
            current_player: self.current_player,
            end_game_counter: self.end_game_counter,
            goal_pool: self.goal_pool.clone(),
            draw_stack: self.draw_stack.iter().map(ZenCard::id).collect(),
            open_cards: self.open_cards.iter().map(ZenCard::id).collect(),
            finished: self.is_finished(),
            players: self
                .players
                .iter()
                .map(|p| {
                    let mut supply: Vec<TileKind> = p.supply.iter().map(|t| t.kind).collect();
                    supply.sort();
                    PlayerView {
                        name: p.name.clone(),
                        tiles: p
                            .bonsai
                            .grid()
                            .tiles()
                            .map(|(coord, tile)| (coord, tile.kind))
                            .collect(),
                        supply,
                        supply_limit: p.supply_limit,
                        tree_tile_limits: p.tree_tile_limits,
                        hidden_deck: p.hidden_deck.iter().map(ZenCard::id).collect(),
                        accepted_goals: p.accepted_goals.clone(),
                        declined_goals: p.declined_goals.clone(),
                        forbidden_goals: p.forbidden_goals.clone(),
                    }
                })
                .collect(),
        }
    }
}

/// Structural placement rules, independent of allowances
pub fn check_structure(bonsai: &Bonsai, kind: TileKind, coord: &HexCoord) -> Result<(), GameError> {
    let grid = bonsai.grid();
    if is_pot(coord) {
        return Err(illegal("the coordinate belongs to the pot"));
    }
    if grid.is_occupied(coord) {
        return Err(illegal("the coordinate is occupied"));
    }
    match kind {
        TileKind::Wood if bonsai.counts().wood == 0 => {
            if !coord.neighbors().iter().any(|n| POT_RIM.contains(n)) {
                return Err(illegal("the first wood must touch the pot"));
            }
        }
        TileKind::Wood => {
            if !grid.touches_kind(coord, TileKind::Wood) {
                return Err(illegal("wood must touch wood"));
            }
        }
        TileKind::Leaf => {
            if !grid.touches_kind(coord, TileKind::Wood) {
                return Err(illegal("leaf must touch wood"));
            }
        }
        TileKind::Flower => {
            if !grid.touches_kind(coord, TileKind::Leaf) {
                return Err(illegal("flower must touch a leaf"));
            }
        }
        TileKind::Fruit => {
            if !goals::flanked_by_leaf_pair(coord, grid) {
                return Err(illegal("fruit must sit between two adjacent leaves"));
            }
            if grid.touches_kind(coord, TileKind::Fruit) {
                return Err(illegal("fruit may not touch another fruit"));
            }
        }
        TileKind::Generic => return Err(invalid("generic tiles cannot be placed")),
    }
    Ok(())
}

/// Comparable projection of a [`GameState`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncView {
    pub current_player: PlayerId,
    pub end_game_counter: u32,
    pub goal_pool: Vec<GoalCard>,
    pub draw_stack: Vec<CardId>,
    pub open_cards: Vec<CardId>,
    pub finished: bool,
    pub players: Vec<PlayerView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerView {
    pub name: String,
    pub tiles: Vec<(HexCoord, TileKind)>,
    /// Sorted by kind
    pub supply: Vec<TileKind>,
    pub supply_limit: usize,
    pub tree_tile_limits: TileCounts,
    pub hidden_deck: Vec<CardId>,
    pub accepted_goals: Vec<GoalCard>,
    pub declined_goals: Vec<GoalCard>,
    pub forbidden_goals: Vec<GoalCard>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn card(id: CardId) -> ZenCard {
        ZenCard::from_id(id).unwrap()
    }

    fn setup(cards: &[CardId]) -> GameSetup {
        GameSetup {
            players: vec![
                PlayerSetup::new("Ann", PotColor::Red, PlayerKind::Local),
                PlayerSetup::new("Ben", PotColor::Blue, PlayerKind::Remote),
            ],
            goal_colors: vec![GoalColor::Wood, GoalColor::Leaf, GoalColor::Protrusion],
            cards: cards.iter().map(|id| card(*id)).collect(),
            speed: Speed::Instant,
        }
    }

    fn state(cards: &[CardId]) -> GameState {
        GameState::from_setup(setup(cards)).unwrap()
    }

    fn supply_tile(state: &GameState, kind: TileKind) -> Tile {
        state.current().first_of_kind(kind).unwrap()
    }

    #[test]
    fn test_setup_deals_rows_and_starting_tiles() {
        let s = state(&[1, 10, 30, 50, 60, 13]);
        assert_eq!(s.draw_stack, vec![card(1), card(10)]);
        assert_eq!(s.open_cards, vec![card(30), card(50), card(60), card(13)]);
        assert_eq!(s.players[0].supply.len(), 1);
        assert_eq!(s.players[1].supply.len(), 2);
        assert_eq!(s.goal_pool.len(), 9);
        assert_eq!(s.card_order(), setup(&[1, 10, 30, 50, 60, 13]).cards);
    }

    #[test]
    fn test_setup_rejects_bad_input() {
        let mut bad = setup(&[1, 10, 30, 50]);
        bad.players.truncate(1);
        assert!(matches!(
            GameState::from_setup(bad),
            Err(GameError::InvalidArgument(_))
        ));

        let mut dup = setup(&[1, 10, 30, 50]);
        dup.players[1].name = "Ann".into();
        assert!(GameState::from_setup(dup).is_err());

        assert!(GameState::from_setup(setup(&[1, 10])).is_err());
    }

    #[test]
    fn test_first_wood_must_touch_pot() {
        let mut s = state(&[1, 10, 30, 50]);
        let wood = supply_tile(&s, TileKind::Wood);
        let err = s.cultivate(wood, HexCoord::new(0, -3)).unwrap_err();
        assert_eq!(
            err,
            GameError::IllegalPlacement("the first wood must touch the pot".into())
        );
        assert!(s.cultivate(wood, HexCoord::new(0, -1)).is_ok());
    }

    #[test]
    fn test_pot_and_off_grid_coordinates() {
        let mut s = state(&[1, 10, 30, 50]);
        let wood = supply_tile(&s, TileKind::Wood);
        assert!(matches!(
            s.cultivate(wood, HexCoord::new(0, 0)),
            Err(GameError::IllegalPlacement(_))
        ));
        assert!(matches!(
            s.cultivate(wood, HexCoord::new(0, -12)),
            Err(GameError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_allowance_falls_back_to_generic() {
        let mut s = state(&[1, 10, 30, 50]);
        for kind in [TileKind::Wood, TileKind::Wood, TileKind::Wood] {
            let tile = s.new_tile(kind);
            s.current_mut().supply.push(tile);
        }
        let woods: Vec<Tile> = s
            .current()
            .supply
            .iter()
            .filter(|t| t.kind == TileKind::Wood)
            .copied()
            .collect();

        s.cultivate(woods[0], HexCoord::new(0, -1)).unwrap();
        s.cultivate(woods[1], HexCoord::new(0, -2)).unwrap();
        assert_eq!(s.turn.used, TileCounts::with_amounts(1, 0, 0, 0, 1));

        let err = s.cultivate(woods[2], HexCoord::new(0, -3)).unwrap_err();
        assert_eq!(
            err,
            GameError::IllegalPlacement("no wood placement left this turn".into())
        );
    }

    #[test]
    fn test_meditate_shifts_row_and_refills() {
        let mut s = state(&[1, 10, 30, 50, 60, 13]);
        let events = s.meditate(&card(60)).unwrap();

        // 60 sat at position 2: wood and flower come with it
        assert_eq!(
            events[0],
            GameEvent::CardDrawn {
                player: 0,
                card: 60,
                position: 2,
                tiles: vec![TileKind::Wood, TileKind::Flower],
            }
        );
        assert_eq!(s.open_cards, vec![card(10), card(30), card(50), card(13)]);
        assert_eq!(s.draw_stack, vec![card(1)]);
        assert_eq!(s.current().hidden_deck, vec![card(60)]);
        assert_eq!(s.current().supply.len(), 3);
    }

    #[test]
    fn test_meditate_then_cultivate_needs_helper() {
        let mut s = state(&[1, 10, 30, 50, 60, 13]);
        s.meditate(&card(30)).unwrap();
        let wood = supply_tile(&s, TileKind::Wood);
        assert!(matches!(
            s.cultivate(wood, HexCoord::new(0, -1)),
            Err(GameError::IllegalPlacement(_))
        ));
        assert!(s.meditate(&card(10)).is_err());
    }

    #[test]
    fn test_helper_enables_placement_after_draw() {
        // Helper 50 [generic, wood] sits at position 0
        let mut s = state(&[1, 10, 50, 30, 60, 13]);
        let events = s.meditate(&card(50)).unwrap();
        assert!(events.iter().any(|e| matches!(
            e,
            GameEvent::TileChoiceNeeded {
                reason: ChoiceReason::Helper,
                ..
            }
        )));

        let wood = supply_tile(&s, TileKind::Wood);
        s.cultivate(wood, HexCoord::new(0, -1)).unwrap();
        assert!(!s.current().has_cultivated);
        assert_eq!(s.turn.helper_slots, vec![TileKind::Generic]);
    }

    #[test]
    fn test_position_pick_and_master_pick() {
        // Master 34 [generic] at position 1 owes two picks
        let mut s = state(&[1, 10, 30, 34, 60, 13]);
        s.meditate(&card(34)).unwrap();
        assert_eq!(s.turn.pending_picks.len(), 2);
        assert!(s.end_turn().is_err());

        assert!(s.apply_tile_choice(TileKind::Fruit, false).is_err());
        s.apply_tile_choice(TileKind::Fruit, true).unwrap();
        s.apply_tile_choice(TileKind::Leaf, false).unwrap();
        assert!(s.turn.pending_picks.is_empty());
        assert_eq!(s.current().supply.len(), 3);
        s.end_turn().unwrap();
    }

    #[test]
    fn test_supply_limit_blocks_end_turn() {
        let mut s = state(&[1, 10, 30, 50, 60, 13]);
        for _ in 0..5 {
            let tile = s.new_tile(TileKind::Leaf);
            s.current_mut().supply.push(tile);
        }
        assert!(matches!(s.end_turn(), Err(GameError::InvalidArgument(_))));
        let leaf = supply_tile(&s, TileKind::Leaf);
        s.discard_tile(leaf).unwrap();
        let events = s.end_turn().unwrap();
        assert_eq!(
            events,
            vec![GameEvent::TurnEnded {
                player: 0,
                next_player: 1
            }]
        );
    }

    #[test]
    fn test_removal_must_come_first() {
        let mut s = state(&[1, 10, 30, 50]);
        let wood = supply_tile(&s, TileKind::Wood);
        s.cultivate(wood, HexCoord::new(0, -1)).unwrap();
        let leaf = s.new_tile(TileKind::Leaf);
        s.players[0]
            .bonsai
            .place(HexCoord::new(0, -2), leaf)
            .unwrap();

        assert!(matches!(
            s.remove_tile(leaf),
            Err(GameError::InvalidArgument(_))
        ));
        s.turn.removals_closed = false;
        s.remove_tile(leaf).unwrap();
        assert!(s.current().supply.contains(&leaf));
    }

    #[test]
    fn test_wood_is_not_removable() {
        let mut s = state(&[1, 10, 30, 50]);
        let wood = s.new_tile(TileKind::Wood);
        s.players[0]
            .bonsai
            .place(HexCoord::new(0, -1), wood)
            .unwrap();
        assert_eq!(s.remove_tile(wood), Err(GameError::NotEligibleForRemoval));
    }

    #[test]
    fn test_ranking_ties_go_to_later_seat() {
        let mut s = state(&[1, 10, 30, 50]);
        let ranking = s.finish();
        assert_eq!(ranking[0].player, 1);
        assert_eq!(ranking[1].player, 0);
        assert!(s.is_finished());
        assert!(s.end_turn().is_err());
    }

    #[test]
    fn test_speed_delays() {
        assert!(Speed::Slow.turn_delay() > Speed::Normal.turn_delay());
        assert_eq!(Speed::Instant.turn_delay(), Duration::ZERO);
    }
}
