//! The game session: live state, history and turn recording.
//!
//! Every action runs on a clone of the live [`GameState`] and replaces it only
//! when the action succeeds, so a failed call never leaves a trace.

use crate::actions::{GameEvent, PlayerScore, TilePick};
use crate::cards::ZenCard;
use crate::codec::MessageBuilder;
use crate::game::{GameError, GameSetup, GameState, PlayerSetup, Speed};
use crate::goals::{GoalCard, GoalColor};
use crate::hex::HexCoord;
use crate::history::History;
use crate::protocol::TurnMessage;
use crate::tile::{Tile, TileKind};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Everything needed to resume a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub current: Option<GameState>,
    pub undo: Vec<GameState>,
    pub redo: Vec<GameState>,
    pub turn_start: Option<GameState>,
}

impl GameSnapshot {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// One running game
#[derive(Debug, Clone, Default)]
pub struct BonsaiGame {
    current: Option<GameState>,
    history: History,
    /// State the current turn started from
    turn_start: Option<GameState>,
    /// Present while this instance records turns for the wire
    recorder: Option<MessageBuilder>,
    /// Message for the last turn that ended while recording
    outbox: Option<TurnMessage>,
    /// Set once peers mirror this game; undo/redo never reach them
    shared: bool,
}

/// Live state and turn start, enough to roll back a partly applied turn
#[derive(Debug, Clone)]
pub(crate) struct TurnCheckpoint {
    current: Option<GameState>,
    turn_start: Option<GameState>,
}

impl BonsaiGame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start or stop recording turns into wire messages
    pub fn set_recording(&mut self, enabled: bool) {
        self.recorder = enabled.then(MessageBuilder::new);
    }

    pub fn is_recording(&self) -> bool {
        self.recorder.is_some()
    }

    /// Mark the game as mirrored by peers, which disables undo/redo
    pub fn set_shared(&mut self, shared: bool) {
        self.shared = shared;
    }

    pub fn is_shared(&self) -> bool {
        self.shared
    }

    pub fn is_active(&self) -> bool {
        self.current.is_some()
    }

    /// The live state
    pub fn state(&self) -> Result<&GameState, GameError> {
        self.current.as_ref().ok_or(GameError::NoActiveGame)
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Shuffle a fresh deck and start a game; returns the setup to broadcast
    pub fn start_new_game(
        &mut self,
        players: Vec<PlayerSetup>,
        speed: Speed,
        goals: Vec<GoalColor>,
    ) -> Result<GameSetup, GameError> {
        self.start_new_game_with_rng(players, speed, goals, &mut rand::thread_rng())
    }

    pub fn start_new_game_with_rng<R: Rng>(
        &mut self,
        players: Vec<PlayerSetup>,
        speed: Speed,
        goals: Vec<GoalColor>,
        rng: &mut R,
    ) -> Result<GameSetup, GameError> {
        let setup = GameSetup::shuffled(players, speed, goals, rng);
        self.start_from_setup(setup.clone())?;
        Ok(setup)
    }

    /// Start a game from a known setup
    pub fn start_from_setup(&mut self, setup: GameSetup) -> Result<(), GameError> {
        let state = GameState::from_setup(setup)?;
        info!(
            players = state.player_count(),
            cards = state.draw_stack.len() + state.open_cards.len(),
            "game started"
        );
        self.history.clear();
        self.turn_start = Some(state.clone());
        self.current = Some(state);
        self.reset_turn_recording();
        Ok(())
    }

    /// Score the game now and freeze it
    pub fn end_game(&mut self) -> Result<Vec<PlayerScore>, GameError> {
        let ranking = self.transact(|state| Ok(state.finish()))?;
        info!(winner = ?ranking.first().map(|s| &s.name), "game ended");
        Ok(ranking)
    }

    fn transact<T>(
        &mut self,
        action: impl FnOnce(&mut GameState) -> Result<T, GameError>,
    ) -> Result<T, GameError> {
        let mut next = self.state()?.clone();
        let out = action(&mut next)?;
        self.current = Some(next);
        Ok(out)
    }

    fn record(&mut self, f: impl FnOnce(&mut MessageBuilder)) {
        if let Some(builder) = self.recorder.as_mut() {
            f(builder);
        }
    }

    fn reset_turn_recording(&mut self) {
        if let Some(builder) = self.recorder.as_mut() {
            builder.reset();
        }
        self.outbox = None;
    }

    // ==================== Actions ====================

    pub fn cultivate(&mut self, tile: Tile, coord: HexCoord) -> Result<Vec<GameEvent>, GameError> {
        let events = self.transact(|state| state.cultivate(tile, coord))?;
        if let Some(GameEvent::TilePlaced { tile, coord, .. }) = events.first() {
            let (kind, coord) = (tile.kind, *coord);
            debug!(%kind, q = coord.q, r = coord.r, "cultivated");
            self.record(|b| b.record_placement(kind, coord));
        }
        Ok(events)
    }

    pub fn meditate(&mut self, card: &ZenCard) -> Result<Vec<GameEvent>, GameError> {
        let events = self.transact(|state| state.meditate(card))?;
        let required = self.state()?.turn.pending_picks.len();
        if let Some(GameEvent::CardDrawn { position, .. }) = events.first() {
            let position = *position;
            debug!(card = card.id(), position, "meditated");
            self.record(|b| b.record_meditate(position, required));
        }
        Ok(events)
    }

    pub fn apply_tile_choice(
        &mut self,
        kind: TileKind,
        is_card_choice: bool,
    ) -> Result<Vec<GameEvent>, GameError> {
        let events = self.transact(|state| state.apply_tile_choice(kind, is_card_choice))?;
        debug!(%kind, is_card_choice, "tile chosen");
        self.record(|b| b.record_pick(kind));
        Ok(events)
    }

    pub fn remove_tile(&mut self, tile: Tile) -> Result<Vec<GameEvent>, GameError> {
        let events = self.transact(|state| state.remove_tile(tile))?;
        if let Some(GameEvent::TileRemoved { coord, .. }) = events.first() {
            let coord = *coord;
            debug!(q = coord.q, r = coord.r, "tile removed");
            self.record(|b| b.record_removal(coord));
        }
        Ok(events)
    }

    pub fn discard_tile(&mut self, tile: Tile) -> Result<Vec<GameEvent>, GameError> {
        let events = self.transact(|state| state.discard_tile(tile))?;
        if let Some(GameEvent::TileDiscarded { tile, .. }) = events.first() {
            let kind = tile.kind;
            self.record(|b| b.record_discard(kind));
        }
        Ok(events)
    }

    pub fn decide_goal_claim(
        &mut self,
        goal: GoalCard,
        claim: bool,
    ) -> Result<Vec<GameEvent>, GameError> {
        let events = self.transact(|state| state.decide_goal_claim(goal, claim))?;
        debug!(color = ?goal.color, tier = ?goal.tier, claim, "goal decided");
        self.record(|b| b.record_goal(goal, claim));
        Ok(events)
    }

    /// Close the turn. The turn's starting state goes onto the undo stack.
    pub fn end_turn(&mut self) -> Result<Vec<GameEvent>, GameError> {
        let message = match &self.recorder {
            Some(builder) => Some(builder.build()?),
            None => None,
        };
        let events = self.transact(|state| state.end_turn())?;

        if let Some(start) = self.turn_start.take() {
            self.history.commit(start);
        }
        self.turn_start = self.current.clone();
        self.reset_turn_recording();
        self.outbox = message;

        if let Some(state) = &self.current {
            debug!(
                next = state.current_player,
                counter = state.end_game_counter,
                "turn ended"
            );
        }
        Ok(events)
    }

    /// The wire message of the last recorded turn, once
    pub fn take_turn_message(&mut self) -> Option<TurnMessage> {
        self.outbox.take()
    }

    /// Step back one turn. An unfinished turn is dropped first.
    pub fn undo(&mut self) -> Result<(), GameError> {
        self.check_history_available()?;
        let start = self.turn_boundary()?;
        let previous = self.history.undo(start)?;
        self.jump_to(previous);
        Ok(())
    }

    /// Step forward one turn. An unfinished turn is dropped first.
    pub fn redo(&mut self) -> Result<(), GameError> {
        self.check_history_available()?;
        let start = self.turn_boundary()?;
        let next = self.history.redo(start)?;
        self.jump_to(next);
        Ok(())
    }

    fn check_history_available(&self) -> Result<(), GameError> {
        if self.shared || self.is_recording() {
            return Err(GameError::InvalidArgument(
                "undo and redo are unavailable while peers mirror the game".into(),
            ));
        }
        Ok(())
    }

    fn turn_boundary(&self) -> Result<GameState, GameError> {
        match &self.turn_start {
            Some(start) => Ok(start.clone()),
            None => self.state().cloned(),
        }
    }

    fn jump_to(&mut self, state: GameState) {
        debug!(turn_of = state.current_player, "history step");
        self.turn_start = Some(state.clone());
        self.current = Some(state);
        self.reset_turn_recording();
    }

    // ==================== Queries ====================

    pub fn legal_placements(&self, kind: TileKind) -> Vec<HexCoord> {
        self.current
            .as_ref()
            .map(|state| state.legal_placements(kind))
            .unwrap_or_default()
    }

    pub fn reached_goals(&self) -> Vec<GoalCard> {
        self.current
            .as_ref()
            .map(GameState::reached_goals)
            .unwrap_or_default()
    }

    pub fn removable_tiles(&self) -> Vec<Tile> {
        self.current
            .as_ref()
            .map(GameState::removable_tiles)
            .unwrap_or_default()
    }

    pub fn pending_picks(&self) -> Vec<TilePick> {
        self.current
            .as_ref()
            .map(|state| state.turn.pending_picks.clone())
            .unwrap_or_default()
    }

    // ==================== Persistence ====================

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            current: self.current.clone(),
            undo: self.history.undo_stack().to_vec(),
            redo: self.history.redo_stack().to_vec(),
            turn_start: self.turn_start.clone(),
        }
    }

    pub(crate) fn checkpoint(&self) -> TurnCheckpoint {
        TurnCheckpoint {
            current: self.current.clone(),
            turn_start: self.turn_start.clone(),
        }
    }

    /// Undo a partly applied turn. History is untouched until `end_turn`
    /// succeeds, so it needs no rollback.
    pub(crate) fn rollback(&mut self, checkpoint: TurnCheckpoint) {
        self.current = checkpoint.current;
        self.turn_start = checkpoint.turn_start;
        self.reset_turn_recording();
    }

    /// Replace the session with a snapshot. Recording stays as configured.
    pub fn restore(&mut self, snapshot: GameSnapshot) {
        self.current = snapshot.current;
        self.history = History::from_stacks(snapshot.undo, snapshot.redo);
        self.turn_start = snapshot.turn_start;
        self.reset_turn_recording();
    }
}
