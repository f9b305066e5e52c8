//! Bonsai - rule engine and turn synchronization for the Bonsai tile-placement game
//!
//! This crate provides the core game logic for Bonsai, including:
//! - Axial hex grid holding each player's tree
//! - Goal evaluation and tile-removal eligibility
//! - Turn state machine with full rule enforcement
//! - Undo/redo of turn-start snapshots
//! - Compact per-turn wire messages and their replay
//!
//! # Architecture
//!
//! Every participant runs its own copy of the game. Only the turn author
//! mutates through the action API; peers replay the author's one-message
//! summary of the turn and end up with the same state.
//!
//! # Modules
//!
//! - [`hex`], [`grid`]: Coordinates and the sparse tile grid
//! - [`tile`], [`cards`], [`player`]: Game pieces and per-player state
//! - [`goals`]: Goal table and the removable-tile / goal predicates
//! - [`game`]: Game state and turn rules
//! - [`engine`], [`history`]: Transactional game session with undo/redo
//! - [`protocol`], [`codec`]: Wire types, turn recording and replay
//! - [`session`], [`config`]: Sans-IO connection state machine
//! - [`bot`]: Random legal-move player

pub mod actions;
pub mod bot;
pub mod cards;
pub mod codec;
pub mod config;
pub mod engine;
pub mod game;
pub mod goals;
pub mod grid;
pub mod hex;
pub mod history;
pub mod player;
pub mod protocol;
pub mod session;
pub mod tile;

// Re-export commonly used types
pub use actions::{ChoiceReason, GameEvent, PlayerScore, TilePick};
pub use bot::Bot;
pub use cards::{CardId, CardType, ZenCard};
pub use codec::{replay, MessageBuilder};
pub use config::NetworkConfig;
pub use engine::{BonsaiGame, GameSnapshot};
pub use game::{GameError, GameSetup, GameState, PlayerSetup, Speed, SyncView};
pub use goals::{GoalCard, GoalColor, GoalTier};
pub use grid::{GridError, HexGrid};
pub use hex::HexCoord;
pub use history::History;
pub use player::{Bonsai, Player, PlayerId, PlayerKind, PotColor};
pub use protocol::{ClientMessage, ServerMessage, StartGame, TurnMessage};
pub use session::{ConnectionState, Role, SessionCoordinator};
pub use tile::{Tile, TileCounts, TileId, TileKind};
