//! Events produced by the turn engine.
//!
//! Every successful action returns the events it caused so that drivers (a
//! UI, a bot, the network layer) can react without diffing game states.

use crate::cards::CardId;
use crate::goals::GoalCard;
use crate::hex::HexCoord;
use crate::player::{PlayerId, ScoreBreakdown};
use crate::tile::{Tile, TileKind};
use serde::{Deserialize, Serialize};

/// Why the player has to choose a tile kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChoiceReason {
    /// Drawing from an open-row position that grants a pick
    OpenRowPosition,
    /// A master card with a generic entry
    MasterCard,
    /// A helper card lets the player place straight away
    Helper,
}

/// A pick the player still owes before ending the turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TilePick {
    pub options: Vec<TileKind>,
    /// Picks granted by the card itself rather than by the row position
    pub card_choice: bool,
}

impl TilePick {
    pub fn accepts(&self, kind: TileKind) -> bool {
        self.options.contains(&kind)
    }
}

/// One player's final result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerScore {
    pub player: PlayerId,
    pub name: String,
    pub breakdown: ScoreBreakdown,
    pub total: u32,
}

/// Events that occur as a result of actions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    TilePlaced {
        player: PlayerId,
        tile: Tile,
        coord: HexCoord,
    },

    TileRemoved {
        player: PlayerId,
        tile: Tile,
        coord: HexCoord,
    },

    /// A card was taken from the open row
    CardDrawn {
        player: PlayerId,
        card: CardId,
        position: usize,
        /// Tiles added to the supply straight away
        tiles: Vec<TileKind>,
    },

    TileChoiceNeeded {
        player: PlayerId,
        reason: ChoiceReason,
        options: Vec<TileKind>,
    },

    /// A pending pick was resolved
    TileChosen {
        player: PlayerId,
        kind: TileKind,
    },

    /// A pool goal became satisfied and awaits a decision
    GoalReached {
        player: PlayerId,
        goal: GoalCard,
    },

    GoalClaimed {
        player: PlayerId,
        goal: GoalCard,
        /// Same-color cards that left the pool with it
        forbidden: Vec<GoalCard>,
    },

    GoalRenounced {
        player: PlayerId,
        goal: GoalCard,
    },

    TileDiscarded {
        player: PlayerId,
        tile: Tile,
    },

    /// The draw stack is empty and the countdown moved on
    EndGameCounterAdvanced {
        counter: u32,
    },

    TurnEnded {
        player: PlayerId,
        next_player: PlayerId,
    },

    GameEnded {
        ranking: Vec<PlayerScore>,
    },
}
