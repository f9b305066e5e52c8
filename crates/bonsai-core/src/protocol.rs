//! Wire protocol shared by the session coordinator and the relay server.
//!
//! Domain enums travel as small integer codes and cards as catalog ids, so a
//! turn message stays a few dozen bytes no matter how big the game state is.

use crate::cards::{CardId, CardType, ZenCard};
use crate::game::{GameError, GameSetup, PlayerSetup, Speed};
use crate::goals::{GoalCard, GoalColor, GoalTier};
use crate::hex::HexCoord;
use crate::player::{PlayerKind, PotColor};
use crate::tile::TileKind;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unknown {kind} code {code}")]
pub struct UnknownCode {
    pub kind: &'static str,
    pub code: u8,
}

/// Declares a wire enum that serializes as its `u8` code and decodes into a
/// domain enum. `total` also derives the domain-to-wire direction.
macro_rules! wire_enum {
    (total $(#[$meta:meta])* $name:ident : $domain:ident { $($variant:ident = $code:literal),+ $(,)? }) => {
        wire_enum!($(#[$meta])* $name : $domain { $($variant = $code),+ });

        impl From<$domain> for $name {
            fn from(value: $domain) -> Self {
                match value {
                    $($domain::$variant => $name::$variant),+
                }
            }
        }
    };
    ($(#[$meta:meta])* $name:ident : $domain:ident { $($variant:ident = $code:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(into = "u8", try_from = "u8")]
        pub enum $name {
            $($variant = $code),+
        }

        impl From<$name> for u8 {
            fn from(code: $name) -> u8 {
                code as u8
            }
        }

        impl TryFrom<u8> for $name {
            type Error = UnknownCode;

            fn try_from(code: u8) -> Result<Self, Self::Error> {
                match code {
                    $($code => Ok($name::$variant),)+
                    _ => Err(UnknownCode {
                        kind: stringify!($name),
                        code,
                    }),
                }
            }
        }

        impl From<$name> for $domain {
            fn from(code: $name) -> Self {
                match code {
                    $($name::$variant => $domain::$variant),+
                }
            }
        }
    };
}

wire_enum!(
    /// Placeable tile kinds
    WireTileKind: TileKind { Wood = 0, Leaf = 1, Flower = 2, Fruit = 3 }
);

wire_enum!(total WireGoalColor: GoalColor {
    Wood = 0,
    Leaf = 1,
    Flower = 2,
    Fruit = 3,
    Protrusion = 4,
});

wire_enum!(total WireGoalTier: GoalTier { Small = 0, Medium = 1, Large = 2 });

wire_enum!(total WireCardType: CardType {
    Growth = 0,
    Helper = 1,
    Master = 2,
    Parchment = 3,
    Tool = 4,
    Placeholder = 5,
});

wire_enum!(total WirePotColor: PotColor { Red = 0, Blue = 1, Green = 2, Purple = 3 });

wire_enum!(total WireSpeed: Speed { Slow = 0, Normal = 1, Fast = 2, Instant = 3 });

impl WireTileKind {
    /// Generic is a marker and never crosses the wire
    pub fn encode(kind: TileKind) -> Result<Self, GameError> {
        match kind {
            TileKind::Wood => Ok(WireTileKind::Wood),
            TileKind::Leaf => Ok(WireTileKind::Leaf),
            TileKind::Flower => Ok(WireTileKind::Flower),
            TileKind::Fruit => Ok(WireTileKind::Fruit),
            TileKind::Generic => Err(GameError::InvalidArgument(
                "generic tiles have no wire code".into(),
            )),
        }
    }
}

/// Axial `(q, r)`
pub type WireCoord = (i32, i32);

pub fn encode_coord(coord: HexCoord) -> WireCoord {
    (coord.q, coord.r)
}

pub fn decode_coord((q, r): WireCoord) -> HexCoord {
    HexCoord::new(q, r)
}

/// A goal card by color and tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WireGoal(pub WireGoalColor, pub WireGoalTier);

impl From<GoalCard> for WireGoal {
    fn from(goal: GoalCard) -> Self {
        WireGoal(goal.color.into(), goal.tier.into())
    }
}

impl From<WireGoal> for GoalCard {
    fn from(WireGoal(color, tier): WireGoal) -> Self {
        GoalCard::of(color.into(), tier.into())
    }
}

/// The one full-state message: everything a guest needs to build the
/// initial state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartGame {
    /// `(name, pot color, bot)` in seat order
    pub players: Vec<(String, WirePotColor, bool)>,
    pub goal_colors: Vec<WireGoalColor>,
    /// Draw stack bottom to top, then the open row left to right
    pub cards: Vec<(WireCardType, CardId)>,
    pub speed: WireSpeed,
}

impl StartGame {
    pub fn from_setup(setup: &GameSetup) -> Self {
        Self {
            players: setup
                .players
                .iter()
                .map(|p| (p.name.clone(), p.pot_color.into(), p.kind.is_bot()))
                .collect(),
            goal_colors: setup.goal_colors.iter().map(|c| (*c).into()).collect(),
            cards: setup
                .cards
                .iter()
                .map(|c| (c.card_type().into(), c.id()))
                .collect(),
            speed: setup.speed.into(),
        }
    }

    /// Rebuild the setup as seen from the instance driving `local`.
    ///
    /// Bot seats become random bots, `local` becomes the local seat and every
    /// other seat is remote.
    pub fn to_setup(&self, local: &str) -> Result<GameSetup, GameError> {
        let players = self
            .players
            .iter()
            .map(|(name, pot, bot)| {
                let kind = if *bot {
                    PlayerKind::RandomBot
                } else if name == local {
                    PlayerKind::Local
                } else {
                    PlayerKind::Remote
                };
                PlayerSetup::new(name.clone(), (*pot).into(), kind)
            })
            .collect();

        let cards = self
            .cards
            .iter()
            .map(|(card_type, id)| {
                let card = ZenCard::from_id(*id)
                    .map_err(|e| GameError::InvalidArgument(e.to_string()))?;
                if card.card_type() != CardType::from(*card_type) {
                    return Err(GameError::InvalidArgument(format!(
                        "card {id} is not a {:?} card",
                        CardType::from(*card_type)
                    )));
                }
                Ok(card)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(GameSetup {
            players,
            goal_colors: self.goal_colors.iter().map(|c| (*c).into()).collect(),
            cards,
            speed: self.speed.into(),
        })
    }
}

/// A turn that placed tiles without drawing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CultivateTurn {
    pub removed: Vec<WireCoord>,
    pub placed: Vec<(WireTileKind, WireCoord)>,
    pub claimed: Vec<WireGoal>,
    pub renounced: Vec<WireGoal>,
    /// A removal can push the supply over its limit
    pub discarded: Vec<WireTileKind>,
}

/// A turn that drew from the open row
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeditateTurn {
    pub removed: Vec<WireCoord>,
    pub chosen_index: u8,
    /// Helper placements
    pub placed: Vec<(WireTileKind, WireCoord)>,
    /// Resolved tile picks
    pub drawn_kinds: Vec<WireTileKind>,
    pub claimed: Vec<WireGoal>,
    pub renounced: Vec<WireGoal>,
    pub discarded: Vec<WireTileKind>,
}

/// One complete turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum TurnMessage {
    Cultivate(CultivateTurn),
    Meditate(MeditateTurn),
}

/// Messages sent from client to relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ClientMessage {
    /// Open a session, optionally under a chosen id
    CreateSession {
        game_id: String,
        session_id: Option<String>,
        player_name: String,
    },

    JoinSession {
        session_id: String,
        player_name: String,
    },

    /// Host only, once
    StartGame(StartGame),

    Turn(TurnMessage),

    Leave,
}

/// Messages sent from relay to client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ServerMessage {
    SessionCreated { session_id: String },

    /// Create or join refused
    Rejected { reason: String },

    /// Joined, with everyone already seated
    Joined {
        session_id: String,
        opponent_names: Vec<String>,
    },

    PlayerJoined { name: String },

    StartGame(StartGame),

    /// A turn relayed from another participant
    Turn { from: String, message: TurnMessage },

    PlayerLeft { name: String },
}
