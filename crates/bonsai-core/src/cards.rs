//! Zen cards and the fixed card catalog.
//!
//! Every card in the box has a stable numeric id. Ids are what travels over
//! the wire and into snapshots; the payload of a card is always recovered from
//! [`CATALOG`]. Id ranges are reserved per card type:
//!
//! | ids     | type        |
//! |---------|-------------|
//! | 0       | placeholder |
//! | 1–9     | tool        |
//! | 10–29   | growth      |
//! | 30–49   | master      |
//! | 50–59   | helper      |
//! | 60–79   | parchment   |

use crate::tile::TileKind;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use thiserror::Error;

/// Stable card identity
pub type CardId = u8;

/// Id of the placeholder that keeps the open row four slots wide
pub const PLACEHOLDER_ID: CardId = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unknown card id {0}")]
pub struct UnknownCard(pub CardId);

/// Card families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CardType {
    Growth,
    Helper,
    Master,
    Parchment,
    Tool,
    Placeholder,
}

impl CardType {
    /// The id range reserved for this card type
    pub fn id_range(&self) -> RangeInclusive<CardId> {
        match self {
            CardType::Placeholder => 0..=0,
            CardType::Tool => 1..=9,
            CardType::Growth => 10..=29,
            CardType::Master => 30..=49,
            CardType::Helper => 50..=59,
            CardType::Parchment => 60..=79,
        }
    }
}

/// What a parchment card pays out for at the end of the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParchmentTarget {
    /// Per card of this type the player owns
    Cards(CardType),
    /// Per tile of this kind in the player's bonsai
    Tiles(TileKind),
}

/// Permanently raises the per-turn placement allowance for one kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GrowthCard {
    pub id: CardId,
    pub kind: TileKind,
}

/// Lets the player place tiles in the same turn they drew the card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HelperCard {
    pub id: CardId,
    /// The first slot is always generic
    pub slots: [TileKind; 2],
}

/// Hands the player tiles. Generic entries are picked by the player.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MasterCard {
    pub id: CardId,
    pub tiles: Vec<TileKind>,
}

/// Scores at the end of the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParchmentCard {
    pub id: CardId,
    pub target: ParchmentTarget,
    pub points: u32,
}

/// Raises the supply limit by two
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ToolCard {
    pub id: CardId,
}

/// A card from the shared deck.
///
/// Serializes as its catalog id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "CardId", try_from = "CardId")]
pub enum ZenCard {
    Growth(GrowthCard),
    Helper(HelperCard),
    Master(MasterCard),
    Parchment(ParchmentCard),
    Tool(ToolCard),
    /// Fills a vacated slot of the open row
    Placeholder,
}

impl ZenCard {
    pub fn id(&self) -> CardId {
        match self {
            ZenCard::Growth(card) => card.id,
            ZenCard::Helper(card) => card.id,
            ZenCard::Master(card) => card.id,
            ZenCard::Parchment(card) => card.id,
            ZenCard::Tool(card) => card.id,
            ZenCard::Placeholder => PLACEHOLDER_ID,
        }
    }

    pub fn card_type(&self) -> CardType {
        match self {
            ZenCard::Growth(_) => CardType::Growth,
            ZenCard::Helper(_) => CardType::Helper,
            ZenCard::Master(_) => CardType::Master,
            ZenCard::Parchment(_) => CardType::Parchment,
            ZenCard::Tool(_) => CardType::Tool,
            ZenCard::Placeholder => CardType::Placeholder,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, ZenCard::Placeholder)
    }

    /// Rebuild a card from its id
    pub fn from_id(id: CardId) -> Result<ZenCard, UnknownCard> {
        if id == PLACEHOLDER_ID {
            return Ok(ZenCard::Placeholder);
        }
        CATALOG
            .iter()
            .find(|entry| entry.id == id)
            .map(CatalogEntry::card)
            .ok_or(UnknownCard(id))
    }
}

impl From<ZenCard> for CardId {
    fn from(card: ZenCard) -> Self {
        card.id()
    }
}

impl TryFrom<CardId> for ZenCard {
    type Error = UnknownCard;

    fn try_from(id: CardId) -> Result<Self, Self::Error> {
        ZenCard::from_id(id)
    }
}

/// Catalog payload, const-constructible
#[derive(Debug, Clone, Copy)]
pub enum CardSpec {
    Growth(TileKind),
    Helper(TileKind),
    Master(&'static [TileKind]),
    Parchment(ParchmentTarget, u32),
    Tool,
}

/// One physical card in the box
#[derive(Debug, Clone, Copy)]
pub struct CatalogEntry {
    pub id: CardId,
    /// Smallest player count whose deck includes the card
    pub min_players: u8,
    pub spec: CardSpec,
}

impl CatalogEntry {
    pub fn card(&self) -> ZenCard {
        let id = self.id;
        match self.spec {
            CardSpec::Growth(kind) => ZenCard::Growth(GrowthCard { id, kind }),
            CardSpec::Helper(kind) => ZenCard::Helper(HelperCard {
                id,
                slots: [TileKind::Generic, kind],
            }),
            CardSpec::Master(tiles) => ZenCard::Master(MasterCard {
                id,
                tiles: tiles.to_vec(),
            }),
            CardSpec::Parchment(target, points) => {
                ZenCard::Parchment(ParchmentCard { id, target, points })
            }
            CardSpec::Tool => ZenCard::Tool(ToolCard { id }),
        }
    }
}

const fn entry(id: CardId, min_players: u8, spec: CardSpec) -> CatalogEntry {
    CatalogEntry {
        id,
        min_players,
        spec,
    }
}

use CardSpec::{Growth, Helper, Master, Parchment, Tool};
use TileKind::{Flower, Fruit, Generic, Leaf, Wood};

/// Every card in the box
pub const CATALOG: &[CatalogEntry] = &[
    entry(1, 2, Tool),
    entry(2, 2, Tool),
    entry(3, 2, Tool),
    entry(4, 3, Tool),
    entry(5, 3, Tool),
    entry(6, 4, Tool),
    entry(10, 2, Growth(Wood)),
    entry(11, 2, Growth(Wood)),
    entry(12, 4, Growth(Wood)),
    entry(13, 2, Growth(Leaf)),
    entry(14, 2, Growth(Leaf)),
    entry(15, 3, Growth(Leaf)),
    entry(16, 2, Growth(Flower)),
    entry(17, 2, Growth(Flower)),
    entry(18, 4, Growth(Flower)),
    entry(19, 2, Growth(Fruit)),
    entry(20, 2, Growth(Fruit)),
    entry(21, 3, Growth(Fruit)),
    entry(22, 2, Growth(Generic)),
    entry(23, 4, Growth(Generic)),
    entry(30, 2, Master(&[Wood, Leaf])),
    entry(31, 2, Master(&[Leaf, Leaf])),
    entry(32, 2, Master(&[Leaf, Flower])),
    entry(33, 2, Master(&[Leaf, Fruit])),
    entry(34, 2, Master(&[Generic])),
    entry(35, 3, Master(&[Generic])),
    entry(36, 2, Master(&[Wood, Leaf, Flower])),
    entry(37, 2, Master(&[Leaf, Leaf, Fruit])),
    entry(38, 4, Master(&[Generic, Leaf])),
    entry(39, 3, Master(&[Leaf, Flower, Flower])),
    entry(40, 4, Master(&[Wood, Leaf, Fruit])),
    entry(50, 2, Helper(Wood)),
    entry(51, 2, Helper(Leaf)),
    entry(52, 3, Helper(Leaf)),
    entry(53, 2, Helper(Flower)),
    entry(54, 2, Helper(Fruit)),
    entry(55, 4, Helper(Wood)),
    entry(60, 2, Parchment(ParchmentTarget::Cards(CardType::Master), 2)),
    entry(61, 2, Parchment(ParchmentTarget::Cards(CardType::Growth), 2)),
    entry(62, 2, Parchment(ParchmentTarget::Cards(CardType::Helper), 1)),
    entry(63, 2, Parchment(ParchmentTarget::Tiles(Leaf), 1)),
    entry(64, 2, Parchment(ParchmentTarget::Tiles(Flower), 1)),
    entry(65, 2, Parchment(ParchmentTarget::Tiles(Fruit), 2)),
    entry(66, 3, Parchment(ParchmentTarget::Tiles(Wood), 1)),
    entry(67, 4, Parchment(ParchmentTarget::Cards(CardType::Master), 2)),
];

/// The unshuffled deck for a game with `player_count` players
pub fn deck_for(player_count: usize) -> Vec<ZenCard> {
    CATALOG
        .iter()
        .filter(|entry| entry.min_players as usize <= player_count)
        .map(CatalogEntry::card)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_ids_are_unique() {
        let ids: HashSet<_> = CATALOG.iter().map(|e| e.id).collect();
        assert_eq!(ids.len(), CATALOG.len());
        assert!(!ids.contains(&PLACEHOLDER_ID));
    }

    #[test]
    fn test_catalog_ids_stay_in_their_type_range() {
        for entry in CATALOG {
            let card = entry.card();
            assert!(
                card.card_type().id_range().contains(&card.id()),
                "card {} outside the {:?} range",
                card.id(),
                card.card_type()
            );
        }
    }

    #[test]
    fn test_every_card_round_trips_through_its_id() {
        for entry in CATALOG {
            let card = entry.card();
            assert_eq!(ZenCard::from_id(card.id()), Ok(card));
        }
        assert_eq!(ZenCard::from_id(0), Ok(ZenCard::Placeholder));
        assert_eq!(ZenCard::from_id(99), Err(UnknownCard(99)));
    }

    #[test]
    fn test_serializes_as_id() {
        let card = ZenCard::from_id(30).unwrap();
        assert_eq!(serde_json::to_string(&card).unwrap(), "30");
        let decoded: ZenCard = serde_json::from_str("30").unwrap();
        assert_eq!(
            decoded,
            ZenCard::Master(MasterCard {
                id: 30,
                tiles: vec![TileKind::Wood, TileKind::Leaf]
            })
        );
        assert!(serde_json::from_str::<ZenCard>("98").is_err());
    }

    #[test]
    fn test_deck_grows_with_player_count() {
        let two = deck_for(2).len();
        let three = deck_for(3).len();
        let four = deck_for(4).len();
        assert!(two < three && three < four);
        assert_eq!(four, CATALOG.len());
    }

    #[test]
    fn test_helper_first_slot_is_generic() {
        for card in deck_for(4) {
            if let ZenCard::Helper(helper) = card {
                assert_eq!(helper.slots[0], TileKind::Generic);
                assert_ne!(helper.slots[1], TileKind::Generic);
            }
        }
    }
}
