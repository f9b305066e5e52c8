//! Turn recording and replay.
//!
//! The authoring instance records every engine call of the active turn into a
//! [`MessageBuilder`]; peers feed the resulting [`TurnMessage`] to [`replay`],
//! which issues the equivalent calls in a fixed order:
//!
//! 1. removals, by coordinate
//! 2. the draw, by open-row index
//! 3. tile picks, each to the first pending pick that accepts it
//! 4. placements, using the first supply tile of the kind
//! 5. claims, then renouncements
//! 6. discards
//! 7. `end_turn`
//!
//! The engine's ordering locks guarantee that any accepted call sequence
//! reaches the same state when regrouped this way.

use crate::actions::GameEvent;
use crate::engine::BonsaiGame;
use crate::game::{GameError, GameState};
use crate::goals::GoalCard;
use crate::hex::HexCoord;
use crate::protocol::{
    decode_coord, encode_coord, CultivateTurn, MeditateTurn, TurnMessage, WireCoord, WireGoal,
    WireTileKind,
};
use crate::tile::{Tile, TileKind};
use tracing::debug;

/// Accumulates one turn's calls
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageBuilder {
    removed: Vec<HexCoord>,
    chosen_index: Option<usize>,
    /// Picks the draw made the player owe
    required_picks: usize,
    drawn_kinds: Vec<TileKind>,
    placed: Vec<(TileKind, HexCoord)>,
    claimed: Vec<GoalCard>,
    renounced: Vec<GoalCard>,
    discarded: Vec<TileKind>,
}

impl MessageBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn record_removal(&mut self, coord: HexCoord) {
        self.removed.push(coord);
    }

    pub fn record_meditate(&mut self, index: usize, required_picks: usize) {
        self.chosen_index = Some(index);
        self.required_picks = required_picks;
    }

    pub fn record_pick(&mut self, kind: TileKind) {
        self.drawn_kinds.push(kind);
    }

    pub fn record_placement(&mut self, kind: TileKind, coord: HexCoord) {
        self.placed.push((kind, coord));
    }

    pub fn record_goal(&mut self, goal: GoalCard, claim: bool) {
        if claim {
            // A claim forbids the whole color; earlier renouncements are moot
            self.renounced.retain(|g| g.color != goal.color);
            self.claimed.push(goal);
        } else {
            self.renounced.push(goal);
        }
    }

    pub fn record_discard(&mut self, kind: TileKind) {
        self.discarded.push(kind);
    }

    /// Whether anything has been recorded this turn
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Produce the wire message for the recorded turn
    pub fn build(&self) -> Result<TurnMessage, GameError> {
        let removed: Vec<WireCoord> = self.removed.iter().map(|c| encode_coord(*c)).collect();
        let placed = self
            .placed
            .iter()
            .map(|(kind, coord)| Ok((WireTileKind::encode(*kind)?, encode_coord(*coord))))
            .collect::<Result<Vec<_>, GameError>>()?;
        let claimed: Vec<WireGoal> = self.claimed.iter().map(|g| (*g).into()).collect();
        let renounced: Vec<WireGoal> = self.renounced.iter().map(|g| (*g).into()).collect();
        let discarded = encode_kinds(&self.discarded)?;

        let Some(index) = self.chosen_index else {
            if !self.drawn_kinds.is_empty() {
                return Err(GameError::InvalidArgument(
                    "tile picks recorded without a draw".into(),
                ));
            }
            return Ok(TurnMessage::Cultivate(CultivateTurn {
                removed,
                placed,
                claimed,
                renounced,
                discarded,
            }));
        };

        if self.drawn_kinds.len() < self.required_picks {
            return Err(GameError::InvalidArgument(format!(
                "the draw at position {index} needs {} tile picks, {} recorded",
                self.required_picks,
                self.drawn_kinds.len()
            )));
        }
        Ok(TurnMessage::Meditate(MeditateTurn {
            removed,
            chosen_index: index as u8,
            placed,
            drawn_kinds: encode_kinds(&self.drawn_kinds)?,
            claimed,
            renounced,
            discarded,
        }))
    }
}

fn encode_kinds(kinds: &[TileKind]) -> Result<Vec<WireTileKind>, GameError> {
    kinds.iter().map(|k| WireTileKind::encode(*k)).collect()
}

/// Borrowed view over either message shape
struct TurnParts<'a> {
    removed: &'a [WireCoord],
    chosen_index: Option<u8>,
    drawn_kinds: &'a [WireTileKind],
    placed: &'a [(WireTileKind, WireCoord)],
    claimed: &'a [WireGoal],
    renounced: &'a [WireGoal],
    discarded: &'a [WireTileKind],
}

impl<'a> From<&'a TurnMessage> for TurnParts<'a> {
    fn from(message: &'a TurnMessage) -> Self {
        match message {
            TurnMessage::Cultivate(turn) => TurnParts {
                removed: &turn.removed,
                chosen_index: None,
                drawn_kinds: &[],
                placed: &turn.placed,
                claimed: &turn.claimed,
                renounced: &turn.renounced,
                discarded: &turn.discarded,
            },
            TurnMessage::Meditate(turn) => TurnParts {
                removed: &turn.removed,
                chosen_index: Some(turn.chosen_index),
                drawn_kinds: &turn.drawn_kinds,
                placed: &turn.placed,
                claimed: &turn.claimed,
                renounced: &turn.renounced,
                discarded: &turn.discarded,
            },
        }
    }
}

fn supply_tile(state: &GameState, kind: TileKind) -> Result<Tile, GameError> {
    state
        .current()
        .first_of_kind(kind)
        .ok_or_else(|| GameError::InvalidArgument(format!("no {kind} tile in the supply")))
}

/// Apply a received turn to the local game.
///
/// Either the whole turn applies or the game is left as it was.
pub fn replay(message: &TurnMessage, game: &mut BonsaiGame) -> Result<Vec<GameEvent>, GameError> {
    let checkpoint = game.checkpoint();
    let result = replay_calls(message.into(), game);
    if result.is_err() {
        game.rollback(checkpoint);
    }
    result
}

fn replay_calls(turn: TurnParts<'_>, game: &mut BonsaiGame) -> Result<Vec<GameEvent>, GameError> {
    let mut events = Vec::new();

    for coord in turn.removed {
        let tile = game
            .state()?
            .current()
            .bonsai
            .grid()
            .get(decode_coord(*coord))?;
        events.extend(game.remove_tile(tile)?);
    }

    if let Some(index) = turn.chosen_index {
        let card = game
            .state()?
            .open_cards
            .get(index as usize)
            .cloned()
            .ok_or_else(|| GameError::InvalidArgument(format!("no open card at {index}")))?;
        events.extend(game.meditate(&card)?);
    }

    for wire in turn.drawn_kinds {
        let kind = TileKind::from(*wire);
        let card_choice = game
            .state()?
            .turn
            .pending_picks
            .iter()
            .find(|pick| pick.accepts(kind))
            .map(|pick| pick.card_choice)
            .ok_or_else(|| GameError::InvalidArgument(format!("no pending pick accepts {kind}")))?;
        events.extend(game.apply_tile_choice(kind, card_choice)?);
    }

    for (wire, coord) in turn.placed {
        let tile = supply_tile(game.state()?, TileKind::from(*wire))?;
        events.extend(game.cultivate(tile, decode_coord(*coord))?);
    }

    for goal in turn.claimed {
        events.extend(game.decide_goal_claim((*goal).into(), true)?);
    }
    for goal in turn.renounced {
        events.extend(game.decide_goal_claim((*goal).into(), false)?);
    }

    for wire in turn.discarded {
        let tile = supply_tile(game.state()?, TileKind::from(*wire))?;
        events.extend(game.discard_tile(tile)?);
    }

    events.extend(game.end_turn()?);
    debug!(events = events.len(), "replayed turn");
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::goals::{GoalColor, GoalTier};
    use crate::protocol::{WireGoalColor, WireGoalTier};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_builder_is_a_cultivate_turn() {
        let builder = MessageBuilder::new();
        assert!(builder.is_empty());
        assert_eq!(
            builder.build().unwrap(),
            TurnMessage::Cultivate(CultivateTurn::default())
        );
    }

    #[test]
    fn test_draw_needs_recorded_picks() {
        let mut builder = MessageBuilder::new();
        builder.record_meditate(1, 1);
        assert!(matches!(
            builder.build(),
            Err(GameError::InvalidArgument(_))
        ));

        builder.record_pick(TileKind::Leaf);
        match builder.build().unwrap() {
            TurnMessage::Meditate(turn) => {
                assert_eq!(turn.chosen_index, 1);
                assert_eq!(turn.drawn_kinds, vec![WireTileKind::Leaf]);
            }
            other => panic!("expected a meditate turn, got {other:?}"),
        }
    }

    #[test]
    fn test_picks_without_draw_are_rejected() {
        let mut builder = MessageBuilder::new();
        builder.record_pick(TileKind::Wood);
        assert!(builder.build().is_err());
    }

    #[test]
    fn test_claim_drops_same_color_renouncements() {
        let mut builder = MessageBuilder::new();
        builder.record_goal(GoalCard::of(GoalColor::Wood, GoalTier::Large), false);
        builder.record_goal(GoalCard::of(GoalColor::Leaf, GoalTier::Small), false);
        builder.record_goal(GoalCard::of(GoalColor::Wood, GoalTier::Small), true);

        let TurnMessage::Cultivate(turn) = builder.build().unwrap() else {
            panic!("expected a cultivate turn");
        };
        assert_eq!(
            turn.claimed,
            vec![WireGoal(WireGoalColor::Wood, WireGoalTier::Small)]
        );
        assert_eq!(
            turn.renounced,
            vec![WireGoal(WireGoalColor::Leaf, WireGoalTier::Small)]
        );
    }

    #[test]
    fn test_generic_placement_cannot_be_encoded() {
        let mut builder = MessageBuilder::new();
        builder.record_placement(TileKind::Generic, HexCoord::new(0, -1));
        assert!(builder.build().is_err());
    }
}
