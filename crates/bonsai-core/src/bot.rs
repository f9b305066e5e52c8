//! Random bot.
//!
//! Plays whole turns through the same action API a human driver uses, picking
//! uniformly among the legal options at each step. Used for the random-bot
//! seat kind, the headless client and the convergence tests.

use crate::actions::GameEvent;
use crate::engine::BonsaiGame;
use crate::game::GameError;
use crate::hex::HexCoord;
use crate::tile::TileKind;
use rand::prelude::*;

/// Chance to prune a tile before the primary action
const REMOVE_CHANCE: f64 = 0.1;

/// Chance to claim (rather than renounce) a reached goal
const CLAIM_CHANCE: f64 = 0.8;

/// Chance to keep placing while placements remain
const KEEP_PLACING_CHANCE: f64 = 0.9;

/// A bot player that plays random legal moves
pub struct Bot {
    rng: StdRng,
}

impl Default for Bot {
    fn default() -> Self {
        Self::new()
    }
}

impl Bot {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Play the current seat's turn from start to `end_turn`
    pub fn play_turn(&mut self, game: &mut BonsaiGame) -> Result<Vec<GameEvent>, GameError> {
        let mut events = Vec::new();

        if self.rng.gen_bool(REMOVE_CHANCE) {
            if let Some(tile) = game.removable_tiles().choose(&mut self.rng).copied() {
                events.extend(game.remove_tile(tile)?);
            }
        }

        let can_place = !self.placement_options(game).is_empty();
        let cards: Vec<_> = game
            .state()?
            .open_cards
            .iter()
            .filter(|c| !c.is_placeholder())
            .cloned()
            .collect();

        let meditate = match (can_place, cards.is_empty()) {
            (true, false) => self.rng.gen_bool(0.5),
            (false, false) => true,
            _ => false,
        };

        if meditate {
            if let Some(card) = cards.choose(&mut self.rng) {
                events.extend(game.meditate(card)?);
            }
            for pick in game.pending_picks() {
                if let Some(kind) = pick.options.choose(&mut self.rng) {
                    events.extend(game.apply_tile_choice(*kind, pick.card_choice)?);
                }
            }
        }

        // Ordinary allowance after a cultivate choice, helper slots after a draw
        while let Some((kind, coord)) = self.placement_options(game).choose(&mut self.rng).copied()
        {
            let tile = match game.state()?.current().first_of_kind(kind) {
                Some(tile) => tile,
                None => break,
            };
            events.extend(game.cultivate(tile, coord)?);
            if !self.rng.gen_bool(KEEP_PLACING_CHANCE) {
                break;
            }
        }

        while let Some(goal) = game.reached_goals().first().copied() {
            let claim = self.rng.gen_bool(CLAIM_CHANCE);
            events.extend(game.decide_goal_claim(goal, claim)?);
        }

        loop {
            let player = game.state()?.current();
            if !player.is_over_supply_limit() {
                break;
            }
            let Some(tile) = player.supply.choose(&mut self.rng).copied() else {
                break;
            };
            events.extend(game.discard_tile(tile)?);
        }

        events.extend(game.end_turn()?);
        Ok(events)
    }

    fn placement_options(&self, game: &BonsaiGame) -> Vec<(TileKind, HexCoord)> {
        TileKind::PLAYABLE
            .into_iter()
            .flat_map(|kind| {
                game.legal_placements(kind)
                    .into_iter()
                    .map(move |coord| (kind, coord))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{PlayerSetup, Speed};
    use crate::goals::GoalColor;
    use crate::player::{PlayerKind, PotColor};

    fn game(players: usize) -> BonsaiGame {
        let mut game = BonsaiGame::new();
        let seats = (0..players)
            .map(|i| {
                PlayerSetup::new(
                    format!("Bot {i}"),
                    PotColor::for_seat(i as u8),
                    PlayerKind::RandomBot,
                )
            })
            .collect();
        game.start_new_game_with_rng(
            seats,
            Speed::Instant,
            GoalColor::ALL.to_vec(),
            &mut StdRng::seed_from_u64(players as u64),
        )
        .unwrap();
        game
    }

    #[test]
    fn test_bot_turn_advances_seat() {
        let mut game = game(2);
        let mut bot = Bot::with_seed(1);
        bot.play_turn(&mut game).unwrap();
        assert_eq!(game.state().unwrap().current_player, 1);
    }

    #[test]
    fn test_bots_finish_a_game() {
        for players in 2..=4 {
            let mut game = game(players);
            let mut bot = Bot::with_seed(42);
            let mut turns = 0;
            while !game.state().unwrap().is_finished() {
                bot.play_turn(&mut game).unwrap();
                turns += 1;
                assert!(turns < 1000, "game did not terminate");
            }
            let ranking = game.state().unwrap().ranking.clone().unwrap();
            assert_eq!(ranking.len(), players);
        }
    }
}
