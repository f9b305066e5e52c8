//! Connection and session state machine.
//!
//! The coordinator never touches a socket: each method takes what arrived and
//! returns the messages to send. The headless client wraps it around a
//! WebSocket and the tests wire several coordinators together in memory.
//!
//! ```text
//! Disconnected -> Connected -> WaitingForHostConfirmation -> WaitingForGuests  -+
//!                           -> WaitingForJoinConfirmation -> WaitingForInit    -+
//!                                                                               |
//!                   GameOver <- PlayingMyTurn <-> WaitingForOpponent <----------+
//! ```

use crate::codec;
use crate::config::NetworkConfig;
use crate::engine::BonsaiGame;
use crate::game::{GameError, PlayerSetup, Speed, MAX_PLAYERS};
use crate::goals::GoalColor;
use crate::player::{PlayerId, PlayerKind, PotColor};
use crate::protocol::{ClientMessage, ServerMessage, StartGame, TurnMessage};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectionState {
    Disconnected,
    Connected,
    WaitingForHostConfirmation,
    WaitingForJoinConfirmation,
    WaitingForGuests,
    WaitingForInit,
    PlayingMyTurn,
    WaitingForOpponent,
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Host,
    Guest,
}

pub struct SessionCoordinator {
    config: NetworkConfig,
    local_name: String,
    state: ConnectionState,
    role: Option<Role>,
    session_id: Option<String>,
    /// Other participants in join order
    peers: Vec<String>,
    game: BonsaiGame,
}

impl SessionCoordinator {
    pub fn new(config: NetworkConfig, local_name: impl Into<String>) -> Self {
        Self {
            config,
            local_name: local_name.into(),
            state: ConnectionState::Disconnected,
            role: None,
            session_id: None,
            peers: Vec::new(),
            game: BonsaiGame::new(),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn role(&self) -> Option<Role> {
        self.role
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    pub fn peers(&self) -> &[String] {
        &self.peers
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    pub fn game(&self) -> &BonsaiGame {
        &self.game
    }

    /// The local driver plays its turns through this
    pub fn game_mut(&mut self) -> &mut BonsaiGame {
        &mut self.game
    }

    fn transition(&mut self, next: ConnectionState) {
        if self.state != next {
            info!(from = ?self.state, to = ?next, "session state changed");
            self.state = next;
        }
    }

    fn expect_state(&self, expected: ConnectionState, what: &str) -> Result<(), GameError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(GameError::InvalidArgument(format!(
                "cannot {what} while {:?}",
                self.state
            )))
        }
    }

    /// Log a violation and drop the session
    fn violation(&mut self, reason: impl Into<String>) -> GameError {
        let reason = reason.into();
        warn!(%reason, state = ?self.state, "protocol violation");
        self.transition(ConnectionState::Disconnected);
        GameError::ProtocolViolation(reason)
    }

    // ==================== Transport events ====================

    /// The transport is up. Starts a fresh session.
    pub fn on_connected(&mut self) -> Result<(), GameError> {
        self.expect_state(ConnectionState::Disconnected, "connect")?;
        self.role = None;
        self.session_id = None;
        self.peers.clear();
        self.game = BonsaiGame::new();
        self.transition(ConnectionState::Connected);
        Ok(())
    }

    pub fn on_disconnected(&mut self) {
        self.transition(ConnectionState::Disconnected);
    }

    // ==================== Local commands ====================

    pub fn host(&mut self, session_id: Option<String>) -> Result<Vec<ClientMessage>, GameError> {
        self.expect_state(ConnectionState::Connected, "host a session")?;
        self.role = Some(Role::Host);
        self.transition(ConnectionState::WaitingForHostConfirmation);
        Ok(vec![ClientMessage::CreateSession {
            game_id: self.config.game_id.clone(),
            session_id,
            player_name: self.local_name.clone(),
        }])
    }

    pub fn join(&mut self, session_id: impl Into<String>) -> Result<Vec<ClientMessage>, GameError> {
        self.expect_state(ConnectionState::Connected, "join a session")?;
        self.role = Some(Role::Guest);
        self.transition(ConnectionState::WaitingForJoinConfirmation);
        Ok(vec![ClientMessage::JoinSession {
            session_id: session_id.into(),
            player_name: self.local_name.clone(),
        }])
    }

    /// Host only: seat everyone plus `bots` host-driven bots and broadcast
    /// the setup
    pub fn start_game(
        &mut self,
        bots: usize,
        speed: Speed,
        goals: Vec<GoalColor>,
    ) -> Result<Vec<ClientMessage>, GameError> {
        self.start_game_with_rng(bots, speed, goals, &mut rand::thread_rng())
    }

    pub fn start_game_with_rng<R: Rng>(
        &mut self,
        bots: usize,
        speed: Speed,
        goals: Vec<GoalColor>,
        rng: &mut R,
    ) -> Result<Vec<ClientMessage>, GameError> {
        self.expect_state(ConnectionState::WaitingForGuests, "start the game")?;
        let setup = self
            .game
            .start_new_game_with_rng(self.seats(bots), speed, goals, rng)?;
        self.game.set_shared(true);
        self.after_turn_boundary();
        Ok(vec![ClientMessage::StartGame(StartGame::from_setup(&setup))])
    }

    /// Host first, then guests in join order, then bots
    fn seats(&self, bots: usize) -> Vec<PlayerSetup> {
        let humans = std::iter::once((self.local_name.clone(), PlayerKind::Local)).chain(
            self.peers
                .iter()
                .map(|name| (name.clone(), PlayerKind::Remote)),
        );
        let bots = (1..=bots).map(|n| (format!("Bot {n}"), PlayerKind::RandomBot));
        humans
            .chain(bots)
            .enumerate()
            .map(|(seat, (name, kind))| {
                PlayerSetup::new(name, PotColor::for_seat(seat as PlayerId), kind)
            })
            .collect()
    }

    /// Hand over the turn the local driver just ended
    pub fn submit_turn(&mut self) -> Result<Vec<ClientMessage>, GameError> {
        self.expect_state(ConnectionState::PlayingMyTurn, "submit a turn")?;
        let message = self
            .game
            .take_turn_message()
            .ok_or_else(|| GameError::InvalidArgument("the turn has not ended".into()))?;
        self.after_turn_boundary();
        Ok(vec![ClientMessage::Turn(message)])
    }

    pub fn leave(&mut self) -> Vec<ClientMessage> {
        let in_session = !matches!(
            self.state,
            ConnectionState::Disconnected | ConnectionState::Connected
        );
        self.transition(ConnectionState::Disconnected);
        if in_session {
            vec![ClientMessage::Leave]
        } else {
            Vec::new()
        }
    }

    // ==================== Seats ====================

    /// Whether this instance authors the turns of `seat`
    pub fn controls_seat(&self, seat: PlayerId) -> bool {
        let Ok(state) = self.game.state() else {
            return false;
        };
        match state.get_player(seat).map(|p| p.kind) {
            Some(PlayerKind::Local) => true,
            Some(kind) if kind.is_bot() => self.role == Some(Role::Host),
            _ => false,
        }
    }

    /// Participant allowed to send the turn for `seat`. Bots belong to the
    /// host in seat 0.
    fn author_of(&self, seat: PlayerId) -> Option<String> {
        let state = self.game.state().ok()?;
        let player = state.get_player(seat)?;
        if player.kind.is_bot() {
            state.get_player(0).map(|host| host.name.clone())
        } else {
            Some(player.name.clone())
        }
    }

    fn after_turn_boundary(&mut self) {
        let next = match self.game.state() {
            Ok(state) if state.is_finished() => ConnectionState::GameOver,
            Ok(state) if self.controls_seat(state.current_player) => ConnectionState::PlayingMyTurn,
            Ok(_) => ConnectionState::WaitingForOpponent,
            Err(_) => ConnectionState::Disconnected,
        };
        self.game.set_recording(next == ConnectionState::PlayingMyTurn);
        self.transition(next);
    }

    // ==================== Inbound ====================

    pub fn handle(&mut self, message: ServerMessage) -> Result<Vec<ClientMessage>, GameError> {
        use ConnectionState::*;

        match (self.state, message) {
            (WaitingForHostConfirmation, ServerMessage::SessionCreated { session_id }) => {
                info!(%session_id, "session created");
                self.session_id = Some(session_id);
                self.transition(WaitingForGuests);
            }
            (
                WaitingForHostConfirmation | WaitingForJoinConfirmation,
                ServerMessage::Rejected { reason },
            ) => {
                warn!(%reason, "session refused");
                self.transition(Disconnected);
            }
            (
                WaitingForJoinConfirmation,
                ServerMessage::Joined {
                    session_id,
                    opponent_names,
                },
            ) => {
                if opponent_names.contains(&self.local_name) {
                    return Err(self.violation("joined a session that already has our name"));
                }
                info!(%session_id, opponents = ?opponent_names, "joined session");
                self.session_id = Some(session_id);
                self.peers = opponent_names;
                self.transition(WaitingForInit);
            }
            (WaitingForGuests | WaitingForInit, ServerMessage::PlayerJoined { name }) => {
                if name == self.local_name || self.peers.contains(&name) {
                    return Err(self.violation(format!("duplicate participant {name}")));
                }
                if self.peers.len() + 1 >= MAX_PLAYERS {
                    return Err(self.violation("session is already full"));
                }
                info!(%name, "player joined");
                self.peers.push(name);
            }
            (WaitingForGuests | WaitingForInit, ServerMessage::PlayerLeft { name }) => {
                info!(%name, "player left");
                self.peers.retain(|peer| *peer != name);
            }
            (WaitingForInit, ServerMessage::StartGame(start)) => self.on_start_game(start)?,
            (WaitingForOpponent, ServerMessage::Turn { from, message }) => {
                self.on_turn(from, message)?
            }
            (PlayingMyTurn | WaitingForOpponent, ServerMessage::PlayerLeft { name }) => {
                warn!(%name, "player left mid-game");
                self.transition(Disconnected);
            }
            (GameOver, ServerMessage::PlayerLeft { name }) => {
                info!(%name, "player left");
            }
            (state, message) => {
                return Err(self.violation(format!(
                    "unexpected {} while {state:?}",
                    message_kind(&message)
                )));
            }
        }
        Ok(Vec::new())
    }

    fn on_start_game(&mut self, start: StartGame) -> Result<(), GameError> {
        let setup = match start.to_setup(&self.local_name) {
            Ok(setup) => setup,
            Err(err) => return Err(self.violation(err.to_string())),
        };
        if setup.players.first().map_or(true, |host| host.kind.is_bot()) {
            return Err(self.violation("seat 0 must be the host"));
        }
        if !setup.players.iter().any(|p| p.kind == PlayerKind::Local) {
            return Err(self.violation("StartGame does not seat us"));
        }
        if let Err(err) = self.game.start_from_setup(setup) {
            return Err(self.violation(err.to_string()));
        }
        self.game.set_shared(true);
        self.after_turn_boundary();
        Ok(())
    }

    fn on_turn(&mut self, from: String, message: TurnMessage) -> Result<(), GameError> {
        let seat = self.game.state()?.current_player;
        if self.author_of(seat).as_deref() != Some(from.as_str()) {
            return Err(self.violation(format!("{from} sent a turn for seat {seat}")));
        }
        if let Err(err) = codec::replay(&message, &mut self.game) {
            return Err(self.violation(format!("turn from {from} rejected: {err}")));
        }
        self.after_turn_boundary();
        Ok(())
    }
}

fn message_kind(message: &ServerMessage) -> &'static str {
    match message {
        ServerMessage::SessionCreated { .. } => "SessionCreated",
        ServerMessage::Rejected { .. } => "Rejected",
        ServerMessage::Joined { .. } => "Joined",
        ServerMessage::PlayerJoined { .. } => "PlayerJoined",
        ServerMessage::StartGame(_) => "StartGame",
        ServerMessage::Turn { .. } => "Turn",
        ServerMessage::PlayerLeft { .. } => "PlayerLeft",
    }
}
