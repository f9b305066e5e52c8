//! Session room bookkeeping.
//!
//! The relay keeps no game state: a room only knows who is seated, who hosts
//! and whether the host has sent StartGame.

use bonsai_core::game::MAX_PLAYERS;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomError {
    #[error("Session {0} already exists")]
    SessionExists(String),

    #[error("Session not found")]
    SessionNotFound,

    #[error("Session is full")]
    SessionFull,

    #[error("Name {0} is already taken")]
    NameTaken(String),

    #[error("Already in a session")]
    AlreadyInSession,

    #[error("Not in a session")]
    NotInSession,

    #[error("Not the host")]
    NotHost,

    #[error("Game already started")]
    GameAlreadyStarted,

    #[error("Game not started")]
    GameNotStarted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomStatus {
    Waiting,
    InGame,
}

#[derive(Debug, Clone)]
pub struct RoomMember {
    pub id: Uuid,
    pub name: String,
}

/// What a departure did to the room
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    pub name: String,
    /// The host left or nobody is left
    pub closes_room: bool,
}

/// One named session
#[derive(Debug, Clone)]
pub struct SessionRoom {
    pub id: String,
    pub game_id: String,
    pub host_id: Uuid,
    pub status: RoomStatus,
    /// Join order; the host is first
    pub members: Vec<RoomMember>,
}

impl SessionRoom {
    pub fn new(id: String, game_id: String, host_id: Uuid, host_name: String) -> Self {
        Self {
            id,
            game_id,
            host_id,
            status: RoomStatus::Waiting,
            members: vec![RoomMember {
                id: host_id,
                name: host_name,
            }],
        }
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn is_full(&self) -> bool {
        self.members.len() >= MAX_PLAYERS
    }

    pub fn name_of(&self, member: Uuid) -> Option<&str> {
        self.members
            .iter()
            .find(|m| m.id == member)
            .map(|m| m.name.as_str())
    }

    /// Everyone except `member`
    pub fn others(&self, member: Uuid) -> Vec<Uuid> {
        self.members
            .iter()
            .map(|m| m.id)
            .filter(|id| *id != member)
            .collect()
    }

    /// Seat a guest; returns the names already seated
    pub fn add_member(&mut self, id: Uuid, name: String) -> Result<Vec<String>, RoomError> {
        if self.status != RoomStatus::Waiting {
            return Err(RoomError::GameAlreadyStarted);
        }
        if self.is_full() {
            return Err(RoomError::SessionFull);
        }
        if self.members.iter().any(|m| m.name == name) {
            return Err(RoomError::NameTaken(name));
        }

        let seated = self.members.iter().map(|m| m.name.clone()).collect();
        self.members.push(RoomMember { id, name });
        Ok(seated)
    }

    pub fn remove_member(&mut self, id: Uuid) -> Result<Departure, RoomError> {
        let index = self
            .members
            .iter()
            .position(|m| m.id == id)
            .ok_or(RoomError::NotInSession)?;
        let member = self.members.remove(index);

        Ok(Departure {
            name: member.name,
            closes_room: id == self.host_id || self.members.is_empty(),
        })
    }

    /// Host only, once
    pub fn start_game(&mut self, requester: Uuid) -> Result<(), RoomError> {
        if requester != self.host_id {
            return Err(RoomError::NotHost);
        }
        if self.status != RoomStatus::Waiting {
            return Err(RoomError::GameAlreadyStarted);
        }
        self.status = RoomStatus::InGame;
        Ok(())
    }

    /// Name to stamp on a relayed turn
    pub fn turn_sender(&self, member: Uuid) -> Result<String, RoomError> {
        if self.status != RoomStatus::InGame {
            return Err(RoomError::GameNotStarted);
        }
        self.name_of(member)
            .map(str::to_string)
            .ok_or(RoomError::NotInSession)
    }
}
