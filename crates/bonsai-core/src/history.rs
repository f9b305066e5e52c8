//! Undo/redo stacks of turn-start snapshots.

use crate::game::{GameError, GameState};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct History {
    undo: Vec<GameState>,
    redo: Vec<GameState>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the state a finished turn started from. Clears redo.
    pub fn commit(&mut self, turn_start: GameState) {
        self.undo.push(turn_start);
        self.redo.clear();
    }

    /// Step back, parking `current` on the redo stack
    pub fn undo(&mut self, current: GameState) -> Result<GameState, GameError> {
        let previous = self.undo.pop().ok_or(GameError::StackEmpty)?;
        self.redo.push(current);
        Ok(previous)
    }

    /// Step forward, parking `current` on the undo stack
    pub fn redo(&mut self, current: GameState) -> Result<GameState, GameError> {
        let next = self.redo.pop().ok_or(GameError::StackEmpty)?;
        self.undo.push(current);
        Ok(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }

    pub fn undo_stack(&self) -> &[GameState] {
        &self.undo
    }

    pub fn redo_stack(&self) -> &[GameState] {
        &self.redo
    }

    /// Rebuild from persisted stacks
    pub fn from_stacks(undo: Vec<GameState>, redo: Vec<GameState>) -> Self {
        Self { undo, redo }
    }
}
