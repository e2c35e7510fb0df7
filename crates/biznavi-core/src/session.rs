//! Session-scoped conversation state.
//!
//! A `Session` owns the three pieces of state one conversation needs: the
//! append-only turn log, the artifact mailbox, and the orchestrator phase.
//! The orchestrator is the only writer; a display layer may read
//! concurrently through `history()` and `phase()`.

use std::{
    fmt,
    sync::{Mutex, PoisonError, RwLock},
};

use serde::{Deserialize, Serialize};
use tracing::info;

use biznavi_contracts::conversation::Turn;

use crate::mailbox::ArtifactMailbox;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub uuid::Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Where the orchestrator is in its per-turn cycle.
///
/// `Idle -> Routing -> Invoking -> Composing -> Idle`; the direct-answer
/// path goes `Routing -> Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Routing,
    Invoking,
    Composing,
}

/// Ordered, append-only log of turns.
#[derive(Debug, Clone, Default)]
pub struct ConversationState {
    turns: Vec<Turn>,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }
}

/// One conversation: its history, its mailbox, and its current phase.
#[derive(Debug, Default)]
pub struct Session {
    id: SessionId,
    conversation: RwLock<ConversationState>,
    mailbox: ArtifactMailbox,
    phase: Mutex<Phase>,
}

impl Session {
    /// Start an empty session.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn mailbox(&self) -> &ArtifactMailbox {
        &self.mailbox
    }

    pub fn phase(&self) -> Phase {
        *self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// A snapshot of every turn so far, oldest first.
    pub fn history(&self) -> Vec<Turn> {
        self.read(|c| c.turns().to_vec())
    }

    pub fn len(&self) -> usize {
        self.read(ConversationState::len)
    }

    pub fn is_empty(&self) -> bool {
        self.read(ConversationState::is_empty)
    }

    pub fn last_turn(&self) -> Option<Turn> {
        self.read(|c| c.turns().last().cloned())
    }

    /// The explicit "clear chat" action. Also drops any unconsumed artifact.
    pub fn clear_history(&self) {
        let removed = {
            let mut conversation = self
                .conversation
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            let removed = conversation.len();
            conversation.clear();
            removed
        };
        self.mailbox.clear();
        info!(session_id = %self.id, removed, "conversation cleared");
    }

    pub(crate) fn append(&self, turn: Turn) {
        self.conversation
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .append(turn);
    }

    pub(crate) fn set_phase(&self, phase: Phase) {
        *self.phase.lock().unwrap_or_else(PoisonError::into_inner) = phase;
    }

    fn read<T>(&self, f: impl FnOnce(&ConversationState) -> T) -> T {
        let guard = self.conversation.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }
}
