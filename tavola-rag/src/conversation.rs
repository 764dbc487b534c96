//! Per-session conversation history.

use serde::{Deserialize, Serialize};

/// One question/answer exchange.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConversationTurn {
    /// The question as submitted.
    pub question: String,
    /// The answer returned for it.
    pub answer: String,
}

/// Append-only record of the turns in one engine session.
///
/// Never persisted; grows unbounded for the lifetime of the session.
/// There is no deletion or mutation API.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationLog {
    turns: Vec<ConversationTurn>,
}

impl ConversationLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a turn. Arrival order is preserved.
    pub fn append(&mut self, turn: ConversationTurn) {
        self.turns.push(turn);
    }

    /// All turns in arrival order.
    pub fn all(&self) -> &[ConversationTurn] {
        &self.turns
    }

    /// Number of turns recorded.
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Whether no turns have been recorded.
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
