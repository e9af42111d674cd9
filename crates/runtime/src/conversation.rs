//! Append-only conversation history.

use serde::{Deserialize, Serialize};

/// Who contributed a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// One atomic contribution to the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub segments: Vec<String>,
}

impl Turn {
    /// Create a turn with a single text segment.
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            segments: vec![text.into()],
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self::new(Role::Model, text)
    }

    /// Get combined text content.
    pub fn text(&self) -> String {
        self.segments.concat()
    }
}

/// Ordered history of turns seeding every model call.
///
/// Turns can only be appended; nothing is edited or removed.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_user(&mut self, text: impl Into<String>) {
        self.turns.push(Turn::user(text));
    }

    pub fn append_model(&mut self, text: impl Into<String>) {
        self.turns.push(Turn::model(text));
    }

    /// Read-only view of every turn in order.
    pub fn snapshot(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
