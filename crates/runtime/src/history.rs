//! History windowing policies.
//!
//! A policy decides which suffix of the conversation is sent to the model.
//! It never touches the conversation itself.

use crate::conversation::Turn;

/// Selects the turns sent with each model call.
pub trait HistoryPolicy: Send + Sync {
    fn window<'a>(&self, turns: &'a [Turn]) -> &'a [Turn];
}

/// Send the whole conversation.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeepAll;

impl HistoryPolicy for KeepAll {
    fn window<'a>(&self, turns: &'a [Turn]) -> &'a [Turn] {
        turns
    }
}

/// Send at most the last `n` turns.
#[derive(Debug, Clone, Copy)]
pub struct LastTurns(pub usize);

impl HistoryPolicy for LastTurns {
    fn window<'a>(&self, turns: &'a [Turn]) -> &'a [Turn] {
        let start = turns.len().saturating_sub(self.0);
        &turns[start..]
    }
}

/// Build a policy from a turn limit, where 0 means unlimited.
pub fn from_limit(max_turns: usize) -> Box<dyn HistoryPolicy> {
    if max_turns == 0 {
        Box::new(KeepAll)
    } else {
        Box::new(LastTurns(max_turns))
    }
}
