//! crates/neiji_core/src/timeline.rs
//!
//! The ordered, append-only list of messages exchanged in one conversation.

use crate::domain::{ChatTurn, Message, MessageId};

/// Messages in display order, oldest first.
///
/// Appending settles every earlier message first, so at most one message
/// (the newest) is ever animating.
#[derive(Debug, Default, Clone)]
pub struct Timeline {
    messages: Vec<Message>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Settles all existing messages, then appends `message`.
    ///
    /// Returns the ids whose animation was stopped by this call.
    pub fn append(&mut self, message: Message) -> Vec<MessageId> {
        let settled = self.settle_all();
        self.messages.push(message);
        settled
    }

    fn settle_all(&mut self) -> Vec<MessageId> {
        self.messages
            .iter_mut()
            .filter_map(|m| m.settle().then_some(m.id()))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn animating_count(&self) -> usize {
        self.messages.iter().filter(|m| m.is_animating()).count()
    }

    /// The conversation as `(role, content)` pairs, with real (unmasked) content.
    pub fn to_chat_history(&self) -> Vec<ChatTurn> {
        self.messages
            .iter()
            .map(|m| ChatTurn {
                role: m.role(),
                content: m.content().to_string(),
            })
            .collect()
    }

    pub fn to_vec(&self) -> Vec<Message> {
        self.messages.clone()
    }
}
