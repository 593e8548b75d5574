//! services/api/src/web/state.rs
//!
//! Defines the application's shared state and the state of one mounted conversation.

use crate::{
    accounts::AccountService,
    config::{Config, FlowTimings},
    web::protocol::FlowKind,
};
use neiji_core::{
    domain::{AuthStep, Message, MessageId, MessageIdSeq},
    ports::{ChatCompletionService, SessionRepository},
    timeline::Timeline,
};
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Connections)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<dyn SessionRepository>,
    pub chat_adapter: Arc<dyn ChatCompletionService>,
    pub config: Arc<Config>,
}

/// What a conversation needs from the outside world.
#[derive(Clone)]
pub struct ConversationDeps {
    pub accounts: Arc<AccountService>,
    pub chat: Arc<dyn ChatCompletionService>,
    pub timings: FlowTimings,
    pub max_input_chars: usize,
}

//=========================================================================================
// ConversationState (Specific to One Mounted View)
//=========================================================================================

/// Progress of the sign-in conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthProgress {
    pub step: AuthStep,
    pub email: Option<String>,
    pub password_field: bool,
}

impl Default for AuthProgress {
    fn default() -> Self {
        Self {
            step: AuthStep::Welcome,
            email: None,
            password_field: false,
        }
    }
}

/// The state for a single mounted conversation.
pub struct ConversationState {
    pub kind: FlowKind,
    pub timeline: Timeline,
    pub ids: MessageIdSeq,
    /// Set while a turn is in flight; submissions are refused meanwhile.
    pub busy: bool,
    pub auth: AuthProgress,
    /// The post-sign-in exit fires at most once per conversation.
    pub exit_scheduled: bool,
}

impl ConversationState {
    pub fn new(kind: FlowKind) -> Self {
        Self {
            kind,
            timeline: Timeline::new(),
            ids: MessageIdSeq::default(),
            busy: false,
            auth: AuthProgress::default(),
            exit_scheduled: false,
        }
    }

    /// Appends a reply with a fresh id and returns a copy of it plus the ids it settled.
    pub fn push_assistant(&mut self, content: impl Into<String>) -> (Message, Vec<MessageId>) {
        let message = Message::assistant(self.ids.next_id(), content);
        let settled = self.timeline.append(message.clone());
        (message, settled)
    }

    pub fn push_user(&mut self, content: impl Into<String>, is_password: bool) -> (Message, Vec<MessageId>) {
        let message = Message::user(self.ids.next_id(), content, is_password);
        let settled = self.timeline.append(message.clone());
        (message, settled)
    }
}

/// A point-in-time copy of a conversation, for inspection.
#[derive(Debug, Clone)]
pub struct ConversationSnapshot {
    pub messages: Vec<Message>,
    pub step: AuthStep,
    pub busy: bool,
    pub password_field: bool,
}
