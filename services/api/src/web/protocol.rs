//! services/api/src/web/protocol.rs
//!
//! Defines the WebSocket message protocol between the mobile client and the API server
//! for the conversational screens (sign-in and chatbot).

use chrono::{DateTime, Utc};
use neiji_core::{
    domain::{AuthStep, Message, MessageId, NavAction, PasswordStrength, Role},
    reveal::RevealFrame,
};
use serde::{Deserialize, Serialize};

/// Which conversation a connection mounts.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FlowKind {
    Auth,
    Chatbot,
}

/// A timeline message as the client sees it. Password answers arrive masked.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct MessageView {
    pub id: MessageId,
    pub role: Role,
    pub text: String,
    pub is_animating: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&Message> for MessageView {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id(),
            role: message.role(),
            text: message.display_text().to_string(),
            is_animating: message.is_animating(),
            created_at: message.created_at(),
        }
    }
}

//=========================================================================================
// Messages Sent FROM the Client (App) TO the Server
//=========================================================================================

/// Represents the structured text messages a client can send to the server.
#[derive(Deserialize, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Mounts a conversation. This must be the first message sent on the connection.
    Init { device_id: String, flow: FlowKind },

    /// The user pressed send.
    Submit { text: String },

    /// The text field changed; drives the password strength meter.
    InputChanged { text: String },

    /// The user pressed the back button.
    Back,
}

//=========================================================================================
// Messages Sent FROM the Server TO the Client (App)
//=========================================================================================

/// Represents the structured text messages the server can send to the client.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Confirms the conversation is mounted.
    ConversationStarted { flow: FlowKind, authenticated: bool },

    /// A message joined the timeline. Its text is revealed through `Reveal` frames.
    MessageAppended { message: MessageView },

    /// One frame of a message's typewriter reveal.
    Reveal {
        message_id: MessageId,
        text: String,
        cursor_visible: bool,
        complete: bool,
    },

    /// The submit control must be disabled while `busy` is true.
    Busy { busy: bool },

    /// The sign-in conversation moved to another step.
    StepChanged { step: AuthStep },

    /// Whether the input field should mask what is typed.
    InputMode { password: bool },

    /// Strength meter for the password being typed.
    PasswordStrength { strength: PasswordStrength },

    /// Hide the strength meter.
    StrengthCleared,

    /// Asks the client's screen router to move.
    Navigate { action: NavAction },

    /// Reports a fatal error to the client, which should display an error message.
    Error { message: String },
}

impl ServerMessage {
    pub fn appended(message: &Message) -> Self {
        ServerMessage::MessageAppended {
            message: MessageView::from(message),
        }
    }

    pub fn reveal(message_id: MessageId, frame: RevealFrame) -> Self {
        ServerMessage::Reveal {
            message_id,
            text: frame.text,
            cursor_visible: frame.cursor_visible,
            complete: frame.complete,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_messages_use_snake_case_tags() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"init","device_id":"d1","flow":"chatbot"}"#).unwrap();
        assert!(matches!(
            msg,
            ClientMessage::Init { ref device_id, flow: FlowKind::Chatbot } if device_id == "d1"
        ));

        let msg: ClientMessage = serde_json::from_str(r#"{"type":"back"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::Back));
    }

    #[test]
    fn password_answers_are_sent_masked() {
        let msg = Message::user(MessageId(4), "goodPass1", true);
        let json = serde_json::to_string(&ServerMessage::appended(&msg)).unwrap();
        assert!(!json.contains("goodPass1"));
        assert!(json.contains(neiji_core::PASSWORD_MASK));
    }

    #[test]
    fn navigation_is_tagged() {
        let json = serde_json::to_value(ServerMessage::Navigate {
            action: NavAction::GoBack,
        })
        .unwrap();
        assert_eq!(json["type"], "navigate");
        assert_eq!(json["action"]["kind"], "go_back");
    }
}
