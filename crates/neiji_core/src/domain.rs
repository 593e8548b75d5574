//! crates/neiji_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database, transport or UI layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Mask rendered in place of a password echoed back into the conversation.
pub const PASSWORD_MASK: &str = "••••••••";

//=========================================================================================
// Conversation Messages
//=========================================================================================

/// Identifier of a message, unique within one conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub u64);

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hands out increasing message ids for a single conversation.
#[derive(Debug, Default)]
pub struct MessageIdSeq {
    next: u64,
}

impl MessageIdSeq {
    pub fn next_id(&mut self) -> MessageId {
        let id = MessageId(self.next);
        self.next += 1;
        id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// A single conversation turn shown in the timeline.
///
/// Only `is_animating` ever changes after construction, and only from `true`
/// to `false` (see [`Message::settle`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    id: MessageId,
    content: String,
    role: Role,
    is_password: bool,
    is_animating: bool,
    created_at: DateTime<Utc>,
}

impl Message {
    /// A message typed by the user. User messages never animate.
    pub fn user(id: MessageId, content: impl Into<String>, is_password: bool) -> Self {
        Self {
            id,
            content: content.into(),
            role: Role::User,
            is_password,
            is_animating: false,
            created_at: Utc::now(),
        }
    }

    /// A reply from the assistant. It starts with its reveal animation enabled.
    pub fn assistant(id: MessageId, content: impl Into<String>) -> Self {
        Self {
            id,
            content: content.into(),
            role: Role::Assistant,
            is_password: false,
            is_animating: true,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> MessageId {
        self.id
    }

    /// The real content, including unmasked passwords.
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_password(&self) -> bool {
        self.is_password
    }

    pub fn is_animating(&self) -> bool {
        self.is_animating
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// The text a view may show for this message.
    pub fn display_text(&self) -> &str {
        if self.is_password && self.role == Role::User {
            PASSWORD_MASK
        } else {
            &self.content
        }
    }

    /// Stops the reveal animation for good. Returns whether the flag changed.
    pub fn settle(&mut self) -> bool {
        std::mem::replace(&mut self.is_animating, false)
    }
}

/// A `(role, content)` pair as sent to a chat-completion provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

//=========================================================================================
// Authentication Flow
//=========================================================================================

/// The steps of the conversational sign-in flow, in their only legal order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthStep {
    Welcome,
    Email,
    Password,
    /// Reserved; the sign-in conversation never enters it.
    Register,
    Success,
}

impl AuthStep {
    /// Steps only move forward; staying put is always allowed.
    pub fn can_advance_to(self, next: AuthStep) -> bool {
        next >= self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrengthLevel {
    Weak,
    Medium,
    Strong,
}

/// Derived strength meter for a password being typed. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PasswordStrength {
    pub level: StrengthLevel,
    pub score: u8,
    pub label: &'static str,
    pub color: &'static str,
}

//=========================================================================================
// Accounts
//=========================================================================================

/// The authenticated-user record persisted for a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub is_premium: bool,
}

/// Storage key of the session record that belongs to one device.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey(String);

impl SessionKey {
    pub fn for_device(device_id: &str) -> Self {
        Self(format!("{device_id}:user"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//=========================================================================================
// Navigation
//=========================================================================================

/// A move the client's screen router is asked to make. Opening other
/// screens stays with the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NavAction {
    GoBack,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_messages_are_masked_for_display_only() {
        let msg = Message::user(MessageId(3), "goodPass1", true);
        assert_eq!(msg.display_text(), PASSWORD_MASK);
        assert_eq!(msg.content(), "goodPass1");
        assert!(!msg.is_animating());
    }

    #[test]
    fn settle_only_goes_one_way() {
        let mut msg = Message::assistant(MessageId(1), "hello");
        assert!(msg.is_animating());
        assert!(msg.settle());
        assert!(!msg.settle());
        assert!(!msg.is_animating());
    }

    #[test]
    fn auth_steps_only_move_forward() {
        assert!(AuthStep::Welcome.can_advance_to(AuthStep::Password));
        assert!(AuthStep::Password.can_advance_to(AuthStep::Password));
        assert!(!AuthStep::Success.can_advance_to(AuthStep::Welcome));
        assert!(!AuthStep::Password.can_advance_to(AuthStep::Email));
    }

    #[test]
    fn message_ids_never_repeat() {
        let mut seq = MessageIdSeq::default();
        let a = seq.next_id();
        let b = seq.next_id();
        assert_eq!(a, MessageId(0));
        assert!(b > a);
    }

    #[test]
    fn user_record_uses_camel_case() {
        let user = User {
            id: "42".into(),
            email: "user@example.com".into(),
            name: Some("user".into()),
            is_premium: true,
        };
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["isPremium"], true);
        assert_eq!(SessionKey::for_device("abc").as_str(), "abc:user");
    }
}
