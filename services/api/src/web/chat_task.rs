//! services/api/src/web/chat_task.rs
//!
//! This module contains the reply step of the Neiji chatbot conversation.

use neiji_core::{domain::ChatTurn, ports::ChatCompletionService};
use std::time::Instant;
use tracing::{error, info};

pub const CHAT_APOLOGY: &str =
    "Sorry, I couldn't reach my thoughts just now. Please try again in a moment.";

/// Caps what the user typed before it is sent to the model.
pub fn cap_input(input: &str, max_chars: usize) -> String {
    input.chars().take(max_chars).collect()
}

/// Asks the model for the next reply. Any failure becomes the fixed apology.
///
/// `history` already ends with the user's new message.
pub async fn chat_reply(chat: &dyn ChatCompletionService, history: &[ChatTurn]) -> String {
    let started = Instant::now();
    match chat.complete(history).await {
        Ok(reply) if !reply.trim().is_empty() => {
            info!("Chat completion took {:?}", started.elapsed());
            reply
        }
        Ok(_) => {
            error!("Chat completion returned an empty reply.");
            CHAT_APOLOGY.to_string()
        }
        Err(e) => {
            error!("Chat completion failed: {}", e);
            CHAT_APOLOGY.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use neiji_core::{
        domain::Role,
        ports::{PortError, PortResult},
    };

    struct Fixed(PortResult<String>);

    #[async_trait]
    impl ChatCompletionService for Fixed {
        async fn complete(&self, _history: &[ChatTurn]) -> PortResult<String> {
            match &self.0 {
                Ok(s) => Ok(s.clone()),
                Err(_) => Err(PortError::Unexpected("timeout".into())),
            }
        }
    }

    fn history() -> Vec<ChatTurn> {
        vec![ChatTurn {
            role: Role::User,
            content: "I feel stressed".into(),
        }]
    }

    #[tokio::test]
    async fn passes_replies_through() {
        let reply = chat_reply(&Fixed(Ok("Breathe with me.".into())), &history()).await;
        assert_eq!(reply, "Breathe with me.");
    }

    #[tokio::test]
    async fn failures_become_an_apology() {
        let failing = Fixed(Err(PortError::Unexpected("invalid api key".into())));
        assert_eq!(chat_reply(&failing, &history()).await, CHAT_APOLOGY);
        assert_eq!(chat_reply(&Fixed(Ok("  ".into())), &history()).await, CHAT_APOLOGY);
    }

    #[test]
    fn input_cap_counts_characters() {
        assert_eq!(cap_input("ééééé", 3), "ééé");
        assert_eq!(cap_input("short", 100), "short");
    }
}
