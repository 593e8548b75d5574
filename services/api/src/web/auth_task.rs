//! services/api/src/web/auth_task.rs
//!
//! This module contains the transition function of the sign-in conversation:
//! one user answer in, one assistant reply and the next step out.

use crate::{accounts::AccountService, web::state::AuthProgress};
use neiji_core::{
    domain::{AuthStep, StrengthLevel},
    validation::{password_strength, validate_email, validate_password},
};
use tracing::{error, info, warn};

pub const WELCOME_MESSAGE: &str = "Hello! To unlock everything Neiji has to offer, I need to sign you in. \
Let's start with your email address.";
pub const CLOSING_MESSAGE: &str = "You're signed in! You can head back to the main chat to enjoy every feature.";
pub const INCORRECT_CREDENTIALS: &str = "Incorrect email or password. Please try again.";
pub const CONNECTION_ERROR: &str = "Connection error. Please try again.";
pub const REGISTER_UNAVAILABLE: &str = "Creating an account isn't available from this conversation yet.";

/// Result of evaluating one turn. Applying it is all-or-nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthTurn {
    pub reply: String,
    pub progress: AuthProgress,
}

/// Evaluates one answer against the current step exactly once.
///
/// Failures (validation, rejected credentials, store errors) keep the step
/// unchanged and are phrased as the reply.
pub async fn evaluate_auth_turn(
    current: &AuthProgress,
    input: &str,
    accounts: &AccountService,
) -> AuthTurn {
    let mut next = current.clone();

    let reply = match current.step {
        AuthStep::Welcome | AuthStep::Email => match validate_email(input) {
            Ok(()) => {
                info!("Email captured, asking for the password.");
                next.email = Some(input.to_string());
                next.step = AuthStep::Password;
                next.password_field = true;
                format!(
                    "Perfect! That email works for me. Now, please enter your password for {}.",
                    input
                )
            }
            Err(e) => e.to_string(),
        },
        AuthStep::Password => match validate_password(input) {
            Ok(()) => {
                let email = current.email.clone().unwrap_or_default();
                match accounts.login(&email, input).await {
                    Ok(true) => {
                        next.step = AuthStep::Success;
                        next.password_field = false;
                        success_message(&email, input)
                    }
                    Ok(false) => {
                        warn!("Login rejected.");
                        INCORRECT_CREDENTIALS.to_string()
                    }
                    Err(e) => {
                        error!("Login failed: {}", e);
                        CONNECTION_ERROR.to_string()
                    }
                }
            }
            Err(e) => e.to_string(),
        },
        AuthStep::Success => CLOSING_MESSAGE.to_string(),
        AuthStep::Register => REGISTER_UNAVAILABLE.to_string(),
    };

    debug_assert!(current.step.can_advance_to(next.step));
    AuthTurn {
        reply,
        progress: next,
    }
}

fn success_message(email: &str, password: &str) -> String {
    let compliment = match password_strength(password).level {
        StrengthLevel::Strong => "Excellent choice! This password is very secure. ",
        StrengthLevel::Medium => "Nice! Your password is secure enough. ",
        StrengthLevel::Weak => "",
    };
    format!(
        "Excellent! Signed in successfully. {}Welcome to your personal space, {}. \
         You now have access to every premium feature.",
        compliment, email
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryStore;
    use async_trait::async_trait;
    use neiji_core::{
        domain::{SessionKey, User},
        ports::{PortError, PortResult, SessionRepository},
    };
    use std::{sync::Arc, time::Duration};

    /// A store whose writes always fail.
    struct UnreachableStore;

    #[async_trait]
    impl SessionRepository for UnreachableStore {
        async fn get(&self, _key: &SessionKey) -> PortResult<Option<User>> {
            Ok(None)
        }
        async fn set(&self, _key: &SessionKey, _record: &User) -> PortResult<()> {
            Err(PortError::Unexpected("connection refused".into()))
        }
        async fn remove(&self, _key: &SessionKey) -> PortResult<()> {
            Err(PortError::Unexpected("connection refused".into()))
        }
    }

    async fn accounts() -> (Arc<MemoryStore>, AccountService) {
        let store = Arc::new(MemoryStore::new());
        let accounts = AccountService::load(store.clone(), "phone", Duration::ZERO).await;
        (store, accounts)
    }

    fn at_password() -> AuthProgress {
        AuthProgress {
            step: AuthStep::Password,
            email: Some("user@example.com".into()),
            password_field: true,
        }
    }

    #[tokio::test]
    async fn bad_email_stays_at_welcome() {
        let (_, accounts) = accounts().await;
        let turn = evaluate_auth_turn(&AuthProgress::default(), "notanemail", &accounts).await;
        assert_eq!(turn.progress, AuthProgress::default());
        assert!(turn.reply.contains("doesn't look valid"));
    }

    #[tokio::test]
    async fn good_email_moves_to_password() {
        let (_, accounts) = accounts().await;
        let turn =
            evaluate_auth_turn(&AuthProgress::default(), "user@example.com", &accounts).await;
        assert_eq!(turn.progress, at_password());
        assert!(turn.reply.ends_with("for user@example.com."));
    }

    #[tokio::test]
    async fn short_password_stays_at_password() {
        let (store, accounts) = accounts().await;
        let turn = evaluate_auth_turn(&at_password(), "short1", &accounts).await;
        assert_eq!(turn.progress, at_password());
        assert!(turn.reply.contains("too short"));
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn valid_password_signs_in_with_a_compliment() {
        let (store, accounts) = accounts().await;
        let turn = evaluate_auth_turn(&at_password(), "goodPass1", &accounts).await;
        assert_eq!(turn.progress.step, AuthStep::Success);
        assert!(!turn.progress.password_field);
        assert!(turn.reply.contains("secure enough"));

        let saved = store.get(&SessionKey::for_device("phone")).await.unwrap().unwrap();
        assert_eq!(saved.email, "user@example.com");
    }

    #[test]
    fn compliments_follow_strength() {
        assert!(success_message("a@b.co", "g00d-Pass").contains("very secure"));
        assert!(success_message("a@b.co", "goodPass1").contains("secure enough"));
        let weak = success_message("a@b.co", "aaaaaaaa");
        assert!(!weak.contains("secure"));
        assert!(weak.starts_with("Excellent! Signed in successfully. Welcome"));
    }

    #[tokio::test]
    async fn success_only_repeats_the_closing_line() {
        let (_, accounts) = accounts().await;
        let done = AuthProgress {
            step: AuthStep::Success,
            ..at_password()
        };
        let turn = evaluate_auth_turn(&done, "anything", &accounts).await;
        assert_eq!(turn.reply, CLOSING_MESSAGE);
        assert_eq!(turn.progress, done);
    }

    #[tokio::test]
    async fn store_failure_reports_a_connection_error() {
        let accounts =
            AccountService::load(Arc::new(UnreachableStore), "phone", Duration::ZERO).await;
        let turn = evaluate_auth_turn(&at_password(), "goodPass1", &accounts).await;
        assert_eq!(turn.reply, CONNECTION_ERROR);
        assert_eq!(turn.progress, at_password());
        assert!(!accounts.is_authenticated().await);
    }

    #[tokio::test]
    async fn rejected_login_keeps_the_password_step() {
        let (store, accounts) = accounts().await;
        let no_email = AuthProgress {
            email: None,
            ..at_password()
        };
        let turn = evaluate_auth_turn(&no_email, "goodPass1", &accounts).await;
        assert_eq!(turn.reply, INCORRECT_CREDENTIALS);
        assert_eq!(turn.progress, no_email);
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn email_step_validates_like_welcome() {
        let (_, accounts) = accounts().await;
        let at_email = AuthProgress {
            step: AuthStep::Email,
            ..AuthProgress::default()
        };
        let refused = evaluate_auth_turn(&at_email, "nope", &accounts).await;
        assert_eq!(refused.progress, at_email);

        let accepted = evaluate_auth_turn(&at_email, "user@example.com", &accounts).await;
        assert_eq!(accepted.progress, at_password());
    }

    #[tokio::test]
    async fn register_step_is_not_offered_here() {
        let (store, accounts) = accounts().await;
        let at_register = AuthProgress {
            step: AuthStep::Register,
            ..AuthProgress::default()
        };
        let turn = evaluate_auth_turn(&at_register, "user@example.com", &accounts).await;
        assert_eq!(turn.reply, REGISTER_UNAVAILABLE);
        assert_eq!(turn.progress, at_register);
        assert_eq!(store.len().await, 0);
    }
}
