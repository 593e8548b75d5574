//! crates/neiji_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.

use async_trait::async_trait;
use crate::domain::{ChatTurn, SessionKey, User};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Durable key-value storage of the per-device session record.
///
/// Every call completes fully before returning; a record is always replaced
/// as a whole, never merged.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn get(&self, key: &SessionKey) -> PortResult<Option<User>>;

    async fn set(&self, key: &SessionKey, record: &User) -> PortResult<()>;

    /// Removing a key that holds nothing is not an error.
    async fn remove(&self, key: &SessionKey) -> PortResult<()>;
}

#[async_trait]
pub trait ChatCompletionService: Send + Sync {
    /// Produces the next assistant reply for a conversation, oldest turn first.
    async fn complete(&self, history: &[ChatTurn]) -> PortResult<String>;
}
