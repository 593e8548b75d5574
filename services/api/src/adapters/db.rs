//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `SessionRepository` port from the `core` crate. It keeps one JSONB
//! record per device in PostgreSQL using `sqlx`.

use async_trait::async_trait;
use neiji_core::domain::{SessionKey, User};
use neiji_core::ports::{PortError, PortResult, SessionRepository};
use sqlx::{types::Json, FromRow, PgPool};
use tracing::debug;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `SessionRepository` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct SessionRecordRow {
    record: Json<User>,
}
impl SessionRecordRow {
    fn to_domain(self) -> User {
        self.record.0
    }
}

//=========================================================================================
// `SessionRepository` Trait Implementation
//=========================================================================================

#[async_trait]
impl SessionRepository for DbAdapter {
    async fn get(&self, key: &SessionKey) -> PortResult<Option<User>> {
        let row = sqlx::query_as::<_, SessionRecordRow>(
            "SELECT record FROM session_records WHERE key = $1",
        )
        .bind(key.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(row.map(SessionRecordRow::to_domain))
    }

    async fn set(&self, key: &SessionKey, record: &User) -> PortResult<()> {
        // A single upsert: readers see either the old record or the new one.
        sqlx::query(
            "INSERT INTO session_records (key, record, updated_at) VALUES ($1, $2, NOW()) \
             ON CONFLICT (key) DO UPDATE SET record = EXCLUDED.record, updated_at = NOW()",
        )
        .bind(key.as_str())
        .bind(Json(record))
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        debug!("Stored session record under {}", key.as_str());
        Ok(())
    }

    async fn remove(&self, key: &SessionKey) -> PortResult<()> {
        sqlx::query("DELETE FROM session_records WHERE key = $1")
            .bind(key.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }
}
