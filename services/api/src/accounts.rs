//! services/api/src/accounts.rs
//!
//! The account service: the cached view of one device's session record and
//! the simulated login / registration / logout operations that change it.

use neiji_core::{
    domain::{SessionKey, User},
    ports::{PortResult, SessionRepository},
    validation::{validate_email, validate_password},
};
use std::{sync::Arc, time::Duration};
use tokio::sync::RwLock;
use tracing::{error, info, warn};
use uuid::Uuid;

pub struct AccountService {
    repo: Arc<dyn SessionRepository>,
    key: SessionKey,
    latency: Duration,
    cached: RwLock<Option<User>>,
}

impl AccountService {
    /// Reads the device's record once and keeps it for the lifetime of the service.
    ///
    /// A failing read is logged and treated as signed out.
    pub async fn load(repo: Arc<dyn SessionRepository>, device_id: &str, latency: Duration) -> Self {
        let key = SessionKey::for_device(device_id);
        let cached = match repo.get(&key).await {
            Ok(user) => user,
            Err(e) => {
                error!("Failed to load session record for device {}: {}", device_id, e);
                None
            }
        };
        Self {
            repo,
            key,
            latency,
            cached: RwLock::new(cached),
        }
    }

    pub async fn current_user(&self) -> Option<User> {
        self.cached.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.cached.read().await.is_some()
    }

    /// Signs in and replaces any previous record. `Ok(false)` means rejected credentials.
    pub async fn login(&self, email: &str, password: &str) -> PortResult<bool> {
        self.create_session(email, password, None, true).await
    }

    /// Like [`AccountService::login`], but for a free account with an optional display name.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: Option<&str>,
    ) -> PortResult<bool> {
        self.create_session(email, password, name, false).await
    }

    pub async fn logout(&self) -> PortResult<()> {
        *self.cached.write().await = None;
        self.repo.remove(&self.key).await?;
        info!("Signed out {}", self.key.as_str());
        Ok(())
    }

    async fn create_session(
        &self,
        email: &str,
        password: &str,
        name: Option<&str>,
        is_premium: bool,
    ) -> PortResult<bool> {
        tokio::time::sleep(self.latency).await;

        // Same criteria as the conversation's validators.
        if validate_email(email).is_err() || validate_password(password).is_err() {
            warn!("Rejected credentials for {}", self.key.as_str());
            return Ok(false);
        }

        let local_part = email.split('@').next().unwrap_or_default();
        let user = User {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            name: Some(
                name.filter(|n| !n.trim().is_empty())
                    .unwrap_or(local_part)
                    .to_string(),
            ),
            is_premium,
        };

        self.repo.set(&self.key, &user).await?;
        *self.cached.write().await = Some(user);
        info!("Session record written for {}", self.key.as_str());
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryStore;
    use async_trait::async_trait;
    use neiji_core::ports::PortError;

    struct BrokenStore;

    #[async_trait]
    impl SessionRepository for BrokenStore {
        async fn get(&self, _key: &SessionKey) -> PortResult<Option<User>> {
            Err(PortError::Unexpected("disk on fire".into()))
        }
        async fn set(&self, _key: &SessionKey, _record: &User) -> PortResult<()> {
            Err(PortError::Unexpected("disk on fire".into()))
        }
        async fn remove(&self, _key: &SessionKey) -> PortResult<()> {
            Err(PortError::Unexpected("disk on fire".into()))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn login_persists_a_premium_record() {
        let store = Arc::new(MemoryStore::new());
        let accounts = AccountService::load(store.clone(), "phone", Duration::from_secs(1)).await;
        assert!(!accounts.is_authenticated().await);

        assert!(accounts.login("user@example.com", "goodPass1").await.unwrap());

        let saved = store.get(&SessionKey::for_device("phone")).await.unwrap().unwrap();
        assert_eq!(saved.email, "user@example.com");
        assert_eq!(saved.name.as_deref(), Some("user"));
        assert!(saved.is_premium);
        assert_eq!(accounts.current_user().await, Some(saved));
    }

    #[tokio::test(start_paused = true)]
    async fn register_creates_a_free_account_and_logout_clears_it() {
        let store = Arc::new(MemoryStore::new());
        let accounts = AccountService::load(store.clone(), "tablet", Duration::ZERO).await;

        assert!(accounts
            .register("sam@example.com", "another1", Some("Sam"))
            .await
            .unwrap());
        let user = accounts.current_user().await.unwrap();
        assert_eq!(user.name.as_deref(), Some("Sam"));
        assert!(!user.is_premium);

        accounts.logout().await.unwrap();
        assert!(!accounts.is_authenticated().await);
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_credentials_write_nothing() {
        let store = Arc::new(MemoryStore::new());
        let accounts = AccountService::load(store.clone(), "phone", Duration::ZERO).await;
        assert!(!accounts.login("user@example.com", "aaaaaaaa").await.unwrap());
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn a_later_login_overwrites_the_record() {
        let store = Arc::new(MemoryStore::new());
        let accounts = AccountService::load(store.clone(), "phone", Duration::ZERO).await;
        accounts.register("a@example.com", "password1", None).await.unwrap();
        accounts.login("b@example.com", "password2").await.unwrap();

        let saved = store.get(&SessionKey::for_device("phone")).await.unwrap().unwrap();
        assert_eq!(saved.email, "b@example.com");
        assert!(saved.is_premium);

        let reloaded = AccountService::load(store, "phone", Duration::ZERO).await;
        assert_eq!(reloaded.current_user().await.unwrap().email, "b@example.com");
    }

    #[tokio::test(start_paused = true)]
    async fn store_failures_surface_and_cache_nothing() {
        let accounts = AccountService::load(Arc::new(BrokenStore), "phone", Duration::ZERO).await;
        assert!(accounts.login("user@example.com", "goodPass1").await.is_err());
        assert!(!accounts.is_authenticated().await);
    }
}
