//! services/api/src/adapters/memory.rs
//!
//! An in-process `SessionRepository`. Used when no database is configured and
//! as the default store in tests. Records do not survive a restart.

use async_trait::async_trait;
use neiji_core::domain::{SessionKey, User};
use neiji_core::ports::{PortResult, SessionRepository};
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, User>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait]
impl SessionRepository for MemoryStore {
    async fn get(&self, key: &SessionKey) -> PortResult<Option<User>> {
        Ok(self.records.read().await.get(key.as_str()).cloned())
    }

    async fn set(&self, key: &SessionKey, record: &User) -> PortResult<()> {
        self.records
            .write()
            .await
            .insert(key.as_str().to_string(), record.clone());
        Ok(())
    }

    async fn remove(&self, key: &SessionKey) -> PortResult<()> {
        self.records.write().await.remove(key.as_str());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(email: &str) -> User {
        User {
            id: "1".into(),
            email: email.into(),
            name: None,
            is_premium: false,
        }
    }

    #[tokio::test]
    async fn set_overwrites_and_remove_is_idempotent() {
        let store = MemoryStore::new();
        let key = SessionKey::for_device("phone");

        assert_eq!(store.get(&key).await.unwrap(), None);
        store.set(&key, &user("a@example.com")).await.unwrap();
        store.set(&key, &user("b@example.com")).await.unwrap();
        assert_eq!(store.get(&key).await.unwrap().unwrap().email, "b@example.com");
        assert_eq!(store.len().await, 1);

        store.remove(&key).await.unwrap();
        store.remove(&key).await.unwrap();
        assert_eq!(store.get(&key).await.unwrap(), None);
    }

    #[tokio::test]
    async fn devices_do_not_share_records() {
        let store = MemoryStore::new();
        store
            .set(&SessionKey::for_device("a"), &user("a@example.com"))
            .await
            .unwrap();
        assert!(store.get(&SessionKey::for_device("b")).await.unwrap().is_none());
    }
}
