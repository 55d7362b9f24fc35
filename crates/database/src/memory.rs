//! In-process session store.
//!
//! Backs tests and single-instance development runs. The slot is an
//! `Option`, so a second row cannot exist.

use crate::error::Result;
use crate::store::{CreatedSession, SessionStore};
use chrono::Utc;
use cyt_models::{AdminSession, NewAdminSession};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone, Default)]
pub struct MemorySessionStore {
    slot: Arc<Mutex<Option<AdminSession>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The stored row, expired or not.
    pub async fn current(&self) -> Option<AdminSession> {
        self.slot.lock().await.clone()
    }

    pub async fn row_count(&self) -> usize {
        usize::from(self.slot.lock().await.is_some())
    }
}

impl SessionStore for MemorySessionStore {
    async fn create_exclusive(&self, new_session: &NewAdminSession) -> Result<CreatedSession> {
        let session = AdminSession {
            device_id: new_session.device_id.clone(),
            token_hash: new_session.token_hash.clone(),
            expires_at: new_session.expires_at,
            created_at: Utc::now(),
        };

        let mut slot = self.slot.lock().await;
        let evicted = u64::from(slot.replace(session.clone()).is_some());

        Ok(CreatedSession { session, evicted })
    }

    async fn find_valid(&self, device_id: &str, token_hash: &str) -> Result<Option<AdminSession>> {
        let now = Utc::now();
        let slot = self.slot.lock().await;

        Ok(slot
            .as_ref()
            .filter(|s| s.device_id == device_id && s.token_hash == token_hash)
            .filter(|s| !s.is_expired_at(now))
            .cloned())
    }

    async fn delete_by_device(&self, device_id: &str) -> Result<u64> {
        let mut slot = self.slot.lock().await;
        match slot.as_ref() {
            Some(s) if s.device_id == device_id => {
                *slot = None;
                Ok(1)
            }
            _ => Ok(0),
        }
    }

    async fn delete_all(&self) -> Result<u64> {
        Ok(u64::from(self.slot.lock().await.take().is_some()))
    }

    async fn has_active(&self, exclude_device_id: Option<&str>) -> Result<bool> {
        let now = Utc::now();
        let slot = self.slot.lock().await;

        Ok(slot.as_ref().is_some_and(|s| {
            !s.is_expired_at(now) && exclude_device_id != Some(s.device_id.as_str())
        }))
    }

    async fn cleanup_expired(&self) -> Result<u64> {
        let now = Utc::now();
        let mut slot = self.slot.lock().await;
        if slot.as_ref().is_some_and(|s| s.is_expired_at(now)) {
            *slot = None;
            return Ok(1);
        }
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn new_session(device_id: &str, token_hash: &str, ttl: Duration) -> NewAdminSession {
        NewAdminSession {
            device_id: device_id.to_string(),
            token_hash: token_hash.to_string(),
            expires_at: Utc::now() + ttl,
        }
    }

    #[tokio::test]
    async fn test_create_exclusive_replaces_existing() {
        let store = MemorySessionStore::new();

        let first = store
            .create_exclusive(&new_session("dev-1", "h1", Duration::days(30)))
            .await
            .unwrap();
        assert_eq!(first.evicted, 0);

        let second = store
            .create_exclusive(&new_session("dev-2", "h2", Duration::days(30)))
            .await
            .unwrap();
        assert_eq!(second.evicted, 1);

        assert_eq!(store.row_count().await, 1);
        assert!(store.find_valid("dev-1", "h1").await.unwrap().is_none());
        assert!(store.find_valid("dev-2", "h2").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_find_valid_requires_exact_pair() {
        let store = MemorySessionStore::new();
        store
            .create_exclusive(&new_session("dev-1", "h1", Duration::days(1)))
            .await
            .unwrap();

        assert!(store.find_valid("dev-1", "h2").await.unwrap().is_none());
        assert!(store.find_valid("dev-2", "h1").await.unwrap().is_none());
        assert!(store.find_valid("dev-1", "h1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_expired_row_is_invalid_and_cleaned() {
        let store = MemorySessionStore::new();
        store
            .create_exclusive(&new_session("dev-1", "h1", Duration::seconds(-1)))
            .await
            .unwrap();

        assert!(store.find_valid("dev-1", "h1").await.unwrap().is_none());
        assert!(!store.has_active(None).await.unwrap());
        assert_eq!(store.cleanup_expired().await.unwrap(), 1);
        assert_eq!(store.row_count().await, 0);
    }

    #[tokio::test]
    async fn test_has_active_excludes_device() {
        let store = MemorySessionStore::new();
        store
            .create_exclusive(&new_session("dev-1", "h1", Duration::days(1)))
            .await
            .unwrap();

        assert!(store.has_active(None).await.unwrap());
        assert!(store.has_active(Some("dev-2")).await.unwrap());
        assert!(!store.has_active(Some("dev-1")).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_by_device_leaves_other_device() {
        let store = MemorySessionStore::new();
        store
            .create_exclusive(&new_session("dev-1", "h1", Duration::days(1)))
            .await
            .unwrap();

        assert_eq!(store.delete_by_device("dev-2").await.unwrap(), 0);
        assert_eq!(store.row_count().await, 1);
        assert_eq!(store.delete_by_device("dev-1").await.unwrap(), 1);
        assert_eq!(store.delete_by_device("dev-1").await.unwrap(), 0);
        assert_eq!(store.delete_all().await.unwrap(), 0);
    }
}
