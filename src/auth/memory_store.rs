use crate::auth::models::Session;
use crate::auth::session_store::SessionStore;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

#[derive(Default)]
struct Inner {
    /// session_id -> Session
    sessions: HashMap<Uuid, Session>,
    /// (user_id, refresh_token_hash) -> session_id, for identity lookups
    identity_index: HashMap<(i64, String), Uuid>,
}

/// In-memory session store.
///
/// Both maps live under one `RwLock`, so `compare_and_swap_hash` and
/// `find_by_identity` are trivially atomic with respect to each other:
/// a reader can never observe a torn hash/index pair.
#[derive(Default)]
pub struct MemorySessionStore {
    inner: RwLock<Inner>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(
        &self,
        user_id: i64,
        refresh_token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Session> {
        let session = Session {
            session_id: Uuid::new_v4(),
            user_id,
            refresh_token_hash: refresh_token_hash.to_string(),
            expires_at,
            created_at: Utc::now(),
        };

        let mut inner = self.inner.write().await;
        inner
            .identity_index
            .insert((user_id, refresh_token_hash.to_string()), session.session_id);
        inner.sessions.insert(session.session_id, session.clone());

        debug!("session created: session_id={}", session.session_id);
        Ok(session)
    }

    async fn find_by_identity(
        &self,
        user_id: i64,
        refresh_token_hash: &str,
    ) -> Result<Option<Session>> {
        let inner = self.inner.read().await;
        let id = match inner
            .identity_index
            .get(&(user_id, refresh_token_hash.to_string()))
        {
            Some(id) => *id,
            None => return Ok(None),
        };

        let session = inner.sessions.get(&id).cloned();
        // Expired records behave as absent even before the sweeper runs.
        Ok(session.filter(|s| !s.is_expired(Utc::now())))
    }

    async fn compare_and_swap_hash(
        &self,
        session_id: Uuid,
        expected_hash: &str,
        new_hash: &str,
    ) -> Result<bool> {
        let now = Utc::now();
        let mut inner = self.inner.write().await;

        // Same read contract as the lookup paths: an expired record is
        // absent, so a rotation racing past the deadline cannot commit.
        let user_id = match inner.sessions.get_mut(&session_id) {
            Some(session)
                if session.refresh_token_hash == expected_hash && !session.is_expired(now) =>
            {
                session.refresh_token_hash = new_hash.to_string();
                session.user_id
            }
            _ => return Ok(false),
        };

        inner
            .identity_index
            .remove(&(user_id, expected_hash.to_string()));
        inner
            .identity_index
            .insert((user_id, new_hash.to_string()), session_id);

        Ok(true)
    }

    async fn delete(&self, session_id: Uuid) -> Result<()> {
        let mut inner = self.inner.write().await;
        if let Some(session) = inner.sessions.remove(&session_id) {
            inner
                .identity_index
                .remove(&(session.user_id, session.refresh_token_hash));
            debug!("session deleted: session_id={}", session_id);
        }
        Ok(())
    }

    async fn delete_by_user(&self, user_id: i64) -> Result<u64> {
        let mut inner = self.inner.write().await;
        let doomed: Vec<Uuid> = inner
            .sessions
            .values()
            .filter(|s| s.user_id == user_id)
            .map(|s| s.session_id)
            .collect();

        for id in &doomed {
            if let Some(session) = inner.sessions.remove(id) {
                inner
                    .identity_index
                    .remove(&(session.user_id, session.refresh_token_hash));
            }
        }
        Ok(doomed.len() as u64)
    }

    async fn purge_expired(&self) -> Result<u64> {
        let now = Utc::now();
        let mut inner = self.inner.write().await;
        let doomed: Vec<Uuid> = inner
            .sessions
            .values()
            .filter(|s| s.is_expired(now))
            .map(|s| s.session_id)
            .collect();

        for id in &doomed {
            if let Some(session) = inner.sessions.remove(id) {
                inner
                    .identity_index
                    .remove(&(session.user_id, session.refresh_token_hash));
            }
        }
        Ok(doomed.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn test_create_and_find() {
        let store = MemorySessionStore::new();
        let expires = Utc::now() + Duration::days(7);

        let session = store.create(42, "hash-a", expires).await.unwrap();

        let found = store.find_by_identity(42, "hash-a").await.unwrap();
        assert_eq!(found.unwrap().session_id, session.session_id);

        // Must not match on user alone.
        assert!(store.find_by_identity(42, "hash-b").await.unwrap().is_none());
        assert!(store.find_by_identity(43, "hash-a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_record_behaves_as_absent() {
        let store = MemorySessionStore::new();
        let past = Utc::now() - Duration::seconds(1);

        store.create(42, "hash-a", past).await.unwrap();

        // Unreachable before any sweep runs.
        assert!(store.find_by_identity(42, "hash-a").await.unwrap().is_none());

        let purged = store.purge_expired().await.unwrap();
        assert_eq!(purged, 1);
    }

    #[tokio::test]
    async fn test_cas_first_writer_wins() {
        let store = MemorySessionStore::new();
        let expires = Utc::now() + Duration::days(7);
        let session = store.create(42, "hash-a", expires).await.unwrap();

        // Winner swaps the live hash.
        assert!(store
            .compare_and_swap_hash(session.session_id, "hash-a", "hash-b")
            .await
            .unwrap());

        // Loser raced on the same expected hash and is rejected.
        assert!(!store
            .compare_and_swap_hash(session.session_id, "hash-a", "hash-c")
            .await
            .unwrap());

        // Lookup follows the winner; expires_at is untouched.
        let found = store.find_by_identity(42, "hash-b").await.unwrap().unwrap();
        assert_eq!(found.expires_at, expires);
        assert!(store.find_by_identity(42, "hash-a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cas_rejects_expired_session() {
        let store = MemorySessionStore::new();
        let past = Utc::now() - Duration::seconds(1);
        let session = store.create(42, "hash-a", past).await.unwrap();

        // The record still physically exists (no sweep yet) but the swap
        // must fail, matching the SQL variant's expiry predicate.
        assert!(!store
            .compare_and_swap_hash(session.session_id, "hash-a", "hash-b")
            .await
            .unwrap());
        assert!(store.find_by_identity(42, "hash-b").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = MemorySessionStore::new();
        let expires = Utc::now() + Duration::days(7);
        let session = store.create(42, "hash-a", expires).await.unwrap();

        store.delete(session.session_id).await.unwrap();
        // Second delete of the same id is not an error.
        store.delete(session.session_id).await.unwrap();

        assert!(store.find_by_identity(42, "hash-a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_by_user() {
        let store = MemorySessionStore::new();
        let expires = Utc::now() + Duration::days(7);
        store.create(42, "hash-a", expires).await.unwrap();
        store.create(42, "hash-b", expires).await.unwrap();
        store.create(7, "hash-c", expires).await.unwrap();

        assert_eq!(store.delete_by_user(42).await.unwrap(), 2);
        assert!(store.find_by_identity(7, "hash-c").await.unwrap().is_some());
    }
}
