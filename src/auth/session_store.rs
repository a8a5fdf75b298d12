use crate::auth::models::Session;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Durable keyed storage for refresh-token sessions.
///
/// Expiry is part of the read contract: every lookup excludes records whose
/// `expires_at` has elapsed, so correctness never depends on when the
/// background sweeper actually runs.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Insert a new session record.
    async fn create(
        &self,
        user_id: i64,
        refresh_token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Session>;

    /// Exact match on `(user_id, refresh_token_hash)`. Never matches on the
    /// user alone, and expired records behave as absent even before any
    /// physical purge.
    async fn find_by_identity(
        &self,
        user_id: i64,
        refresh_token_hash: &str,
    ) -> Result<Option<Session>>;

    /// Atomically replace the stored hash, but only while it still equals
    /// `expected_hash`. Returns `false` when another writer got there first.
    /// `expires_at` is left untouched.
    async fn compare_and_swap_hash(
        &self,
        session_id: Uuid,
        expected_hash: &str,
        new_hash: &str,
    ) -> Result<bool>;

    /// Delete a session. Deleting an already-gone session is not an error.
    async fn delete(&self, session_id: Uuid) -> Result<()>;

    /// Delete every session belonging to a user; returns how many went away.
    async fn delete_by_user(&self, user_id: i64) -> Result<u64>;

    /// Physically reclaim expired records. Best effort; returns the count.
    async fn purge_expired(&self) -> Result<u64>;
}

/// Spawn the best-effort background sweep that reclaims expired sessions.
pub fn spawn_expiry_sweeper(store: Arc<dyn SessionStore>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // First tick fires immediately; skip it.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match store.purge_expired().await {
                Ok(0) => {}
                Ok(n) => tracing::info!("🧹 expiry sweep reclaimed {} session(s)", n),
                Err(e) => tracing::warn!("expiry sweep failed: {}", e),
            }
        }
    })
}
