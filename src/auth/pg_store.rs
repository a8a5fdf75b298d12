use crate::auth::models::Session;
use crate::auth::session_store::SessionStore;
use crate::error::{Result, ServerError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

#[derive(sqlx::FromRow)]
struct SessionRow {
    session_id: Uuid,
    user_id: i64,
    refresh_token_hash: String,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl From<SessionRow> for Session {
    fn from(r: SessionRow) -> Self {
        Session {
            session_id: r.session_id,
            user_id: r.user_id,
            refresh_token_hash: r.refresh_token_hash,
            expires_at: r.expires_at,
            created_at: r.created_at,
        }
    }
}

/// PostgreSQL session store.
///
/// Every read carries the `expires_at > NOW()` predicate, so expired rows
/// behave as absent regardless of sweep timing, and the hash swap is a
/// single conditional UPDATE — the row-level lock makes it linearizable
/// per session id.
pub struct PgSessionStore {
    pool: Arc<PgPool>,
}

impl PgSessionStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn create(
        &self,
        user_id: i64,
        refresh_token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Session> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            INSERT INTO authgate_sessions (session_id, user_id, refresh_token_hash, expires_at, created_at)
            VALUES ($1, $2, $3, $4, NOW())
            RETURNING session_id, user_id, refresh_token_hash, expires_at, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(refresh_token_hash)
        .bind(expires_at)
        .fetch_one(self.pool.as_ref())
        .await
        .map_err(|e| ServerError::Database(format!("failed to create session: {}", e)))?;

        debug!("session created: session_id={}", row.session_id);
        Ok(row.into())
    }

    async fn find_by_identity(
        &self,
        user_id: i64,
        refresh_token_hash: &str,
    ) -> Result<Option<Session>> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT session_id, user_id, refresh_token_hash, expires_at, created_at
            FROM authgate_sessions
            WHERE user_id = $1
              AND refresh_token_hash = $2
              AND expires_at > NOW()
            "#,
        )
        .bind(user_id)
        .bind(refresh_token_hash)
        .fetch_optional(self.pool.as_ref())
        .await
        .map_err(|e| ServerError::Database(format!("failed to query session: {}", e)))?;

        Ok(row.map(Into::into))
    }

    async fn compare_and_swap_hash(
        &self,
        session_id: Uuid,
        expected_hash: &str,
        new_hash: &str,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE authgate_sessions
            SET refresh_token_hash = $1
            WHERE session_id = $2
              AND refresh_token_hash = $3
              AND expires_at > NOW()
            "#,
        )
        .bind(new_hash)
        .bind(session_id)
        .bind(expected_hash)
        .execute(self.pool.as_ref())
        .await
        .map_err(|e| ServerError::Database(format!("failed to rotate session hash: {}", e)))?;

        Ok(result.rows_affected() == 1)
    }

    async fn delete(&self, session_id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM authgate_sessions WHERE session_id = $1")
            .bind(session_id)
            .execute(self.pool.as_ref())
            .await
            .map_err(|e| ServerError::Database(format!("failed to delete session: {}", e)))?;
        Ok(())
    }

    async fn delete_by_user(&self, user_id: i64) -> Result<u64> {
        let result = sqlx::query("DELETE FROM authgate_sessions WHERE user_id = $1")
            .bind(user_id)
            .execute(self.pool.as_ref())
            .await
            .map_err(|e| ServerError::Database(format!("failed to delete user sessions: {}", e)))?;
        Ok(result.rows_affected())
    }

    async fn purge_expired(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM authgate_sessions WHERE expires_at <= NOW()")
            .execute(self.pool.as_ref())
            .await
            .map_err(|e| ServerError::Database(format!("failed to purge sessions: {}", e)))?;
        Ok(result.rows_affected())
    }
}
