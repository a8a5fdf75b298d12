//! User directory - PostgreSQL implementation.

use crate::error::{Result, ServerError};
use crate::repository::{UserDirectory, UserRecord};
use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;

/// User directory backed by the `authgate_users` table.
#[derive(Clone)]
pub struct PgUserDirectory {
    pool: Arc<PgPool>,
}

impl PgUserDirectory {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn find_by_id(&self, user_id: i64) -> Result<Option<UserRecord>> {
        #[derive(sqlx::FromRow)]
        struct UserRow {
            user_id: i64,
            username: String,
        }

        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT user_id, username
            FROM authgate_users
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(self.pool.as_ref())
        .await
        .map_err(|e| ServerError::Database(format!("failed to query user: {}", e)))?;

        Ok(row.map(|r| UserRecord {
            user_id: r.user_id,
            username: r.username,
        }))
    }
}
