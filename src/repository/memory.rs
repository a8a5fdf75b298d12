//! User directory - in-memory implementation for tests and database-less runs.

use crate::error::Result;
use crate::repository::{UserDirectory, UserRecord};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// In-memory user directory.
#[derive(Default)]
pub struct MemoryUserDirectory {
    users: RwLock<HashMap<i64, UserRecord>>,
}

impl MemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, user_id: i64, username: &str) {
        let mut users = self.users.write().await;
        users.insert(
            user_id,
            UserRecord {
                user_id,
                username: username.to_string(),
            },
        );
    }

    pub async fn remove(&self, user_id: i64) {
        let mut users = self.users.write().await;
        users.remove(&user_id);
    }
}

#[async_trait]
impl UserDirectory for MemoryUserDirectory {
    async fn find_by_id(&self, user_id: i64) -> Result<Option<UserRecord>> {
        let users = self.users.read().await;
        Ok(users.get(&user_id).cloned())
    }
}
