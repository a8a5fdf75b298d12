// User directory - the external account system consumed by the core.

pub mod memory;
pub mod user_repo;

pub use memory::MemoryUserDirectory;
pub use user_repo::PgUserDirectory;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Minimal view of an account held by the external user system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub user_id: i64,
    pub username: String,
}

/// Lookup interface to the external user system.
///
/// The refresh path confirms the subject still exists before honoring a
/// credential: a deleted user invalidates the practical effect of all of
/// their sessions even while session records linger.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_id(&self, user_id: i64) -> Result<Option<UserRecord>>;
}
