use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A refresh-token session: the durable trust record for one client.
///
/// `refresh_token_hash` holds a sha256 hex digest of the most recently
/// issued raw refresh token; the raw token itself is never stored.
/// `expires_at` is fixed at first issuance and is not extended by rotation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Stable session id; rotation never changes it
    pub session_id: Uuid,
    /// Owning user
    pub user_id: i64,
    /// sha256 hex of the currently live raw refresh token
    pub refresh_token_hash: String,
    /// Absolute deadline; past this the session behaves as nonexistent
    pub expires_at: DateTime<Utc>,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Whether the absolute deadline has elapsed.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// JWT claims carried by refresh and access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Issuer
    pub iss: String,
    /// Audience (distinguishes refresh from access tokens)
    pub aud: String,
    /// Subject: decimal user id
    pub sub: String,
    /// Issued-at (unix seconds)
    pub iat: i64,
    /// Expiry (unix seconds)
    pub exp: i64,
}

impl TokenClaims {
    /// Parse the subject back into a user id.
    pub fn user_id(&self) -> Option<i64> {
        self.sub.parse().ok()
    }
}

/// Body of `POST /api/admin/sessions/issue`.
#[derive(Debug, Clone, Deserialize)]
pub struct IssueSessionRequest {
    pub user_id: i64,
}

/// Response of `POST /api/admin/sessions/issue`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueSessionResponse {
    /// Short-lived access token
    pub token: String,
    /// Raw refresh token (transmitted once, then only its hash survives)
    pub refresh_token: String,
    pub session_id: Uuid,
    pub user_id: i64,
    pub expires_at: DateTime<Utc>,
}

/// Body of `POST /api/admin/sessions/revoke`.
#[derive(Debug, Clone, Deserialize)]
pub struct RevokeSessionsRequest {
    pub user_id: i64,
}

/// Response of `POST /api/admin/sessions/revoke`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevokeSessionsResponse {
    pub user_id: i64,
    pub revoked: u64,
}

/// Response of `POST /api/auth/refresh`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshResponse {
    /// Short-lived access token
    pub token: String,
    pub user_id: i64,
}

/// Response of `POST /api/auth/logout`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogoutResponse {
    pub success: bool,
}
