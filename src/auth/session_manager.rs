use crate::auth::jwt_service::JwtService;
use crate::auth::models::Session;
use crate::auth::session_store::SessionStore;
use crate::error::{Result, ServerError};
use crate::repository::UserDirectory;
use chrono::{DateTime, Duration, Utc};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Deployment mode, chosen once at startup from explicit configuration.
///
/// `Development` enables the store-bypass refresh path; the enum is the
/// only gate, so the bypass is unreachable in `Production` and trivially
/// testable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeMode {
    Production,
    Development,
}

impl RuntimeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuntimeMode::Production => "production",
            RuntimeMode::Development => "development",
        }
    }
}

impl std::str::FromStr for RuntimeMode {
    type Err = ServerError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "production" => Ok(RuntimeMode::Production),
            "development" | "dev" => Ok(RuntimeMode::Development),
            other => Err(ServerError::Configuration(format!(
                "unknown environment: {}",
                other
            ))),
        }
    }
}

/// Result of a successful refresh: the rotated credential and its owner.
#[derive(Debug, Clone)]
pub struct RefreshOutcome {
    pub user_id: i64,
    pub session_id: Uuid,
    /// New raw refresh token; handed to the caller for transmission and
    /// not retained anywhere after this value is dropped.
    pub refresh_token: String,
    /// The session's fixed deadline, unchanged by the rotation. The
    /// gateway aligns the cookie lifetime with it.
    pub expires_at: DateTime<Utc>,
}

/// Orchestrates the refresh-session lifecycle over a signer, a session
/// store and the external user directory.
///
/// All collaborators are injected at construction; there is no global
/// signer or store state. Store calls run under a bounded timeout and an
/// elapsed deadline surfaces as `Timeout`, never as a negative trust
/// decision.
pub struct SessionManager {
    jwt: Arc<JwtService>,
    store: Arc<dyn SessionStore>,
    users: Arc<dyn UserDirectory>,
    refresh_ttl: Duration,
    store_timeout: std::time::Duration,
    mode: RuntimeMode,
}

impl SessionManager {
    pub fn new(
        jwt: Arc<JwtService>,
        store: Arc<dyn SessionStore>,
        users: Arc<dyn UserDirectory>,
        refresh_ttl_secs: i64,
        store_timeout: std::time::Duration,
        mode: RuntimeMode,
    ) -> Self {
        Self {
            jwt,
            store,
            users,
            refresh_ttl: Duration::seconds(refresh_ttl_secs),
            store_timeout,
            mode,
        }
    }

    async fn bounded<T>(&self, fut: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::time::timeout(self.store_timeout, fut).await?
    }

    /// Issue a brand-new session for a subject.
    ///
    /// The absolute deadline is `now + refresh_ttl` and is fixed for the
    /// session's whole life: rotation later reuses it unchanged.
    pub async fn issue(&self, user_id: i64) -> Result<(String, Session)> {
        let expires_at = Utc::now() + self.refresh_ttl;
        let raw = self.jwt.issue_refresh(user_id, expires_at)?;
        let hash = JwtService::fingerprint(&raw);

        let session = self.bounded(self.store.create(user_id, &hash, expires_at)).await?;

        info!(
            "✅ session issued: user_id={}, session_id={}",
            user_id, session.session_id
        );
        Ok((raw, session))
    }

    /// Validate a raw refresh token against the live server-side record.
    ///
    /// Signature verification and the store lookup are both mandatory: a
    /// rotated-away token still carries a valid signature and an unexpired
    /// embedded claim, and only the store knows it is no longer live.
    pub async fn validate(&self, raw: &str) -> Result<Session> {
        let claims = self.jwt.verify_refresh(raw)?;
        let user_id = claims.user_id().ok_or(ServerError::TokenMalformed)?;
        let hash = JwtService::fingerprint(raw);

        let session = self
            .bounded(self.store.find_by_identity(user_id, &hash))
            .await?
            .ok_or(ServerError::SessionNotFound)?;

        debug!(
            "session validated: user_id={}, session_id={}",
            user_id, session.session_id
        );
        Ok(session)
    }

    /// Rotate a session's credential, keeping its absolute expiry.
    ///
    /// First-writer-wins: the swap only commits while the stored hash still
    /// equals the hash this request validated against, so two concurrent
    /// rotations can never both be accepted. The loser gets
    /// `SessionNotFound`, same as any other stale credential.
    pub async fn rotate(&self, session: &Session) -> Result<String> {
        let raw = self.jwt.issue_refresh(session.user_id, session.expires_at)?;
        let new_hash = JwtService::fingerprint(&raw);

        let swapped = self
            .bounded(self.store.compare_and_swap_hash(
                session.session_id,
                &session.refresh_token_hash,
                &new_hash,
            ))
            .await?;

        if !swapped {
            debug!(
                "rotation lost the race: session_id={}",
                session.session_id
            );
            return Err(ServerError::SessionNotFound);
        }

        info!("🔄 session rotated: session_id={}", session.session_id);
        Ok(raw)
    }

    /// Revoke one session (logout). Idempotent.
    pub async fn revoke(&self, session_id: Uuid) -> Result<()> {
        self.bounded(self.store.delete(session_id)).await?;
        info!("session revoked: session_id={}", session_id);
        Ok(())
    }

    /// Revoke every session a user owns (password change, account removal).
    pub async fn revoke_all(&self, user_id: i64) -> Result<u64> {
        let count = self.bounded(self.store.delete_by_user(user_id)).await?;
        info!("✅ revoked {} session(s) for user_id={}", count, user_id);
        Ok(count)
    }

    /// Full gateway flow: verify the credential, confirm the subject still
    /// exists, then validate against the store and rotate.
    pub async fn refresh(&self, raw: &str) -> Result<RefreshOutcome> {
        let claims = self.jwt.verify_refresh(raw)?;
        let user_id = claims.user_id().ok_or(ServerError::TokenMalformed)?;

        self.bounded(self.users.find_by_id(user_id))
            .await?
            .ok_or(ServerError::UserNotFound(user_id))?;

        if self.mode == RuntimeMode::Development {
            // Development bypass: mint a fresh session from the verified
            // subject without consulting the old record.
            info!("🔧 development mode: refresh bypasses the session store");
            let (refresh_token, session) = self.issue(user_id).await?;
            return Ok(RefreshOutcome {
                user_id,
                session_id: session.session_id,
                refresh_token,
                expires_at: session.expires_at,
            });
        }

        let hash = JwtService::fingerprint(raw);
        let session = self
            .bounded(self.store.find_by_identity(user_id, &hash))
            .await?
            .ok_or(ServerError::SessionNotFound)?;

        let refresh_token = self.rotate(&session).await?;

        Ok(RefreshOutcome {
            user_id,
            session_id: session.session_id,
            refresh_token,
            expires_at: session.expires_at,
        })
    }
}
