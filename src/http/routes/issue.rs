//! Admin session issuance.
//!
//! Backend systems call this to mint a refresh session for a known user,
//! authenticated with the pre-shared X-Service-Key header. The raw
//! refresh token appears in this response exactly once.

use crate::auth::{IssueSessionRequest, IssueSessionResponse};
use crate::error::{Result, ServerError};
use crate::http::HttpServerState;
use axum::{
    extract::State,
    http::HeaderMap,
    response::Json,
    routing::post,
    Router,
};
use tracing::{info, warn};

pub fn create_route() -> Router<HttpServerState> {
    Router::new().route("/api/admin/sessions/issue", post(issue_session))
}

/// Extract and verify the X-Service-Key header.
pub(crate) fn verify_service_key(headers: &HeaderMap, state: &HttpServerState) -> Result<()> {
    let key = headers
        .get("X-Service-Key")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            warn!("missing or malformed X-Service-Key header");
            ServerError::Unauthorized("missing X-Service-Key header".to_string())
        })?;

    if !state.service_key_manager.verify(key) {
        warn!("❌ invalid service key");
        return Err(ServerError::Unauthorized("invalid service key".to_string()));
    }

    Ok(())
}

async fn issue_session(
    State(state): State<HttpServerState>,
    headers: HeaderMap,
    Json(request): Json<IssueSessionRequest>,
) -> Result<Json<IssueSessionResponse>> {
    verify_service_key(&headers, &state)?;

    let user = state
        .user_directory
        .find_by_id(request.user_id)
        .await?
        .ok_or(ServerError::UserNotFound(request.user_id))?;

    let (refresh_token, session) = state.session_manager.issue(user.user_id).await?;
    let token = state.access_issuer.issue_access(user.user_id)?;

    info!("🎫 admin issued session {} for user {}", session.session_id, user.user_id);

    Ok(Json(IssueSessionResponse {
        token,
        refresh_token,
        session_id: session.session_id,
        user_id: session.user_id,
        expires_at: session.expires_at,
    }))
}
