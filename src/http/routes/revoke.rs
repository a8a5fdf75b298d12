//! Admin bulk revocation.
//!
//! Deletes every live session of a user, for password resets and
//! account lockouts. Authenticated with X-Service-Key.

use crate::auth::{RevokeSessionsRequest, RevokeSessionsResponse};
use crate::error::Result;
use crate::http::routes::issue::verify_service_key;
use crate::http::HttpServerState;
use axum::{extract::State, http::HeaderMap, response::Json, routing::post, Router};
use tracing::info;

pub fn create_route() -> Router<HttpServerState> {
    Router::new().route("/api/admin/sessions/revoke", post(revoke_sessions))
}

async fn revoke_sessions(
    State(state): State<HttpServerState>,
    headers: HeaderMap,
    Json(request): Json<RevokeSessionsRequest>,
) -> Result<Json<RevokeSessionsResponse>> {
    verify_service_key(&headers, &state)?;

    let revoked = state.session_manager.revoke_all(request.user_id).await?;

    info!("🔒 admin revoked {} session(s) for user {}", revoked, request.user_id);

    Ok(Json(RevokeSessionsResponse {
        user_id: request.user_id,
        revoked,
    }))
}
