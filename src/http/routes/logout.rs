//! Logout endpoint.
//!
//! Best-effort revocation: an invalid or absent credential still yields
//! a success response and a cleared cookie, so a client can always log
//! out. Store failures are the only hard errors.

use crate::auth::LogoutResponse;
use crate::error::Result;
use crate::http::routes::refresh::{clear_cookie, REFRESH_COOKIE};
use crate::http::HttpServerState;
use axum::{extract::State, response::Json, routing::post, Router};
use tower_cookies::Cookies;
use tracing::{debug, info};

pub fn create_route() -> Router<HttpServerState> {
    Router::new().route("/api/auth/logout", post(logout))
}

async fn logout(
    State(state): State<HttpServerState>,
    cookies: Cookies,
) -> Result<Json<LogoutResponse>> {
    if let Some(cookie) = cookies.get(REFRESH_COOKIE) {
        let raw = cookie.value().to_string();
        match state.session_manager.validate(&raw).await {
            Ok(session) => {
                state.session_manager.revoke(session.session_id).await?;
                info!("👋 user {} logged out", session.user_id);
            }
            Err(err) if err.is_authorization_failure() => {
                debug!("logout with a stale credential, nothing to revoke");
            }
            Err(err) => return Err(err),
        }
    }

    cookies.add(clear_cookie());

    Ok(Json(LogoutResponse { success: true }))
}
