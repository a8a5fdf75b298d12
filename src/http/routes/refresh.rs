//! Refresh endpoint.
//!
//! The browser presents its refresh token in an HttpOnly cookie. A
//! successful call rotates the stored credential and returns a fresh
//! access token; the replacement refresh token travels back in the same
//! cookie. Every credential failure collapses to the same 401 body.

use crate::auth::RefreshResponse;
use crate::error::{Result, ServerError};
use crate::http::HttpServerState;
use axum::{extract::State, response::Json, routing::post, Router};
use chrono::Utc;
use tower_cookies::cookie::time::Duration as CookieDuration;
use tower_cookies::cookie::SameSite;
use tower_cookies::{Cookie, Cookies};
use tracing::debug;

/// Cookie carrying the raw refresh token.
pub const REFRESH_COOKIE: &str = "refresh_token";

pub fn create_route() -> Router<HttpServerState> {
    Router::new().route("/api/auth/refresh", post(refresh_session))
}

/// Build the refresh cookie. HttpOnly always; Secure in production.
///
/// `max_age_secs` is the session's remaining lifetime, not the full TTL:
/// rotation never extends the server-side deadline, and the cookie must
/// not outlive it.
pub fn refresh_cookie(token: String, secure: bool, max_age_secs: i64) -> Cookie<'static> {
    Cookie::build((REFRESH_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(CookieDuration::seconds(max_age_secs.max(0)))
        .build()
}

/// Expired clone of the refresh cookie, used to clear it client-side.
pub fn clear_cookie() -> Cookie<'static> {
    Cookie::build((REFRESH_COOKIE, ""))
        .path("/")
        .http_only(true)
        .max_age(CookieDuration::ZERO)
        .build()
}

async fn refresh_session(
    State(state): State<HttpServerState>,
    cookies: Cookies,
) -> Result<Json<RefreshResponse>> {
    let raw = cookies
        .get(REFRESH_COOKIE)
        .map(|c| c.value().to_string())
        .ok_or_else(|| {
            debug!("refresh request without a credential cookie");
            ServerError::Unauthorized("missing refresh credential".to_string())
        })?;

    let outcome = state.session_manager.refresh(&raw).await?;
    let token = state.access_issuer.issue_access(outcome.user_id)?;

    let remaining_secs = (outcome.expires_at - Utc::now()).num_seconds();
    cookies.add(refresh_cookie(
        outcome.refresh_token,
        state.cookie_secure,
        remaining_secs,
    ));

    Ok(Json(RefreshResponse {
        token,
        user_id: outcome.user_id,
    }))
}
