//! HTTP route modules.
//!
//! - `POST /api/auth/refresh` - rotate a refresh session, mint an access token
//! - `POST /api/auth/logout`  - revoke the presented session, clear the cookie
//! - `POST /api/admin/sessions/issue`  - mint a session for a user (X-Service-Key)
//! - `POST /api/admin/sessions/revoke` - revoke every session of a user (X-Service-Key)

pub mod issue;
pub mod logout;
pub mod refresh;
pub mod revoke;

use crate::http::HttpServerState;
use axum::Router;

pub fn create_routes() -> Router<HttpServerState> {
    Router::new()
        .merge(refresh::create_route())
        .merge(logout::create_route())
        .merge(issue::create_route())
        .merge(revoke::create_route())
}
