//! HTTP server module built on Axum.
//!
//! Surfaces:
//! - `/api/auth/*` - browser-facing refresh and logout endpoints
//!   (credential carried in an HttpOnly cookie)
//! - `/api/admin/*` - backend session administration
//!   (authenticated with X-Service-Key)

pub mod routes;
pub mod server;

pub use server::{AuthHttpServer, HttpServerState};
