//! HTTP server wiring.

use axum::Router;
use std::sync::Arc;
use tower_cookies::CookieManagerLayer;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::auth::{AccessTokenIssuer, ServiceKeyManager, SessionManager};
use crate::http::routes;
use crate::repository::UserDirectory;

/// Shared state handed to every route handler.
#[derive(Clone)]
pub struct HttpServerState {
    pub session_manager: Arc<SessionManager>,
    pub access_issuer: Arc<dyn AccessTokenIssuer>,
    pub service_key_manager: Arc<ServiceKeyManager>,
    pub user_directory: Arc<dyn UserDirectory>,
    /// Refresh cookies carry the Secure attribute in production.
    pub cookie_secure: bool,
}

pub struct AuthHttpServer {
    state: HttpServerState,
    host: String,
    port: u16,
}

impl AuthHttpServer {
    pub fn new(state: HttpServerState, host: String, port: u16) -> Self {
        Self { state, host, port }
    }

    pub async fn start(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let app = Router::new()
            .merge(routes::create_routes())
            .layer(CookieManagerLayer::new())
            .layer(CorsLayer::permissive())
            .with_state(self.state.clone());

        let addr = format!("{}:{}", self.host, self.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;

        info!("🌐 HTTP server listening on {}", addr);

        axum::serve(listener, app).await?;

        Ok(())
    }
}
