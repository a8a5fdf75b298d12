// Auth module - token signing, session storage and lifecycle orchestration.

pub mod jwt_service;
pub mod memory_store;
pub mod models;
pub mod pg_store;
pub mod service_key_manager;
pub mod session_manager;
pub mod session_store;

pub use jwt_service::{AccessTokenIssuer, JwtService};
pub use memory_store::MemorySessionStore;
pub use models::{
    IssueSessionRequest, IssueSessionResponse, LogoutResponse, RefreshResponse,
    RevokeSessionsRequest, RevokeSessionsResponse, Session, TokenClaims,
};
pub use pg_store::PgSessionStore;
pub use service_key_manager::ServiceKeyManager;
pub use session_manager::{RefreshOutcome, RuntimeMode, SessionManager};
pub use session_store::{spawn_expiry_sweeper, SessionStore};
