use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Server error type.
///
/// Credential-level variants (`TokenMalformed`, `TokenSignature`,
/// `TokenExpired`) and `SessionNotFound` / `UserNotFound` stay distinct
/// internally for logging and tests, but the HTTP mapping collapses them
/// into one undifferentiated 401 so a caller cannot probe which sub-check
/// rejected a refresh attempt.
#[derive(Debug, Clone, Error)]
pub enum ServerError {
    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
    /// Configuration error (fatal at startup)
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// Request validation error
    #[error("Validation error: {0}")]
    Validation(String),
    /// Refresh credential could not be parsed
    #[error("Malformed token")]
    TokenMalformed,
    /// Refresh credential signature did not verify
    #[error("Invalid token signature")]
    TokenSignature,
    /// Refresh credential's embedded expiry has elapsed
    #[error("Expired token")]
    TokenExpired,
    /// No live session matches the presented credential
    #[error("Session not found")]
    SessionNotFound,
    /// Referenced user no longer exists
    #[error("User not found: {0}")]
    UserNotFound(i64),
    /// Missing or rejected credential at the HTTP boundary
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    /// Database / store failure (infrastructure, not an authorization outcome)
    #[error("Database error: {0}")]
    Database(String),
    /// Store operation exceeded its deadline
    #[error("Timeout: {0}")]
    Timeout(String),
}

impl ServerError {
    /// True for the failures that must be reported to clients as one
    /// generic "refresh invalid" outcome.
    pub fn is_authorization_failure(&self) -> bool {
        matches!(
            self,
            ServerError::TokenMalformed
                | ServerError::TokenSignature
                | ServerError::TokenExpired
                | ServerError::SessionNotFound
                | ServerError::UserNotFound(_)
                | ServerError::Unauthorized(_)
        )
    }
}

impl From<tokio::time::error::Elapsed> for ServerError {
    fn from(err: tokio::time::error::Elapsed) -> Self {
        ServerError::Timeout(err.to_string())
    }
}

impl From<sqlx::Error> for ServerError {
    fn from(err: sqlx::Error) -> Self {
        ServerError::Database(err.to_string())
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, code, message) = if self.is_authorization_failure() {
            // One body for every authorization failure. The concrete
            // reason only ever shows up in server-side logs.
            tracing::warn!("refresh rejected: {}", self);
            (
                StatusCode::UNAUTHORIZED,
                ErrorCode::Unauthorized,
                "invalid refresh credential".to_string(),
            )
        } else {
            match &self {
                ServerError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, ErrorCode::Validation, msg.clone())
                }
                ServerError::Timeout(e) => {
                    tracing::error!("store timeout: {}", e);
                    (
                        StatusCode::SERVICE_UNAVAILABLE,
                        ErrorCode::Timeout,
                        "service temporarily unavailable".to_string(),
                    )
                }
                ServerError::Database(e) => {
                    tracing::error!("database error: {}", e);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ErrorCode::Database,
                        "internal error".to_string(),
                    )
                }
                other => {
                    tracing::error!("internal error: {}", other);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ErrorCode::Internal,
                        "internal error".to_string(),
                    )
                }
            }
        };

        let body = ErrorResponse {
            code,
            message,
            timestamp: chrono::Utc::now().timestamp() as u64,
        };
        (status, Json(body)).into_response()
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, ServerError>;

/// Wire-level error code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    Internal,
    Validation,
    Unauthorized,
    Database,
    Timeout,
}

/// Error response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: ErrorCode,
    pub message: String,
    pub timestamp: u64,
}
