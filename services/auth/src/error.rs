//! Error taxonomy of the authentication service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Client-facing message for a confirmation code mismatch
pub const INCORRECT_CODE_MESSAGE: &str = "Confirm code is incorrect";

/// Custom error type for the authentication service
#[derive(Error, Debug)]
pub enum AuthError {
    /// Malformed input, surfaced verbatim
    #[error("Validation error: {0}")]
    Validation(String),

    /// Missing or invalid refresh token carrier
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Refresh token or confirmation code absent or past its TTL
    #[error("{0}")]
    NotFoundOrExpired(String),

    /// Confirmation code mismatch; never carries the cause
    #[error("Confirm code is incorrect")]
    IncorrectCode,

    /// Error reported by the identity provider, passed through unchanged
    #[error("Identity provider error ({status}): {message}")]
    Upstream { status: StatusCode, message: String },

    /// Backend, serialization or signing failure
    #[error("Internal error: {0:#}")]
    Internal(#[from] anyhow::Error),
}

impl AuthError {
    /// HTTP status the error maps to
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::Validation(_) | AuthError::IncorrectCode => StatusCode::BAD_REQUEST,
            AuthError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AuthError::NotFoundOrExpired(_) => StatusCode::NOT_FOUND,
            AuthError::Upstream { status, .. } => *status,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_message = match &self {
            AuthError::Validation(msg)
            | AuthError::Unauthorized(msg)
            | AuthError::NotFoundOrExpired(msg) => msg.clone(),
            AuthError::IncorrectCode => INCORRECT_CODE_MESSAGE.to_string(),
            AuthError::Upstream { message, .. } => message.clone(),
            AuthError::Internal(e) => {
                error!("Internal error: {:#}", e);
                "Internal server error".to_string()
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Type alias for authentication results
pub type AuthResult<T> = Result<T, AuthError>;
