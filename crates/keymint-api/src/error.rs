// Error taxonomy for the credential-issuance pipeline
// Decision: One tagged error type propagated through the pipeline, translated
// to HTTP exactly once in IntoResponse

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::api::ErrorResponse;

/// Failure modes of authentication, authorization, and registration.
///
/// Messages for `Unauthenticated` are fixed and generic so callers cannot
/// learn which check failed. `Internal` carries its source for logging only;
/// the response body never includes it.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Malformed input, rejected before any store access (400)
    #[error("{0}")]
    Validation(String),
    /// Credential or proof check failed (401)
    #[error("invalid credentials")]
    Unauthenticated,
    /// Valid identity but missing/unknown API key token (401)
    #[error("{0}")]
    Unauthorized(String),
    /// Duplicate registration (400)
    #[error("{0}")]
    Conflict(String),
    /// Unmatched route (404)
    #[error("not found")]
    NotFound,
    /// Unexpected store/signing failure (500, logged, message withheld)
    #[error("internal server error")]
    Internal(#[from] anyhow::Error),
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::Validation(_) => StatusCode::BAD_REQUEST,
            AuthError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AuthError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AuthError::Conflict(_) => StatusCode::BAD_REQUEST,
            AuthError::NotFound => StatusCode::NOT_FOUND,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn unauthorized(message: &str) -> Self {
        AuthError::Unauthorized(message.to_string())
    }

    pub fn conflict(message: &str) -> Self {
        AuthError::Conflict(message.to_string())
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if let AuthError::Internal(source) = &self {
            tracing::error!("internal error: {:#}", source);
        }
        let status = self.status();
        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}
