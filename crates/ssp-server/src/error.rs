//! HTTP error mapping.
//!
//! Auth action failures are turned into JSON error responses. Configuration
//! problems and broken attribute contracts are operator errors and do not
//! expose their details to the browser.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use ssp_auth::AuthError;
use ssp_session::SessionError;
use thiserror::Error;

/// Errors surfaced by the HTTP layer.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Authentication failed or is misconfigured.
    #[error("{0}")]
    Auth(#[from] AuthError),

    /// The session store failed.
    #[error("session error: {0}")]
    Session(#[from] SessionError),
}

impl ServerError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Auth(err) if err.is_provider() => StatusCode::BAD_GATEWAY,
            Self::Auth(_) | Self::Session(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the error code for responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Auth(AuthError::Configuration(_)) => "configuration_error",
            Self::Auth(AuthError::ContractViolation { .. }) => "contract_violation",
            Self::Auth(err) if err.is_provider() => "identity_provider_error",
            Self::Auth(AuthError::Storage(_)) => "storage_error",
            Self::Auth(_) | Self::Session(_) => "session_error",
        }
    }

    /// Returns the description shown to the client.
    #[must_use]
    pub fn public_description(&self) -> String {
        match self {
            Self::Auth(err) if err.is_configuration() || err.is_contract_violation() => {
                "authentication is not configured correctly".to_string()
            }
            Self::Auth(err) if err.is_provider() => self.to_string(),
            _ => "internal error".to_string(),
        }
    }
}

/// Error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub error: String,
    /// Human-readable error message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, code = self.error_code(), "Auth action failed");
        }
        let body = ErrorResponse {
            error: self.error_code().to_string(),
            error_description: Some(self.public_description()),
        };
        (status, Json(body)).into_response()
    }
}

/// Result type for HTTP handlers.
pub type ServerResult<T> = Result<T, ServerError>;
