//! Error types for the server.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use droidauth_config::ConfigError;
use droidauth_google::GoogleError;
use serde::Serialize;
use thiserror::Error;

/// Result type for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;

/// Server error type.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Malformed request.
    #[error("{0}")]
    BadRequest(String),

    /// No master token stored yet.
    #[error("{0}")]
    Unauthorized(String),

    /// Static proxy target outside the allow-list.
    #[error("domain not allowed: {0}")]
    Forbidden(String),

    /// Upstream host unreachable.
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Body read, decompression, or other internal failure.
    #[error("{0}")]
    Internal(String),

    /// Check-in or token exchange failed.
    #[error(transparent)]
    Google(#[from] GoogleError),

    /// State file could not be saved.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Unauthorized(_) | ServerError::Google(GoogleError::NoMasterToken) => {
                StatusCode::UNAUTHORIZED
            }
            ServerError::Forbidden(_) => StatusCode::FORBIDDEN,
            ServerError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ServerError::Internal(_) | ServerError::Google(_) | ServerError::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn log(&self, status: StatusCode) {
        if status.is_server_error() {
            tracing::error!(status = %status, error = %self, "Server error");
        } else {
            tracing::warn!(status = %status, error = %self, "Client error");
        }
    }
}

/// JSON error body for `/api` routes.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        self.log(status);
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Plain-text error for proxied browser requests.
#[derive(Debug)]
pub struct ProxyError(ServerError);

impl From<ServerError> for ProxyError {
    fn from(err: ServerError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.0.status();
        self.0.log(status);
        (status, self.0.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ServerError::BadRequest("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServerError::Forbidden("evil.com".into()).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ServerError::Upstream("down".into()).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ServerError::from(GoogleError::NoMasterToken).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ServerError::from(GoogleError::EmptyToken("x".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_forbidden_message() {
        let err = ServerError::Forbidden("evil.example".into());
        assert_eq!(err.to_string(), "domain not allowed: evil.example");
    }
}
