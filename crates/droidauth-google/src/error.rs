//! Error types for the Google clients.

use droidauth_proto::ProtoError;

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, GoogleError>;

/// Errors from check-in and token exchange.
#[derive(Debug, thiserror::Error)]
pub enum GoogleError {
    /// Building the request message failed.
    #[error("encode check-in request: {0}")]
    Encode(#[source] ProtoError),

    /// The response body was not a valid message.
    #[error("decode check-in response: {0}")]
    Decode(#[source] ProtoError),

    /// Connection failure or timeout.
    #[error("Network error: {0}")]
    Network(String),

    /// gzip encode/decode failure.
    #[error("Compression error: {0}")]
    Compression(String),

    /// The check-in endpoint answered with a non-200 status.
    #[error("check-in failed: status {status}: {body}")]
    RegistrationFailed { status: u16, body: String },

    /// A 200 check-in response carried no usable device id.
    #[error("check-in response missing device id")]
    MissingDeviceId,

    /// The token endpoint answered with a non-200 status.
    #[error("auth failed: status {status}: {error}")]
    ExchangeFailed { status: u16, error: String },

    /// A 200 token response carried no token.
    #[error("empty token in response: {0}")]
    EmptyToken(String),

    /// A service token was requested before login.
    #[error("no master token; run 'droidauth login' first")]
    NoMasterToken,
}

impl From<reqwest::Error> for GoogleError {
    fn from(e: reqwest::Error) -> Self {
        GoogleError::Network(e.to_string())
    }
}

/// Trim a response body for error messages.
pub(crate) fn snippet(body: &str) -> String {
    const MAX: usize = 512;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
