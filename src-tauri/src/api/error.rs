use thiserror::Error;

/// Failures talking to the Keke backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server rejected the credentials or the token.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// Email or PIN left blank; nothing was sent.
    #[error("Email and PIN are required")]
    MissingCredentials,

    /// Connection refused, DNS failure, timeout, ...
    #[error("Server not accessible: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Non-success status other than an auth rejection.
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// Body could not be decoded; the raw body is kept for the log.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl ApiError {
    /// True when the stored token should be discarded.
    pub fn is_auth_rejected(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }
}
