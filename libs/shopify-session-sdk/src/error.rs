use shopify_session_types::{PUBLIC_REJECTION_MESSAGE, SessionTokenError};
use thiserror::Error;

/// SDK-specific errors.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Session token was rejected
    #[error("Session token error: {0}")]
    Token(#[from] SessionTokenError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl SessionError {
    /// True when the request should be answered with 401 Unauthorized.
    pub fn is_unauthorized(&self) -> bool {
        match self {
            Self::Token(err) => err.is_client_error(),
            Self::Config(_) => false,
        }
    }

    /// Text safe to return to the client.
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::Token(_) => PUBLIC_REJECTION_MESSAGE,
            Self::Config(_) => "Internal error",
        }
    }
}
