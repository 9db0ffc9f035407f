use jsonwebtoken::errors::ErrorKind;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Message callers should return to the client for any rejected token.
pub const PUBLIC_REJECTION_MESSAGE: &str = "Invalid session token";

/// Stable diagnostic codes for session token failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    MalformedHeader,
    MalformedToken,
    InvalidSignature,
    TokenExpired,
    TokenNotYetValid,
    AudienceMismatch,
    MissingClaim,
    InvalidIssuer,
    IssuerDestinationMismatch,
    InvalidConfig,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::MalformedHeader => "MALFORMED_HEADER",
            Self::MalformedToken => "MALFORMED_TOKEN",
            Self::InvalidSignature => "INVALID_SIGNATURE",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::TokenNotYetValid => "TOKEN_NOT_YET_VALID",
            Self::AudienceMismatch => "AUDIENCE_MISMATCH",
            Self::MissingClaim => "MISSING_CLAIM",
            Self::InvalidIssuer => "INVALID_ISSUER",
            Self::IssuerDestinationMismatch => "ISSUER_DESTINATION_MISMATCH",
            Self::InvalidConfig => "INVALID_CONFIG",
        };
        write!(f, "{}", s)
    }
}

/// Session token verification errors.
///
/// Each variant is a distinct rejection reason. They are meant for logs and
/// diagnostics; clients should only ever see [`PUBLIC_REJECTION_MESSAGE`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionTokenError {
    #[error("Authorization header is not a Bearer token")]
    MalformedHeader,

    #[error("Malformed session token: {0}")]
    MalformedToken(String),

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Token has expired")]
    Expired,

    #[error("Token is not yet valid")]
    NotYetValid,

    #[error("Audience does not match client id")]
    AudienceMismatch,

    #[error("Missing required claim: {0}")]
    MissingClaim(String),

    #[error("Invalid issuer: {0}")]
    InvalidIssuer(String),

    #[error("Issuer {issuer} does not match destination {destination}")]
    IssuerDestinationMismatch { issuer: String, destination: String },

    #[error("Invalid verifier configuration: {0}")]
    InvalidConfig(String),
}

impl SessionTokenError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::MalformedHeader => ErrorCode::MalformedHeader,
            Self::MalformedToken(_) => ErrorCode::MalformedToken,
            Self::InvalidSignature => ErrorCode::InvalidSignature,
            Self::Expired => ErrorCode::TokenExpired,
            Self::NotYetValid => ErrorCode::TokenNotYetValid,
            Self::AudienceMismatch => ErrorCode::AudienceMismatch,
            Self::MissingClaim(_) => ErrorCode::MissingClaim,
            Self::InvalidIssuer(_) => ErrorCode::InvalidIssuer,
            Self::IssuerDestinationMismatch { .. } => ErrorCode::IssuerDestinationMismatch,
            Self::InvalidConfig(_) => ErrorCode::InvalidConfig,
        }
    }

    /// True when the request carried a bad token (HTTP 401), false when the
    /// verifier itself is misconfigured.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::InvalidConfig(_))
    }

    pub fn public_message(&self) -> &'static str {
        PUBLIC_REJECTION_MESSAGE
    }
}

impl From<jsonwebtoken::errors::Error> for SessionTokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::InvalidSignature
            | ErrorKind::InvalidAlgorithm
            | ErrorKind::InvalidAlgorithmName
            | ErrorKind::MissingAlgorithm => Self::InvalidSignature,
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::ImmatureSignature => Self::NotYetValid,
            ErrorKind::InvalidAudience => Self::AudienceMismatch,
            ErrorKind::MissingRequiredClaim(claim) if claim == "aud" => Self::AudienceMismatch,
            ErrorKind::MissingRequiredClaim(claim) => Self::MissingClaim(claim.clone()),
            _ => Self::MalformedToken(err.to_string()),
        }
    }
}
