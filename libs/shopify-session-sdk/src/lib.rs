//! Server-side verification of Shopify embedded app session tokens.
//!
//! An embedded app's frontend sends a session token signed by the Shopify
//! admin with the app's API secret in `Authorization: Bearer <token>`.
//! This SDK verifies it locally.
//!
//! # Features
//!
//! - **Token verification** - HS256 signature, audience, time window and required claims
//! - **Issuer policy** - `iss` must be a `https://<shop>.myshopify.com` origin matching `dest`
//! - **Token extraction** - Framework-agnostic `Headers` trait
//!
//! # Example
//!
//! ```rust,ignore
//! use shopify_session::{SessionTokenVerifier, VerifierConfig};
//!
//! let verifier = SessionTokenVerifier::new(VerifierConfig {
//!     client_id: "api-key".to_string(),
//!     secret: "api-secret".into(),
//!     clock_skew_seconds: None,
//! })?;
//!
//! let payload = verifier.verify("Bearer eyJ...")?;
//! println!("Shop: {:?}", payload.destination());
//! ```

mod client;
mod error;
mod extract;

pub use client::{SessionTokenVerifier, VerifierConfig};
pub use error::SessionError;
pub use extract::{Headers, extract_from_header};

// Re-export shared types for convenience
pub use shopify_session_types::{
    DecodedPayload, ErrorCode, SessionTokenClaims, SessionTokenError, encode_session_token,
    verify_session_token,
};
