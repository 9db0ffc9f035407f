//! Shared types and verification primitives for Shopify session tokens.
//!
//! This crate provides:
//! - Session token claims (`SessionTokenClaims`) and the verified claim set (`DecodedPayload`)
//! - The session token error taxonomy (`SessionTokenError`, `ErrorCode`)
//! - Issuer origin policy (`origin_of`, `is_shop_origin`, `is_shop_hostname`)
//! - HS256 verification of `Authorization: Bearer` headers (`verify_session_token`)

mod claims;
mod crypto;
mod errors;
mod issuer;

pub use claims::{DecodedPayload, SessionTokenClaims};
pub use crypto::{
    ALGORITHM, BEARER_PREFIX, REQUIRED_CLAIMS, encode_session_token, extract_from_header,
    verify_session_token,
};
pub use errors::{ErrorCode, PUBLIC_REJECTION_MESSAGE, SessionTokenError};
pub use issuer::{is_shop_hostname, is_shop_origin, origin_of};
