//! Token extraction utilities.

pub use shopify_session_types::extract_from_header;

/// Trait for accessing HTTP headers in a framework-agnostic way.
///
/// Implement this trait for your framework's header type to use
/// `SessionTokenVerifier::authenticate()`.
///
/// # Example
///
/// ```rust,ignore
/// use shopify_session::Headers;
///
/// // For axum
/// impl Headers for axum::http::HeaderMap {
///     fn get_authorization(&self) -> Option<&str> {
///         self.get("authorization")
///             .and_then(|v| v.to_str().ok())
///     }
/// }
/// ```
pub trait Headers {
    /// Get the Authorization header value.
    fn get_authorization(&self) -> Option<&str>;
}
