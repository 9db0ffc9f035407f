//! Session token verifier implementation.

use env_helpers::get_env_default;
use secrecy::{ExposeSecret, SecretString};
use shopify_session_types::{DecodedPayload, SessionTokenError, verify_session_token};

use crate::error::SessionError;
use crate::extract::{Headers, extract_from_header};

/// Configuration for the session token verifier.
#[derive(Debug)]
pub struct VerifierConfig {
    /// The app's API key (client id); expected as the token audience
    pub client_id: String,

    /// The app's API secret key; tokens are signed with it
    pub secret: SecretString,

    /// Clock skew tolerance in seconds (default: 0)
    pub clock_skew_seconds: Option<u64>,
}

impl VerifierConfig {
    /// Load the configuration from the environment.
    ///
    /// Reads `SHOPIFY_API_KEY`, `SHOPIFY_API_SECRET` and the optional
    /// `SHOPIFY_SESSION_TOKEN_LEEWAY_SECS`.
    pub fn from_env() -> Result<Self, SessionError> {
        let client_id = required_env("SHOPIFY_API_KEY")?;
        let secret = SecretString::new(required_env("SHOPIFY_API_SECRET")?.into());
        let clock_skew_seconds: u64 = get_env_default("SHOPIFY_SESSION_TOKEN_LEEWAY_SECS", 0);

        Ok(Self {
            client_id,
            secret,
            clock_skew_seconds: Some(clock_skew_seconds),
        })
    }
}

fn required_env(key: &str) -> Result<String, SessionError> {
    std::env::var(key).map_err(|_| SessionError::Config(format!("{key} must be set")))
}

/// Verifies session tokens sent by an embedded app's frontend.
///
/// Holds only immutable configuration, so a single instance can be shared
/// across threads and requests.
pub struct SessionTokenVerifier {
    config: VerifierConfig,
}

impl SessionTokenVerifier {
    /// Create a new verifier.
    ///
    /// # Returns
    /// A configured `SessionTokenVerifier` or an error if the client id or
    /// secret is empty.
    pub fn new(config: VerifierConfig) -> Result<Self, SessionError> {
        if config.client_id.is_empty() {
            return Err(SessionError::Config(
                "client_id is required. Use the app's API key.".into(),
            ));
        }

        if config.secret.expose_secret().is_empty() {
            return Err(SessionError::Config(
                "secret is required. Use the app's API secret key.".into(),
            ));
        }

        Ok(Self { config })
    }

    /// Create a verifier from `VerifierConfig::from_env()`.
    pub fn from_env() -> Result<Self, SessionError> {
        Self::new(VerifierConfig::from_env()?)
    }

    pub fn client_id(&self) -> &str {
        &self.config.client_id
    }

    /// Verify an Authorization header value.
    ///
    /// No network call required.
    ///
    /// # Example
    /// ```rust,ignore
    /// let payload = verifier.verify("Bearer eyJ...")?;
    /// println!("Shop: {:?}", payload.destination());
    /// println!("Staff user: {:?}", payload.subject());
    /// ```
    pub fn verify(&self, authorization_header: &str) -> Result<DecodedPayload, SessionError> {
        let payload = verify_session_token(
            authorization_header,
            &self.config.client_id,
            self.config.secret.expose_secret().as_bytes(),
            self.config.clock_skew_seconds.unwrap_or(0),
        )?;

        Ok(payload)
    }

    /// Extract the raw session token from request headers.
    ///
    /// # Returns
    /// The token string or None if there is no Bearer Authorization header.
    pub fn extract_token<H: Headers>(&self, headers: &H) -> Option<String> {
        headers
            .get_authorization()
            .and_then(extract_from_header)
            .map(str::to_string)
    }

    /// Authenticate a request by verifying its Authorization header.
    ///
    /// A missing header is rejected the same way as a malformed one.
    pub fn authenticate<H: Headers>(&self, headers: &H) -> Result<DecodedPayload, SessionError> {
        let Some(authorization) = headers.get_authorization() else {
            tracing::debug!("Request has no Authorization header");
            return Err(SessionTokenError::MalformedHeader.into());
        };

        self.verify(authorization)
    }
}
