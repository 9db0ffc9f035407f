use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Session token claims issued by the Shopify admin to embedded apps.
///
/// Used to build tokens (fixtures, local tooling) and as an optional typed
/// view over a verified [`DecodedPayload`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTokenClaims {
    /// Shop admin URL (e.g., "https://my-shop.myshopify.com/admin")
    pub iss: String,

    /// Shop URL the request is destined for (e.g., "https://my-shop.myshopify.com")
    pub dest: String,

    /// App API key (client id)
    pub aud: String,

    /// Staff user ID
    pub sub: String,

    /// Token expiration (Unix timestamp)
    pub exp: i64,

    /// Token not valid before (Unix timestamp)
    pub nbf: i64,

    /// Token issued at (Unix timestamp)
    pub iat: i64,

    /// Unique token ID
    pub jti: String,

    /// Admin session ID
    pub sid: String,
}

/// The claim set of a verified session token.
///
/// Holds the claims exactly as they were decoded; nothing is added,
/// removed or coerced after verification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DecodedPayload(Map<String, Value>);

impl DecodedPayload {
    pub(crate) fn new(claims: Map<String, Value>) -> Self {
        Self(claims)
    }

    /// Raw claim lookup.
    pub fn get(&self, claim: &str) -> Option<&Value> {
        self.0.get(claim)
    }

    pub fn issuer(&self) -> Option<&str> {
        self.str_claim("iss")
    }

    pub fn destination(&self) -> Option<&str> {
        self.str_claim("dest")
    }

    /// Audience, when carried as a single string.
    pub fn audience(&self) -> Option<&str> {
        self.str_claim("aud")
    }

    pub fn subject(&self) -> Option<&str> {
        self.str_claim("sub")
    }

    pub fn token_id(&self) -> Option<&str> {
        self.str_claim("jti")
    }

    pub fn session_id(&self) -> Option<&str> {
        self.str_claim("sid")
    }

    pub fn expires_at(&self) -> Option<f64> {
        self.get("exp").and_then(Value::as_f64)
    }

    pub fn not_before(&self) -> Option<f64> {
        self.get("nbf").and_then(Value::as_f64)
    }

    pub fn issued_at(&self) -> Option<f64> {
        self.get("iat").and_then(Value::as_f64)
    }

    /// Deserialize the claim set into a caller-defined type.
    pub fn deserialize_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(Value::Object(self.0.clone()))
    }

    pub fn claims(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_claims(self) -> Map<String, Value> {
        self.0
    }

    fn str_claim(&self, claim: &str) -> Option<&str> {
        self.get(claim).and_then(Value::as_str)
    }
}
