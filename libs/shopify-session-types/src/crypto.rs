use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde_json::{Map, Value};
use time::OffsetDateTime;

use crate::issuer::validate_issuer;
use crate::{DecodedPayload, SessionTokenClaims, SessionTokenError};

/// Prefix of the Authorization header carrying a session token.
pub const BEARER_PREFIX: &str = "Bearer ";

/// The only signing algorithm session tokens use.
pub const ALGORITHM: Algorithm = Algorithm::HS256;

/// Claims that must be present (and non-null) in every session token.
pub const REQUIRED_CLAIMS: [&str; 5] = ["iss", "dest", "sub", "jti", "sid"];

/// Verifies a session token Authorization header and returns its claims.
///
/// # Arguments
/// * `authorization_header` - The raw header value, `"Bearer <token>"`
/// * `client_id` - The app's API key, expected as the `aud` claim
/// * `secret` - The app's API secret the token was signed with
/// * `leeway_seconds` - Clock skew tolerance applied to `exp` and `nbf`
///
/// # Returns
/// The decoded claim set, unchanged, or the first check that failed.
pub fn verify_session_token(
    authorization_header: &str,
    client_id: &str,
    secret: &[u8],
    leeway_seconds: u64,
) -> Result<DecodedPayload, SessionTokenError> {
    let now = OffsetDateTime::now_utc().unix_timestamp_nanos() as f64 / 1e9;
    verify_session_token_at(authorization_header, client_id, secret, leeway_seconds, now)
}

pub(crate) fn verify_session_token_at(
    authorization_header: &str,
    client_id: &str,
    secret: &[u8],
    leeway_seconds: u64,
    now: f64,
) -> Result<DecodedPayload, SessionTokenError> {
    if client_id.is_empty() {
        return Err(SessionTokenError::InvalidConfig("client id is empty".into()));
    }
    if secret.is_empty() {
        return Err(SessionTokenError::InvalidConfig("secret is empty".into()));
    }

    let result = extract_token(authorization_header)
        .and_then(|token| decode_token(token, client_id, secret))
        .and_then(|claims| {
            validate_time_window(&claims, leeway_seconds, now)?;
            let issuer_origin = validate_issuer(
                required_str(&claims, "iss")?,
                required_str(&claims, "dest")?,
            )?;
            tracing::trace!(issuer = %issuer_origin, "Session token verified");
            Ok(DecodedPayload::new(claims))
        });

    if let Err(err) = &result {
        tracing::debug!(code = %err.code(), error = %err, "Session token rejected");
    }

    result
}

/// Signs a claim set into a compact session token.
///
/// Apps never need this in production (the Shopify admin issues the
/// tokens); it exists for fixtures and local tooling.
pub fn encode_session_token(
    claims: &SessionTokenClaims,
    secret: &[u8],
) -> Result<String, SessionTokenError> {
    encode(&Header::new(ALGORITHM), claims, &EncodingKey::from_secret(secret))
        .map_err(SessionTokenError::from)
}

/// Extract the session token from an Authorization Bearer header.
///
/// The prefix is matched exactly; an empty token is treated as absent.
pub fn extract_from_header(authorization_header: &str) -> Option<&str> {
    authorization_header
        .strip_prefix(BEARER_PREFIX)
        .filter(|token| !token.is_empty())
}

fn extract_token(authorization_header: &str) -> Result<&str, SessionTokenError> {
    extract_from_header(authorization_header).ok_or(SessionTokenError::MalformedHeader)
}

/// Checks signature and algorithm, then audience and required claim presence.
///
/// Audience and time claims are checked here rather than by `jsonwebtoken`,
/// which skips claims it cannot parse. Fractional timestamps are accepted
/// and the window is inclusive of `nbf` and exclusive of `exp`.
fn decode_token(
    token: &str,
    client_id: &str,
    secret: &[u8],
) -> Result<Map<String, Value>, SessionTokenError> {
    let mut validation = Validation::new(ALGORITHM);
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.leeway = 0;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let token_data = decode::<Map<String, Value>>(
        token,
        &DecodingKey::from_secret(secret),
        &validation,
    )?;
    let claims = token_data.claims;

    validate_audience(&claims, client_id)?;

    if let Some(missing) = REQUIRED_CLAIMS
        .iter()
        .find(|claim| claims.get(**claim).is_none_or(Value::is_null))
    {
        return Err(SessionTokenError::MissingClaim(missing.to_string()));
    }

    Ok(claims)
}

/// `aud` must be the client id, or a list of strings containing it.
fn validate_audience(
    claims: &Map<String, Value>,
    client_id: &str,
) -> Result<(), SessionTokenError> {
    let matches = match claims.get("aud") {
        Some(Value::String(aud)) => aud == client_id,
        Some(Value::Array(auds)) => {
            auds.iter().all(Value::is_string) && auds.iter().any(|aud| aud == client_id)
        }
        _ => false,
    };

    if matches {
        Ok(())
    } else {
        Err(SessionTokenError::AudienceMismatch)
    }
}

fn validate_time_window(
    claims: &Map<String, Value>,
    leeway_seconds: u64,
    now: f64,
) -> Result<(), SessionTokenError> {
    let leeway = leeway_seconds as f64;

    if let Some(exp) = numeric_claim(claims, "exp")? {
        if now >= exp + leeway {
            return Err(SessionTokenError::Expired);
        }
    }

    if let Some(nbf) = numeric_claim(claims, "nbf")? {
        if now < nbf - leeway {
            return Err(SessionTokenError::NotYetValid);
        }
    }

    Ok(())
}

fn numeric_claim(
    claims: &Map<String, Value>,
    claim: &str,
) -> Result<Option<f64>, SessionTokenError> {
    match claims.get(claim) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_f64()
            .map(Some)
            .ok_or_else(|| SessionTokenError::MalformedToken(format!("{claim} is not a number"))),
    }
}

fn required_str<'a>(
    claims: &'a Map<String, Value>,
    claim: &str,
) -> Result<&'a str, SessionTokenError> {
    match claims.get(claim) {
        Some(Value::String(value)) => Ok(value),
        Some(_) => Err(SessionTokenError::MalformedToken(format!("{claim} is not a string"))),
        None => Err(SessionTokenError::MissingClaim(claim.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SECRET: &[u8] = b"API Secret";
    const API_KEY: &str = "API key";
    const NOW: i64 = 1_735_603_200;

    fn test_claims() -> SessionTokenClaims {
        SessionTokenClaims {
            iss: "https://test-shop.myshopify.com/admin".to_string(),
            dest: "https://test-shop.myshopify.com".to_string(),
            aud: API_KEY.to_string(),
            sub: "1".to_string(),
            exp: NOW + 60,
            nbf: NOW,
            iat: NOW,
            jti: "4321".to_string(),
            sid: "abc123".to_string(),
        }
    }

    fn bearer(token: &str) -> String {
        format!("Bearer {token}")
    }

    fn header_for(claims: &SessionTokenClaims) -> String {
        bearer(&encode_session_token(claims, SECRET).unwrap())
    }

    fn header_for_value(claims: Value) -> String {
        let key = EncodingKey::from_secret(SECRET);
        bearer(&encode(&Header::new(ALGORITHM), &claims, &key).unwrap())
    }

    fn verify(header: &str) -> Result<DecodedPayload, SessionTokenError> {
        verify_session_token_at(header, API_KEY, SECRET, 0, NOW as f64)
    }

    #[test]
    fn test_returns_decoded_payload_unchanged() {
        let claims = test_claims();
        let payload = verify(&header_for(&claims)).unwrap();

        assert_eq!(payload.claims(), serde_json::to_value(&claims).unwrap().as_object().unwrap());
        assert_eq!(payload.deserialize_as::<SessionTokenClaims>().unwrap(), claims);
    }

    #[test]
    fn test_keeps_unknown_claims_and_fractional_timestamps() {
        let claims = json!({
            "iss": "https://test-shop.myshopify.com/admin",
            "dest": "https://test-shop.myshopify.com",
            "aud": API_KEY,
            "sub": "1",
            "exp": NOW as f64 + 60.25,
            "nbf": NOW as f64 - 0.5,
            "iat": NOW as f64 - 0.5,
            "jti": "4321",
            "sid": "abc123",
            "custom": {"nested": [1, 2]}
        });

        let payload = verify(&header_for_value(claims.clone())).unwrap();
        assert_eq!(&Value::Object(payload.into_claims()), &claims);
    }

    #[test]
    fn test_verify_with_wall_clock() {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let claims = SessionTokenClaims {
            exp: now + 60,
            nbf: now - 1,
            iat: now - 1,
            ..test_claims()
        };

        let payload = verify_session_token(&header_for(&claims), API_KEY, SECRET, 0).unwrap();
        assert_eq!(payload.session_id(), Some("abc123"));
    }

    #[test]
    fn test_rejects_non_bearer_header() {
        let token = encode_session_token(&test_claims(), SECRET).unwrap();
        for header in [
            "Bad auth header".to_string(),
            "Token xyz".to_string(),
            String::new(),
            "Bearer".to_string(),
            "Bearer ".to_string(),
            format!("bearer {token}"),
            format!("Bearer\t{token}"),
        ] {
            assert_eq!(verify(&header), Err(SessionTokenError::MalformedHeader), "{header:?}");
        }
    }

    #[test]
    fn test_rejects_garbage_token() {
        let result = verify("Bearer not-a-jwt");
        assert!(matches!(result, Err(SessionTokenError::MalformedToken(_))));
    }

    #[test]
    fn test_rejects_wrong_secret() {
        let token = encode_session_token(&test_claims(), b"Other Secret").unwrap();
        assert_eq!(verify(&bearer(&token)), Err(SessionTokenError::InvalidSignature));
    }

    #[test]
    fn test_rejects_tampered_claims() {
        let token = encode_session_token(&test_claims(), SECRET).unwrap();
        let forged = encode_session_token(
            &SessionTokenClaims {
                sub: "2".to_string(),
                ..test_claims()
            },
            SECRET,
        )
        .unwrap();

        let mut parts: Vec<&str> = token.split('.').collect();
        parts[1] = forged.split('.').nth(1).unwrap();
        assert_eq!(verify(&bearer(&parts.join("."))), Err(SessionTokenError::InvalidSignature));
    }

    #[test]
    fn test_rejects_other_algorithm() {
        let token = encode(
            &Header::new(Algorithm::HS512),
            &test_claims(),
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();
        assert_eq!(verify(&bearer(&token)), Err(SessionTokenError::InvalidSignature));
    }

    #[test]
    fn test_rejects_expired_token() {
        let claims = SessionTokenClaims {
            exp: NOW - 10,
            ..test_claims()
        };
        assert_eq!(verify(&header_for(&claims)), Err(SessionTokenError::Expired));
    }

    #[test]
    fn test_expiry_is_exclusive() {
        let claims = SessionTokenClaims {
            exp: NOW,
            ..test_claims()
        };
        assert_eq!(verify(&header_for(&claims)), Err(SessionTokenError::Expired));
    }

    #[test]
    fn test_rejects_token_not_yet_valid() {
        let claims = SessionTokenClaims {
            nbf: NOW + 10,
            ..test_claims()
        };
        assert_eq!(verify(&header_for(&claims)), Err(SessionTokenError::NotYetValid));
    }

    #[test]
    fn test_leeway_applies_to_both_bounds() {
        let expired = SessionTokenClaims {
            exp: NOW - 5,
            ..test_claims()
        };
        let early = SessionTokenClaims {
            nbf: NOW + 5,
            ..test_claims()
        };

        for claims in [&expired, &early] {
            let header = header_for(claims);
            assert!(verify_session_token_at(&header, API_KEY, SECRET, 10, NOW as f64).is_ok());
            assert!(verify_session_token_at(&header, API_KEY, SECRET, 4, NOW as f64).is_err());
        }
    }

    #[test]
    fn test_rejects_audience_mismatch() {
        let claims = SessionTokenClaims {
            aud: "someone else".to_string(),
            ..test_claims()
        };
        assert_eq!(verify(&header_for(&claims)), Err(SessionTokenError::AudienceMismatch));
    }

    #[test]
    fn test_rejects_missing_audience() {
        let mut claims = serde_json::to_value(test_claims()).unwrap();
        claims.as_object_mut().unwrap().remove("aud");
        assert_eq!(verify(&header_for_value(claims)), Err(SessionTokenError::AudienceMismatch));
    }

    #[test]
    fn test_accepts_audience_list_containing_client_id() {
        let mut claims = serde_json::to_value(test_claims()).unwrap();
        claims["aud"] = json!(["other-app", API_KEY]);
        let payload = verify(&header_for_value(claims)).unwrap();
        assert_eq!(payload.get("aud"), Some(&json!(["other-app", API_KEY])));
    }

    #[test]
    fn test_rejects_audience_of_wrong_shape() {
        for aud in [
            json!(123),
            json!(true),
            json!({"x": 1}),
            json!(""),
            json!([]),
            json!(["other-app"]),
            json!(["other-app", 5]),
            json!([API_KEY, 5]),
            json!([[API_KEY]]),
        ] {
            let mut claims = serde_json::to_value(test_claims()).unwrap();
            claims["aud"] = aud.clone();
            assert_eq!(
                verify(&header_for_value(claims)),
                Err(SessionTokenError::AudienceMismatch),
                "aud = {aud}"
            );
        }
    }

    #[test]
    fn test_sub_second_expiry_uses_fractional_now() {
        let mut claims = serde_json::to_value(test_claims()).unwrap();
        claims["exp"] = json!(NOW as f64 + 0.5);
        let header = header_for_value(claims);

        assert!(verify_session_token_at(&header, API_KEY, SECRET, 0, NOW as f64 + 0.3).is_ok());
        assert_eq!(
            verify_session_token_at(&header, API_KEY, SECRET, 0, NOW as f64 + 0.7),
            Err(SessionTokenError::Expired)
        );
    }

    #[test]
    fn test_sub_second_not_before_uses_fractional_now() {
        let mut claims = serde_json::to_value(test_claims()).unwrap();
        claims["nbf"] = json!(NOW as f64 + 0.5);
        let header = header_for_value(claims);

        assert_eq!(
            verify_session_token_at(&header, API_KEY, SECRET, 0, NOW as f64 + 0.3),
            Err(SessionTokenError::NotYetValid)
        );
        assert!(verify_session_token_at(&header, API_KEY, SECRET, 0, NOW as f64 + 0.7).is_ok());
    }

    #[test]
    fn test_extract_from_header() {
        assert_eq!(extract_from_header("Bearer eyJtoken"), Some("eyJtoken"));
        assert_eq!(extract_from_header("bearer eyJtoken"), None);
        assert_eq!(extract_from_header("Basic xyz"), None);
        assert_eq!(extract_from_header("Bearer "), None);
        assert_eq!(extract_from_header("Bearer"), None);
        assert_eq!(extract_from_header(""), None);
    }

    #[test]
    fn test_rejects_missing_required_claims() {
        for claim in REQUIRED_CLAIMS {
            let mut claims = serde_json::to_value(test_claims()).unwrap();
            claims.as_object_mut().unwrap().remove(claim);
            assert_eq!(
                verify(&header_for_value(claims)),
                Err(SessionTokenError::MissingClaim(claim.to_string()))
            );
        }
    }

    #[test]
    fn test_null_claim_counts_as_missing() {
        let mut claims = serde_json::to_value(test_claims()).unwrap();
        claims["sid"] = Value::Null;
        assert_eq!(
            verify(&header_for_value(claims)),
            Err(SessionTokenError::MissingClaim("sid".into()))
        );
    }

    #[test]
    fn test_rejects_non_numeric_expiry() {
        let mut claims = serde_json::to_value(test_claims()).unwrap();
        claims["exp"] = json!("tomorrow");
        assert!(matches!(
            verify(&header_for_value(claims)),
            Err(SessionTokenError::MalformedToken(_))
        ));
    }

    #[test]
    fn test_rejects_invalid_issuer_hostname() {
        for iss in ["bad_shop_hostname", "https://bad_shop_hostname"] {
            let claims = SessionTokenClaims {
                iss: iss.to_string(),
                ..test_claims()
            };
            assert_eq!(
                verify(&header_for(&claims)),
                Err(SessionTokenError::InvalidIssuer(iss.to_string()))
            );
        }
    }

    #[test]
    fn test_rejects_issuer_destination_mismatch() {
        let claims = SessionTokenClaims {
            iss: "https://shop.myshopify.com/".to_string(),
            dest: "https://other.myshopify.com/".to_string(),
            ..test_claims()
        };
        assert!(matches!(
            verify(&header_for(&claims)),
            Err(SessionTokenError::IssuerDestinationMismatch { .. })
        ));

        let claims = SessionTokenClaims {
            dest: "bad_shop.myshopify.com".to_string(),
            ..test_claims()
        };
        assert!(matches!(
            verify(&header_for(&claims)),
            Err(SessionTokenError::IssuerDestinationMismatch { .. })
        ));
    }

    #[test]
    fn test_rejects_empty_config() {
        let header = header_for(&test_claims());
        assert!(matches!(
            verify_session_token_at(&header, "", SECRET, 0, NOW as f64),
            Err(SessionTokenError::InvalidConfig(_))
        ));
        assert!(matches!(
            verify_session_token_at(&header, API_KEY, b"", 0, NOW as f64),
            Err(SessionTokenError::InvalidConfig(_))
        ));
    }
}
