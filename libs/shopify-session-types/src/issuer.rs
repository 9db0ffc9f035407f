//! Issuer trust policy: shop hostname check and issuer/destination match.

use url::Url;

use crate::SessionTokenError;

const SHOP_SCHEME: &str = "https";
const SHOP_DOMAIN_SUFFIX: &str = ".myshopify.com";

/// Returns the origin of `url` as `scheme://authority/`.
///
/// Path, query and fragment are discarded and a single trailing slash is
/// appended. The authority is taken verbatim (no case folding, no default
/// port removal), so two origins compare equal only when both URLs spell
/// scheme and host the same way. Returns `None` for relative or
/// non-hierarchical URLs.
pub fn origin_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    if parsed.cannot_be_a_base() || parsed.host_str().is_none() {
        return None;
    }

    let (_, rest) = url.trim().split_once("://")?;
    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    if authority.is_empty() {
        return None;
    }

    Some(format!("{}://{}/", parsed.scheme(), authority))
}

/// Check whether an origin is a shop admin origin:
/// `https://<label>.myshopify.com/`.
pub fn is_shop_origin(origin: &str) -> bool {
    origin
        .strip_prefix(SHOP_SCHEME)
        .and_then(|rest| rest.strip_prefix("://"))
        .and_then(|rest| rest.strip_suffix('/'))
        .is_some_and(is_shop_hostname)
}

/// Check whether a hostname is `<label>.myshopify.com`, where the label is
/// lowercase alphanumerics and hyphens, starting and ending alphanumeric.
pub fn is_shop_hostname(hostname: &str) -> bool {
    let Some(label) = hostname.strip_suffix(SHOP_DOMAIN_SUFFIX) else {
        return false;
    };

    let is_alnum = |b: u8| b.is_ascii_lowercase() || b.is_ascii_digit();
    let bytes = label.as_bytes();

    match (bytes.first(), bytes.last()) {
        (Some(&first), Some(&last)) => {
            is_alnum(first) && is_alnum(last) && bytes.iter().all(|&b| is_alnum(b) || b == b'-')
        }
        _ => false,
    }
}

/// Validates the `iss` and `dest` claims and returns the shared shop origin.
pub(crate) fn validate_issuer(
    issuer: &str,
    destination: &str,
) -> Result<String, SessionTokenError> {
    let issuer_origin = origin_of(issuer)
        .filter(|origin| is_shop_origin(origin))
        .ok_or_else(|| SessionTokenError::InvalidIssuer(issuer.to_string()))?;

    let destination_origin = origin_of(destination);
    if destination_origin.as_deref() != Some(issuer_origin.as_str()) {
        return Err(SessionTokenError::IssuerDestinationMismatch {
            issuer: issuer_origin,
            destination: destination_origin.unwrap_or_else(|| destination.to_string()),
        });
    }

    Ok(issuer_origin)
}
