use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default)]
    pub sub: Option<String>, // user id
    #[serde(default)]
    pub exp: Option<i64>, // expiry, unix seconds
}

/// Reads the `exp` claim of a JWT without checking its signature.
///
/// The backend owns the signing key; the client only needs the expiry to arm
/// its logout timer when the login response does not say how long the token lives.
pub fn token_expiry(token: &str) -> Option<DateTime<Utc>> {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.required_spec_claims.clear();

    let data = decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation).ok()?;
    DateTime::from_timestamp(data.claims.exp?, 0)
}

/// `now + secs`, or `None` when the result does not fit a timestamp.
pub fn offset_by_secs(now: DateTime<Utc>, secs: u64) -> Option<DateTime<Utc>> {
    i64::try_from(secs)
        .ok()
        .and_then(Duration::try_seconds)
        .and_then(|d| now.checked_add_signed(d))
}

/// `now + lifetime`, capped at one hour when the lifetime is out of range.
pub fn offset_by(now: DateTime<Utc>, lifetime: std::time::Duration) -> DateTime<Utc> {
    offset_by_secs(now, lifetime.as_secs()).unwrap_or_else(|| now + Duration::hours(1))
}

/// Expiry of a freshly issued token.
///
/// Preference order: the server's `expires_in`, the token's own `exp` claim,
/// then the configured fallback lifetime. An `expires_in` too large to
/// represent counts as absent.
pub fn resolve_expiry(
    now: DateTime<Utc>,
    expires_in: Option<u64>,
    token: &str,
    fallback: std::time::Duration,
) -> DateTime<Utc> {
    if let Some(at) = expires_in.and_then(|secs| offset_by_secs(now, secs)) {
        return at;
    }
    if let Some(secs) = expires_in {
        tracing::warn!("Ignoring out of range expires_in {}", secs);
    }
    if let Some(exp) = token_expiry(token) {
        return exp;
    }
    offset_by(now, fallback)
}

/// Splits `key=value` command line pairs.
pub fn parse_assignment(raw: &str) -> Option<(String, String)> {
    let (key, value) = raw.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key.to_string(), value.to_string()))
}
