// common/src/credential.rs
use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use sha2::{Digest, Sha256};

// Only the expiry claim is read; everything else stays opaque.
#[derive(Debug, Deserialize)]
struct ExpiryClaims {
    exp: Option<i64>,
}

/// Short, log-safe fingerprint of a credential
pub fn credential_fingerprint(credential: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(credential.as_bytes());
    let digest = hex::encode(hasher.finalize());
    digest[..12].to_string()
}

/// Expiry of a JWT-shaped credential.
///
/// The signature is NOT verified: the client cannot hold the service's key,
/// and the result is only used to stop presenting a credential the service
/// would reject anyway. Opaque or malformed credentials yield `None`.
pub fn credential_expiry(credential: &str) -> Option<DateTime<Utc>> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.required_spec_claims.clear();

    let data = decode::<ExpiryClaims>(credential, &DecodingKey::from_secret(&[]), &validation).ok()?;
    let exp = data.claims.exp?;
    Utc.timestamp_opt(exp, 0).single()
}

/// Whether the credential carries an expiry at or before `now`
pub fn is_credential_expired(credential: &str, now: DateTime<Utc>) -> bool {
    credential_expiry(credential)
        .map(|exp| exp <= now)
        .unwrap_or(false)
}
