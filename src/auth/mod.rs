//! Bearer token issuance and verification.
//!
//! Tokens are JWTs signed with a process-wide shared secret; expiry is the
//! only deactivation path, there is no revocation list. The algorithm is
//! fixed at construction and restricted to the HMAC family, since the
//! service only holds a symmetric secret.

mod password;

pub use password::{hash_password, verify_password};

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde_json::Value;
use thiserror::Error;

/// Claims embedded in a token: caller-supplied assertions plus the injected
/// `exp` timestamp.
pub type Claims = serde_json::Map<String, Value>;

/// Token lifetime applied when the configuration does not set one.
pub const DEFAULT_TTL_MINUTES: i64 = 15;

#[derive(Debug, Error)]
pub enum TokenError {
    /// The configured algorithm cannot be used with a shared secret.
    #[error("unsupported signing algorithm {0:?}")]
    Algorithm(Algorithm),

    /// The signer rejected the claims or key material.
    #[error("token signing failed: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),

    /// The token's expiry is in the past.
    #[error("token has expired")]
    Expired,

    /// Malformed, truncated, or signature-mismatched token.
    #[error("invalid token: {0}")]
    Invalid(#[source] jsonwebtoken::errors::Error),
}

impl TokenError {
    /// Stable numeric classification, logged alongside the message.
    pub fn code(&self) -> u16 {
        match self {
            TokenError::Algorithm(_) | TokenError::Signing(_) => 30,
            TokenError::Expired => 31,
            TokenError::Invalid(_) => 32,
        }
    }
}

/// Convenience constructor for the common single-subject claims mapping.
pub fn subject_claims(subject: &str) -> Claims {
    let mut claims = Claims::new();
    claims.insert("sub".to_string(), Value::from(subject));
    claims
}

/// Issues and verifies bearer tokens with a bounded lifetime.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    algorithm: Algorithm,
    ttl_minutes: i64,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Key material stays out of logs and panic messages.
        f.debug_struct("TokenService")
            .field("algorithm", &self.algorithm)
            .field("ttl_minutes", &self.ttl_minutes)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    /// Build a service around a shared secret. Only HMAC algorithms are
    /// accepted; asymmetric ones need key material this service never holds.
    pub fn new(
        secret: &str,
        algorithm: Algorithm,
        ttl_minutes: i64,
    ) -> Result<TokenService, TokenError> {
        if !matches!(
            algorithm,
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
        ) {
            return Err(TokenError::Algorithm(algorithm));
        }
        Ok(TokenService {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            algorithm,
            ttl_minutes,
        })
    }

    /// Issue a signed token embedding `claims` plus an absolute expiry set
    /// to the service's configured lifetime from now.
    pub fn issue(&self, claims: Claims) -> Result<String, TokenError> {
        self.issue_with_ttl(claims, self.ttl_minutes)
    }

    /// Issue a signed token with an explicit lifetime in minutes. A caller
    /// `exp` claim is overwritten by the computed expiry.
    pub fn issue_with_ttl(&self, claims: Claims, ttl_minutes: i64) -> Result<String, TokenError> {
        let mut expiry = Utc::now() + Duration::minutes(ttl_minutes);
        // A non-positive lifetime must produce a token that is already
        // dead; an exp equal to "now" still passes a strict exp < now
        // check for the remainder of that second.
        if ttl_minutes <= 0 {
            expiry = expiry - Duration::seconds(1);
        }

        let mut payload = claims;
        payload.insert("exp".to_string(), Value::from(expiry.timestamp()));

        encode(&Header::new(self.algorithm), &payload, &self.encoding)
            .map_err(TokenError::Signing)
    }

    /// Decode a token, checking signature and expiry, and return the
    /// embedded claims (including the injected `exp`).
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(self.algorithm);
        // No clock slack: a token is dead the second its expiry passes.
        validation.leeway = 0;

        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|err| match err.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(err),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new("test-secret", Algorithm::HS256, DEFAULT_TTL_MINUTES).unwrap()
    }

    #[test]
    fn issue_and_verify_roundtrip_preserves_claims() {
        let service = service();
        let token = service.issue(subject_claims("alice")).unwrap();

        let claims = service.verify(&token).unwrap();
        assert_eq!(claims["sub"], Value::from("alice"));
        assert!(claims["exp"].as_i64().unwrap() > Utc::now().timestamp());
    }

    #[test]
    fn expiry_lands_the_configured_minutes_out() {
        let service = service();
        let token = service.issue(subject_claims("alice")).unwrap();
        let claims = service.verify(&token).unwrap();

        let expected = Utc::now().timestamp() + DEFAULT_TTL_MINUTES * 60;
        let exp = claims["exp"].as_i64().unwrap();
        assert!((exp - expected).abs() <= 5, "exp {exp} vs expected {expected}");
    }

    #[test]
    fn expired_token_is_rejected_as_expired() {
        let service = service();
        let token = service
            .issue_with_ttl(subject_claims("alice"), -1)
            .unwrap();

        let err = service.verify(&token).unwrap_err();
        assert!(matches!(err, TokenError::Expired));
        assert_eq!(err.code(), 31);
    }

    #[test]
    fn zero_ttl_token_is_already_expired() {
        let service = service();
        let token = service.issue_with_ttl(subject_claims("alice"), 0).unwrap();

        let err = service.verify(&token).unwrap_err();
        assert!(matches!(err, TokenError::Expired));
    }

    #[test]
    fn garbage_token_is_rejected_as_invalid() {
        let err = service().verify("not-a-token").unwrap_err();
        assert!(matches!(err, TokenError::Invalid(_)));
        assert_eq!(err.code(), 32);
    }

    #[test]
    fn token_signed_with_another_secret_is_rejected() {
        let issuer = TokenService::new("secret-a", Algorithm::HS256, 15).unwrap();
        let verifier = TokenService::new("secret-b", Algorithm::HS256, 15).unwrap();

        let token = issuer.issue(subject_claims("alice")).unwrap();
        let err = verifier.verify(&token).unwrap_err();
        assert!(matches!(err, TokenError::Invalid(_)));
    }

    #[test]
    fn asymmetric_algorithms_are_refused_at_construction() {
        let err = TokenService::new("secret", Algorithm::RS256, 15).unwrap_err();
        assert!(matches!(err, TokenError::Algorithm(Algorithm::RS256)));
        assert_eq!(err.code(), 30);
    }

    #[test]
    fn caller_exp_claim_is_overwritten() {
        let service = service();
        let mut claims = subject_claims("alice");
        claims.insert("exp".to_string(), Value::from(0));

        let token = service.issue(claims).unwrap();
        let verified = service.verify(&token).unwrap();
        assert!(verified["exp"].as_i64().unwrap() > Utc::now().timestamp());
    }
}
