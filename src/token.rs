//! Bearer token issue and validation.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Lifetime of every issued token.
pub const TOKEN_TTL_DAYS: i64 = 7;

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("invalid signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("malformed token")]
    Malformed,
    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// JWT claims payload.
///
/// | Field | JWT claim | Meaning |
/// |-------|-----------|---------|
/// | `sub` | `sub` | email of the authenticated user |
/// | `iat` | `iat` | issue time, seconds since epoch |
/// | `exp` | `exp` | expiry, `iat` + 7 days |
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// HS256 signer/verifier built from the configured secret.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenKeys {
    pub fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Sign a token bound to `email`, expiring in [`TOKEN_TTL_DAYS`].
    pub fn issue(&self, email: &str) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: email.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::days(TOKEN_TTL_DAYS)).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Check signature and expiry, returning the claims.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);

        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                jsonwebtoken::errors::ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                _ => TokenError::Malformed,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-for-unit-tests";

    fn sign(claims: &Claims, secret: &str) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn issued_token_verifies() {
        let keys = TokenKeys::from_secret(SECRET);
        let token = keys.issue("ana@x.com").unwrap();
        let claims = keys.verify(&token).unwrap();
        assert_eq!(claims.sub, "ana@x.com");
        assert_eq!(claims.exp - claims.iat, TOKEN_TTL_DAYS * 24 * 60 * 60);
    }

    #[test]
    fn rejects_wrong_secret() {
        let token = TokenKeys::from_secret(SECRET).issue("ana@x.com").unwrap();
        let err = TokenKeys::from_secret("other").verify(&token).unwrap_err();
        assert!(matches!(err, TokenError::InvalidSignature));
    }

    #[test]
    fn rejects_expired() {
        let claims = Claims {
            sub: "ana@x.com".into(),
            iat: 1_000_000,
            exp: 1_000_000 + 60,
        };
        let err = TokenKeys::from_secret(SECRET)
            .verify(&sign(&claims, SECRET))
            .unwrap_err();
        assert!(matches!(err, TokenError::Expired));
    }

    #[test]
    fn rejects_garbage() {
        let err = TokenKeys::from_secret(SECRET).verify("not-a-jwt").unwrap_err();
        assert!(matches!(err, TokenError::Malformed));
    }
}
