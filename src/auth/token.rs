// src/auth/token.rs
use anyhow::{Context, Result};
use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::config::JwtConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: String,
    pub iat: usize,
    pub exp: usize,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("invalid token: {0}")]
    Invalid(#[source] jsonwebtoken::errors::Error),
}

/// Issues and verifies the HS256 session tokens handed to the frontend
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
            ttl,
        }
    }

    pub fn from_config(config: &JwtConfig) -> Result<Self> {
        Ok(Self::new(&config.secret, config.expiry()?))
    }

    pub fn issue(&self, user_id: &str) -> Result<String> {
        let now = Utc::now().timestamp().max(0) as usize;
        let exp = usize::try_from(self.ttl.as_secs())
            .ok()
            .and_then(|ttl| now.checked_add(ttl))
            .with_context(|| format!("Token lifetime of {}s is out of range", self.ttl.as_secs()))?;
        let claims = Claims {
            user_id: user_id.to_string(),
            iat: now,
            exp,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .context("Failed to sign session token")
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new("test-secret", Duration::from_secs(3600))
    }

    #[test]
    fn test_issue_then_verify() {
        let tokens = service();
        let token = tokens.issue("user-1").unwrap();
        let claims = tokens.verify(&token).unwrap();

        assert_eq!(claims.user_id, "user-1");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_out_of_range_lifetime_is_an_error() {
        let tokens = TokenService::new("test-secret", Duration::from_secs(u64::MAX));
        let err = tokens.issue("user-1").unwrap_err();

        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let token = service().issue("user-1").unwrap();
        let other = TokenService::new("another-secret", Duration::from_secs(3600));

        assert!(matches!(other.verify(&token), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_garbage_is_invalid() {
        assert!(matches!(
            service().verify("not.a.token"),
            Err(TokenError::Invalid(_))
        ));
    }

    #[test]
    fn test_expired_token() {
        let now = Utc::now().timestamp() as usize;
        let claims = Claims {
            user_id: "user-1".to_string(),
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        assert!(matches!(service().verify(&token), Err(TokenError::Expired)));
    }
}
