//! Signed access and refresh tokens.
//!
//! Tokens are HS256 JWTs carrying `{token_type, exp, iat, jti, user_id}`.
//! Access tokens authorize API calls; refresh tokens can only be exchanged
//! for a new access token.

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use saraphan_core::UserId;

use super::AuthError;
use crate::config::AuthConfig;

/// Which purpose a token was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// Claims carried by every token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub token_type: TokenType,
    /// Expiry, seconds since the Unix epoch.
    pub exp: i64,
    /// Issue time, seconds since the Unix epoch.
    pub iat: i64,
    /// Unique token ID.
    pub jti: String,
    pub user_id: UserId,
}

/// An access/refresh token pair returned on login.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Issues and verifies tokens with one signing key.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_lifetime: Duration,
    refresh_lifetime: Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("access_lifetime", &self.access_lifetime)
            .field("refresh_lifetime", &self.refresh_lifetime)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    /// Create a token service from configuration.
    #[must_use]
    pub fn new(config: &AuthConfig) -> Self {
        let key = config.secret_key.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(key),
            decoding: DecodingKey::from_secret(key),
            access_lifetime: config.access_token_lifetime,
            refresh_lifetime: config.refresh_token_lifetime,
        }
    }

    /// Issue a fresh access/refresh pair for a user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Signing` if a token cannot be encoded.
    pub fn issue_pair(&self, user_id: UserId) -> Result<TokenPair, AuthError> {
        Ok(TokenPair {
            access: self.issue(user_id, TokenType::Access)?,
            refresh: self.issue(user_id, TokenType::Refresh)?,
        })
    }

    /// Issue a token of the given type.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Signing` if the token cannot be encoded.
    pub fn issue(&self, user_id: UserId, token_type: TokenType) -> Result<String, AuthError> {
        let lifetime = match token_type {
            TokenType::Access => self.access_lifetime,
            TokenType::Refresh => self.refresh_lifetime,
        };
        let iat = Utc::now().timestamp();
        let exp = iat.saturating_add(i64::try_from(lifetime.as_secs()).unwrap_or(i64::MAX));
        self.sign(&Claims {
            token_type,
            exp,
            iat,
            jti: Uuid::new_v4().simple().to_string(),
            user_id,
        })
    }

    /// Verify a token's signature, expiry and type.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` for anything but a valid, unexpired
    /// token of the `expected` type.
    pub fn verify(&self, token: &str, expected: TokenType) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|_| AuthError::InvalidToken)?;
        if data.claims.token_type != expected {
            return Err(AuthError::InvalidToken);
        }
        Ok(data.claims)
    }

    fn sign(&self, claims: &Claims) -> Result<String, AuthError> {
        Ok(jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            claims,
            &self.encoding,
        )?)
    }
}
