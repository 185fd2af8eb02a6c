//! Authentication service.
//!
//! Password login issuing JWT pairs, refresh, and bearer-token
//! authentication of API callers.

mod error;
pub mod tokens;

pub use error::AuthError;
pub use tokens::{Claims, TokenPair, TokenService, TokenType};

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use saraphan_core::Username;

use crate::db::{RepositoryError, Store};
use crate::models::User;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Authentication service.
///
/// Handles account creation, login, token refresh and token authentication.
pub struct AuthService<'a> {
    store: &'a dyn Store,
    tokens: &'a TokenService,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(store: &'a dyn Store, tokens: &'a TokenService) -> Self {
        Self { store, tokens }
    }

    /// Create an account with a username and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidUsername` if the username format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the username is taken.
    pub async fn register(&self, username: &str, password: &str) -> Result<User, AuthError> {
        create_account(self.store, username, password).await
    }

    /// Exchange a username and password for a token pair.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the username is unknown, the
    /// password is wrong, or the account is inactive.
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenPair, AuthError> {
        let username = Username::parse(username).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .store
            .get_user_credentials(&username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        if !user.is_active {
            return Err(AuthError::InvalidCredentials);
        }

        tracing::info!(user_id = %user.id, "Issued token pair");
        self.tokens.issue_pair(user.id)
    }

    /// Exchange a refresh token for a new access token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if the token is invalid, expired, or
    /// not a refresh token.
    pub fn refresh(&self, refresh: &str) -> Result<String, AuthError> {
        let claims = self.tokens.verify(refresh, TokenType::Refresh)?;
        self.tokens.issue(claims.user_id, TokenType::Access)
    }

    /// Resolve the user behind an access token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` for a bad token,
    /// `AuthError::UserNotFound` if the user was deleted and
    /// `AuthError::UserInactive` if the user was deactivated.
    pub async fn authenticate(&self, access: &str) -> Result<User, AuthError> {
        let claims = self.tokens.verify(access, TokenType::Access)?;
        let user = self
            .store
            .get_user(claims.user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        if !user.is_active {
            return Err(AuthError::UserInactive);
        }
        Ok(user)
    }
}

/// Create an account with a username and password.
///
/// Needs no token service, so the CLI and fixture loading can create users
/// without a signing key.
///
/// # Errors
///
/// Returns `AuthError::InvalidUsername` if the username format is invalid.
/// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
/// Returns `AuthError::UserAlreadyExists` if the username is taken.
pub async fn create_account(
    store: &dyn Store,
    username: &str,
    password: &str,
) -> Result<User, AuthError> {
    let username = Username::parse(username)?;
    validate_password(password)?;
    let password_hash = hash_password(password)?;

    let user = store
        .create_user(&username, &password_hash)
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
            other => AuthError::Repository(other),
        })?;

    tracing::info!(user_id = %user.id, username = %user.username.as_str(), "Created user");
    Ok(user)
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use secrecy::SecretString;

    use super::*;
    use crate::config::AuthConfig;
    use crate::db::{MemoryStore, UserStore};

    fn tokens() -> TokenService {
        TokenService::new(&AuthConfig {
            secret_key: SecretString::from("k8#Qz!v2Lp@9sWm$4Tn&7Rb^1Yc*6Hd0"),
            access_token_lifetime: Duration::from_secs(900),
            refresh_token_lifetime: Duration::from_secs(86_400),
        })
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("!user_PASSWORD_1!").unwrap();
        assert!(verify_password("!user_PASSWORD_1!", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_validate_password_length() {
        assert!(validate_password("short").is_err());
        assert!(validate_password("long enough").is_ok());
    }

    #[tokio::test]
    async fn test_register_and_login() {
        let store = MemoryStore::new();
        let tokens = tokens();
        let auth = AuthService::new(&store, &tokens);

        let user = auth.register("auth_user", "!user_PASSWORD_1!").await.unwrap();
        let pair = auth.login("auth_user", "!user_PASSWORD_1!").await.unwrap();
        let resolved = auth.authenticate(&pair.access).await.unwrap();
        assert_eq!(resolved.id, user.id);
    }

    #[tokio::test]
    async fn test_register_duplicate() {
        let store = MemoryStore::new();
        let tokens = tokens();
        let auth = AuthService::new(&store, &tokens);

        auth.register("auth_user", "password-1").await.unwrap();
        assert!(matches!(
            auth.register("auth_user", "password-2").await,
            Err(AuthError::UserAlreadyExists)
        ));
    }

    #[tokio::test]
    async fn test_login_rejects_bad_credentials() {
        let store = MemoryStore::new();
        let tokens = tokens();
        let auth = AuthService::new(&store, &tokens);
        auth.register("auth_user", "password-1").await.unwrap();

        assert!(matches!(
            auth.login("auth_user", "password-2").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.login("nobody", "password-1").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.login("bad name", "password-1").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_inactive_user() {
        let store = MemoryStore::new();
        let tokens = tokens();
        let auth = AuthService::new(&store, &tokens);
        auth.register("auth_user", "password-1").await.unwrap();
        let pair = auth.login("auth_user", "password-1").await.unwrap();

        store
            .set_user_active(&Username::parse("auth_user").unwrap(), false)
            .await
            .unwrap();

        assert!(matches!(
            auth.login("auth_user", "password-1").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.authenticate(&pair.access).await,
            Err(AuthError::UserInactive)
        ));
    }

    #[tokio::test]
    async fn test_deleted_user() {
        let store = MemoryStore::new();
        let tokens = tokens();
        let auth = AuthService::new(&store, &tokens);
        let user = auth.register("auth_user", "password-1").await.unwrap();
        let pair = auth.login("auth_user", "password-1").await.unwrap();

        store.delete_user(user.id).await.unwrap();

        assert!(matches!(
            auth.authenticate(&pair.access).await,
            Err(AuthError::UserNotFound)
        ));
    }

    #[tokio::test]
    async fn test_refresh_issues_access_token() {
        let store = MemoryStore::new();
        let tokens = tokens();
        let auth = AuthService::new(&store, &tokens);
        let user = auth.register("auth_user", "password-1").await.unwrap();
        let pair = auth.login("auth_user", "password-1").await.unwrap();

        let access = auth.refresh(&pair.refresh).unwrap();
        assert_eq!(auth.authenticate(&access).await.unwrap().id, user.id);
        assert!(matches!(
            auth.refresh(&pair.access),
            Err(AuthError::InvalidToken)
        ));
    }
}
