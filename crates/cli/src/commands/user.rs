//! User management commands.
//!
//! # Usage
//!
//! ```bash
//! saraphan user create --username auth_user --password '!user_PASSWORD_1!'
//! saraphan user deactivate --username auth_user
//! ```

use saraphan_api::db::UserStore;
use saraphan_api::services::auth::{AuthError, create_account};
use saraphan_core::{UserId, Username};

use super::{CliError, connect_store};

/// Create a new user.
///
/// # Returns
///
/// The ID of the created user.
///
/// # Errors
///
/// Returns an error if the username is invalid or taken, the password is too
/// short, or the database fails.
pub async fn create(username: &str, password: &str) -> Result<UserId, CliError> {
    let store = connect_store().await?;
    let user = create_account(&store, username, password).await?;

    tracing::info!(
        "User created successfully! ID: {}, Username: {}",
        user.id,
        user.username.as_str()
    );
    Ok(user.id)
}

/// Deactivate a user. Issued tokens stop working immediately.
///
/// # Errors
///
/// Returns an error if the username is invalid, no such user exists, or the
/// database fails.
pub async fn deactivate(username: &str) -> Result<(), CliError> {
    let username = Username::parse(username).map_err(AuthError::from)?;
    let store = connect_store().await?;
    let user = store.set_user_active(&username, false).await?;

    tracing::info!(
        "User deactivated. ID: {}, Username: {}",
        user.id,
        user.username.as_str()
    );
    Ok(())
}
