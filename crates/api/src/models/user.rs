//! Account domain types.

use chrono::{DateTime, Utc};

use saraphan_core::{UserId, Username};

/// An API account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Login name.
    pub username: Username,
    /// Inactive accounts can neither log in nor use issued tokens.
    pub is_active: bool,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}
