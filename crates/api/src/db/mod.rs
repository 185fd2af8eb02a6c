//! Storage port and its adapters.
//!
//! Handlers talk to storage only through the [`Store`] trait object held in
//! [`AppState`](crate::state::AppState). Two adapters implement it:
//!
//! - [`PgStore`] - `PostgreSQL` via sqlx, schema `shop`
//! - [`MemoryStore`] - process-local tables behind a lock, for local runs and tests
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and embedded in
//! [`MIGRATOR`]. They are applied by the CLI, never by the server:
//! ```bash
//! cargo run -p saraphan-cli -- migrate
//! ```

pub mod memory;
pub mod postgres;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use saraphan_core::{CategoryId, GoodId, Slug, SubcategoryId, UserId, Username};

use crate::config::StorageConfig;
use crate::models::{
    CartItem, CartLine, Category, Good, NewCategory, NewGood, NewSubcategory, Subcategory, User,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Embedded schema migrations for the `shop` schema.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Uniqueness constraint violation.
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// A referenced entity does not exist.
    #[error("invalid reference: {0}")]
    InvalidReference(String),

    /// The entity still has dependents and cannot be deleted.
    #[error("protected: {0}")]
    Protected(String),
}

/// A window into an ordered collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Number of items to skip.
    pub offset: u64,
    /// Maximum number of items to return.
    pub limit: u64,
}

impl PageRequest {
    /// Window for a 1-based page number.
    #[must_use]
    pub const fn for_page(page: u64, page_size: u64) -> Self {
        Self {
            offset: page.saturating_sub(1).saturating_mul(page_size),
            limit: page_size,
        }
    }
}

/// Items of one page together with the size of the whole collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSlice<T> {
    pub items: Vec<T>,
    pub total: u64,
}

impl<T> PageSlice<T> {
    /// Convert every item, keeping the total.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PageSlice<U> {
        PageSlice {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
        }
    }
}

/// Read access to the catalog, plus the writes used by seeding and the CLI.
///
/// Every collection is ordered by name (ties broken by ID).
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn list_categories(
        &self,
        page: PageRequest,
    ) -> Result<PageSlice<Category>, RepositoryError>;

    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError>;

    async fn category_by_slug(&self, slug: &Slug) -> Result<Option<Category>, RepositoryError>;

    async fn list_subcategories(
        &self,
        page: PageRequest,
    ) -> Result<PageSlice<Subcategory>, RepositoryError>;

    async fn get_subcategory(
        &self,
        id: SubcategoryId,
    ) -> Result<Option<Subcategory>, RepositoryError>;

    async fn subcategory_by_slug(
        &self,
        slug: &Slug,
    ) -> Result<Option<Subcategory>, RepositoryError>;

    async fn list_goods(&self, page: PageRequest) -> Result<PageSlice<Good>, RepositoryError>;

    async fn get_good(&self, id: GoodId) -> Result<Option<Good>, RepositoryError>;

    async fn good_by_slug(&self, slug: &Slug) -> Result<Option<Good>, RepositoryError>;

    /// Which of `ids` refer to existing goods.
    async fn existing_goods(&self, ids: &[GoodId]) -> Result<HashSet<GoodId>, RepositoryError>;

    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the name or slug is taken.
    async fn create_category(&self, new: &NewCategory) -> Result<Category, RepositoryError>;

    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the name or slug is taken and
    /// `RepositoryError::InvalidReference` if the category does not exist.
    async fn create_subcategory(
        &self,
        new: &NewSubcategory,
    ) -> Result<Subcategory, RepositoryError>;

    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the name or slug is taken and
    /// `RepositoryError::InvalidReference` if the subcategory does not exist.
    async fn create_good(&self, new: &NewGood) -> Result<Good, RepositoryError>;

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown ID and
    /// `RepositoryError::Protected` while subcategories reference it.
    async fn delete_category(&self, id: CategoryId) -> Result<(), RepositoryError>;

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown ID and
    /// `RepositoryError::Protected` while goods reference it.
    async fn delete_subcategory(&self, id: SubcategoryId) -> Result<(), RepositoryError>;

    /// Delete a good and every cart line holding it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown ID.
    async fn delete_good(&self, id: GoodId) -> Result<(), RepositoryError>;
}

/// Per-user shopping carts.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// The user's cart lines joined with their goods.
    async fn cart_lines(&self, user: UserId) -> Result<Vec<CartLine>, RepositoryError>;

    /// Atomically replace the user's whole cart.
    ///
    /// Either every previous line is removed and every item inserted, or
    /// nothing changes. Concurrent replaces for one user serialize.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if a good repeats,
    /// `RepositoryError::InvalidReference` if a good does not exist and
    /// `RepositoryError::NotFound` if the user does not exist.
    async fn replace_cart(
        &self,
        user: UserId,
        items: &[CartItem],
    ) -> Result<Vec<CartLine>, RepositoryError>;

    /// Remove every line of the user's cart, returning how many were removed.
    async fn clear_cart(&self, user: UserId) -> Result<u64, RepositoryError>;
}

/// API accounts.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the username is taken.
    async fn create_user(
        &self,
        username: &Username,
        password_hash: &str,
    ) -> Result<User, RepositoryError>;

    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    /// Look up a user together with their password hash.
    async fn get_user_credentials(
        &self,
        username: &Username,
    ) -> Result<Option<(User, String)>, RepositoryError>;

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such user exists.
    async fn set_user_active(
        &self,
        username: &Username,
        is_active: bool,
    ) -> Result<User, RepositoryError>;

    /// Delete a user and their cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such user exists.
    async fn delete_user(&self, id: UserId) -> Result<(), RepositoryError>;
}

/// The full storage port.
#[async_trait]
pub trait Store: CatalogStore + CartStore + UserStore {
    /// Check that the backing storage is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Open the store selected by configuration.
///
/// # Errors
///
/// Returns `sqlx::Error` if the `PostgreSQL` pool cannot be created.
pub async fn connect(storage: &StorageConfig) -> Result<Arc<dyn Store>, sqlx::Error> {
    match storage {
        StorageConfig::Postgres { database_url } => {
            let pool = create_pool(database_url).await?;
            Ok(Arc::new(PgStore::new(pool)))
        }
        StorageConfig::Memory => Ok(Arc::new(MemoryStore::new())),
    }
}
