//! CLI command implementations.
//!
//! Every command talks to `PostgreSQL` through the same store the API uses.
//!
//! # Environment Variables
//!
//! - `API_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string

pub mod catalog;
pub mod migrate;
pub mod seed;
pub mod user;

use saraphan_api::config::{ConfigError, get_database_url};
use saraphan_api::db::{self, PgStore, RepositoryError};
use saraphan_api::services::auth::AuthError;
use saraphan_api::services::seed::SeedError;
use sqlx::PgPool;
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Required configuration is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// A migration failed to apply.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A store operation failed.
    #[error("{0}")]
    Repository(#[from] RepositoryError),

    /// Creating or changing a user failed.
    #[error("{0}")]
    Auth(#[from] AuthError),

    /// A fixture file could not be loaded.
    #[error("{0}")]
    Seed(#[from] SeedError),
}

/// Connect to the database named by `API_DATABASE_URL`.
async fn connect_pool() -> Result<PgPool, CliError> {
    dotenvy::dotenv().ok();
    let database_url = get_database_url("API_DATABASE_URL")?;

    tracing::info!("Connecting to database...");
    Ok(db::create_pool(&database_url).await?)
}

/// Connect and wrap the pool in the `PostgreSQL` store.
async fn connect_store() -> Result<PgStore, CliError> {
    Ok(PgStore::new(connect_pool().await?))
}
