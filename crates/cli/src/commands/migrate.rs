//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! saraphan migrate
//! ```
//!
//! Migrations live in `crates/api/migrations/` and are embedded in the API
//! crate, so the binary can migrate without the source tree.

use saraphan_api::db::MIGRATOR;

use super::{CliError, connect_pool};

/// Apply every pending migration.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), CliError> {
    let pool = connect_pool().await?;

    tracing::info!("Running migrations...");
    MIGRATOR.run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
