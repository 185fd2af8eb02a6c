//! Load catalog and user fixtures from a YAML file.
//!
//! See [`saraphan_api::services::seed`] for the file format. Entries whose
//! slug or username already exists are skipped.

use std::path::Path;

use saraphan_api::services::seed::SeedFile;

use super::{CliError, connect_store};

/// Seed the database from `file_path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, an entry is
/// invalid, or the database fails. Entries created before a failure stay.
pub async fn run(file_path: &Path) -> Result<(), CliError> {
    // Parse before connecting so a typo fails fast
    tracing::info!(path = %file_path.display(), "Loading fixtures from file");
    let seed = SeedFile::load(file_path).await?;

    let store = connect_store().await?;
    let report = seed.apply(&store).await?;

    tracing::info!(
        categories = report.categories,
        subcategories = report.subcategories,
        goods = report.goods,
        users = report.users,
        "Seeding complete!"
    );
    Ok(())
}
