//! Catalog maintenance commands.
//!
//! # Usage
//!
//! ```bash
//! saraphan catalog delete good 12
//! saraphan catalog delete subcategory 3
//! saraphan catalog delete category 1
//! ```
//!
//! A category or subcategory that still has children cannot be deleted;
//! delete the children first. Deleting a good also removes it from carts.

use saraphan_api::db::CatalogStore;
use saraphan_core::{CategoryId, GoodId, SubcategoryId};

use super::{CliError, connect_store};

/// Which catalog entity to delete.
#[derive(Debug, Clone, Copy)]
pub enum Target {
    Category(CategoryId),
    Subcategory(SubcategoryId),
    Good(GoodId),
}

/// Delete one catalog entity.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` for an unknown ID and
/// `RepositoryError::Protected` while children reference the entity.
pub async fn delete(target: Target) -> Result<(), CliError> {
    let store = connect_store().await?;

    match target {
        Target::Category(id) => {
            store.delete_category(id).await?;
            tracing::info!(category_id = %id, "Category deleted");
        }
        Target::Subcategory(id) => {
            store.delete_subcategory(id).await?;
            tracing::info!(subcategory_id = %id, "Subcategory deleted");
        }
        Target::Good(id) => {
            store.delete_good(id).await?;
            tracing::info!(good_id = %id, "Good deleted");
        }
    }
    Ok(())
}
