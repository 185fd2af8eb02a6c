//! YAML fixtures for the catalog and accounts.
//!
//! # Format
//!
//! ```yaml
//! categories:
//!   - { name: "Категория 1", slug: category-1, image: true }
//! subcategories:
//!   - { name: "Подкатегория 1", slug: subcategory-1, category: category-1 }
//! goods:
//!   - name: "Товар 1"
//!     slug: good-1
//!     price: 1
//!     subcategory: subcategory-1
//!     images: true
//! users:
//!   - { username: auth_user, password: "!user_PASSWORD_1!" }
//! ```
//!
//! Parents are referenced by slug. `image: true` stores the default path for
//! the entity (`categories/<slug>` and so on); a string stores that path.
//! Entries whose slug or username already exists are skipped, so loading a
//! file twice is harmless.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use saraphan_core::{Price, PriceError, Slug, SlugError, Username};

use super::auth::{AuthError, create_account};
use crate::db::{RepositoryError, Store};
use crate::models::catalog::{ImageKind, image_path};
use crate::models::{NewCategory, NewGood, NewSubcategory};

/// Errors that can occur while loading fixtures.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("failed to read seed file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse seed file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid slug '{slug}': {source}")]
    Slug {
        slug: String,
        #[source]
        source: SlugError,
    },

    #[error("invalid price for '{slug}': {source}")]
    Price {
        slug: String,
        #[source]
        source: PriceError,
    },

    #[error("{kind} '{slug}' referenced by '{child}' does not exist")]
    UnknownParent {
        kind: &'static str,
        slug: String,
        child: String,
    },

    #[error("failed to create user: {0}")]
    Auth(#[from] AuthError),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// An image field: `true` for the default path, or an explicit path.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum SeedImage {
    Default(bool),
    Path(String),
}

impl SeedImage {
    fn resolve(image: Option<&Self>, kind: ImageKind, slug: &Slug) -> Option<String> {
        match image? {
            Self::Default(true) => Some(image_path(kind, slug)),
            Self::Default(false) => None,
            Self::Path(path) => Some(path.clone()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedCategory {
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub image: Option<SeedImage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedSubcategory {
    pub name: String,
    pub slug: String,
    /// Slug of the parent category.
    pub category: String,
    #[serde(default)]
    pub image: Option<SeedImage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedGood {
    pub name: String,
    pub slug: String,
    pub price: i64,
    /// Slug of the parent subcategory.
    pub subcategory: String,
    /// Applies to all three image sizes.
    #[serde(default)]
    pub images: Option<SeedImage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedUser {
    pub username: String,
    pub password: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

const fn default_active() -> bool {
    true
}

/// A parsed fixture file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SeedFile {
    pub categories: Vec<SeedCategory>,
    pub subcategories: Vec<SeedSubcategory>,
    pub goods: Vec<SeedGood>,
    pub users: Vec<SeedUser>,
}

/// How many entries were created (skipped entries are not counted).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub categories: usize,
    pub subcategories: usize,
    pub goods: usize,
    pub users: usize,
}

impl SeedFile {
    /// Parse fixtures from YAML text.
    ///
    /// # Errors
    ///
    /// Returns `SeedError::Yaml` if the document does not match the format.
    pub fn parse(yaml: &str) -> Result<Self, SeedError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Read and parse a fixture file.
    ///
    /// # Errors
    ///
    /// Returns `SeedError::Io` or `SeedError::Yaml`.
    pub async fn load(path: &Path) -> Result<Self, SeedError> {
        let yaml = tokio::fs::read_to_string(path).await?;
        Self::parse(&yaml)
    }

    /// Insert every entry into `store`, parents first.
    ///
    /// # Errors
    ///
    /// Returns the first invalid entry or storage failure. Entries created
    /// before the failure stay in the store.
    pub async fn apply(&self, store: &dyn Store) -> Result<SeedReport, SeedError> {
        let mut report = SeedReport::default();

        for entry in &self.categories {
            let slug = parse_slug(&entry.slug)?;
            if store.category_by_slug(&slug).await?.is_some() {
                continue;
            }
            store
                .create_category(&NewCategory {
                    name: entry.name.clone(),
                    image: SeedImage::resolve(entry.image.as_ref(), ImageKind::Category, &slug),
                    slug,
                })
                .await?;
            report.categories += 1;
        }

        for entry in &self.subcategories {
            let slug = parse_slug(&entry.slug)?;
            if store.subcategory_by_slug(&slug).await?.is_some() {
                continue;
            }
            let category = store
                .category_by_slug(&parse_slug(&entry.category)?)
                .await?
                .ok_or_else(|| SeedError::UnknownParent {
                    kind: "category",
                    slug: entry.category.clone(),
                    child: entry.slug.clone(),
                })?;
            store
                .create_subcategory(&NewSubcategory {
                    name: entry.name.clone(),
                    image: SeedImage::resolve(entry.image.as_ref(), ImageKind::Subcategory, &slug),
                    slug,
                    category_id: category.id,
                })
                .await?;
            report.subcategories += 1;
        }

        for entry in &self.goods {
            let slug = parse_slug(&entry.slug)?;
            if store.good_by_slug(&slug).await?.is_some() {
                continue;
            }
            let price = Price::new(entry.price).map_err(|source| SeedError::Price {
                slug: entry.slug.clone(),
                source,
            })?;
            let subcategory = store
                .subcategory_by_slug(&parse_slug(&entry.subcategory)?)
                .await?
                .ok_or_else(|| SeedError::UnknownParent {
                    kind: "subcategory",
                    slug: entry.subcategory.clone(),
                    child: entry.slug.clone(),
                })?;
            let images = entry.images.as_ref();
            store
                .create_good(&NewGood {
                    name: entry.name.clone(),
                    price,
                    subcategory_id: subcategory.id,
                    image_large: SeedImage::resolve(images, ImageKind::GoodLarge, &slug),
                    image_medium: SeedImage::resolve(images, ImageKind::GoodMedium, &slug),
                    image_small: SeedImage::resolve(images, ImageKind::GoodSmall, &slug),
                    slug,
                })
                .await?;
            report.goods += 1;
        }

        for entry in &self.users {
            let username = Username::parse(&entry.username).map_err(AuthError::from)?;
            if store.get_user_credentials(&username).await?.is_some() {
                continue;
            }
            create_account(store, &entry.username, &entry.password).await?;
            if !entry.is_active {
                store.set_user_active(&username, false).await?;
            }
            report.users += 1;
        }

        tracing::info!(
            categories = report.categories,
            subcategories = report.subcategories,
            goods = report.goods,
            users = report.users,
            "Loaded seed fixtures"
        );
        Ok(report)
    }
}

fn parse_slug(slug: &str) -> Result<Slug, SeedError> {
    Slug::parse(slug).map_err(|source| SeedError::Slug {
        slug: slug.to_owned(),
        source,
    })
}
