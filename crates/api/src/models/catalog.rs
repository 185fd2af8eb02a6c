//! Catalog domain types.

use saraphan_core::{CategoryId, GoodId, Price, Slug, SubcategoryId};

/// A top-level product category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    /// Unique category ID.
    pub id: CategoryId,
    /// Display name, unique across categories.
    pub name: String,
    /// URL slug, unique across categories.
    pub slug: Slug,
    /// Relative path of the image under the media root.
    pub image: Option<String>,
}

/// A subcategory within exactly one category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subcategory {
    /// Unique subcategory ID.
    pub id: SubcategoryId,
    /// Display name, unique across subcategories.
    pub name: String,
    /// URL slug, unique across subcategories.
    pub slug: Slug,
    /// Relative path of the image under the media root.
    pub image: Option<String>,
    /// Parent category.
    pub category: Category,
}

/// A sellable good within exactly one subcategory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Good {
    /// Unique good ID.
    pub id: GoodId,
    /// Display name, unique across goods.
    pub name: String,
    /// URL slug, unique across goods.
    pub slug: Slug,
    /// Unit price.
    pub price: Price,
    /// Parent subcategory (with its category).
    pub subcategory: Subcategory,
    /// Large image path.
    pub image_large: Option<String>,
    /// Medium image path.
    pub image_medium: Option<String>,
    /// Small image path.
    pub image_small: Option<String>,
}

impl Good {
    /// The three image paths, largest first.
    #[must_use]
    pub fn images(&self) -> [Option<&str>; 3] {
        [
            self.image_large.as_deref(),
            self.image_medium.as_deref(),
            self.image_small.as_deref(),
        ]
    }
}

/// Input for creating a category.
#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub slug: Slug,
    pub image: Option<String>,
}

/// Input for creating a subcategory.
#[derive(Debug, Clone)]
pub struct NewSubcategory {
    pub name: String,
    pub slug: Slug,
    pub image: Option<String>,
    pub category_id: CategoryId,
}

/// Input for creating a good.
#[derive(Debug, Clone)]
pub struct NewGood {
    pub name: String,
    pub slug: Slug,
    pub price: Price,
    pub subcategory_id: SubcategoryId,
    pub image_large: Option<String>,
    pub image_medium: Option<String>,
    pub image_small: Option<String>,
}

/// Default image path for a catalog entity, relative to the media root.
///
/// Categories are stored under `categories/<slug>`, subcategories under
/// `subcategories/<slug>` and goods under `goods/<slug>_<size>` where size is
/// `l`, `m` or `s`.
#[must_use]
pub fn image_path(kind: ImageKind, slug: &Slug) -> String {
    match kind {
        ImageKind::Category => format!("categories/{slug}"),
        ImageKind::Subcategory => format!("subcategories/{slug}"),
        ImageKind::GoodLarge => format!("goods/{slug}_l"),
        ImageKind::GoodMedium => format!("goods/{slug}_m"),
        ImageKind::GoodSmall => format!("goods/{slug}_s"),
    }
}

/// Which image slot a path belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Category,
    Subcategory,
    GoodLarge,
    GoodMedium,
    GoodSmall,
}
