//! Read-only catalog endpoints.
//!
//! ```text
//! GET /api/v1/categories/          GET /api/v1/categories/{id}/
//! GET /api/v1/subcategories/       GET /api/v1/subcategories/{id}/
//! GET /api/v1/goods/               GET /api/v1/goods/{id}/
//! ```

use axum::{
    Json,
    extract::{OriginalUri, Path, State},
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::{AppError, Result};
use crate::models::{Category, Good, Subcategory};
use crate::routes::pagination::{Page, PageQuery};
use crate::state::AppState;

/// Turns stored image paths into absolute URLs.
#[derive(Debug, Clone)]
pub struct MediaUrl(String);

impl MediaUrl {
    #[must_use]
    pub fn new(state: &AppState) -> Self {
        Self(state.config().media_url())
    }

    fn resolve(&self, path: Option<&str>) -> Option<String> {
        path.map(|p| format!("{}{}", self.0, p.trim_start_matches('/')))
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryResponse {
    pub id: i64,
    pub name: String,
    pub slug: String,
    /// Absolute image URL.
    pub image: Option<String>,
}

impl CategoryResponse {
    fn new(category: Category, media: &MediaUrl) -> Self {
        Self {
            image: media.resolve(category.image.as_deref()),
            id: category.id.as_i64(),
            name: category.name,
            slug: category.slug.into_inner(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SubcategoryResponse {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub category: CategoryResponse,
    /// Absolute image URL.
    pub image: Option<String>,
}

impl SubcategoryResponse {
    fn new(subcategory: Subcategory, media: &MediaUrl) -> Self {
        Self {
            image: media.resolve(subcategory.image.as_deref()),
            id: subcategory.id.as_i64(),
            name: subcategory.name,
            slug: subcategory.slug.into_inner(),
            category: CategoryResponse::new(subcategory.category, media),
        }
    }
}

/// Subcategory as embedded in a good: the parent category by name only.
#[derive(Debug, Serialize, ToSchema)]
pub struct GoodSubcategoryResponse {
    pub id: i64,
    pub name: String,
    pub slug: String,
    /// Name of the category the subcategory belongs to.
    pub parent_category: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GoodResponse {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub price: i64,
    pub subcategory: GoodSubcategoryResponse,
    pub image_large: Option<String>,
    pub image_medium: Option<String>,
    pub image_small: Option<String>,
}

impl GoodResponse {
    fn new(good: Good, media: &MediaUrl) -> Self {
        let [large, medium, small] = good.images().map(|path| media.resolve(path));
        Self {
            id: good.id.as_i64(),
            name: good.name,
            slug: good.slug.into_inner(),
            price: good.price.as_i64(),
            subcategory: GoodSubcategoryResponse {
                id: good.subcategory.id.as_i64(),
                name: good.subcategory.name,
                slug: good.subcategory.slug.into_inner(),
                parent_category: good.subcategory.category.name,
            },
            image_large: large,
            image_medium: medium,
            image_small: small,
        }
    }
}

/// Parse a detail-route id; anything that is not an integer is a 404.
fn parse_id(raw: &str) -> Result<i64> {
    raw.parse::<i64>().map_err(|_| AppError::NotFound)
}

/// List categories ordered by name.
#[utoipa::path(
    get,
    path = "/api/v1/categories/",
    tag = "catalog",
    params(PageQuery),
    responses(
        (status = 200, description = "One page of categories", body = Page<CategoryResponse>),
        (status = 404, description = "Invalid page"),
    )
)]
pub async fn list_categories(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    query: PageQuery,
) -> Result<Json<Page<CategoryResponse>>> {
    let page_size = state.config().page_size;
    let (number, request) = query.request(page_size)?;
    let media = MediaUrl::new(&state);
    let slice = state
        .store()
        .list_categories(request)
        .await?
        .map(|c| CategoryResponse::new(c, &media));
    let page = Page::new(slice, number, page_size, &state.config().base_url, &uri)?;
    Ok(Json(page))
}

/// Get one category.
#[utoipa::path(
    get,
    path = "/api/v1/categories/{id}/",
    tag = "catalog",
    params(("id" = i64, Path, description = "Category ID")),
    responses(
        (status = 200, description = "The category", body = CategoryResponse),
        (status = 404, description = "No such category"),
    )
)]
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CategoryResponse>> {
    let category = state
        .store()
        .get_category(parse_id(&id)?.into())
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(CategoryResponse::new(category, &MediaUrl::new(&state))))
}

/// List subcategories ordered by name.
#[utoipa::path(
    get,
    path = "/api/v1/subcategories/",
    tag = "catalog",
    params(PageQuery),
    responses(
        (status = 200, description = "One page of subcategories", body = Page<SubcategoryResponse>),
        (status = 404, description = "Invalid page"),
    )
)]
pub async fn list_subcategories(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    query: PageQuery,
) -> Result<Json<Page<SubcategoryResponse>>> {
    let page_size = state.config().page_size;
    let (number, request) = query.request(page_size)?;
    let media = MediaUrl::new(&state);
    let slice = state
        .store()
        .list_subcategories(request)
        .await?
        .map(|s| SubcategoryResponse::new(s, &media));
    let page = Page::new(slice, number, page_size, &state.config().base_url, &uri)?;
    Ok(Json(page))
}

/// Get one subcategory.
#[utoipa::path(
    get,
    path = "/api/v1/subcategories/{id}/",
    tag = "catalog",
    params(("id" = i64, Path, description = "Subcategory ID")),
    responses(
        (status = 200, description = "The subcategory", body = SubcategoryResponse),
        (status = 404, description = "No such subcategory"),
    )
)]
pub async fn get_subcategory(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SubcategoryResponse>> {
    let subcategory = state
        .store()
        .get_subcategory(parse_id(&id)?.into())
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(SubcategoryResponse::new(
        subcategory,
        &MediaUrl::new(&state),
    )))
}

/// List goods ordered by name.
#[utoipa::path(
    get,
    path = "/api/v1/goods/",
    tag = "catalog",
    params(PageQuery),
    responses(
        (status = 200, description = "One page of goods", body = Page<GoodResponse>),
        (status = 404, description = "Invalid page"),
    )
)]
pub async fn list_goods(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    query: PageQuery,
) -> Result<Json<Page<GoodResponse>>> {
    let page_size = state.config().page_size;
    let (number, request) = query.request(page_size)?;
    let media = MediaUrl::new(&state);
    let slice = state
        .store()
        .list_goods(request)
        .await?
        .map(|g| GoodResponse::new(g, &media));
    let page = Page::new(slice, number, page_size, &state.config().base_url, &uri)?;
    Ok(Json(page))
}

/// Get one good.
#[utoipa::path(
    get,
    path = "/api/v1/goods/{id}/",
    tag = "catalog",
    params(("id" = i64, Path, description = "Good ID")),
    responses(
        (status = 200, description = "The good", body = GoodResponse),
        (status = 404, description = "No such good"),
    )
)]
pub async fn get_good(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<GoodResponse>> {
    let good = state
        .store()
        .get_good(parse_id(&id)?.into())
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(GoodResponse::new(good, &MediaUrl::new(&state))))
}
