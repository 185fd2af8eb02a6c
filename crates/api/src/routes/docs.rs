//! OpenAPI document and Swagger UI.
//!
//! The document is generated from the `#[utoipa::path]` annotations on the
//! handlers and served at `/api/v1/docs/`; Swagger UI is mounted at
//! `/api/v1/docs/swagger/`.

use axum::{Json, Router, routing::get};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::state::AppState;

/// Adds the bearer-token security scheme referenced by the cart paths.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .description(Some("Access token from POST /api/v1/auth/token/create/"))
                    .build(),
            ),
        );
    }
}

/// OpenAPI document for the API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Saraphan API",
        version = "0.0.1",
        description = "Product catalog and per-user shopping cart."
    ),
    paths(
        super::catalog::list_categories,
        super::catalog::get_category,
        super::catalog::list_subcategories,
        super::catalog::get_subcategory,
        super::catalog::list_goods,
        super::catalog::get_good,
        super::cart::show,
        super::cart::replace,
        super::cart::clear,
        super::sequence::create_nums_row,
        super::auth::create_token,
        super::auth::refresh_token,
    ),
    tags(
        (name = "catalog", description = "Categories, subcategories and goods"),
        (name = "cart", description = "The caller's shopping cart"),
        (name = "auth", description = "JWT issue and refresh"),
        (name = "utilities", description = "Stateless helpers")
    )
)]
pub struct ApiDoc;

/// Routes serving the document and the UI.
pub fn routes() -> Router<AppState> {
    let doc = ApiDoc::openapi();
    Router::new()
        .route(
            "/api/v1/docs/",
            get({
                let doc = doc.clone();
                move || async move { Json(doc) }
            }),
        )
        .merge(SwaggerUi::new("/api/v1/docs/swagger").url("/api/v1/docs/openapi.json", doc))
}
