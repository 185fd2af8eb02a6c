//! HTTP routes for the API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                                     - Liveness
//! GET  /health/ready                               - Readiness (pings the store)
//! GET  /media/*                                    - Uploaded images
//!
//! # Catalog (public, paginated)
//! GET  /api/v1/categories/         /api/v1/categories/{id}/
//! GET  /api/v1/subcategories/      /api/v1/subcategories/{id}/
//! GET  /api/v1/goods/              /api/v1/goods/{id}/
//!
//! # Cart (bearer token)
//! GET  /api/v1/shopping-cart/
//! POST /api/v1/shopping-cart/
//! POST /api/v1/shopping-cart/clear_shopping_cart/
//!
//! # Utilities
//! POST /api/v1/create-nums-row/
//!
//! # Auth (rate limited)
//! POST /api/v1/auth/token/create/
//! POST /api/v1/auth/token/refresh/
//!
//! # Docs
//! GET  /api/v1/docs/                               - OpenAPI JSON
//! GET  /api/v1/docs/swagger/                       - Swagger UI
//! ```

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod docs;
pub mod health;
pub mod json;
pub mod pagination;
pub mod sequence;

use axum::{
    Json, Router,
    http::{
        HeaderName, Method, StatusCode,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    response::IntoResponse,
    routing::{any, get, post},
};
use serde_json::json;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::ServeDir,
    trace::{DefaultOnResponse, OnResponse, TraceLayer},
};
use tracing::Span;

use crate::config::ApiConfig;
use crate::error::AppError;
use crate::middleware::{
    auth_rate_limiter, request_id::REQUEST_ID_HEADER, request_id_middleware,
    security_headers_middleware,
};
use crate::state::AppState;

/// Create the catalog routes router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/categories/", get(catalog::list_categories))
        .route("/categories/{id}/", get(catalog::get_category))
        .route("/subcategories/", get(catalog::list_subcategories))
        .route("/subcategories/{id}/", get(catalog::get_subcategory))
        .route("/goods/", get(catalog::list_goods))
        .route("/goods/{id}/", get(catalog::get_good))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/shopping-cart/", get(cart::show).post(cart::replace))
        .route(
            "/shopping-cart/clear_shopping_cart/",
            post(cart::clear),
        )
        .route("/shopping-cart/{id}/", any(cart::line))
}

/// Create the token routes router.
pub fn auth_routes(rate_limit: bool) -> Router<AppState> {
    let router = Router::new()
        .route("/token/create/", post(auth::create_token))
        .route("/token/refresh/", post(auth::refresh_token));

    if !rate_limit {
        return router;
    }
    match auth_rate_limiter() {
        Some(limiter) => router.layer(limiter),
        None => {
            tracing::warn!("Rate limiter configuration rejected; token routes are not limited");
            router
        }
    }
}

/// Create all `/api/v1` routes.
pub fn api_routes(config: &ApiConfig) -> Router<AppState> {
    Router::new()
        .merge(catalog_routes())
        .merge(cart_routes())
        .route("/create-nums-row/", post(sequence::create_nums_row))
        .nest("/auth", auth_routes(config.rate_limit))
}

/// Build the complete application: routes, fallbacks and middleware.
pub fn app(state: AppState) -> Router {
    let config = state.config();

    let mut router = Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/api/v1", api_routes(config))
        .merge(docs::routes())
        .nest_service("/media", ServeDir::new(&config.media_dir))
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed);

    if let Some(cors) = cors_layer(config) {
        router = router.layer(cors);
    }

    router
        .layer(axum::middleware::from_fn(security_headers_middleware))
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// CORS for the configured origins, or `None` when no origin is allowed.
fn cors_layer(config: &ApiConfig) -> Option<CorsLayer> {
    if config.cors_origins.is_empty() {
        return None;
    }
    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(config.cors_origins.clone()))
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([AUTHORIZATION, CONTENT_TYPE])
            .expose_headers([HeaderName::from_static(REQUEST_ID_HEADER)]),
    )
}

async fn not_found() -> AppError {
    AppError::NotFound
}

async fn method_not_allowed(method: Method) -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({ "detail": format!("Method \"{method}\" not allowed.") })),
    )
}
