//! Shopping cart endpoints.
//!
//! ```text
//! GET  /api/v1/shopping-cart/                      - Current cart with totals
//! POST /api/v1/shopping-cart/                      - Replace the whole cart
//! POST /api/v1/shopping-cart/clear_shopping_cart/  - Remove every line
//! ANY  /api/v1/shopping-cart/{id}/                 - 405 once authenticated
//! ```
//!
//! Every handler requires a bearer token; the cart is always the caller's.

use axum::{
    Json,
    extract::State,
    http::{Method, StatusCode},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::instrument;
use utoipa::ToSchema;

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::{CartLine, CartSummary};
use crate::routes::json::ApiJson;
use crate::services::cart::CartService;
use crate::state::AppState;

/// Body of a cart replacement.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CartRequest {
    /// Lines of the new cart; validated by the cart service.
    #[schema(value_type = Vec<CartItemRequest>)]
    pub goods: Option<Value>,
}

/// One line of a cart replacement.
#[derive(Debug, ToSchema)]
pub struct CartItemRequest {
    /// Good ID.
    pub good: i64,
    /// Quantity, at least 1.
    #[schema(minimum = 1)]
    pub amount: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartLineResponse {
    /// Name of the good.
    pub good: String,
    /// Current unit price of the good.
    pub price: i64,
    pub amount: i64,
}

impl From<CartLine> for CartLineResponse {
    fn from(line: CartLine) -> Self {
        Self {
            good: line.good_name,
            price: line.price.as_i64(),
            amount: line.amount.as_i64(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartResponse {
    /// Number of lines in the cart.
    pub total_goods: usize,
    /// Sum of `price * amount` over all lines.
    pub total_sum: i64,
    pub goods: Vec<CartLineResponse>,
}

impl From<CartSummary> for CartResponse {
    fn from(summary: CartSummary) -> Self {
        Self {
            total_goods: summary.total_goods,
            total_sum: summary.total_sum,
            goods: summary.lines.into_iter().map(Into::into).collect(),
        }
    }
}

/// Show the caller's cart.
#[utoipa::path(
    get,
    path = "/api/v1/shopping-cart/",
    tag = "cart",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "The caller's cart", body = CartResponse),
        (status = 401, description = "Missing or invalid token"),
    )
)]
#[instrument(skip_all)]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<CartResponse>> {
    let summary = CartService::new(state.store()).summary(user.id).await?;
    Ok(Json(summary.into()))
}

/// Replace the caller's cart.
///
/// Nothing changes unless every line is valid.
#[utoipa::path(
    post,
    path = "/api/v1/shopping-cart/",
    tag = "cart",
    security(("bearer" = [])),
    request_body = CartRequest,
    responses(
        (status = 201, description = "The new cart", body = CartResponse),
        (status = 400, description = "Field errors"),
        (status = 401, description = "Missing or invalid token"),
    )
)]
#[instrument(skip_all)]
pub async fn replace(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(body): ApiJson<CartRequest>,
) -> Result<(StatusCode, Json<CartResponse>)> {
    let summary = CartService::new(state.store())
        .replace(user.id, body.goods.as_ref())
        .await?;
    Ok((StatusCode::CREATED, Json(summary.into())))
}

/// Remove every line from the caller's cart.
#[utoipa::path(
    post,
    path = "/api/v1/shopping-cart/clear_shopping_cart/",
    tag = "cart",
    security(("bearer" = [])),
    responses(
        (status = 204, description = "Cart cleared"),
        (status = 401, description = "Missing or invalid token"),
    )
)]
#[instrument(skip_all)]
pub async fn clear(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<StatusCode> {
    CartService::new(state.store()).clear(user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Carts have no per-line resource; authentication is still checked first.
pub async fn line(RequireAuth(_): RequireAuth, method: Method) -> impl IntoResponse {
    super::method_not_allowed(method).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use saraphan_core::{Amount, CartLineId, GoodId, Price};

    use super::*;

    #[test]
    fn test_cart_response_shape() {
        let summary = CartSummary::from_lines(vec![CartLine {
            id: CartLineId::new(1),
            good_id: GoodId::new(1),
            good_name: "Товар 1".to_string(),
            price: Price::new(3).unwrap(),
            amount: Amount::new(4).unwrap(),
        }]);
        let body = serde_json::to_value(CartResponse::from(summary)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "total_goods": 1,
                "total_sum": 12,
                "goods": [{"good": "Товар 1", "price": 3, "amount": 4}]
            })
        );
    }
}
