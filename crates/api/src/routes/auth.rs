//! Token endpoints.
//!
//! ```text
//! POST /api/v1/auth/token/create/   - Username and password for an access/refresh pair
//! POST /api/v1/auth/token/refresh/  - Refresh token for a new access token
//! ```

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::instrument;
use utoipa::ToSchema;

use crate::error::Result;
use crate::routes::json::ApiJson;
use crate::services::auth::AuthService;
use crate::state::AppState;
use crate::validation::{FieldErrors, string_field};

#[derive(Debug, Deserialize, ToSchema)]
pub struct TokenCreateRequest {
    #[schema(value_type = String)]
    pub username: Option<Value>,
    #[schema(value_type = String, format = Password)]
    pub password: Option<Value>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TokenPairResponse {
    pub access: String,
    pub refresh: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TokenRefreshRequest {
    #[schema(value_type = String)]
    pub refresh: Option<Value>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AccessTokenResponse {
    pub access: String,
}

/// Read every named string field, collecting all problems.
fn required_strings<const N: usize>(
    fields: [(&str, Option<&Value>); N],
) -> std::result::Result<[String; N], FieldErrors> {
    let mut errors = FieldErrors::new();
    let values = fields.map(|(name, value)| {
        string_field(value).unwrap_or_else(|message| {
            errors.add(name, message);
            String::new()
        })
    });
    if errors.is_empty() {
        Ok(values)
    } else {
        Err(errors)
    }
}

/// Exchange credentials for a token pair.
#[utoipa::path(
    post,
    path = "/api/v1/auth/token/create/",
    tag = "auth",
    request_body = TokenCreateRequest,
    responses(
        (status = 200, description = "Access and refresh tokens", body = TokenPairResponse),
        (status = 400, description = "Missing fields or bad credentials"),
        (status = 429, description = "Too many attempts"),
    )
)]
#[instrument(skip_all)]
pub async fn create_token(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<TokenCreateRequest>,
) -> Result<Json<TokenPairResponse>> {
    let [username, password] = required_strings([
        ("username", body.username.as_ref()),
        ("password", body.password.as_ref()),
    ])?;

    let pair = AuthService::new(state.store(), state.tokens())
        .login(&username, &password)
        .await?;
    Ok(Json(TokenPairResponse {
        access: pair.access,
        refresh: pair.refresh,
    }))
}

/// Exchange a refresh token for a new access token.
#[utoipa::path(
    post,
    path = "/api/v1/auth/token/refresh/",
    tag = "auth",
    request_body = TokenRefreshRequest,
    responses(
        (status = 200, description = "New access token", body = AccessTokenResponse),
        (status = 400, description = "Missing field or invalid token"),
    )
)]
#[instrument(skip_all)]
pub async fn refresh_token(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<TokenRefreshRequest>,
) -> Result<Json<AccessTokenResponse>> {
    let [refresh] = required_strings([("refresh", body.refresh.as_ref())])?;
    let access = AuthService::new(state.store(), state.tokens()).refresh(&refresh)?;
    Ok(Json(AccessTokenResponse { access }))
}
