//! Bearer-token authentication extractor.
//!
//! Protected handlers take a [`RequireAuth`] argument; the request is rejected
//! with 401 before the handler runs when the `Authorization` header is
//! missing or does not carry a valid access token for an active user.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{HeaderValue, StatusCode, header, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::error::set_sentry_user;
use crate::models::User;
use crate::services::auth::{AuthError, AuthService};
use crate::state::AppState;

/// Extractor that requires a valid access token.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAuth(user): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", user.username)
/// }
/// ```
pub struct RequireAuth(pub User);

/// Why a request was not authenticated.
#[derive(Debug)]
pub enum AuthRejection {
    /// No `Authorization: Bearer` header.
    MissingCredentials,
    /// Token is malformed, expired, or not an access token.
    InvalidToken,
    /// Token names a user that no longer exists.
    UserNotFound,
    /// Token names a deactivated user.
    UserInactive,
    /// The store failed while resolving the user.
    Internal,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::MissingCredentials => (
                StatusCode::UNAUTHORIZED,
                json!({ "detail": "Authentication credentials were not provided." }),
            ),
            Self::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                json!({
                    "detail": "Given token not valid for any token type",
                    "code": "token_not_valid",
                }),
            ),
            Self::UserNotFound => (
                StatusCode::UNAUTHORIZED,
                json!({ "detail": "User not found", "code": "user_not_found" }),
            ),
            Self::UserInactive => (
                StatusCode::UNAUTHORIZED,
                json!({ "detail": "User is inactive", "code": "user_inactive" }),
            ),
            Self::Internal => {
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "detail": "Internal server error" })),
                )
                    .into_response();
            }
        };

        let mut response = (status, Json(body)).into_response();
        response.headers_mut().insert(
            header::WWW_AUTHENTICATE,
            HeaderValue::from_static("Bearer realm=\"api\""),
        );
        response
    }
}

/// Pull the token out of an `Authorization: Bearer <token>` header.
fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(AuthRejection::MissingCredentials)?;

        let auth = AuthService::new(state.store(), state.tokens());
        let user = auth.authenticate(token).await.map_err(|e| match e {
            AuthError::UserNotFound => AuthRejection::UserNotFound,
            AuthError::UserInactive => AuthRejection::UserInactive,
            AuthError::Repository(err) => {
                tracing::error!(error = %err, "Failed to resolve token user");
                AuthRejection::Internal
            }
            _ => AuthRejection::InvalidToken,
        })?;

        set_sentry_user(&user.id, user.username.as_str());
        Ok(Self(user))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::Request;

    use super::*;

    fn parts_with(value: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/v1/shopping-cart/");
        if let Some(value) = value {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token(&parts_with(Some("Bearer abc"))), Some("abc"));
        assert_eq!(bearer_token(&parts_with(Some("bearer abc"))), Some("abc"));
        assert_eq!(bearer_token(&parts_with(Some("Basic abc"))), None);
        assert_eq!(bearer_token(&parts_with(Some("Bearer "))), None);
        assert_eq!(bearer_token(&parts_with(Some("Bearer"))), None);
        assert_eq!(bearer_token(&parts_with(None)), None);
    }

    #[test]
    fn test_rejection_sets_www_authenticate() {
        let response = AuthRejection::MissingCredentials.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Bearer realm=\"api\""
        );
    }
}
