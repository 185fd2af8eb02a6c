//! JSON request bodies.
//!
//! [`ApiJson`] replaces axum's `Json` extractor for request bodies so that
//! every rejection is rendered as an API error body instead of plain text.

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::header::CONTENT_TYPE,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::AppError;
use crate::validation::{FieldErrors, json_type_name};

/// A JSON object request body.
///
/// An empty body is read as `{}` so that missing fields are reported per
/// field. A non-empty body must be sent as `application/json` (or a
/// `+json` type) and must be an object.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

fn is_json_content_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || essence.ends_with("+json")
}

fn parse_error(err: &impl std::fmt::Display) -> AppError {
    AppError::BadRequest(format!("JSON parse error - {err}"))
}

impl<S, T> FromRequest<S> for ApiJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;

        let value = if bytes.is_empty() {
            Value::Object(Map::new())
        } else {
            let content_type = content_type.unwrap_or_default();
            if !is_json_content_type(&content_type) {
                return Err(AppError::UnsupportedMediaType(format!(
                    "Unsupported media type \"{content_type}\" in request."
                )));
            }
            serde_json::from_slice::<Value>(&bytes).map_err(|e| parse_error(&e))?
        };

        if !value.is_object() {
            return Err(FieldErrors::single(
                "non_field_errors",
                format!(
                    "Invalid data. Expected a dictionary, but got {}.",
                    json_type_name(&value)
                ),
            )
            .into());
        }

        serde_json::from_value(value)
            .map(Self)
            .map_err(|e| parse_error(&e))
    }
}
