//! `POST /api/v1/create-nums-row/`

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::error::Result;
use crate::routes::json::ApiJson;
use crate::services::sequence::{number_sequence, parse_number};
use crate::state::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct SequenceRequest {
    /// Positive integer `n`.
    #[schema(value_type = i64, minimum = 1)]
    pub number: Option<Value>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SequenceResponse {
    /// Each `i` in `1..=n` written `i` times.
    pub number_sequence: String,
}

/// Build the repeated-digit sequence for `number`.
#[utoipa::path(
    post,
    path = "/api/v1/create-nums-row/",
    tag = "utilities",
    request_body = SequenceRequest,
    responses(
        (status = 200, description = "The sequence", body = SequenceResponse),
        (status = 400, description = "Field errors"),
    )
)]
pub async fn create_nums_row(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<SequenceRequest>,
) -> Result<Json<SequenceResponse>> {
    let n = parse_number(body.number.as_ref(), state.config().sequence_max)?;
    Ok(Json(SequenceResponse {
        number_sequence: number_sequence(n),
    }))
}
