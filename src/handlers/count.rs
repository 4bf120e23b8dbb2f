use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
    http::{HeaderValue, StatusCode, header::CACHE_CONTROL},
    response::{IntoResponse, Response},
};
use std::time::Instant;
use validator::Validate;

use super::{ClientAddr, record_outcome};
use crate::error::{ApiError, ApiResult};
use crate::hash::hash_identifier;
use crate::models::{CountQuery, CountResponse};
use crate::state::AppState;

/// `GET /like/count?postId=...`
///
/// An absent `postId` is 400 `MISSING_PARAMETER`. A `postId` that is
/// present but empty (`?postId=`) or longer than 256 characters is 422
/// `VALIDATION_ERROR`, as is a query string that cannot be parsed.
pub async fn count_handler(
    State(state): State<AppState>,
    ClientAddr(client): ClientAddr,
    query: Result<Query<CountQuery>, QueryRejection>,
) -> Response {
    let start_time = Instant::now();

    let result = read_count(&state, query).await;
    record_outcome(
        "count",
        &hash_identifier(&client),
        &result,
        start_time.elapsed(),
    );

    match result {
        Ok(body) => {
            let mut response = (StatusCode::OK, Json(body)).into_response();
            // Display-only read, a few seconds of staleness is fine
            if let Ok(value) = HeaderValue::from_str(&state.count_cache_control) {
                response.headers_mut().insert(CACHE_CONTROL, value);
            }
            response
        }
        Err(err) => err.into_response(),
    }
}

async fn read_count(
    state: &AppState,
    query: Result<Query<CountQuery>, QueryRejection>,
) -> ApiResult<CountResponse> {
    let Query(query) = query.map_err(|e| ApiError::Validation(e.body_text()))?;
    query
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;
    let post_id = query.post_id.ok_or(ApiError::MissingParameter("postId"))?;

    let count = state.store.get_count(&post_id).await?;

    let response = CountResponse { count };
    response
        .validate()
        .map_err(|e| ApiError::ResponseValidation(e.to_string()))?;
    Ok(response)
}
