use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderValue, StatusCode, header::CACHE_CONTROL},
    response::{IntoResponse, Response},
};
use serde_json::Value;
use std::time::Instant;
use validator::Validate;

use super::{ClientAddr, record_outcome};
use crate::error::{ApiError, ApiResult, rate_limit_headers};
use crate::hash::hash_identifier;
use crate::metrics::{RATE_LIMIT_DENIED, RATE_LIMIT_ENTRIES};
use crate::models::{LikeOp, LikeRequest, LikeResponse};
use crate::state::AppState;

pub const NO_CACHE: &str = "no-cache, no-store, must-revalidate";

// POST /like
pub async fn like_handler(
    State(state): State<AppState>,
    ClientAddr(client): ClientAddr,
    body: Bytes,
) -> Response {
    let start_time = Instant::now();
    let client_hash = hash_identifier(&client);

    // Cheap rejection first: the body is not even parsed when over the limit
    let decision = state.rate_limiter.check(&client);
    RATE_LIMIT_ENTRIES.set(state.rate_limiter.len() as i64);

    let result = if decision.allowed {
        apply_like(&state, &body).await
    } else {
        RATE_LIMIT_DENIED.inc();
        Err(ApiError::RateLimited(decision.clone()))
    };

    record_outcome("like", &client_hash, &result, start_time.elapsed());

    let mut response = match result {
        Ok(body) => (StatusCode::OK, rate_limit_headers(&decision), Json(body)).into_response(),
        Err(err) => {
            let mut response = err.into_response();
            response.headers_mut().extend(rate_limit_headers(&decision));
            response
        }
    };
    response
        .headers_mut()
        .insert(CACHE_CONTROL, HeaderValue::from_static(NO_CACHE));
    response
}

async fn apply_like(state: &AppState, body: &[u8]) -> ApiResult<LikeResponse> {
    let request = parse_request(body)?;

    let count = match request.op {
        LikeOp::Like => state.store.increment(&request.post_id).await?,
        LikeOp::Unlike => state.store.decrement(&request.post_id).await?,
    };

    let response = LikeResponse {
        success: true,
        count,
    };
    response
        .validate()
        .map_err(|e| ApiError::ResponseValidation(e.to_string()))?;

    Ok(response)
}

fn parse_request(body: &[u8]) -> ApiResult<LikeRequest> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ApiError::MissingParameter("body"));
    }

    let value: Value = serde_json::from_slice(body)
        .map_err(|e| ApiError::Validation(format!("invalid JSON body: {e}")))?;
    let Some(object) = value.as_object() else {
        return Err(ApiError::Validation("body must be a JSON object".to_string()));
    };

    for field in ["postId", "op"] {
        if object.get(field).is_none_or(Value::is_null) {
            return Err(ApiError::MissingParameter(field));
        }
    }

    let request: LikeRequest =
        serde_json::from_value(value).map_err(|e| ApiError::Validation(e.to_string()))?;
    request
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    Ok(request)
}
