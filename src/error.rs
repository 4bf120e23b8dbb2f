//! Endpoint error taxonomy and its HTTP rendering.

use axum::{
    Json,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::models::ErrorBody;
use crate::rate_limit::RateLimitDecision;
use crate::store::StoreError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Rate limit exceeded. Try again in {} seconds.", .0.retry_after_secs.unwrap_or(1))]
    RateLimited(RateLimitDecision),

    #[error(transparent)]
    Database(#[from] StoreError),

    #[error("Response validation failed: {0}")]
    ResponseValidation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingParameter(_) => StatusCode::BAD_REQUEST,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Database(_)
            | ApiError::ResponseValidation(_)
            | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::MissingParameter(_) => "MISSING_PARAMETER",
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::RateLimited(_) => "RATE_LIMIT_EXCEEDED",
            ApiError::Database(_) => "DATABASE_ERROR",
            ApiError::ResponseValidation(_) => "RESPONSE_VALIDATION_ERROR",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    // What the caller sees. Server-side failures never leak their detail.
    pub fn public_message(&self) -> String {
        match self {
            ApiError::MissingParameter(_) | ApiError::Validation(_) | ApiError::RateLimited(_) => {
                self.to_string()
            }
            ApiError::Database(_) => "Database error. Please try again later.".to_string(),
            ApiError::ResponseValidation(_) | ApiError::Internal(_) => {
                "Internal server error".to_string()
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let headers = match &self {
            ApiError::RateLimited(decision) => rate_limit_headers(decision),
            _ => HeaderMap::new(),
        };

        let body = Json(ErrorBody {
            success: false,
            error: self.public_message(),
            code: self.code().to_string(),
        });

        (self.status(), headers, body).into_response()
    }
}

/// `X-RateLimit-*` headers for a decision, plus `Retry-After` on denial.
pub fn rate_limit_headers(decision: &RateLimitDecision) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("x-ratelimit-limit", decision.limit.into());
    headers.insert("x-ratelimit-remaining", decision.remaining.into());
    headers.insert("x-ratelimit-reset", decision.reset_at.timestamp().into());
    if let Some(secs) = decision.retry_after_secs {
        headers.insert(axum::http::header::RETRY_AFTER, secs.into());
    }
    headers
}
