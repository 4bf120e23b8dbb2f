//! Anonymous like counter for blog posts.
//!
//! The server half is an axum app with two endpoints: `POST /like` mutates a
//! post's counter behind a per-client fixed-window rate limiter, and
//! `GET /like/count` reads it. The [`client`] module holds the browser-side
//! half: an optimistic toggle state machine with rollback, persisted
//! liked-post membership, and an HTTP transport.

use axum::{
    Router,
    http::{Method, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use std::any::Any;
use std::time::Duration;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any as AnyOrigin, CorsLayer};
use tracing::error;

pub mod client;
pub mod config;
pub mod error;
pub mod handlers;
pub mod hash;
pub mod metrics;
pub mod models;
pub mod rate_limit;
pub mod state;
pub mod store;

use error::ApiError;
use handlers::{count_handler, health_handler, like_handler, metrics_handler};
pub use state::AppState;

// Router with every route; callers add `.into_make_service_with_connect_info`
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AnyOrigin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/like", post(like_handler))
        .route("/like/count", get(count_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
        .layer(cors)
        .layer(CatchPanicLayer::custom(panic_response))
}

// Anything unanticipated still gets the uniform error shape
fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!(detail, "handler panicked");
    metrics::observe("unknown", "internal_error", 0.0);

    ApiError::Internal(detail.to_string()).into_response()
}
