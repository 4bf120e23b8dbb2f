mod client_addr;
mod count;
mod health;
mod like;
mod metrics;

pub use client_addr::{ClientAddr, UNKNOWN_CLIENT};
pub use count::count_handler;
pub use health::health_handler;
pub use like::{NO_CACHE, like_handler};
pub use metrics::metrics_handler;

use std::time::Duration;
use tracing::{error, info, warn};

use crate::error::ApiError;

// One structured event and one metric bucket per endpoint call.
// `client` is always the hashed identifier.
fn record_outcome<T>(endpoint: &str, client: &str, result: &Result<T, ApiError>, elapsed: Duration) {
    let elapsed_ms = elapsed.as_secs_f64() * 1000.0;

    let outcome = match result {
        Ok(_) => {
            info!(endpoint, client, status = 200, elapsed_ms, "like api request");
            "ok".to_string()
        }
        Err(err) => {
            let status = err.status().as_u16();
            let code = err.code();
            match err {
                ApiError::RateLimited(_) => {
                    warn!(endpoint, client, status, code, elapsed_ms, "rate limit exceeded")
                }
                ApiError::MissingParameter(_) | ApiError::Validation(_) => {
                    info!(endpoint, client, status, code, elapsed_ms, error = %err, "rejected request")
                }
                ApiError::Database(_) | ApiError::ResponseValidation(_) | ApiError::Internal(_) => {
                    error!(endpoint, client, status, code, elapsed_ms, error = %err, "request failed")
                }
            }
            code.to_ascii_lowercase()
        }
    };

    crate::metrics::observe(endpoint, &outcome, elapsed.as_secs_f64());
}
