use lazy_static::lazy_static;
use prometheus::{
    HistogramVec, IntCounter, IntCounterVec, IntGauge, register_histogram_vec,
    register_int_counter, register_int_counter_vec, register_int_gauge,
};

lazy_static! {
    pub static ref LIKE_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "like_requests_total",
        "Like API requests by endpoint and outcome",
        &["endpoint", "outcome"]
    )
    .unwrap();
    pub static ref LIKE_REQUEST_LATENCY: HistogramVec = register_histogram_vec!(
        "like_request_latency_seconds",
        "Like API request latency in seconds",
        &["endpoint"]
    )
    .unwrap();
    pub static ref RATE_LIMIT_DENIED: IntCounter = register_int_counter!(
        "like_rate_limit_denied_total",
        "Mutations rejected by the rate limiter"
    )
    .unwrap();
    pub static ref RATE_LIMIT_ENTRIES: IntGauge = register_int_gauge!(
        "like_rate_limit_entries",
        "Client identifiers currently tracked by the rate limiter"
    )
    .unwrap();
}

// Bump the outcome bucket and latency histogram for one finished request
pub fn observe(endpoint: &str, outcome: &str, elapsed_secs: f64) {
    LIKE_REQUESTS_TOTAL
        .with_label_values(&[endpoint, outcome])
        .inc();
    LIKE_REQUEST_LATENCY
        .with_label_values(&[endpoint])
        .observe(elapsed_secs);
}
