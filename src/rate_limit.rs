//! Fixed-window request counter keyed by client identifier.
//!
//! One limiter is built per process and handed to the handlers through
//! `AppState`. State lives in memory only and is lost on restart.

use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

pub const DEFAULT_WINDOW: Duration = Duration::from_millis(60_000);
pub const DEFAULT_MAX_REQUESTS: u32 = 60;

// Rate limit entry - tracks requests per client identifier
#[derive(Debug, Clone)]
pub struct RateLimitEntry {
    pub count: u32,
    pub window_reset_at: DateTime<Utc>,
}

/// Outcome of a single [`RateLimiter::check`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    pub reset_at: DateTime<Utc>,
    /// Only set on denial. Always at least 1.
    pub retry_after_secs: Option<u64>,
}

#[derive(Clone)]
pub struct RateLimiter {
    inner: Arc<RateLimiterInner>,
}

struct RateLimiterInner {
    entries: DashMap<String, RateLimitEntry>,
    max_requests: u32,
    window: TimeDelta,
    // millis timestamp of the last purge pass
    last_sweep_ms: AtomicI64,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_REQUESTS, DEFAULT_WINDOW)
    }
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        let window = TimeDelta::from_std(window).unwrap_or_else(|_| TimeDelta::days(36_500));
        Self {
            inner: Arc::new(RateLimiterInner {
                entries: DashMap::new(),
                max_requests,
                window,
                last_sweep_ms: AtomicI64::new(0),
            }),
        }
    }

    pub fn max_requests(&self) -> u32 {
        self.inner.max_requests
    }

    // Number of tracked identifiers, expired ones included until the next sweep
    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }

    pub fn check(&self, identifier: &str) -> RateLimitDecision {
        self.check_at(identifier, Utc::now())
    }

    /// Count one request from `identifier` at `now`.
    ///
    /// The DashMap entry guard holds the shard's write lock for the whole
    /// check-then-increment, so two concurrent requests from the same
    /// identifier can never both be admitted on the last free slot.
    pub fn check_at(&self, identifier: &str, now: DateTime<Utc>) -> RateLimitDecision {
        // Must run before the entry guard is taken: retain locks every shard.
        self.sweep_expired(now);

        let max = self.inner.max_requests;
        let fresh = || RateLimitEntry {
            count: 0,
            window_reset_at: now + self.inner.window,
        };

        let mut entry = self
            .inner
            .entries
            .entry(identifier.to_string())
            .or_insert_with(fresh);

        // window expired..? Replace it
        if entry.window_reset_at < now {
            *entry = fresh();
        }

        if entry.count >= max {
            let wait_ms = (entry.window_reset_at - now).num_milliseconds().max(0) as u64;
            return RateLimitDecision {
                allowed: false,
                limit: max,
                remaining: 0,
                reset_at: entry.window_reset_at,
                retry_after_secs: Some(wait_ms.div_ceil(1000).max(1)),
            };
        }

        entry.count += 1;
        RateLimitDecision {
            allowed: true,
            limit: max,
            remaining: max - entry.count,
            reset_at: entry.window_reset_at,
            retry_after_secs: None,
        }
    }

    // Drop expired entries at most once per window. Correctness never depends on
    // this running; check_at treats an expired entry as absent anyway.
    fn sweep_expired(&self, now: DateTime<Utc>) {
        let now_ms = now.timestamp_millis();
        let last = self.inner.last_sweep_ms.load(Ordering::Relaxed);
        if now_ms - last < self.inner.window.num_milliseconds() {
            return;
        }
        if self
            .inner
            .last_sweep_ms
            .compare_exchange(last, now_ms, Ordering::AcqRel, Ordering::Relaxed)
            .is_err()
        {
            // another request is sweeping
            return;
        }
        self.inner
            .entries
            .retain(|_, entry| entry.window_reset_at >= now);
    }
}
