use std::sync::Arc;

use crate::config::{Args, StorageKind};
use crate::rate_limit::RateLimiter;
use crate::store::{LikeStore, MemoryLikeStore, SledLikeStore, StoreResult};

// app's shared state, built once per process
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn LikeStore>,
    pub rate_limiter: RateLimiter,
    pub count_cache_control: String, // Cache-Control for GET /like/count
    pub trust_proxy: bool,           // honour forwarding headers for the client address
}

impl AppState {
    pub fn new(store: Arc<dyn LikeStore>, rate_limiter: RateLimiter) -> Self {
        Self {
            store,
            rate_limiter,
            count_cache_control: "public, s-maxage=10, stale-while-revalidate=30".to_string(),
            trust_proxy: false,
        }
    }

    pub fn with_trust_proxy(mut self, trust_proxy: bool) -> Self {
        self.trust_proxy = trust_proxy;
        self
    }

    pub fn from_args(args: &Args) -> StoreResult<Self> {
        let store: Arc<dyn LikeStore> = match args.storage {
            StorageKind::Sled => Arc::new(SledLikeStore::open(&args.db_path)?),
            StorageKind::Memory => Arc::new(MemoryLikeStore::new()),
        };
        let rate_limiter = RateLimiter::new(args.rate_limit, args.rate_window());

        Ok(Self {
            count_cache_control: args.count_cache_control(),
            trust_proxy: args.trust_proxy,
            ..Self::new(store, rate_limiter)
        })
    }
}
