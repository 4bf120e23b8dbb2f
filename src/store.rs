//! Durable like counters.
//!
//! Every mutation is a single atomic operation evaluated by the backend:
//! sled's `update_and_fetch` CAS loop, or a DashMap entry held under its
//! shard lock. Nothing here reads a count, adds one and writes it back.

use async_trait::async_trait;
use dashmap::DashMap;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

pub const COUNTS_TREE: &str = "like_counts";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage failure: {0}")]
    Storage(#[from] sled::Error),

    #[error("Stored count for post {post_id} is corrupt")]
    Corrupt { post_id: String },
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait LikeStore: Send + Sync {
    /// Add one like, creating the row at 1 when absent. Returns the new count.
    async fn increment(&self, post_id: &str) -> StoreResult<u64>;

    /// Remove one like, floored at 0. A missing row is created at 0.
    async fn decrement(&self, post_id: &str) -> StoreResult<u64>;

    /// Current count, 0 when the post was never liked.
    async fn get_count(&self, post_id: &str) -> StoreResult<u64>;
}

// Sled-backed store: key = post id bytes, value = big-endian u64
#[derive(Debug, Clone)]
pub struct SledLikeStore {
    db: sled::Db,
    counts: sled::Tree,
}

impl SledLikeStore {
    /// Open or create the database
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let db = sled::open(path)?;
        Self::from_db(db)
    }

    // In-memory sled instance, removed on drop
    pub fn temporary() -> StoreResult<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(db)
    }

    fn from_db(db: sled::Db) -> StoreResult<Self> {
        let counts = db.open_tree(COUNTS_TREE)?;
        Ok(Self { db, counts })
    }

    // Applies `step` to the stored count atomically. A corrupt value is left as-is.
    fn apply(&self, post_id: &str, step: fn(u64) -> u64) -> StoreResult<u64> {
        let mut corrupt = false;

        let updated = self.counts.update_and_fetch(post_id.as_bytes(), |old| {
            corrupt = false;
            match old.map(decode_count) {
                None => Some(encode_count(step(0)).to_vec()),
                Some(Some(count)) => Some(encode_count(step(count)).to_vec()),
                Some(None) => {
                    corrupt = true;
                    old.map(|bytes| bytes.to_vec())
                }
            }
        })?;

        if corrupt {
            return Err(StoreError::Corrupt {
                post_id: post_id.to_string(),
            });
        }

        // Flush so an acknowledged like survives a crash. Blocking flush:
        // concurrent `flush_async` callers can stall each other in sled 0.34.
        self.db.flush()?;

        updated
            .as_deref()
            .and_then(decode_count)
            .ok_or_else(|| StoreError::Corrupt {
                post_id: post_id.to_string(),
            })
    }
}

#[async_trait]
impl LikeStore for SledLikeStore {
    async fn increment(&self, post_id: &str) -> StoreResult<u64> {
        let count = self.apply(post_id, |count| count.saturating_add(1))?;
        debug!(post_id, count, "incremented like count");
        Ok(count)
    }

    async fn decrement(&self, post_id: &str) -> StoreResult<u64> {
        let count = self.apply(post_id, |count| count.saturating_sub(1))?;
        debug!(post_id, count, "decremented like count");
        Ok(count)
    }

    async fn get_count(&self, post_id: &str) -> StoreResult<u64> {
        match self.counts.get(post_id.as_bytes())? {
            Some(bytes) => decode_count(&bytes).ok_or_else(|| StoreError::Corrupt {
                post_id: post_id.to_string(),
            }),
            None => Ok(0),
        }
    }
}

fn encode_count(count: u64) -> [u8; 8] {
    count.to_be_bytes()
}

fn decode_count(bytes: &[u8]) -> Option<u64> {
    let raw: [u8; 8] = bytes.try_into().ok()?;
    Some(u64::from_be_bytes(raw))
}

// Process-local store; the entry guard makes each mutation atomic per post
#[derive(Debug, Default)]
pub struct MemoryLikeStore {
    counts: DashMap<String, u64>,
}

impl MemoryLikeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LikeStore for MemoryLikeStore {
    async fn increment(&self, post_id: &str) -> StoreResult<u64> {
        let mut count = self.counts.entry(post_id.to_string()).or_insert(0);
        *count = count.saturating_add(1);
        Ok(*count)
    }

    async fn decrement(&self, post_id: &str) -> StoreResult<u64> {
        let mut count = self.counts.entry(post_id.to_string()).or_insert(0);
        *count = count.saturating_sub(1);
        Ok(*count)
    }

    async fn get_count(&self, post_id: &str) -> StoreResult<u64> {
        Ok(self.counts.get(post_id).map(|count| *count).unwrap_or(0))
    }
}
