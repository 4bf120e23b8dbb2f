//! "Have I liked this post" membership, kept in client-local storage.
//!
//! The whole set lives under a single key as a JSON array of post ids.
//! Missing or unreadable data is an empty set, never an error.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::warn;

pub const LIKED_POSTS_KEY: &str = "liked-posts";

// Minimal key-value storage, shaped like a browser's localStorage
pub trait LocalStorage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> io::Result<()>;

    /// Read-modify-write of one key. No other `set` or `update` on the same
    /// storage lands between the read handed to `f` and the write of its result.
    fn update(&self, key: &str, f: &mut dyn FnMut(Option<&str>) -> String) -> io::Result<()>;
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: DashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|v| v.clone())
    }

    fn set(&self, key: &str, value: &str) -> io::Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn update(&self, key: &str, f: &mut dyn FnMut(Option<&str>) -> String) -> io::Result<()> {
        // the entry guard holds the shard lock across read and write
        match self.entries.entry(key.to_string()) {
            Entry::Occupied(mut entry) => {
                let next = f(Some(entry.get().as_str()));
                entry.insert(next);
            }
            Entry::Vacant(entry) => {
                entry.insert(f(None));
            }
        }
        Ok(())
    }
}

// Distinguishes temp files of concurrent writers in one process
static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

// One `<key>.json` file per key under `dir`.
// Clones share one write lock; separate instances over the same dir do not.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            lock: Arc::new(Mutex::new(())),
        }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    fn read(&self, key: &str) -> Option<String> {
        std::fs::read_to_string(self.path(key)).ok()
    }

    fn write(&self, key: &str, value: &str) -> io::Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        // write-then-rename so a crash never leaves half a file behind
        let seq = TMP_SEQ.fetch_add(1, Ordering::Relaxed);
        let tmp = self
            .dir
            .join(format!("{key}.json.{}.{seq}.tmp", std::process::id()));
        if let Err(e) = std::fs::write(&tmp, value) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e);
        }
        std::fs::rename(tmp, self.path(key))
    }
}

impl LocalStorage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        let _guard = self.lock.lock();
        self.read(key)
    }

    fn set(&self, key: &str, value: &str) -> io::Result<()> {
        let _guard = self.lock.lock();
        self.write(key, value)
    }

    fn update(&self, key: &str, f: &mut dyn FnMut(Option<&str>) -> String) -> io::Result<()> {
        let _guard = self.lock.lock();
        let current = self.read(key);
        let next = f(current.as_deref());
        self.write(key, &next)
    }
}

#[derive(Clone)]
pub struct LikedPosts {
    storage: Arc<dyn LocalStorage>,
}

impl LikedPosts {
    pub fn new(storage: Arc<dyn LocalStorage>) -> Self {
        Self { storage }
    }

    /// Liked post ids in first-seen order, duplicates dropped.
    pub fn read(&self) -> Vec<String> {
        parse_ids(self.storage.get(LIKED_POSTS_KEY).as_deref())
    }

    pub fn contains(&self, post_id: &str) -> bool {
        self.read().iter().any(|id| id == post_id)
    }

    /// Add or remove one id. Concurrent calls for different posts all land.
    pub fn set_liked(&self, post_id: &str, liked: bool) -> io::Result<()> {
        self.storage.update(LIKED_POSTS_KEY, &mut |raw| {
            let mut ids = parse_ids(raw);
            ids.retain(|id| id != post_id);
            if liked {
                ids.push(post_id.to_string());
            }
            serde_json::Value::from(ids).to_string()
        })
    }
}

fn parse_ids(raw: Option<&str>) -> Vec<String> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    let ids: Vec<String> = match serde_json::from_str(raw) {
        Ok(ids) => ids,
        Err(e) => {
            warn!(error = %e, "ignoring unreadable liked posts");
            return Vec::new();
        }
    };

    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(id.clone())).collect()
}
