//! Response cache module
//!
//! Raw responses are cached by fetch key (see [`crate::url::fetch_key`]) with a
//! fixed time-to-live. The cache sits on top of a pluggable [`CacheStore`]:
//! - `MemoryCacheStore`: process-local, used when no cache path is configured
//! - `SqliteCacheStore`: a plain key -> record table on disk
//!
//! Expiry is lazy: an entry older than the TTL is reported as a miss but left
//! in place until the key is fetched again and overwritten. A record that
//! cannot be read back is also a miss; the cache never surfaces store errors
//! to the fetch path.

mod schema;
mod sqlite;
mod store;

pub use sqlite::SqliteCacheStore;
pub use store::{CacheStore, MemoryCacheStore};

use chrono::{DateTime, Duration, Utc};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised by cache stores
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Corrupt cache entry for key {key}: {reason}")]
    Corrupt { key: String, reason: String },
}

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;

/// One stored response
#[derive(Debug, Clone, PartialEq)]
pub struct CacheRecord {
    /// SHA-256 fetch key of the normalized URL
    pub key: String,

    /// The normalized URL the content was fetched from
    pub url: String,

    /// Raw response body
    pub content: String,

    /// When the response was fetched
    pub captured_at: DateTime<Utc>,
}

impl CacheRecord {
    pub fn new(key: impl Into<String>, url: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            url: url.into(),
            content: content.into(),
            captured_at: Utc::now(),
        }
    }

    /// Returns how long ago the record was captured
    pub fn age(&self) -> Duration {
        Utc::now() - self.captured_at
    }

    /// Checks whether the record is still inside the TTL window
    ///
    /// An age exactly equal to the TTL still counts as fresh.
    pub fn is_fresh(&self, ttl: Duration) -> bool {
        self.age() <= ttl
    }
}

/// TTL cache over a shared record store
///
/// Cloning is cheap and clones share the same store, so one cache can be
/// handed to several fetchers.
#[derive(Clone)]
pub struct ResponseCache {
    store: Arc<dyn CacheStore>,
    ttl: Duration,
}

impl ResponseCache {
    /// Default time-to-live for cached responses
    pub const DEFAULT_TTL_HOURS: i64 = 24;

    /// Creates a cache over an arbitrary store
    pub fn with_store(store: Arc<dyn CacheStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// Creates a process-local cache
    pub fn in_memory(ttl: Duration) -> Self {
        Self::with_store(Arc::new(MemoryCacheStore::new()), ttl)
    }

    /// Opens (or creates) an SQLite-backed cache
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    /// * `ttl` - Maximum age of an entry that is still served
    ///
    /// # Returns
    ///
    /// * `Ok(ResponseCache)` - Successfully opened store
    /// * `Err(CacheError)` - The database could not be opened or initialized
    pub fn open(path: &Path, ttl: Duration) -> CacheResult<Self> {
        let store = SqliteCacheStore::open(path)?;
        Ok(Self::with_store(Arc::new(store), ttl))
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the cached content for `key` if present and fresh
    pub fn get(&self, key: &str) -> Option<String> {
        match self.store.load(key) {
            Ok(Some(record)) if record.is_fresh(self.ttl) => {
                tracing::debug!(key, url = %record.url, "Cache hit");
                Some(record.content)
            }
            Ok(Some(record)) => {
                tracing::debug!(
                    key,
                    url = %record.url,
                    age_minutes = record.age().num_minutes(),
                    "Cache entry expired"
                );
                None
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(key, "Treating unreadable cache entry as a miss: {}", e);
                None
            }
        }
    }

    /// Stores or overwrites the content for `key`
    ///
    /// Failures are logged; a write that does not land only costs a refetch.
    pub fn put(&self, key: &str, url: &str, content: &str) {
        let record = CacheRecord::new(key, url, content);
        if let Err(e) = self.store.save(&record) {
            tracing::warn!(key, url, "Failed to write cache entry: {}", e);
        }
    }
}

impl std::fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache")
            .field("ttl_hours", &self.ttl.num_hours())
            .finish_non_exhaustive()
    }
}
