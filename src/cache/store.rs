//! Cache store trait and the in-memory implementation

use crate::cache::{CacheRecord, CacheResult};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Trait for cache record backends
///
/// Implementations must be safe to share between tasks. A write must be
/// atomic from a reader's point of view: a concurrent `load` sees either the
/// previous record or the new one, never a mix. Concurrent writes to the same
/// key are last-writer-wins.
pub trait CacheStore: Send + Sync {
    /// Loads the record stored under `key`
    ///
    /// Returns `Ok(None)` when no record exists and `Err` when one exists but
    /// cannot be decoded.
    fn load(&self, key: &str) -> CacheResult<Option<CacheRecord>>;

    /// Stores or replaces the record under `record.key`
    fn save(&self, record: &CacheRecord) -> CacheResult<()>;
}

/// Process-local store backed by a `HashMap`
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    records: RwLock<HashMap<String, CacheRecord>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CacheStore for MemoryCacheStore {
    fn load(&self, key: &str) -> CacheResult<Option<CacheRecord>> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        Ok(records.get(key).cloned())
    }

    fn save(&self, record: &CacheRecord) -> CacheResult<()> {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        records.insert(record.key.clone(), record.clone());
        Ok(())
    }
}
