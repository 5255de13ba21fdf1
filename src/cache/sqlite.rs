//! SQLite cache store
//!
//! This module provides a SQLite-based implementation of the CacheStore trait.

use crate::cache::schema::initialize_schema;
use crate::cache::store::CacheStore;
use crate::cache::{CacheError, CacheRecord, CacheResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// SQLite cache backend
///
/// The connection sits behind a mutex; every statement is a single row
/// operation so the lock is held only briefly.
pub struct SqliteCacheStore {
    conn: Mutex<Connection>,
}

impl SqliteCacheStore {
    /// Opens or creates the cache database at `path`
    pub fn open(path: &Path) -> CacheResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        tracing::debug!("Opened response cache at {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory database
    pub fn open_in_memory() -> CacheResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Counts stored records, fresh or not
    pub fn count(&self) -> CacheResult<u64> {
        let count: i64 = self
            .lock()
            .query_row("SELECT COUNT(*) FROM responses", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CacheStore for SqliteCacheStore {
    fn load(&self, key: &str) -> CacheResult<Option<CacheRecord>> {
        let row: Option<(String, String, String)> = self
            .lock()
            .query_row(
                "SELECT url, content, captured_at FROM responses WHERE key = ?1",
                params![key],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()
            .map_err(|e| match e {
                // A row whose columns cannot be read as text is damaged, not a store failure
                rusqlite::Error::InvalidColumnType(..) | rusqlite::Error::FromSqlConversionFailure(..) => {
                    CacheError::Corrupt {
                        key: key.to_string(),
                        reason: e.to_string(),
                    }
                }
                other => CacheError::Sqlite(other),
            })?;

        let Some((url, content, captured_at)) = row else {
            return Ok(None);
        };

        let captured_at = DateTime::parse_from_rfc3339(&captured_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| CacheError::Corrupt {
                key: key.to_string(),
                reason: format!("bad timestamp '{}': {}", captured_at, e),
            })?;

        Ok(Some(CacheRecord {
            key: key.to_string(),
            url,
            content,
            captured_at,
        }))
    }

    fn save(&self, record: &CacheRecord) -> CacheResult<()> {
        self.lock().execute(
            "INSERT OR REPLACE INTO responses (key, url, content, captured_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                record.key,
                record.url,
                record.content,
                record.captured_at.to_rfc3339()
            ],
        )?;
        Ok(())
    }
}
