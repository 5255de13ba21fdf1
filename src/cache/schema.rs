//! Cache database schema
//!
//! One row per fetch key. The table is readable without the rest of the
//! system: `key` is the SHA-256 hex of the normalized URL, `captured_at` is
//! RFC 3339 in UTC.

use rusqlite::Connection;

/// SQL schema for the cache database
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS responses (
    key TEXT PRIMARY KEY NOT NULL,
    url TEXT NOT NULL,
    content TEXT NOT NULL,
    captured_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_responses_url ON responses(url);

CREATE TABLE IF NOT EXISTS schema_meta (
    version INTEGER NOT NULL
);
"#;

/// Initializes the cache schema
///
/// Idempotent: running it against an existing cache leaves the data intact.
pub fn initialize_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;

    let versions: i64 = conn.query_row("SELECT COUNT(*) FROM schema_meta", [], |row| row.get(0))?;
    if versions == 0 {
        conn.execute(
            "INSERT INTO schema_meta (version) VALUES (?1)",
            [get_schema_version()],
        )?;
    }

    Ok(())
}

/// Gets the current schema version
pub fn get_schema_version() -> u32 {
    1
}
