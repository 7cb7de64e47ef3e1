//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the WebGenome database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One row per host name
CREATE TABLE IF NOT EXISTS domains (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    parent_domain INTEGER REFERENCES domains(id),
    skipped INTEGER NOT NULL DEFAULT 0,
    last_checked TEXT
);

CREATE INDEX IF NOT EXISTS idx_domains_pending ON domains(skipped, last_checked);
CREATE INDEX IF NOT EXISTS idx_domains_parent ON domains(parent_domain);

-- Captured response headers, one row per (key, value) pair
CREATE TABLE IF NOT EXISTS domain_headers (
    domain_id INTEGER NOT NULL REFERENCES domains(id) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    key TEXT NOT NULL,
    value TEXT NOT NULL,
    PRIMARY KEY (domain_id, position)
);

CREATE INDEX IF NOT EXISTS idx_domain_headers_key ON domain_headers(key);
"#;

/// SQL predicate selecting domains that have never been attempted
///
/// Expects the `domains` table to be aliased as `d`.
pub const UNPROCESSED_PREDICATE: &str = "d.skipped = 0 AND d.last_checked IS NULL \
     AND NOT EXISTS (SELECT 1 FROM domain_headers h WHERE h.domain_id = d.id)";

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

/// Gets the current schema version
pub fn get_schema_version() -> u32 {
    1
}
