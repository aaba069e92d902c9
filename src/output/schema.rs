//! SQLite schema for graph exports

/// SQL schema for an exported crawl graph
pub const SCHEMA_SQL: &str = r#"
-- Every registered address; fetched = 0 for ids only seen as link targets
CREATE TABLE IF NOT EXISTS nodes (
    id INTEGER PRIMARY KEY,
    address TEXT NOT NULL UNIQUE,
    payload BLOB,
    fetched INTEGER NOT NULL
);

-- Edge lists in document order
CREATE TABLE IF NOT EXISTS edges (
    from_id INTEGER NOT NULL REFERENCES nodes(id),
    to_id INTEGER NOT NULL REFERENCES nodes(id),
    position INTEGER NOT NULL,
    PRIMARY KEY (from_id, position)
);

CREATE INDEX IF NOT EXISTS idx_edges_to ON edges(to_id);

-- Failures keyed by the failing address
CREATE TABLE IF NOT EXISTS errors (
    address TEXT PRIMARY KEY,
    kind TEXT NOT NULL,
    message TEXT NOT NULL,
    recorded_at TEXT NOT NULL
);
"#;

/// Initializes the export schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
