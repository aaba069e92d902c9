//! SQLite export of a crawl snapshot
//!
//! Writes the registry, node payloads, edge lists and error log into a
//! queryable database. Exporting into an existing file replaces its contents.

use crate::checkpoint::Snapshot;
use crate::output::schema::initialize_schema;
use rusqlite::{params, Connection};
use std::path::Path;

/// Row counts written by an export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExportSummary {
    pub nodes: usize,
    pub edges: usize,
    pub errors: usize,
}

/// Exports a snapshot to the SQLite database at `path`
///
/// # Arguments
///
/// * `snapshot` - The crawl state to export
/// * `path` - Database file, created if missing
///
/// # Returns
///
/// * `Ok(ExportSummary)` - Rows written per table
/// * `Err(rusqlite::Error)` - The database could not be written
pub fn export_sqlite(snapshot: &Snapshot, path: &Path) -> Result<ExportSummary, rusqlite::Error> {
    let mut conn = Connection::open(path)?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    let summary = export_into(snapshot, &mut conn)?;

    tracing::info!(
        "Exported {} nodes, {} edges and {} errors to {}",
        summary.nodes,
        summary.edges,
        summary.errors,
        path.display()
    );
    Ok(summary)
}

fn export_into(snapshot: &Snapshot, conn: &mut Connection) -> Result<ExportSummary, rusqlite::Error> {
    initialize_schema(conn)?;

    let tx = conn.transaction()?;
    tx.execute_batch("DELETE FROM edges; DELETE FROM errors; DELETE FROM nodes;")?;

    let mut summary = ExportSummary::default();
    {
        let mut insert_node = tx.prepare(
            "INSERT INTO nodes (id, address, payload, fetched) VALUES (?1, ?2, ?3, ?4)",
        )?;
        for (address, &id) in &snapshot.id_registry {
            let record = snapshot.nodes.get(&id);
            insert_node.execute(params![
                id,
                address,
                record.map(|r| r.payload.as_slice()),
                record.is_some()
            ])?;
            summary.nodes += 1;
        }

        let mut insert_edge =
            tx.prepare("INSERT INTO edges (from_id, to_id, position) VALUES (?1, ?2, ?3)")?;
        for (&from_id, targets) in &snapshot.graph {
            for (position, &to_id) in targets.iter().enumerate() {
                insert_edge.execute(params![from_id, to_id, position])?;
                summary.edges += 1;
            }
        }

        let mut insert_error = tx.prepare(
            "INSERT INTO errors (address, kind, message, recorded_at) VALUES (?1, ?2, ?3, ?4)",
        )?;
        for (address, record) in &snapshot.errors {
            insert_error.execute(params![
                address,
                record.kind.as_str(),
                record.message,
                record.recorded_at.to_rfc3339()
            ])?;
            summary.errors += 1;
        }
    }
    tx.commit()?;

    Ok(summary)
}
