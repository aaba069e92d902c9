//! Output module for reporting and exporting crawl results
//!
//! This module handles:
//! - The end-of-run `CrawlReport`
//! - Statistics of a checkpoint for `--inspect`
//! - Exporting a snapshot to SQLite

mod report;
mod schema;
mod sqlite_export;
pub mod stats;

pub use report::{print_report, CrawlReport, StopReason};
pub use schema::initialize_schema;
pub use sqlite_export::{export_sqlite, ExportSummary};
pub use stats::{print_statistics, SnapshotStatistics};
