//! End-of-run report

use crate::checkpoint::CheckpointHandle;
use std::fmt;
use std::time::Duration;

/// Why a crawl stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The fetched node count reached `max-nodes`
    NodeLimit,
    /// No addresses were left to fetch
    FrontierExhausted,
    /// A shutdown was requested
    Cancelled,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NodeLimit => "node limit reached",
            Self::FrontierExhausted => "frontier exhausted",
            Self::Cancelled => "cancelled",
        })
    }
}

/// Summary of a finished crawl session
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// Total nodes in the node store, including ones restored from a checkpoint
    pub nodes_fetched: usize,

    /// Nodes fetched during this run only
    pub nodes_fetched_this_run: usize,

    pub edges: usize,
    pub registered_ids: usize,
    pub errors: usize,
    pub frontier_remaining: usize,
    pub elapsed: Duration,
    pub stop_reason: StopReason,

    /// The checkpoint written when the session ended
    pub final_checkpoint: Option<CheckpointHandle>,
}

/// Prints a crawl report to stdout
pub fn print_report(report: &CrawlReport) {
    println!("=== Crawl Report ===\n");

    println!("Stopped: {}", report.stop_reason);
    println!(
        "  Nodes fetched: {} ({} this run)",
        report.nodes_fetched, report.nodes_fetched_this_run
    );
    println!("  Edges: {}", report.edges);
    println!("  Registered ids: {}", report.registered_ids);
    println!("  Errors: {}", report.errors);
    println!("  Frontier remaining: {}", report.frontier_remaining);
    println!("  Elapsed: {:.2}s", report.elapsed.as_secs_f64());

    if let Some(handle) = &report.final_checkpoint {
        println!(
            "\nFinal checkpoint: #{} at {}",
            handle.sequence_number,
            handle.path.display()
        );
    }
}
