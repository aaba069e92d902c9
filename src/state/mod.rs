//! State module for the shared crawl state
//!
//! # Components
//!
//! - `IdRegistry`: assigns stable ids to addresses in first-seen order
//! - `Frontier`: FIFO queue of addresses awaiting processing
//! - `VisitedSet`: claim-before-fetch bookkeeping of processed addresses
//! - `ErrorLog`: failures keyed by the failing address
//! - `CrawlSession`: all of the above plus the graph and node stores

mod error_log;
mod frontier;
mod registry;
mod session;
mod visited;

// Re-export main types
pub use error_log::{ErrorLog, ErrorRecord, FailureKind};
pub use frontier::Frontier;
pub use registry::{Assignment, IdRegistry};
pub use session::CrawlSession;
pub use visited::VisitedSet;

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Locks a mutex, recovering the data if a previous holder panicked
///
/// Every guarded structure is updated in single statements, so a poisoned
/// lock never holds a half-applied change.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
