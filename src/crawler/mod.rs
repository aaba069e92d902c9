//! Crawler module for fetching and processing resources
//!
//! This module contains the core crawling logic, including:
//! - The collaborator traits the engine fetches and extracts through
//! - HTTP fetching and HTML link / JSON-LD payload extraction
//! - Per-address processing by workers
//! - Overall crawl coordination

pub mod collaborators;
mod coordinator;
mod fetcher;
mod parser;
mod worker;

pub use collaborators::{
    Collaborators, ExtractError, FailureCause, FetchError, Fetcher, LinkExtractor,
    PayloadExtractor,
};
pub use coordinator::{
    open_session, run_crawl, Coordinator, OrchestratorState, ResumeFrom, ShutdownHandle,
};
pub use fetcher::{build_http_client, HttpFetcher};
pub use parser::{HtmlLinkExtractor, JsonLdPayloadExtractor};
pub use worker::{ProcessResult, Worker, WorkerPolicy};
