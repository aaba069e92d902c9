//! Deterministic in-memory web shared by the integration tests
//!
//! A fixture page's content is its payload on the first line followed by one
//! outbound address per line. A payload of `-` makes payload extraction fail.

#![allow(dead_code)]

use async_trait::async_trait;
use linkweave::checkpoint::CheckpointManager;
use linkweave::config::{Config, CrawlerConfig};
use linkweave::crawler::{
    open_session, Collaborators, Coordinator, ExtractError, FetchError, Fetcher, LinkExtractor,
    PayloadExtractor, ResumeFrom, ShutdownHandle,
};
use linkweave::url::AddressScheme;
use linkweave::{Address, Snapshot};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const SITE: &str = "https://site.test/";

/// Full address of a fixture page
pub fn addr(name: &str) -> Address {
    format!("{}{}", SITE, name)
}

#[derive(Debug, Clone)]
enum Page {
    Content(String),
    Status(u16),
}

/// In-memory web that counts every fetch
#[derive(Default)]
pub struct FixtureWeb {
    pages: HashMap<Address, Page>,
    fetch_counts: Mutex<HashMap<Address, usize>>,
    total_fetches: AtomicUsize,
    delay: Duration,
    shutdown_after: Mutex<Option<(usize, ShutdownHandle)>>,
}

impl FixtureWeb {
    /// Builds a web from `(page, links)` pairs; every page has a payload
    pub fn new(graph: &[(&str, &[&str])]) -> Self {
        let mut web = Self::default();
        for (name, links) in graph {
            web.add_page(name, &format!("{{\"page\":\"{}\"}}", name), links);
        }
        web
    }

    pub fn add_page(&mut self, name: &str, payload: &str, links: &[&str]) {
        let mut content = payload.to_string();
        for link in links {
            content.push('\n');
            content.push_str(&addr(link));
        }
        self.pages.insert(addr(name), Page::Content(content));
    }

    pub fn add_status(&mut self, name: &str, status: u16) {
        self.pages.insert(addr(name), Page::Status(status));
    }

    /// Sleeps before answering each fetch so workers overlap
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Requests a shutdown once `fetches` fetches have started
    pub fn shutdown_after(&self, fetches: usize, handle: ShutdownHandle) {
        *self.shutdown_after.lock().unwrap() = Some((fetches, handle));
    }

    pub fn fetches_of(&self, name: &str) -> usize {
        self.fetch_counts
            .lock()
            .unwrap()
            .get(&addr(name))
            .copied()
            .unwrap_or(0)
    }

    pub fn fetch_counts(&self) -> HashMap<Address, usize> {
        self.fetch_counts.lock().unwrap().clone()
    }

    pub fn total_fetches(&self) -> usize {
        self.total_fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for FixtureWeb {
    async fn fetch(&self, address: &str) -> Result<String, FetchError> {
        *self
            .fetch_counts
            .lock()
            .unwrap()
            .entry(address.to_string())
            .or_insert(0) += 1;
        let started = self.total_fetches.fetch_add(1, Ordering::SeqCst) + 1;

        if let Some((after, handle)) = self.shutdown_after.lock().unwrap().as_ref() {
            if started >= *after {
                handle.shutdown();
            }
        }

        if self.delay.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(self.delay).await;
        }

        match self.pages.get(address) {
            Some(Page::Content(content)) => Ok(content.clone()),
            Some(Page::Status(status)) => Err(FetchError::Status {
                address: address.to_string(),
                status: *status,
            }),
            None => Err(FetchError::Status {
                address: address.to_string(),
                status: 404,
            }),
        }
    }
}

pub struct LineLinks;

impl LinkExtractor for LineLinks {
    fn extract_links(&self, content: &str, _base: &str) -> Vec<Address> {
        content.lines().skip(1).map(str::to_string).collect()
    }
}

pub struct FirstLinePayload;

impl PayloadExtractor for FirstLinePayload {
    fn extract_payload(&self, content: &str) -> Result<Vec<u8>, ExtractError> {
        match content.lines().next() {
            Some("-") | None => Err(ExtractError::MissingBlock),
            Some(line) => Ok(line.as_bytes().to_vec()),
        }
    }
}

pub fn collaborators(web: &Arc<FixtureWeb>) -> Collaborators {
    Collaborators::new(web.clone(), Arc::new(LineLinks), Arc::new(FirstLinePayload))
}

pub fn config(seed: &str, crawler: CrawlerConfig, checkpoint_dir: &Path) -> Config {
    let mut config = Config::default();
    config.crawler = CrawlerConfig {
        seed_url: addr(seed),
        ..crawler
    };
    config.checkpoint.directory = checkpoint_dir.display().to_string();
    config
}

pub fn settings(max_nodes: usize, worker_count: usize) -> CrawlerConfig {
    CrawlerConfig {
        max_nodes,
        worker_count,
        ..CrawlerConfig::default()
    }
}

/// Builds a coordinator over the fixture web, resuming as requested
pub fn coordinator(web: &Arc<FixtureWeb>, config: &Config, resume: &ResumeFrom) -> Coordinator {
    let mut checkpoints =
        CheckpointManager::new(&config.checkpoint.directory, AddressScheme::http()).unwrap();
    let session = open_session(config, resume, &mut checkpoints).unwrap();
    Coordinator::new(
        config.crawler.clone(),
        Arc::new(session),
        collaborators(web),
        checkpoints,
    )
}

/// The graph with ids replaced by addresses, comparable across id orders
pub fn address_graph(snapshot: &Snapshot) -> BTreeMap<Address, Vec<Address>> {
    let by_id: HashMap<u64, &Address> = snapshot
        .id_registry
        .iter()
        .map(|(address, &id)| (id, address))
        .collect();

    snapshot
        .graph
        .iter()
        .map(|(id, targets)| {
            (
                by_id[id].clone(),
                targets.iter().map(|t| by_id[t].clone()).collect(),
            )
        })
        .collect()
}
