use serde::Deserialize;

/// Main configuration structure for Linkweave
///
/// Every section is optional in the TOML file; missing values fall back to
/// the defaults below.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub checkpoint: CheckpointConfig,
    pub scope: ScopeConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Address the crawl starts from
    #[serde(rename = "seed-url")]
    pub seed_url: String,

    /// Stop once this many nodes have been fetched
    #[serde(rename = "max-nodes")]
    pub max_nodes: usize,

    /// Maximum number of concurrently running workers
    #[serde(rename = "worker-count")]
    pub worker_count: usize,

    /// Write a checkpoint every this many newly fetched nodes
    #[serde(rename = "checkpoint-interval")]
    pub checkpoint_interval: usize,

    /// Log progress every this many newly fetched nodes
    #[serde(rename = "progress-interval")]
    pub progress_interval: usize,

    /// Record pages without outbound links as nodes with an empty edge list
    #[serde(rename = "record-dead-ends")]
    pub record_dead_ends: bool,

    /// Keep only the first occurrence of each link target per page
    #[serde(rename = "dedupe-edges")]
    pub dedupe_edges: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            seed_url: "https://en.wikipedia.org/wiki/Wikipedia".to_string(),
            max_nodes: 1000,
            worker_count: 4,
            checkpoint_interval: 100,
            progress_interval: 100,
            record_dead_ends: false,
            dedupe_edges: true,
        }
    }
}

/// Checkpoint storage configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CheckpointConfig {
    /// Directory holding numbered checkpoint files
    pub directory: String,
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            directory: "./checkpoints".to_string(),
        }
    }
}

/// Which addresses are considered crawlable
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScopeConfig {
    /// URL schemes an address may use
    #[serde(rename = "allowed-schemes")]
    pub allowed_schemes: Vec<String>,

    /// Only follow links starting with this prefix
    #[serde(rename = "link-prefix")]
    pub link_prefix: Option<String>,

    /// Drop links whose last path segment contains ':' (e.g. `File:x.png`)
    #[serde(rename = "skip-namespaced")]
    pub skip_namespaced: bool,
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            allowed_schemes: vec!["http".to_string(), "https".to_string()],
            link_prefix: None,
            skip_namespaced: false,
        }
    }
}

/// User agent identification and HTTP client configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Whole-request timeout in seconds
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "linkweave".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://example.com/linkweave".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Values supplied on the command line that take precedence over the file
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub seed_url: Option<String>,
    pub max_nodes: Option<usize>,
    pub worker_count: Option<usize>,
    pub checkpoint_interval: Option<usize>,
    pub checkpoint_dir: Option<String>,
}

impl Config {
    /// Applies command-line overrides on top of the loaded configuration
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(seed) = &overrides.seed_url {
            self.crawler.seed_url = seed.clone();
        }
        if let Some(max_nodes) = overrides.max_nodes {
            self.crawler.max_nodes = max_nodes;
        }
        if let Some(workers) = overrides.worker_count {
            self.crawler.worker_count = workers;
        }
        if let Some(interval) = overrides.checkpoint_interval {
            self.crawler.checkpoint_interval = interval;
        }
        if let Some(dir) = &overrides.checkpoint_dir {
            self.checkpoint.directory = dir.clone();
        }
    }
}
