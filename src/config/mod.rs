//! Configuration module for Linkweave
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files. Every key is optional; command-line flags are layered on top with
//! [`Config::apply_overrides`] before the final [`validate`] call.
//!
//! # Example
//!
//! ```no_run
//! use linkweave::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("linkweave.toml")).unwrap();
//! println!("Crawler will stop after {} nodes", config.crawler.max_nodes);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    CheckpointConfig, Config, ConfigOverrides, CrawlerConfig, ScopeConfig, UserAgentConfig,
};

// Re-export parser and validation functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
