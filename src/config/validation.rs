use crate::config::types::{CheckpointConfig, Config, CrawlerConfig, ScopeConfig, UserAgentConfig};
use crate::ConfigError;
use url::Url;

/// Upper bound on concurrently running workers
const MAX_WORKERS: usize = 256;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_scope_config(&config.scope)?;
    validate_crawler_config(&config.crawler, &config.scope)?;
    validate_checkpoint_config(&config.checkpoint)?;
    validate_user_agent_config(&config.user_agent)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig, scope: &ScopeConfig) -> Result<(), ConfigError> {
    if config.worker_count < 1 || config.worker_count > MAX_WORKERS {
        return Err(ConfigError::Validation(format!(
            "worker_count must be between 1 and {}, got {}",
            MAX_WORKERS, config.worker_count
        )));
    }

    if config.max_nodes < 1 {
        return Err(ConfigError::Validation(
            "max_nodes must be >= 1".to_string(),
        ));
    }

    if config.checkpoint_interval < 1 {
        return Err(ConfigError::Validation(
            "checkpoint_interval must be >= 1".to_string(),
        ));
    }

    if config.progress_interval < 1 {
        return Err(ConfigError::Validation(
            "progress_interval must be >= 1".to_string(),
        ));
    }

    let seed = Url::parse(&config.seed_url).map_err(|e| {
        ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", config.seed_url, e))
    })?;

    if !scope
        .allowed_schemes
        .iter()
        .any(|scheme| scheme == seed.scheme())
    {
        return Err(ConfigError::Validation(format!(
            "Seed URL '{}' uses scheme '{}', allowed: {:?}",
            config.seed_url,
            seed.scheme(),
            scope.allowed_schemes
        )));
    }

    Ok(())
}

/// Validates scope configuration
fn validate_scope_config(config: &ScopeConfig) -> Result<(), ConfigError> {
    if config.allowed_schemes.is_empty() {
        return Err(ConfigError::Validation(
            "allowed_schemes cannot be empty".to_string(),
        ));
    }

    for scheme in &config.allowed_schemes {
        if scheme.is_empty()
            || !scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '-' || c == '.')
        {
            return Err(ConfigError::Validation(format!(
                "Invalid scheme '{}' in allowed_schemes",
                scheme
            )));
        }
    }

    if let Some(prefix) = &config.link_prefix {
        Url::parse(prefix).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid link_prefix '{}': {}", prefix, e))
        })?;
    }

    Ok(())
}

/// Validates checkpoint configuration
fn validate_checkpoint_config(config: &CheckpointConfig) -> Result<(), ConfigError> {
    if config.directory.trim().is_empty() {
        return Err(ConfigError::Validation(
            "checkpoint directory cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeout_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_worker_count_bounds() {
        let mut config = Config::default();
        config.crawler.worker_count = 0;
        assert!(matches!(validate(&config), Err(ConfigError::Validation(_))));

        config.crawler.worker_count = MAX_WORKERS + 1;
        assert!(matches!(validate(&config), Err(ConfigError::Validation(_))));

        config.crawler.worker_count = MAX_WORKERS;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_intervals_must_be_positive() {
        let mut config = Config::default();
        config.crawler.checkpoint_interval = 0;
        assert!(validate(&config).is_err());

        let mut config = Config::default();
        config.crawler.progress_interval = 0;
        assert!(validate(&config).is_err());

        let mut config = Config::default();
        config.crawler.max_nodes = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_seed_must_parse_and_match_scheme() {
        let mut config = Config::default();
        config.crawler.seed_url = "not a url".to_string();
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));

        config.crawler.seed_url = "ftp://example.com/file".to_string();
        assert!(matches!(validate(&config), Err(ConfigError::Validation(_))));

        config.scope.allowed_schemes.push("ftp".to_string());
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_scope_validation() {
        let mut config = Config::default();
        config.scope.allowed_schemes.clear();
        assert!(validate(&config).is_err());

        let mut config = Config::default();
        config.scope.link_prefix = Some("::nope".to_string());
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn test_crawler_name_characters() {
        let mut config = Config::default();
        config.user_agent.crawler_name = "bad name!".to_string();
        assert!(validate(&config).is_err());

        config.user_agent.crawler_name = "good-name2".to_string();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_empty_checkpoint_directory() {
        let mut config = Config::default();
        config.checkpoint.directory = "  ".to_string();
        assert!(validate(&config).is_err());
    }
}
