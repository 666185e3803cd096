use crate::config::types::{Config, ScopeConfig};
use crate::config::validation::validate;
use crate::url::normalize;
use crate::{ConfigError, ConfigResult, UrlError};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use sumi_mirror::config::load_config;
///
/// let config = load_config(Path::new("mirror.toml")).unwrap();
/// println!("Max depth: {}", config.crawler.max_depth);
/// ```
pub fn load_config(path: &Path) -> ConfigResult<Config> {
    // Read the configuration file
    let content = std::fs::read_to_string(path)?;

    // Parse TOML
    let config: Config = toml::from_str(&content)?;

    // Validate the configuration
    validate(&config)?;

    Ok(config)
}

/// Resolves the start URL and builds the run scope
///
/// The start URL must be an absolute http or https URL with a host.
pub fn resolve_scope(start_url: &str, config: &Config) -> ConfigResult<ScopeConfig> {
    let root = normalize(start_url, None)
        .map_err(|e| ConfigError::InvalidUrl(e.to_string()))?;

    if !root.scheme().is_web() {
        return Err(ConfigError::InvalidUrl(format!(
            "Only HTTP and HTTPS start URLs are supported, got: {}",
            start_url
        )));
    }

    if root.host().is_empty() {
        return Err(ConfigError::InvalidUrl(
            UrlError::MissingHost(start_url.to_string()).to_string(),
        ));
    }

    validate(config)?;

    Ok(ScopeConfig::new(root, config))
}
