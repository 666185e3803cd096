use crate::url::CanonicalUrl;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for Sumi-Mirror
///
/// Every section and key is optional in the TOML file; missing values fall
/// back to the defaults below, and command-line flags override both.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Directory levels a page link may descend below the start URL's
    /// directory; negative values widen the window upward instead
    #[serde(rename = "max-depth")]
    pub max_depth: i32,

    /// Number of pages fetched concurrently
    pub workers: u32,

    /// Per-request timeout (seconds)
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Cancel the run after this many page fetches fail in a row (0 disables)
    #[serde(rename = "max-consecutive-failures")]
    pub max_consecutive_failures: u32,

    /// Cancel the run once it has been going for this long (seconds)
    #[serde(rename = "run-timeout-secs")]
    pub run_timeout_secs: Option<u64>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_depth: 0,
            workers: 4,
            timeout_secs: 10,
            max_consecutive_failures: 0,
            run_timeout_secs: None,
        }
    }
}

/// User agent identification configuration
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
    pub contact_url: Option<String>,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "SumiMirror".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: None,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Root directory mirrored resources are written under
    pub directory: PathBuf,

    /// File name used for URLs whose path is empty or ends with `/`
    #[serde(rename = "index-filename")]
    pub index_filename: String,

    /// File name of the per-host failure report
    #[serde(rename = "failed-report")]
    pub failed_report: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("output"),
            index_filename: "index.html".to_string(),
            failed_report: "failed.txt".to_string(),
        }
    }
}

/// Immutable per-run scope: where the crawl starts, how far it may go and
/// where it writes
#[derive(Debug, Clone)]
pub struct ScopeConfig {
    /// Normalized start URL
    pub root: CanonicalUrl,

    /// Signed depth window for page links
    pub max_depth: i32,

    /// Output root directory
    pub output_root: PathBuf,

    /// Per-request timeout
    pub timeout: Duration,
}

impl ScopeConfig {
    /// Builds the run scope from a start URL and the loaded configuration
    pub fn new(root: CanonicalUrl, config: &Config) -> Self {
        Self {
            root,
            max_depth: config.crawler.max_depth,
            output_root: config.output.directory.clone(),
            timeout: Duration::from_secs(config.crawler.timeout_secs),
        }
    }
}
