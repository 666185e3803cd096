//! Sumi-Mirror: a scope-limited website mirror
//!
//! This crate implements a web crawler that downloads every page and embedded
//! resource reachable from a starting URL, staying on the starting host and
//! within a configurable path-depth boundary, and writes each resource to disk
//! exactly once.

pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod storage;
pub mod url;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Sumi-Mirror operations
///
/// Fetch, ledger and storage failures never surface here; they are recorded
/// per resource and reported in the [`CrawlSummary`].
#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Configuration-specific errors
///
/// These are the only errors that abort a run, and they always do so before
/// the first fetch.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid start URL: {0}")]
    InvalidUrl(String),

    #[error("Output root {path} is not usable: {source}")]
    OutputRoot {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// URL-specific errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UrlError {
    #[error("Malformed URL: {0}")]
    Malformed(String),

    #[error("Missing host in URL: {0}")]
    MissingHost(String),

    #[error("URL out of scope: {0}")]
    OutOfScope(String),
}

/// Errors produced while fetching and persisting a single resource
///
/// None of these are fatal to a crawl: the failing URL is recorded in the
/// ledger and the driver moves on.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network error for {url}: {message}")]
    Network { url: String, message: String },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Failed to store {url}: {source}")]
    WriteFailure {
        url: String,
        source: storage::StorageError,
    },

    #[error("{url} already failed earlier in this run: {reason}")]
    PreviouslyFailed { url: String, reason: String },

    #[error("Crawl cancelled before {url} was fetched")]
    Cancelled { url: String },

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

/// Errors raised by invalid ledger transitions
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("No ledger record for {0}")]
    Unknown(String),

    #[error("Invalid state transition for {url}: {from} -> {to}")]
    InvalidTransition {
        url: String,
        from: state::ResourceState,
        to: state::ResourceState,
    },
}

/// Result type alias for Sumi-Mirror operations
pub type Result<T> = std::result::Result<T, MirrorError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

/// Result type alias for fetch operations
pub type FetchResult<T> = std::result::Result<T, FetchError>;

// Re-export commonly used types
pub use config::{Config, ScopeConfig};
pub use state::{Ledger, ResourceState};
pub use crate::url::{is_in_scope, normalize, CanonicalUrl, DepthCheck};
pub use crawler::{run_crawl, Coordinator};
pub use output::CrawlSummary;
