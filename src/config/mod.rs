//! Configuration module for Sumi-Mirror
//!
//! This module handles loading, parsing, and validating the optional TOML
//! configuration file, and turning it plus a start URL into a run scope.
//!
//! # Example
//!
//! ```no_run
//! use sumi_mirror::config::{load_config, resolve_scope};
//! use std::path::Path;
//!
//! let config = load_config(Path::new("mirror.toml")).unwrap();
//! let scope = resolve_scope("https://example.com/docs/", &config).unwrap();
//! println!("Mirroring {} with max depth {}", scope.root, scope.max_depth);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, OutputConfig, ScopeConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{load_config, resolve_scope};
pub use validation::validate;
