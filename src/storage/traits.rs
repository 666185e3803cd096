//! Storage traits and error types
//!
//! This module defines the trait interface for output backends and
//! associated error types.

use crate::url::CanonicalUrl;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("URL has no host: {0}")]
    MissingHost(String),

    #[error("Refusing unsafe path segment '{segment}' in {url}")]
    UnsafePath { url: String, segment: String },

    #[error("Storage task failed: {0}")]
    Task(String),
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for output backend implementations
///
/// Implementations are shared between worker tasks and must be safe to call
/// concurrently, including for resources that share parent directories.
/// Calls may block; async callers run them on the blocking pool.
pub trait Storage: Send + Sync {
    /// Returns the location a resource is written to
    fn path_for(&self, url: &CanonicalUrl) -> StorageResult<PathBuf>;

    /// Writes a resource's bytes, replacing any previous content atomically
    ///
    /// # Returns
    ///
    /// The path the resource was written to
    fn write(&self, url: &CanonicalUrl, body: &[u8]) -> StorageResult<PathBuf>;

    /// Writes the end-of-run failure report for the host of `root`, one URL
    /// per line
    fn write_failure_report(
        &self,
        root: &CanonicalUrl,
        failed: &[CanonicalUrl],
    ) -> StorageResult<PathBuf>;
}
