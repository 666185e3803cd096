//! Filesystem mirror storage
//!
//! Resources are laid out as `<root>/<host dir>/<url path>`. The host dir is
//! the host, or `<host>_<port>` when the URL carries a non-default port. A
//! path that is empty or ends with `/` gets the configured index file name.
//!
//! Every write goes through a temporary file in the destination directory
//! that is renamed into place, so a reader never sees a partial file.

use crate::storage::{Storage, StorageError, StorageResult};
use crate::url::CanonicalUrl;
use crate::ConfigError;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Mirror storage rooted at a local directory
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
    index_filename: String,
    report_filename: String,
}

impl FileStorage {
    /// Opens (creating if needed) the output root
    ///
    /// # Returns
    ///
    /// * `Ok(FileStorage)` - The root is a directory a file was just written to
    /// * `Err(ConfigError::OutputRoot)` - The root cannot be created or written
    pub fn open(
        root: impl Into<PathBuf>,
        index_filename: impl Into<String>,
        report_filename: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let root = root.into();

        std::fs::create_dir_all(&root).map_err(|source| ConfigError::OutputRoot {
            path: root.clone(),
            source,
        })?;

        // A real write; mode bits miss immutable dirs and read-only mounts
        NamedTempFile::new_in(&root)
            .and_then(|scratch| scratch.close())
            .map_err(|source| ConfigError::OutputRoot {
                path: root.clone(),
                source,
            })?;

        Ok(Self {
            root,
            index_filename: index_filename.into(),
            report_filename: report_filename.into(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/<host dir>` for the given URL
    pub fn host_root(&self, url: &CanonicalUrl) -> StorageResult<PathBuf> {
        if url.host().is_empty() {
            return Err(StorageError::MissingHost(url.to_string()));
        }

        let host_dir = match url.port() {
            Some(port) => format!("{}_{}", url.host(), port),
            None => url.host().to_string(),
        };

        Ok(self.root.join(host_dir))
    }
}

impl Storage for FileStorage {
    fn path_for(&self, url: &CanonicalUrl) -> StorageResult<PathBuf> {
        let mut path = self.host_root(url)?;

        if let Some(segments) = url.as_url().path_segments() {
            for segment in segments.filter(|s| !s.is_empty()) {
                if segment == "." || segment == ".." || segment.contains('\\') {
                    return Err(StorageError::UnsafePath {
                        url: url.to_string(),
                        segment: segment.to_string(),
                    });
                }
                path.push(segment);
            }
        }

        if url.is_directory() {
            path.push(&self.index_filename);
        }

        Ok(path)
    }

    fn write(&self, url: &CanonicalUrl, body: &[u8]) -> StorageResult<PathBuf> {
        let path = self.path_for(url)?;
        write_atomic(&path, body)?;
        Ok(path)
    }

    fn write_failure_report(
        &self,
        root: &CanonicalUrl,
        failed: &[CanonicalUrl],
    ) -> StorageResult<PathBuf> {
        let path = self.host_root(root)?.join(&self.report_filename);

        let mut contents = String::new();
        for url in failed {
            contents.push_str(url.as_str());
            contents.push('\n');
        }

        write_atomic(&path, contents.as_bytes())?;
        Ok(path)
    }
}

/// Writes `body` to `path` through a temporary sibling file and a rename
///
/// Missing parent directories are created; a directory created concurrently
/// by another writer is not an error.
pub fn write_atomic(path: &Path, body: &[u8]) -> StorageResult<()> {
    let dir = path
        .parent()
        .ok_or_else(|| StorageError::io(path, std::io::ErrorKind::InvalidInput.into()))?;

    std::fs::create_dir_all(dir).map_err(|e| StorageError::io(dir, e))?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| StorageError::io(dir, e))?;
    tmp.write_all(body).map_err(|e| StorageError::io(tmp.path(), e))?;
    tmp.flush().map_err(|e| StorageError::io(tmp.path(), e))?;

    // The temp file is removed on drop if the rename fails
    tmp.persist(path)
        .map_err(|e| StorageError::io(path, e.error))?;

    Ok(())
}
