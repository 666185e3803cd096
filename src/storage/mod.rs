//! Storage module for persisting mirrored resources
//!
//! This module handles everything written to disk during a crawl:
//! - Mapping canonical URLs onto the output directory layout
//! - Atomic resource writes (temp file + rename)
//! - The per-host failure report

mod filesystem;
mod traits;

pub use filesystem::{write_atomic, FileStorage};
pub use traits::{Storage, StorageError, StorageResult};
