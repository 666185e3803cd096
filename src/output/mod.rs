//! Output module for crawl summaries
//!
//! The mirrored files and the failure report are written by the storage
//! layer; this module only covers what is reported back to the user.

pub mod stats;

pub use stats::{print_summary, CrawlSummary};
