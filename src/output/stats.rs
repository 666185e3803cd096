//! Run statistics
//!
//! This module provides the summary produced when a crawl reaches `Done`
//! and the formatted console report printed by the binary.

use crate::url::CanonicalUrl;
use chrono::{DateTime, Utc};
use std::path::PathBuf;

/// Outcome of one complete crawl run
#[derive(Debug, Clone)]
pub struct CrawlSummary {
    /// Normalized start URL
    pub root: CanonicalUrl,

    /// When the driver left `Idle`
    pub started_at: DateTime<Utc>,

    /// When the driver reached `Done`
    pub finished_at: DateTime<Utc>,

    /// Pages fetched (and parsed when parseable) successfully
    pub pages_crawled: u64,

    /// Pages whose own fetch failed
    pub pages_failed: u64,

    /// Embedded resources fetched during this run
    pub media_fetched: u64,

    /// Every URL recorded as failed, sorted
    pub failed: Vec<CanonicalUrl>,

    /// True when the run stopped early (interrupt, failure limit or deadline)
    pub cancelled: bool,

    /// Where the failure report was written, if it could be
    pub report_path: Option<PathBuf>,
}

impl CrawlSummary {
    /// Wall-clock duration of the run in seconds
    pub fn duration_seconds(&self) -> i64 {
        (self.finished_at - self.started_at).num_seconds()
    }

    /// Resources written to disk
    pub fn total_fetched(&self) -> u64 {
        self.pages_crawled + self.media_fetched
    }

    /// Share of attempted resources that were fetched, in percent
    pub fn success_rate(&self) -> f64 {
        let attempted = self.total_fetched() + self.failed.len() as u64;
        if attempted == 0 {
            return 0.0;
        }
        (self.total_fetched() as f64 / attempted as f64) * 100.0
    }
}

/// Prints a summary to stdout in a formatted manner
///
/// # Arguments
///
/// * `summary` - The summary to display
pub fn print_summary(summary: &CrawlSummary) {
    println!("=== Mirror Summary ===\n");

    println!("Overview:");
    println!("  Root: {}", summary.root);
    println!(
        "  Started: {}",
        summary.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!("  Duration: {}s", summary.duration_seconds());
    if summary.cancelled {
        println!("  Status: cancelled before the frontier was exhausted");
    } else {
        println!("  Status: completed");
    }
    println!();

    println!("Resources:");
    println!("  Pages crawled: {}", summary.pages_crawled);
    println!("  Media fetched: {}", summary.media_fetched);
    println!("  Failed: {}", summary.failed.len());
    println!();

    if !summary.failed.is_empty() {
        println!("Failed URLs ({}):", summary.failed.len());
        for url in summary.failed.iter().take(20) {
            println!("  - {}", url);
        }
        if summary.failed.len() > 20 {
            println!("  ... and {} more", summary.failed.len() - 20);
        }
        println!();
    }

    if let Some(path) = &summary.report_path {
        println!("Failure report: {}", path.display());
    }

    println!(
        "Success Rate: {:.1}% ({} / {} resources fetched)",
        summary.success_rate(),
        summary.total_fetched(),
        summary.total_fetched() + summary.failed.len() as u64
    );
}
