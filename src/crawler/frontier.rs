//! Crawl frontier
//!
//! Pages discovered but not yet dispatched, handed out breadth-first. A URL
//! is admitted at most once per run: the frontier remembers everything it
//! has ever queued and also refuses URLs the ledger already knows about.

use crate::state::Ledger;
use crate::url::CanonicalUrl;
use std::collections::{HashSet, VecDeque};

/// FIFO work queue of page URLs
#[derive(Debug, Default)]
pub struct Frontier {
    queue: VecDeque<CanonicalUrl>,
    seen: HashSet<CanonicalUrl>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `url` unless it was queued before or already has a ledger record
    ///
    /// # Returns
    ///
    /// `true` if the URL was added
    pub fn push(&mut self, url: CanonicalUrl, ledger: &Ledger) -> bool {
        if self.seen.contains(&url) || ledger.contains(&url) {
            return false;
        }

        self.seen.insert(url.clone());
        self.queue.push_back(url);
        true
    }

    /// Next URL in discovery order
    pub fn pop(&mut self) -> Option<CanonicalUrl> {
        self.queue.pop_front()
    }

    /// Number of URLs waiting to be dispatched
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Number of distinct URLs ever admitted
    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }
}
