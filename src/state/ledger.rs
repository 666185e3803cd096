//! The run-scoped resource ledger
//!
//! The ledger is the single source of truth for whether a URL has been
//! fetched, is being fetched, or failed. `try_claim` is the only way to start
//! a fetch, which makes it the one synchronization point guaranteeing at most
//! one network request per canonical URL.

use crate::state::{ContentKind, ResourceRecord, ResourceState};
use crate::url::CanonicalUrl;
use crate::LedgerError;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;

/// Outcome of [`Ledger::try_claim`]
#[derive(Debug, Clone)]
pub enum Claim {
    /// The caller now owns the fetch and must settle it
    Claimed,

    /// Someone else claimed the URL first; carries the record as it was
    AlreadyClaimed(ResourceRecord),
}

/// Visited / in-flight / failed bookkeeping for one crawl run
#[derive(Debug, Default)]
pub struct Ledger {
    records: Mutex<HashMap<CanonicalUrl, ResourceRecord>>,
    settled: Notify,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    fn records(&self) -> MutexGuard<'_, HashMap<CanonicalUrl, ResourceRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Atomically moves `url` from absent to `Pending`
    pub fn try_claim(&self, url: &CanonicalUrl) -> Claim {
        let mut records = self.records();
        match records.get(url) {
            Some(record) => Claim::AlreadyClaimed(record.clone()),
            None => {
                records.insert(url.clone(), ResourceRecord::Pending);
                Claim::Claimed
            }
        }
    }

    /// `Pending -> Fetched`
    pub fn record_success(
        &self,
        url: &CanonicalUrl,
        body: Option<Arc<[u8]>>,
        content_kind: ContentKind,
    ) -> Result<(), LedgerError> {
        self.settle(url, ResourceRecord::Fetched { body, content_kind })
    }

    /// `Pending -> Failed`
    pub fn record_failure(
        &self,
        url: &CanonicalUrl,
        reason: impl Into<String>,
    ) -> Result<(), LedgerError> {
        self.settle(
            url,
            ResourceRecord::Failed {
                reason: reason.into(),
            },
        )
    }

    fn settle(&self, url: &CanonicalUrl, next: ResourceRecord) -> Result<(), LedgerError> {
        {
            let mut records = self.records();
            let record = records
                .get_mut(url)
                .ok_or_else(|| LedgerError::Unknown(url.to_string()))?;

            if record.state() != ResourceState::Pending {
                return Err(LedgerError::InvalidTransition {
                    url: url.to_string(),
                    from: record.state(),
                    to: next.state(),
                });
            }

            *record = next;
        }

        self.settled.notify_waiters();
        Ok(())
    }

    /// Returns a snapshot of the record for `url`, if any
    pub fn get(&self, url: &CanonicalUrl) -> Option<ResourceRecord> {
        self.records().get(url).cloned()
    }

    /// Returns true if `url` has a record in any state
    pub fn contains(&self, url: &CanonicalUrl) -> bool {
        self.records().contains_key(url)
    }

    /// Waits until the record for `url` leaves `Pending`
    ///
    /// Used by callers that lost the claim race and need the winner's result.
    pub async fn wait_settled(&self, url: &CanonicalUrl) -> Result<ResourceRecord, LedgerError> {
        loop {
            let notified = self.settled.notified();
            tokio::pin!(notified);
            // Register before checking so a transition in between is not missed
            notified.as_mut().enable();

            match self.get(url) {
                None => return Err(LedgerError::Unknown(url.to_string())),
                Some(ResourceRecord::Pending) => {}
                Some(record) => return Ok(record),
            }

            notified.await;
        }
    }

    /// All URLs currently `Failed`, sorted
    pub fn snapshot_failed(&self) -> Vec<CanonicalUrl> {
        let mut failed: Vec<CanonicalUrl> = self
            .records()
            .iter()
            .filter(|(_, record)| record.state() == ResourceState::Failed)
            .map(|(url, _)| url.clone())
            .collect();
        failed.sort();
        failed
    }

    /// Number of records in the given state
    pub fn count(&self, state: ResourceState) -> usize {
        self.records()
            .values()
            .filter(|record| record.state() == state)
            .count()
    }

    /// Total number of URLs ever claimed
    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records().is_empty()
    }
}
