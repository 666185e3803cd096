//! Fetch-and-persist for a single resource
//!
//! This module handles retrieving one canonical URL, including:
//! - Claiming the URL in the ledger so it is fetched at most once per run
//! - Returning the cached outcome to callers that lost the claim
//! - Classifying transport errors, timeouts and non-2xx statuses
//! - Writing the body under the output root on the blocking pool
//! - Settling the ledger record with the final outcome

use crate::crawler::client::{HttpClient, TransportError};
use crate::state::{Claim, ContentKind, Ledger, ResourceRecord};
use crate::storage::{Storage, StorageError};
use crate::url::{normalize, CanonicalUrl};
use crate::{FetchError, FetchResult};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Result of a successful [`Fetcher::fetch_and_store`]
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    /// The body, when this call fetched it or the ledger retained it
    pub body: Option<Arc<[u8]>>,

    /// Classification used to decide whether to parse the body
    pub content_kind: ContentKind,

    /// Where the body was written; `None` for cached outcomes
    pub path: Option<PathBuf>,

    /// Where redirects ended up, when that differs from the requested URL
    ///
    /// The body is stored under this URL's path rather than the requested one.
    pub redirected_to: Option<CanonicalUrl>,
}

impl FetchOutcome {
    /// The body, if it should be scanned for further references
    pub fn parseable_body(&self) -> Option<&[u8]> {
        if self.content_kind.is_parseable() {
            self.body.as_deref()
        } else {
            None
        }
    }
}

/// Fetches resources and persists them, settling the shared ledger
pub struct Fetcher {
    client: Arc<dyn HttpClient>,
    storage: Arc<dyn Storage>,
    ledger: Arc<Ledger>,
    timeout: Duration,
    cancel: CancellationToken,
}

impl Fetcher {
    pub fn new(
        client: Arc<dyn HttpClient>,
        storage: Arc<dyn Storage>,
        ledger: Arc<Ledger>,
        timeout: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            client,
            storage,
            ledger,
            timeout,
            cancel,
        }
    }

    pub fn ledger(&self) -> &Arc<Ledger> {
        &self.ledger
    }

    /// Fetches `url` and writes it to storage, at most once per run
    ///
    /// # Request Flow
    ///
    /// 1. Refuse new work once the run is cancelled
    /// 2. Claim the URL; if it was already claimed, wait for the winner and
    ///    return its outcome without touching the network
    /// 3. GET with the configured timeout
    /// 4. Write the body atomically under the output root, at the redirect
    ///    target's path when the request was redirected
    /// 5. Record `Fetched` or `Failed`
    ///
    /// # Returns
    ///
    /// * `Ok(FetchOutcome)` - Fetched now or earlier in this run
    /// * `Err(FetchError::PreviouslyFailed)` - An earlier attempt failed
    /// * `Err(FetchError::Cancelled)` - The run was cancelled before the claim
    /// * `Err(FetchError)` - This attempt failed and was recorded
    pub async fn fetch_and_store(&self, url: &CanonicalUrl) -> FetchResult<FetchOutcome> {
        if self.cancel.is_cancelled() {
            return Err(FetchError::Cancelled {
                url: url.to_string(),
            });
        }

        match self.ledger.try_claim(url) {
            Claim::Claimed => {}
            Claim::AlreadyClaimed(ResourceRecord::Pending) => {
                tracing::trace!("Waiting for in-flight fetch of {}", url);
                let record = self.ledger.wait_settled(url).await?;
                return cached_outcome(url, record);
            }
            Claim::AlreadyClaimed(record) => return cached_outcome(url, record),
        }

        match self.fetch_claimed(url).await {
            Ok(outcome) => {
                let retained = if outcome.content_kind.is_parseable() {
                    outcome.body.clone()
                } else {
                    None
                };
                self.ledger
                    .record_success(url, retained, outcome.content_kind.clone())?;
                Ok(outcome)
            }
            Err(e) => {
                tracing::warn!("{}", e);
                self.ledger.record_failure(url, e.to_string())?;
                Err(e)
            }
        }
    }

    async fn fetch_claimed(&self, url: &CanonicalUrl) -> FetchResult<FetchOutcome> {
        tracing::debug!("Fetching {}", url);

        let response = self
            .client
            .get(url.as_url(), self.timeout)
            .await
            .map_err(|e| match e {
                TransportError::Timeout => FetchError::Timeout {
                    url: url.to_string(),
                },
                other => FetchError::Network {
                    url: url.to_string(),
                    message: other.to_string(),
                },
            })?;

        if !response.is_success() {
            return Err(FetchError::HttpStatus {
                url: url.to_string(),
                status: response.status,
            });
        }

        let redirected_to = normalize(response.url.as_str(), None)
            .ok()
            .filter(|landed| landed != url);
        if let Some(landed) = &redirected_to {
            tracing::debug!("{} redirected to {}", url, landed);
        }

        let landed = redirected_to.as_ref().unwrap_or(url);
        let content_kind = ContentKind::detect(response.content_type(), landed.path());
        let body: Arc<[u8]> = Arc::from(response.body);

        let path = {
            let storage = self.storage.clone();
            let target = landed.clone();
            let body = body.clone();
            tokio::task::spawn_blocking(move || storage.write(&target, &body))
                .await
                .map_err(|e| StorageError::Task(e.to_string()))
                .and_then(|written| written)
                .map_err(|source| FetchError::WriteFailure {
                    url: url.to_string(),
                    source,
                })?
        };

        tracing::debug!("Saved {} to {}", url, path.display());

        Ok(FetchOutcome {
            body: Some(body),
            content_kind,
            path: Some(path),
            redirected_to,
        })
    }
}

fn cached_outcome(url: &CanonicalUrl, record: ResourceRecord) -> FetchResult<FetchOutcome> {
    match record {
        ResourceRecord::Fetched { body, content_kind } => Ok(FetchOutcome {
            body,
            content_kind,
            path: None,
            redirected_to: None,
        }),
        ResourceRecord::Failed { reason } => Err(FetchError::PreviouslyFailed {
            url: url.to_string(),
            reason,
        }),
        // wait_settled never yields Pending
        ResourceRecord::Pending => Err(FetchError::PreviouslyFailed {
            url: url.to_string(),
            reason: "still pending".to_string(),
        }),
    }
}
