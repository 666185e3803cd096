//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the main crawl loop that coordinates all aspects of
//! the crawling process, including:
//! - Seeding and draining the frontier breadth-first
//! - Keeping a bounded number of page tasks in flight
//! - Feeding extracted page links back into the frontier
//! - Fetching embedded media inside the page task that found it
//! - Cancellation (interrupt, consecutive failure limit, run deadline)
//! - Writing the failure report and producing the run summary

use crate::config::{resolve_scope, Config, CrawlerConfig, ScopeConfig};
use crate::crawler::client::{build_http_client, HttpClient, ReqwestClient};
use crate::crawler::fetcher::Fetcher;
use crate::crawler::frontier::Frontier;
use crate::crawler::parser::{AttrKind, ExtractedAttr, HtmlParser, ScraperParser};
use crate::output::CrawlSummary;
use crate::state::Ledger;
use crate::storage::{FileStorage, Storage, StorageError};
use crate::url::{resolve_in_scope, CanonicalUrl, DepthCheck};
use crate::{ConfigResult, FetchError, FetchResult};
use chrono::Utc;
use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;

/// Lifecycle of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlPhase {
    /// Constructed, nothing dispatched yet
    Idle,
    /// Dispatching pages from the frontier
    Running,
    /// No new dispatches; waiting for in-flight pages
    Draining,
    /// Frontier empty and nothing outstanding
    Done,
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CrawlPhase::Idle => "idle",
            CrawlPhase::Running => "running",
            CrawlPhase::Draining => "draining",
            CrawlPhase::Done => "done",
        };
        f.write_str(name)
    }
}

/// What a page task hands back to the driver
#[derive(Debug, Default)]
struct PageOutcome {
    /// In-scope page links, not yet deduplicated against the frontier
    links: Vec<CanonicalUrl>,
    /// Media written to disk by this task
    media_fetched: u64,
}

#[derive(Debug)]
struct PageReport {
    url: CanonicalUrl,
    result: FetchResult<PageOutcome>,
}

/// Everything a page task needs, shared between tasks
struct PageContext {
    scope: ScopeConfig,
    fetcher: Fetcher,
    parser: Arc<dyn HtmlParser>,
}

impl PageContext {
    /// Fetches one page, then every in-scope media reference it embeds
    async fn crawl_page(&self, page: &CanonicalUrl) -> FetchResult<PageOutcome> {
        let fetched = self.fetcher.fetch_and_store(page).await?;

        let Some(body) = fetched.parseable_body() else {
            return Ok(PageOutcome::default());
        };

        // Relative references resolve against where redirects ended up
        let base = fetched.redirected_to.as_ref().unwrap_or(page);
        let (links, media) = self.classify(page, base, self.parser.parse(body));

        let mut media_fetched = 0;
        for url in media {
            match self.fetcher.fetch_and_store(&url).await {
                Ok(outcome) => {
                    if outcome.path.is_some() {
                        media_fetched += 1;
                    }
                }
                Err(FetchError::Cancelled { .. }) => {
                    tracing::debug!("Crawl cancelled; skipping remaining media on {}", page);
                    break;
                }
                // Already logged and recorded by the fetcher
                Err(_) => {}
            }
        }

        Ok(PageOutcome {
            links,
            media_fetched,
        })
    }

    /// Splits extracted references into page links and media, both in scope
    fn classify(
        &self,
        page: &CanonicalUrl,
        base: &CanonicalUrl,
        attrs: Vec<ExtractedAttr>,
    ) -> (Vec<CanonicalUrl>, Vec<CanonicalUrl>) {
        let mut links = Vec::new();
        let mut media = Vec::new();
        let mut seen = HashSet::new();

        for attr in attrs {
            let check = match attr.kind {
                AttrKind::Href => DepthCheck::Enforce,
                AttrKind::Src => DepthCheck::Skip,
            };

            let url = match resolve_in_scope(&attr.raw_value, base, &self.scope, check) {
                Ok(url) => url,
                Err(e) => {
                    tracing::trace!(
                        "Discarding <{}> reference '{}' on {}: {}",
                        attr.tag_name,
                        attr.raw_value,
                        page,
                        e
                    );
                    continue;
                }
            };

            if url == *page || url == *base || !seen.insert((attr.kind, url.clone())) {
                continue;
            }

            match attr.kind {
                AttrKind::Href => links.push(url),
                AttrKind::Src => media.push(url),
            }
        }

        (links, media)
    }
}

async fn process_page(context: Arc<PageContext>, url: CanonicalUrl) -> PageReport {
    let result = context.crawl_page(&url).await;
    PageReport { url, result }
}

/// Cancels `cancel` once `limit` has elapsed, unless it fires first
fn spawn_deadline(limit: Duration, cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            _ = tokio::time::sleep(limit) => {
                tracing::warn!("Run timeout of {:?} reached; cancelling crawl", limit);
                cancel.cancel();
            }
            _ = cancel.cancelled() => {}
        }
    })
}

/// Main crawler coordinator structure
///
/// Owns the run-scoped frontier and ledger; both are dropped with the
/// coordinator when the run completes.
pub struct Coordinator {
    context: Arc<PageContext>,
    ledger: Arc<Ledger>,
    storage: Arc<dyn Storage>,
    frontier: Frontier,
    workers: usize,
    max_consecutive_failures: u32,
    run_timeout: Option<Duration>,
    cancel: CancellationToken,
    phase: CrawlPhase,
}

impl Coordinator {
    /// Creates a coordinator from explicit collaborators
    ///
    /// # Arguments
    ///
    /// * `scope` - The resolved run scope
    /// * `config` - Worker count and cancellation limits
    /// * `client` - HTTP collaborator
    /// * `parser` - HTML collaborator
    /// * `storage` - Where fetched resources and the failure report go
    pub fn new(
        scope: ScopeConfig,
        config: &CrawlerConfig,
        client: Arc<dyn HttpClient>,
        parser: Arc<dyn HtmlParser>,
        storage: Arc<dyn Storage>,
    ) -> Self {
        Self::with_cancellation(
            scope,
            config,
            client,
            parser,
            storage,
            CancellationToken::new(),
        )
    }

    /// Like [`Coordinator::new`], stopping early when `cancel` fires
    pub fn with_cancellation(
        scope: ScopeConfig,
        config: &CrawlerConfig,
        client: Arc<dyn HttpClient>,
        parser: Arc<dyn HtmlParser>,
        storage: Arc<dyn Storage>,
        cancel: CancellationToken,
    ) -> Self {
        let ledger = Arc::new(Ledger::new());
        let fetcher = Fetcher::new(
            client,
            storage.clone(),
            ledger.clone(),
            scope.timeout,
            cancel.clone(),
        );

        Self {
            context: Arc::new(PageContext {
                scope,
                fetcher,
                parser,
            }),
            ledger,
            storage,
            frontier: Frontier::new(),
            workers: config.workers.max(1) as usize,
            max_consecutive_failures: config.max_consecutive_failures,
            run_timeout: config.run_timeout_secs.map(Duration::from_secs),
            cancel,
            phase: CrawlPhase::Idle,
        }
    }

    /// Creates a coordinator with the production collaborators
    ///
    /// # Arguments
    ///
    /// * `start_url` - The URL to mirror from
    /// * `config` - The crawler configuration
    /// * `cancel` - Cancelling this token stops the run early
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Start URL valid and output root usable
    /// * `Err(ConfigError)` - The run cannot start
    pub fn from_config(
        start_url: &str,
        config: &Config,
        cancel: CancellationToken,
    ) -> ConfigResult<Self> {
        let scope = resolve_scope(start_url, config)?;
        let storage = FileStorage::open(
            scope.output_root.clone(),
            config.output.index_filename.clone(),
            config.output.failed_report.clone(),
        )?;
        let client = ReqwestClient::new(build_http_client(&config.user_agent)?);

        Ok(Self::with_cancellation(
            scope,
            &config.crawler,
            Arc::new(client),
            Arc::new(ScraperParser::new()),
            Arc::new(storage),
            cancel,
        ))
    }

    /// Token that stops the run when cancelled
    ///
    /// Cancelling stops new dispatches and media fetches; pages already in
    /// flight finish or time out on their own.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    pub fn scope(&self) -> &ScopeConfig {
        &self.context.scope
    }

    fn set_phase(&mut self, phase: CrawlPhase) {
        if self.phase != phase {
            tracing::debug!("Crawl phase: {} -> {}", self.phase, phase);
            self.phase = phase;
        }
    }

    /// Runs the main crawl loop to completion
    ///
    /// This is the core crawling logic that:
    /// 1. Seeds the frontier with the root URL
    /// 2. Keeps up to `workers` page tasks in flight
    /// 3. Pushes links returned by finished tasks onto the frontier
    /// 4. Stops dispatching once cancelled and waits for in-flight tasks
    /// 5. Writes the failure report
    ///
    /// Fetch failures never abort the run; they end up in the summary.
    pub async fn run(mut self) -> CrawlSummary {
        let started_at = Utc::now();
        let start_time = Instant::now();
        let root = self.context.scope.root.clone();

        tracing::info!(
            "Mirroring {} into {} (max depth {}, {} workers)",
            root,
            self.context.scope.output_root.display(),
            self.context.scope.max_depth,
            self.workers
        );

        self.set_phase(CrawlPhase::Running);
        self.frontier.push(root.clone(), &self.ledger);

        let deadline = self
            .run_timeout
            .map(|limit| spawn_deadline(limit, self.cancel.clone()));

        let mut tasks = JoinSet::new();
        let mut pages_crawled: u64 = 0;
        let mut pages_failed: u64 = 0;
        let mut media_fetched: u64 = 0;
        let mut consecutive_failures: u32 = 0;

        loop {
            if !self.cancel.is_cancelled() {
                while tasks.len() < self.workers {
                    let Some(url) = self.frontier.pop() else {
                        break;
                    };
                    tracing::debug!("Dispatching {}", url);
                    tasks.spawn(process_page(self.context.clone(), url));
                }
            }

            if tasks.is_empty() {
                break;
            }

            if self.cancel.is_cancelled() || self.frontier.is_empty() {
                self.set_phase(CrawlPhase::Draining);
            } else {
                self.set_phase(CrawlPhase::Running);
            }

            let Some(joined) = tasks.join_next().await else {
                break;
            };

            let report = match joined {
                Ok(report) => report,
                Err(e) => {
                    tracing::error!("Page task failed: {}", e);
                    pages_failed += 1;
                    continue;
                }
            };

            match report.result {
                Ok(outcome) => {
                    consecutive_failures = 0;
                    pages_crawled += 1;
                    media_fetched += outcome.media_fetched;

                    let found = outcome.links.len();
                    let queued = outcome
                        .links
                        .into_iter()
                        .filter(|link| self.frontier.push(link.clone(), &self.ledger))
                        .count();
                    tracing::debug!(
                        "Processed {}: {} links, {} new",
                        report.url,
                        found,
                        queued
                    );

                    // Progress reporting every 10 pages
                    if pages_crawled % 10 == 0 {
                        let rate = pages_crawled as f64 / start_time.elapsed().as_secs_f64();
                        tracing::info!(
                            "Progress: {} pages crawled, {} in frontier, {} in flight, {:.2} pages/sec",
                            pages_crawled,
                            self.frontier.len(),
                            tasks.len(),
                            rate
                        );
                    }
                }
                Err(FetchError::Cancelled { .. }) => {}
                // Failed as media first; no request was made for the page
                Err(FetchError::PreviouslyFailed { .. }) => {
                    pages_failed += 1;
                    tracing::debug!("Page {} already failed earlier in the run", report.url);
                }
                Err(e) => {
                    pages_failed += 1;
                    consecutive_failures += 1;
                    tracing::debug!("Page {} failed: {}", report.url, e);

                    if self.max_consecutive_failures > 0
                        && consecutive_failures >= self.max_consecutive_failures
                        && !self.cancel.is_cancelled()
                    {
                        tracing::warn!(
                            "{} consecutive page failures; cancelling crawl",
                            consecutive_failures
                        );
                        self.cancel.cancel();
                    }
                }
            }
        }

        if let Some(handle) = deadline {
            handle.abort();
        }

        self.set_phase(CrawlPhase::Done);

        let cancelled = self.cancel.is_cancelled();
        let failed = self.ledger.snapshot_failed();
        let report_path = match self.write_failure_report(&root, &failed).await {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::error!("Failed to write failure report: {}", e);
                None
            }
        };

        tracing::info!(
            "Crawl {}: {} pages, {} media, {} failed in {:?}",
            if cancelled { "cancelled" } else { "completed" },
            pages_crawled,
            media_fetched,
            failed.len(),
            start_time.elapsed()
        );

        CrawlSummary {
            root,
            started_at,
            finished_at: Utc::now(),
            pages_crawled,
            pages_failed,
            media_fetched,
            failed,
            cancelled,
            report_path,
        }
    }

    async fn write_failure_report(
        &self,
        root: &CanonicalUrl,
        failed: &[CanonicalUrl],
    ) -> Result<PathBuf, StorageError> {
        let storage = self.storage.clone();
        let root = root.clone();
        let failed = failed.to_vec();

        tokio::task::spawn_blocking(move || storage.write_failure_report(&root, &failed))
            .await
            .map_err(|e| StorageError::Task(e.to_string()))?
    }
}

/// Runs a complete mirror of `start_url`
///
/// This function orchestrates the entire crawl process:
///
/// 1. Resolve the start URL and scope
/// 2. Open the output root and build the HTTP client
/// 3. Crawl until the frontier is exhausted or `cancel` fires
/// 4. Write the failure report and return the summary
///
/// # Arguments
///
/// * `start_url` - The URL to mirror from
/// * `config` - The crawler configuration
/// * `cancel` - Cancelling this token stops the run early
///
/// # Returns
///
/// * `Ok(CrawlSummary)` - The run reached `Done`
/// * `Err(MirrorError)` - The run could not start
///
/// # Example
///
/// ```no_run
/// use sumi_mirror::config::Config;
/// use sumi_mirror::crawler::run_crawl;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let summary = run_crawl("https://example.com/", &Config::default(), CancellationToken::new()).await?;
/// println!("{} pages mirrored", summary.pages_crawled);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(
    start_url: &str,
    config: &Config,
    cancel: CancellationToken,
) -> crate::Result<CrawlSummary> {
    let coordinator = Coordinator::from_config(start_url, config, cancel)?;
    Ok(coordinator.run().await)
}
