//! Crawler module for mirroring a site
//!
//! This module contains the core crawling logic, including:
//! - The HTTP and HTML collaborators and their production implementations
//! - Fetch-and-persist of single resources through the shared ledger
//! - The breadth-first frontier
//! - Overall crawl coordination with a bounded worker pool

mod client;
mod coordinator;
mod fetcher;
mod frontier;
mod parser;

pub use client::{
    build_http_client, user_agent, HttpClient, HttpResponse, ReqwestClient, TransportError,
};
pub use coordinator::{run_crawl, Coordinator, CrawlPhase};
pub use fetcher::{FetchOutcome, Fetcher};
pub use frontier::Frontier;
pub use parser::{AttrKind, ExtractedAttr, HtmlParser, ScraperParser};
