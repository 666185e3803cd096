//! State module for tracking crawl progress
//!
//! This module provides the per-resource lifecycle and the ledger holding it
//! for the duration of one crawl.
//!
//! # Components
//!
//! - `ResourceState`: Pending, Fetched or Failed
//! - `ResourceRecord`: A ledger entry, with the retained body or failure reason
//! - `ContentKind`: Hint deciding whether a body is parsed for more links
//! - `Ledger`: The run-scoped, at-most-once fetch registry

mod ledger;
mod resource_state;

// Re-export main types
pub use ledger::{Claim, Ledger};
pub use resource_state::{ContentKind, ResourceRecord, ResourceState};
