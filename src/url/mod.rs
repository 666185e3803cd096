//! URL handling module for Sumi-Mirror
//!
//! This module provides the canonical URL identity used throughout the crawl,
//! normalization of raw attribute values into that identity, and the scope
//! rules deciding which discovered URLs are followed.

mod canonical;
mod normalize;
mod scope;

// Re-export main types and functions
pub use canonical::{CanonicalUrl, Scheme};
pub use normalize::normalize;
pub use scope::{is_in_scope, resolve_in_scope, DepthCheck};
