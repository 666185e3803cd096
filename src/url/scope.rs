//! Scope rules for discovered URLs
//!
//! A candidate is in scope when it lives on the root's host (and port), uses
//! http or https, and, for page links only, sits inside the directory window
//! allowed by the configured maximum depth.

use crate::config::ScopeConfig;
use crate::url::{normalize, CanonicalUrl};
use crate::{UrlError, UrlResult};

/// Whether the path-depth rule applies to a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthCheck {
    /// Page links: the depth window is enforced
    Enforce,
    /// Embedded media: any depth on the root host is accepted
    Skip,
}

/// Decides whether `candidate` may be crawled from a run rooted at `root`
///
/// # Depth Rules
///
/// With `base = root.depth_segments()` and `test = candidate.depth_segments()`:
///
/// | `max_depth` | Accepted when |
/// |-------------|---------------|
/// | `>= 0` | `test` starts with `base` and is at most `max_depth` segments longer |
/// | `< 0` | the first `max(len(base) + max_depth, 0)` segments of both agree |
///
/// A negative depth therefore opens the crawl upward: `-1` allows siblings of
/// the root's directory, `-2` siblings of its parent, and so on.
///
/// # Examples
///
/// ```
/// use sumi_mirror::url::{is_in_scope, normalize, DepthCheck};
///
/// let root = normalize("http://example.com/a/index.html", None).unwrap();
/// let same_dir = normalize("http://example.com/a/c.html", None).unwrap();
/// let deeper = normalize("http://example.com/a/sub/d.html", None).unwrap();
///
/// assert!(is_in_scope(&same_dir, &root, 0, DepthCheck::Enforce));
/// assert!(!is_in_scope(&deeper, &root, 0, DepthCheck::Enforce));
/// assert!(is_in_scope(&deeper, &root, 0, DepthCheck::Skip));
/// ```
pub fn is_in_scope(
    candidate: &CanonicalUrl,
    root: &CanonicalUrl,
    max_depth: i32,
    check: DepthCheck,
) -> bool {
    // Host-less candidates only survive normalization as non-web schemes,
    // which the scheme check below rejects.
    if !candidate.host().is_empty()
        && (candidate.host() != root.host() || candidate.port() != root.port())
    {
        return false;
    }

    if !candidate.scheme().is_web() {
        return false;
    }

    match check {
        DepthCheck::Skip => true,
        DepthCheck::Enforce => within_depth(
            candidate.depth_segments(),
            root.depth_segments(),
            max_depth,
        ),
    }
}

fn within_depth(test: &[String], base: &[String], max_depth: i32) -> bool {
    if max_depth >= 0 {
        test.len() >= base.len()
            && test[..base.len()] == *base
            && (test.len() - base.len()) as u64 <= max_depth as u64
    } else {
        let match_len = (base.len() as i64 + max_depth as i64).max(0) as usize;
        test.len() >= match_len && test[..match_len] == base[..match_len]
    }
}

/// Resolves a raw attribute value found on `page` and applies the scope rules
///
/// # Returns
///
/// * `Ok(CanonicalUrl)` - The candidate is in scope
/// * `Err(UrlError::Malformed)` - The value could not be normalized
/// * `Err(UrlError::OutOfScope)` - The value resolved outside the scope
pub fn resolve_in_scope(
    raw: &str,
    page: &CanonicalUrl,
    scope: &ScopeConfig,
    check: DepthCheck,
) -> UrlResult<CanonicalUrl> {
    let candidate = normalize(raw, Some(page))?;

    if is_in_scope(&candidate, &scope.root, scope.max_depth, check) {
        Ok(candidate)
    } else {
        Err(UrlError::OutOfScope(candidate.to_string()))
    }
}
