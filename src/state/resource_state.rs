/// Resource state definitions for tracking crawl progress
///
/// This module defines the lifecycle of a single resource in the ledger and
/// the content-kind hint that decides whether a fetched body is parsed.
use std::fmt;
use std::sync::Arc;

/// Represents the current state of a resource in the crawl process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceState {
    /// A fetch has been claimed and is in flight
    Pending,

    /// Fetched and written to disk
    Fetched,

    /// Fetch or write failed; not retried within the run
    Failed,
}

impl ResourceState {
    /// Returns true if this is a terminal state (no further processing needed)
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Fetched => "fetched",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for ResourceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extensions that are never worth handing to the HTML parser
const STATIC_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "webp", "svg", "ico", "bmp", "avif", "css", "js", "mjs", "json",
    "xml", "txt", "pdf", "zip", "gz", "tar", "mp3", "mp4", "webm", "ogg", "wav", "woff", "woff2",
    "ttf", "otf", "eot", "wasm", "map",
];

/// Extensions that name HTML documents
const HTML_EXTENSIONS: &[&str] = &["html", "htm", "xhtml", "shtml"];

/// Best-effort hint about what a fetched body contains
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentKind {
    /// Declared (or inferred) HTML
    Html,

    /// Anything else, carrying the declared type or the extension it was
    /// inferred from
    Other(String),

    /// No declared type and nothing conclusive in the path
    Unknown,
}

impl ContentKind {
    /// Classifies a response
    ///
    /// The declared `Content-Type` wins when present. Without it, the last
    /// path segment's extension decides: well-known static extensions are
    /// `Other`, HTML extensions and extension-less names (including
    /// directory URLs) are `Html`, and anything else is `Unknown`.
    pub fn detect(content_type: Option<&str>, path: &str) -> Self {
        if let Some(content_type) = content_type {
            let mime = content_type
                .split(';')
                .next()
                .unwrap_or("")
                .trim()
                .to_ascii_lowercase();

            if !mime.is_empty() {
                return if mime == "text/html" || mime == "application/xhtml+xml" {
                    Self::Html
                } else {
                    Self::Other(mime)
                };
            }
        }

        let name = path.rsplit('/').next().unwrap_or("");
        match name.rsplit_once('.') {
            None => Self::Html,
            Some((_, ext)) => {
                let ext = ext.to_ascii_lowercase();
                if HTML_EXTENSIONS.contains(&ext.as_str()) {
                    Self::Html
                } else if STATIC_EXTENSIONS.contains(&ext.as_str()) {
                    Self::Other(ext)
                } else {
                    Self::Unknown
                }
            }
        }
    }

    /// Returns true when the body should be handed to the HTML parser
    pub fn is_parseable(&self) -> bool {
        matches!(self, Self::Html | Self::Unknown)
    }
}

/// One entry in the ledger
#[derive(Debug, Clone)]
pub enum ResourceRecord {
    /// Claimed; the claiming task is fetching it
    Pending,

    /// Fetched and persisted. The body is only retained for parseable
    /// content; media bodies are dropped once written.
    Fetched {
        body: Option<Arc<[u8]>>,
        content_kind: ContentKind,
    },

    /// Failed with the recorded reason
    Failed { reason: String },
}

impl ResourceRecord {
    pub fn state(&self) -> ResourceState {
        match self {
            Self::Pending => ResourceState::Pending,
            Self::Fetched { .. } => ResourceState::Fetched,
            Self::Failed { .. } => ResourceState::Failed,
        }
    }
}
