use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use url::Url;

/// URL scheme of a canonical URL
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scheme {
    Http,
    Https,
    /// Any other scheme (`mailto`, `javascript`, `ftp`, ...), lower-cased
    Other(String),
}

impl Scheme {
    fn from_name(scheme: &str) -> Self {
        match scheme {
            "http" => Self::Http,
            "https" => Self::Https,
            other => Self::Other(other.to_ascii_lowercase()),
        }
    }

    /// Returns true for http and https
    pub fn is_web(&self) -> bool {
        matches!(self, Self::Http | Self::Https)
    }
}

/// The normalized identity of a resource
///
/// A `CanonicalUrl` never carries a query string or fragment, and its scheme
/// and host are lower-cased, so two URLs differing only in those respects
/// compare equal. Equality, hashing and ordering all use the serialized form.
#[derive(Debug, Clone)]
pub struct CanonicalUrl {
    url: Url,
    scheme: Scheme,
    host: String,
    port: Option<u16>,
    depth_segments: Vec<String>,
}

impl CanonicalUrl {
    /// Builds a canonical URL from an already parsed URL, dropping its query
    /// and fragment
    pub(crate) fn from_url(mut url: Url) -> Self {
        url.set_query(None);
        url.set_fragment(None);

        let scheme = Scheme::from_name(url.scheme());
        let host = url
            .host_str()
            .map(|h| h.to_ascii_lowercase())
            .unwrap_or_default();
        let port = url.port();

        // Every path component except the last one (the resource's own name)
        let depth_segments = match url.path_segments() {
            Some(segments) => {
                let mut segments: Vec<String> = segments.map(str::to_string).collect();
                segments.pop();
                segments
            }
            None => Vec::new(),
        };

        Self {
            url,
            scheme,
            host,
            port,
            depth_segments,
        }
    }

    pub fn scheme(&self) -> &Scheme {
        &self.scheme
    }

    /// Case-folded host, empty for host-less URLs such as `mailto:`
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Explicit port, `None` when it is the scheme's default
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Normalized path, always starting with `/` for web URLs
    pub fn path(&self) -> &str {
        self.url.path()
    }

    /// Path components excluding the final segment
    ///
    /// `/a/b/index.html` yields `["a", "b"]`, `/a/b/` yields `["a", "b"]`
    /// and `/` yields `[]`.
    pub fn depth_segments(&self) -> &[String] {
        &self.depth_segments
    }

    /// Returns true when the path names a directory (empty or trailing `/`)
    pub fn is_directory(&self) -> bool {
        self.path().is_empty() || self.path().ends_with('/')
    }

    pub fn as_url(&self) -> &Url {
        &self.url
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }
}

impl PartialEq for CanonicalUrl {
    fn eq(&self, other: &Self) -> bool {
        self.url.as_str() == other.url.as_str()
    }
}

impl Eq for CanonicalUrl {}

impl Hash for CanonicalUrl {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.url.as_str().hash(state);
    }
}

impl Ord for CanonicalUrl {
    fn cmp(&self, other: &Self) -> Ordering {
        self.url.as_str().cmp(other.url.as_str())
    }
}

impl PartialOrd for CanonicalUrl {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for CanonicalUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}
