//! HTML parser for extracting link and media references
//!
//! The parser does no URL resolution or filtering; it reports raw attribute
//! values and leaves normalization and scope decisions to the caller.

use scraper::{Html, Selector};

/// How a reference should be treated by the crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttrKind {
    /// A page link, queued and subject to the depth window
    Href,
    /// Embedded media, fetched immediately without a depth check
    Src,
}

/// One reference found in a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedAttr {
    pub kind: AttrKind,
    pub raw_value: String,
    pub tag_name: String,
}

impl ExtractedAttr {
    fn new(kind: AttrKind, raw_value: &str, tag_name: &str) -> Self {
        Self {
            kind,
            raw_value: raw_value.to_string(),
            tag_name: tag_name.to_string(),
        }
    }
}

/// Extracts references from a fetched body
///
/// Implementations must tolerate arbitrary bytes: malformed markup yields
/// whatever could be recovered, possibly nothing.
pub trait HtmlParser: Send + Sync {
    fn parse(&self, body: &[u8]) -> Vec<ExtractedAttr>;
}

/// [`HtmlParser`] built on `scraper`'s html5ever tree builder
#[derive(Debug, Clone, Copy, Default)]
pub struct ScraperParser;

impl ScraperParser {
    pub fn new() -> Self {
        Self
    }
}

impl HtmlParser for ScraperParser {
    /// Extracts references in document order
    ///
    /// # Extraction Rules
    ///
    /// | Source | Kind |
    /// |--------|------|
    /// | any element's `href` | `Href` |
    /// | `<link rel="stylesheet" href>` | `Src` |
    /// | any element's `src` | `Src` |
    /// | each candidate in `srcset` | `Src` |
    ///
    /// Stylesheets are embedded resources of the page rather than pages to
    /// crawl, so they bypass the depth window like images do.
    fn parse(&self, body: &[u8]) -> Vec<ExtractedAttr> {
        let html = String::from_utf8_lossy(body);
        let document = Html::parse_document(&html);
        let mut attrs = Vec::new();

        let Ok(selector) = Selector::parse("[href], [src], [srcset]") else {
            return attrs;
        };

        for element in document.select(&selector) {
            let value = element.value();
            let tag = value.name();

            if let Some(href) = value.attr("href") {
                let kind = if tag == "link" && is_stylesheet(value.attr("rel")) {
                    AttrKind::Src
                } else {
                    AttrKind::Href
                };
                attrs.push(ExtractedAttr::new(kind, href, tag));
            }

            if let Some(src) = value.attr("src") {
                attrs.push(ExtractedAttr::new(AttrKind::Src, src, tag));
            }

            if let Some(srcset) = value.attr("srcset") {
                for candidate in srcset_urls(srcset) {
                    attrs.push(ExtractedAttr::new(AttrKind::Src, candidate, tag));
                }
            }
        }

        attrs
    }
}

fn is_stylesheet(rel: Option<&str>) -> bool {
    rel.map(|rel| {
        rel.split_ascii_whitespace()
            .any(|token| token.eq_ignore_ascii_case("stylesheet"))
    })
    .unwrap_or(false)
}

/// URLs from a `srcset` value such as `a.png 1x, b.png 2x`
fn srcset_urls(srcset: &str) -> impl Iterator<Item = &str> {
    srcset
        .split(',')
        .filter_map(|candidate| candidate.split_ascii_whitespace().next())
}
