use crate::url::CanonicalUrl;
use crate::{UrlError, UrlResult};
use url::{ParseError, Url};

/// Normalizes a raw URL string into a [`CanonicalUrl`]
///
/// # Normalization Steps
///
/// 1. Trim surrounding whitespace (attribute values often carry some)
/// 2. Parse the string as an absolute URL
/// 3. If it is relative and a base is given, resolve it against the base
///    (RFC 3986: `../`, `./`, absolute-path, scheme-relative and
///    query-relative references)
/// 4. Lowercase the scheme and host, remove dot segments
/// 5. Remove the query string and the fragment
///
/// Query strings are insignificant for identity and are not kept for storage
/// either, so `page?a=1` and `page?a=2` are the same resource.
///
/// # Arguments
///
/// * `raw` - The URL string, absolute or relative
/// * `base` - The URL of the document the string was found in, if any
///
/// # Returns
///
/// * `Ok(CanonicalUrl)` - Normalized URL
/// * `Err(UrlError::Malformed)` - The string cannot be parsed or resolved
///
/// # Examples
///
/// ```
/// use sumi_mirror::url::normalize;
///
/// let page = normalize("HTTP://Example.COM/dir/page.html?x=1#top", None).unwrap();
/// assert_eq!(page.as_str(), "http://example.com/dir/page.html");
///
/// let image = normalize("../img.png", Some(&page)).unwrap();
/// assert_eq!(image.as_str(), "http://example.com/img.png");
/// ```
pub fn normalize(raw: &str, base: Option<&CanonicalUrl>) -> UrlResult<CanonicalUrl> {
    let raw = raw.trim();

    let url = match Url::parse(raw) {
        Ok(url) => url,
        Err(ParseError::RelativeUrlWithoutBase) => match base {
            Some(base) => base
                .as_url()
                .join(raw)
                .map_err(|e| UrlError::Malformed(format!("{}: {}", raw, e)))?,
            None => {
                return Err(UrlError::Malformed(format!(
                    "relative URL without a base: {}",
                    raw
                )))
            }
        },
        Err(e) => return Err(UrlError::Malformed(format!("{}: {}", raw, e))),
    };

    Ok(CanonicalUrl::from_url(url))
}
