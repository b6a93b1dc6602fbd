//! URL helpers for mirror rewriting and link absolutization.

use url::Url;

/// Scheme and authority of an absolute URL, without trailing slash.
///
/// `https://www.site.nl/film/x?y=1` → `https://www.site.nl`
pub fn origin_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return None;
    }
    Some(parsed.origin().ascii_serialization())
}

/// Path plus query of an absolute URL, suitable for appending to a mirror
/// base. The fragment is dropped; an empty path becomes `/`.
pub fn relative_path(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let path = if parsed.path().is_empty() { "/" } else { parsed.path() };
    Some(match parsed.query() {
        Some(query) if !query.is_empty() => format!("{path}?{query}"),
        _ => path.to_string(),
    })
}

pub fn is_absolute(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Resolve a link found in a page against the site's base URL.
///
/// Protocol-relative links get `https:`; rooted and bare paths are joined
/// onto `base`.
pub fn absolutize(base: &str, link: &str) -> String {
    let link = link.trim();
    if link.is_empty() || link.starts_with("http") {
        return link.to_string();
    }
    if let Some(rest) = link.strip_prefix("//") {
        return format!("https://{rest}");
    }
    let base = base.trim_end_matches('/');
    if link.starts_with('/') {
        format!("{base}{link}")
    } else {
        format!("{base}/{link}")
    }
}

/// Like [`absolutize`] but maps blank input to `None`.
pub fn absolutize_opt(base: &str, link: Option<&str>) -> Option<String> {
    let link = link?.trim();
    if link.is_empty() {
        return None;
    }
    Some(absolutize(base, link))
}
