//! Link resolution and number parsing helpers.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use url::Url;

static ANY_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());

/// Resolve a matched href against the page's origin.
///
/// Returns `None` for fragments, script/mail links and anything that does
/// not end up as an absolute http(s) URL.
pub fn resolve_link(page_url: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }
    let lower = href.to_ascii_lowercase();
    if lower.starts_with("javascript:") || lower.starts_with("mailto:") || lower.starts_with("data:")
    {
        return None;
    }

    let origin = page_url.join("/").ok()?;
    let resolved = origin.join(href).ok()?;
    matches!(resolved.scheme(), "http" | "https").then(|| resolved.to_string())
}

/// First run of ASCII digits in `text`, if it fits in a `u32`.
pub fn first_number(text: &str) -> Option<u32> {
    ANY_NUMBER
        .find_iter(text)
        .find_map(|m| m.as_str().parse().ok())
}
