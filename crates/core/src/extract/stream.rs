//! Watch-page stream resolution.

use std::convert::Infallible;

use once_cell::sync::Lazy;
use regex_lite::Regex;
use scraper::{Html, Selector};
use tracing::{info, warn};
use url::Url;

use super::links::resolve_link;
use crate::browser::{LoadedPage, PageSource};
use crate::fallback::{first_success, Attempt};
use crate::metrics;
use crate::sites::{StreamSource, StreamingData};

/// URL fragments identifying embeddable players and video hosts.
pub const EMBED_HOSTS: &[&str] = &[
    "embed",
    "player",
    "streamtape",
    "mp4upload",
    "dood",
    "filemoon",
    "streamwish",
    "voe.sx",
    "mixdrop",
    "ok.ru",
    "blogger.com/video",
    "vidstream",
    "fembed",
];

/// Inline-script patterns, in priority order. Group 1 is the URL.
static SCRIPT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r#"["'](https?://[^"']+\.mp4[^"']*)["']"#,
        r#"["'](https?://[^"']+\.m3u8[^"']*)["']"#,
        r#"["'](https?://[^"']+/embed/[^"']+)["']"#,
        r#"source\s*:\s*["']([^"']+)["']"#,
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static VIDEO: Lazy<Selector> = Lazy::new(|| Selector::parse("video").unwrap());
static VIDEO_SOURCE: Lazy<Selector> = Lazy::new(|| Selector::parse("video source[src]").unwrap());
static IFRAME: Lazy<Selector> = Lazy::new(|| Selector::parse("iframe").unwrap());
static SCRIPT: Lazy<Selector> = Lazy::new(|| Selector::parse("script").unwrap());

/// Playable URL of a native `<video>` element.
///
/// Prefers the live `currentSrc` captured at load time, then the `src`
/// attribute, then nested `<source>` elements.
pub fn probe_video(page: &LoadedPage) -> Option<String> {
    let base = page.base_url()?;
    if let Some(url) = page.media_src.as_deref().and_then(|s| resolve_link(&base, s)) {
        return Some(url);
    }

    let document = Html::parse_document(&page.html);
    let from_attr = document
        .select(&VIDEO)
        .filter_map(|v| v.value().attr("src"))
        .find_map(|src| resolve_link(&base, src));
    from_attr.or_else(|| {
        document
            .select(&VIDEO_SOURCE)
            .filter_map(|s| s.value().attr("src"))
            .find_map(|src| resolve_link(&base, src))
    })
}

/// First iframe whose source looks like an embedded player.
pub fn probe_iframe(page: &LoadedPage) -> Option<String> {
    let base = page.base_url()?;
    let document = Html::parse_document(&page.html);
    document
        .select(&IFRAME)
        .filter_map(|frame| {
            frame
                .value()
                .attr("src")
                .or_else(|| frame.value().attr("data-src"))
        })
        .filter(|src| {
            let lower = src.to_ascii_lowercase();
            EMBED_HOSTS.iter().any(|host| lower.contains(host))
        })
        .find_map(|src| resolve_link(&base, src))
}

/// Direct or iframe URL from the DOM; direct media wins.
pub fn probe_dom(page: &LoadedPage) -> Option<(String, StreamSource)> {
    probe_video(page)
        .map(|url| (url, StreamSource::Video))
        .or_else(|| probe_iframe(page).map(|url| (url, StreamSource::Iframe)))
}

/// Scan inline scripts for an embedded media URL.
///
/// Scripts are visited in document order and, within each script, the
/// patterns in priority order.
pub fn scan_scripts(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    for script in document.select(&SCRIPT) {
        // JSON blobs often escape slashes.
        let text = script.text().collect::<String>().replace("\\/", "/");
        if text.trim().is_empty() {
            continue;
        }
        for pattern in SCRIPT_PATTERNS.iter() {
            let found = pattern
                .captures_iter(&text)
                .filter_map(|caps| caps.get(1))
                .map(|m| m.as_str())
                .find(|candidate| is_http_url(candidate));
            if let Some(url) = found {
                return Some(url.to_string());
            }
        }
    }
    None
}

fn is_http_url(candidate: &str) -> bool {
    Url::parse(candidate)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}

/// Run the detection strategies against an already loaded watch page.
pub async fn resolve_loaded(page: &LoadedPage, episode_url: &str, user_agent: &str) -> StreamingData {
    let attempts: Vec<Attempt<'_, (String, StreamSource), Infallible>> = vec![
        Attempt::new("dom", async { Ok(probe_dom(page)) }),
        Attempt::new("script", async {
            Ok(scan_scripts(&page.html).map(|url| (url, StreamSource::Script)))
        }),
    ];

    match first_success(attempts).await.value() {
        Some((url, source)) => StreamingData::direct(url, source, episode_url, user_agent),
        None => StreamingData::external(episode_url, user_agent, None),
    }
}

/// Load a watch page and resolve a playable URL.
///
/// Never fails: navigation errors produce the external fallback with
/// `error` set.
pub async fn resolve_stream(
    source: &dyn PageSource,
    episode_url: &str,
    user_agent: &str,
) -> StreamingData {
    let data = match source.load(episode_url).await {
        Ok(page) => resolve_loaded(&page, episode_url, user_agent).await,
        Err(e) => {
            warn!(url = episode_url, error = %e, "Watch page failed to load");
            StreamingData::external(episode_url, user_agent, Some(e.to_string()))
        }
    };

    metrics::STREAM_RESOLUTIONS
        .with_label_values(&[data.source.as_str()])
        .inc();
    info!(
        url = episode_url,
        source = data.source.as_str(),
        external = data.external,
        "Resolved stream"
    );
    data
}
