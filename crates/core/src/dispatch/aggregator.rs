use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use tracing::{debug, info, warn};

use super::dedup::dedup_by_title;
use super::{AggregateResult, ScrapeError};
use crate::browser::{BrowserError, LoadedPage, PageSource};
use crate::config::ScraperConfig;
use crate::extract::{extract_catalog, extract_episodes, resolve_stream};
use crate::metrics;
use crate::sites::{CatalogEntry, EpisodeEntry, SiteDescriptor, StreamingData};

/// Fans catalog queries out to every registered site.
pub struct Aggregator {
    sites: Vec<SiteDescriptor>,
    source: Arc<dyn PageSource>,
    config: ScraperConfig,
    user_agent: String,
}

impl Aggregator {
    pub fn new(
        sites: Vec<SiteDescriptor>,
        source: Arc<dyn PageSource>,
        config: ScraperConfig,
        user_agent: impl Into<String>,
    ) -> Self {
        Self {
            sites,
            source,
            config,
            user_agent: user_agent.into(),
        }
    }

    /// Registered sites, in registration order.
    pub fn sites(&self) -> &[SiteDescriptor] {
        &self.sites
    }

    pub fn site(&self, id: &str) -> Option<&SiteDescriptor> {
        self.sites.iter().find(|s| s.id == id)
    }

    /// Scrape every registered site concurrently.
    ///
    /// A failing site never affects the others; its error is reported in
    /// `site_errors`. Only a browser that could not be launched for any
    /// site is an error.
    pub async fn search_all_sites(
        &self,
        query: Option<&str>,
    ) -> Result<AggregateResult, ScrapeError> {
        let start = Instant::now();
        debug!(query = ?query, sites = self.sites.len(), "Starting parallel scrape");

        let scrape_futures: Vec<_> = self
            .sites
            .iter()
            .map(|site| async move { (site, self.scrape_site(site, query).await) })
            .collect();

        let results = join_all(scrape_futures).await;
        self.collect(results, start)
    }

    /// Scrape a single registered site.
    pub async fn search_site(
        &self,
        site_id: &str,
        query: Option<&str>,
    ) -> Result<AggregateResult, ScrapeError> {
        let start = Instant::now();
        let site = self
            .site(site_id)
            .ok_or_else(|| ScrapeError::SiteNotFound(site_id.to_string()))?;

        let result = self.scrape_site(site, query).await;
        self.collect(vec![(site, result)], start)
    }

    fn collect(
        &self,
        results: Vec<(&SiteDescriptor, Result<Vec<CatalogEntry>, ScrapeError>)>,
        start: Instant,
    ) -> Result<AggregateResult, ScrapeError> {
        let attempted = results.len();
        let mut all: Vec<CatalogEntry> = Vec::new();
        let mut site_errors: BTreeMap<String, String> = BTreeMap::new();
        let mut launch_failures = 0;

        for (site, result) in results {
            match result {
                Ok(mut entries) => all.append(&mut entries),
                Err(e) => {
                    warn!(site = %site.id, error = %e, "Site scrape failed");
                    if is_launch_failure(&e) {
                        launch_failures += 1;
                    }
                    site_errors.insert(site.id.clone(), e.to_string());
                }
            }
        }

        if attempted > 0 && launch_failures == attempted {
            let reason = site_errors
                .values()
                .next()
                .cloned()
                .unwrap_or_else(|| "browser failed to launch".to_string());
            return Err(ScrapeError::BrowserUnavailable(reason));
        }

        let entries = dedup_by_title(all);
        let duration_ms = start.elapsed().as_millis() as u64;

        info!(
            results = entries.len(),
            failed_sites = site_errors.len(),
            duration_ms = duration_ms,
            "Scrape complete"
        );

        Ok(AggregateResult {
            entries,
            site_errors,
            duration_ms,
        })
    }

    /// Scrape one site's catalog page under the site timeout.
    async fn scrape_site(
        &self,
        site: &SiteDescriptor,
        query: Option<&str>,
    ) -> Result<Vec<CatalogEntry>, ScrapeError> {
        let url = site.catalog_url(query);
        let secs = self.config.site_timeout_secs;
        let start = Instant::now();

        let result = match tokio::time::timeout(
            Duration::from_secs(secs),
            self.load_with_retry(&site.id, &url),
        )
        .await
        {
            Ok(Ok(page)) => Ok(extract_catalog(&page, site, self.config.max_catalog_items)),
            Ok(Err(e)) => Err(ScrapeError::Browser(e)),
            Err(_) => Err(ScrapeError::Timeout {
                site: site.id.clone(),
                secs,
            }),
        };

        let outcome = match &result {
            Ok(entries) => {
                metrics::CATALOG_ENTRIES
                    .with_label_values(&[site.id.as_str()])
                    .observe(entries.len() as f64);
                "success"
            }
            Err(ScrapeError::Timeout { .. }) => "timeout",
            Err(_) => "error",
        };
        metrics::SITE_SCRAPES
            .with_label_values(&[site.id.as_str(), outcome])
            .inc();
        metrics::SITE_SCRAPE_DURATION
            .with_label_values(&[site.id.as_str()])
            .observe(start.elapsed().as_secs_f64());

        result
    }

    /// Load a page, retrying once if the browser could not be launched.
    async fn load_with_retry(&self, site_id: &str, url: &str) -> Result<LoadedPage, BrowserError> {
        match self.source.load(url).await {
            Err(e) if e.is_launch_failure() => {
                warn!(site = site_id, error = %e, "Browser launch failed, retrying once");
                self.source.load(url).await
            }
            other => other,
        }
    }

    /// Episode list of one catalog entry.
    ///
    /// Transport failures yield an empty list; only an unknown site or a
    /// browser that cannot launch is an error.
    pub async fn episodes(
        &self,
        site_id: &str,
        anime_id: &str,
        anime_url: &str,
    ) -> Result<Vec<EpisodeEntry>, ScrapeError> {
        let site = self
            .site(site_id)
            .ok_or_else(|| ScrapeError::SiteNotFound(site_id.to_string()))?;
        let secs = self.config.site_timeout_secs;

        match tokio::time::timeout(
            Duration::from_secs(secs),
            self.load_with_retry(&site.id, anime_url),
        )
        .await
        {
            Ok(Ok(page)) => Ok(extract_episodes(&page, anime_id, site)),
            Ok(Err(e)) if e.is_launch_failure() => {
                Err(ScrapeError::BrowserUnavailable(e.to_string()))
            }
            Ok(Err(e)) => {
                warn!(site = %site.id, url = anime_url, error = %e, "Episode page failed to load");
                Ok(Vec::new())
            }
            Err(_) => {
                warn!(site = %site.id, url = anime_url, secs = secs, "Episode page timed out");
                Ok(Vec::new())
            }
        }
    }

    /// Resolve a watch page. Always yields a playable or external URL.
    pub async fn stream(&self, episode_url: &str) -> StreamingData {
        resolve_stream(self.source.as_ref(), episode_url, &self.user_agent).await
    }
}

fn is_launch_failure(error: &ScrapeError) -> bool {
    match error {
        ScrapeError::Browser(e) => e.is_launch_failure(),
        ScrapeError::BrowserUnavailable(_) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixtures, MockPageSource};

    fn aggregator(source: Arc<MockPageSource>, sites: &[&str]) -> Aggregator {
        let config = ScraperConfig {
            site_timeout_secs: 1,
            max_catalog_items: 20,
        };
        Aggregator::new(
            sites.iter().map(|id| fixtures::site(id)).collect(),
            source,
            config,
            "TestAgent/1.0",
        )
    }

    #[tokio::test]
    async fn test_search_all_sites_dedups_in_registration_order() {
        let source = Arc::new(MockPageSource::new());
        source
            .set_html(
                &fixtures::site("alpha").base_url,
                fixtures::catalog_page(&[("Naruto", "/a/naruto"), ("Bleach", "/a/bleach")]),
            )
            .await;
        source
            .set_html(
                &fixtures::site("beta").base_url,
                fixtures::catalog_page(&[("naruto", "/b/naruto"), ("Frieren", "/b/frieren")]),
            )
            .await;

        let agg = aggregator(source, &["alpha", "beta"]);
        let result = agg.search_all_sites(None).await.unwrap();

        let ids: Vec<&str> = result.entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["alpha-0", "alpha-1", "beta-1"]);
        assert!(result.site_errors.is_empty());
    }

    #[tokio::test]
    async fn test_one_site_timing_out_does_not_affect_others() {
        let source = Arc::new(MockPageSource::new());
        for id in ["alpha", "beta", "gamma"] {
            source
                .set_html(
                    &fixtures::site(id).base_url,
                    fixtures::catalog_page(&[(format!("Show {}", id).as_str(), "/x")]),
                )
                .await;
        }
        source
            .set_delay(&fixtures::site("beta").base_url, Duration::from_secs(5))
            .await;

        let agg = aggregator(source, &["alpha", "beta", "gamma"]);
        let result = agg.search_all_sites(None).await.unwrap();

        assert_eq!(result.entries.len(), 2);
        assert!(result.site_errors.contains_key("beta"));
        assert!(result.site_errors["beta"].contains("timed out"));
    }

    #[tokio::test]
    async fn test_empty_results_are_success() {
        let source = Arc::new(MockPageSource::new());
        source
            .set_html(&fixtures::site("alpha").base_url, "<p>no results</p>")
            .await;
        let agg = aggregator(source, &["alpha"]);

        let result = agg.search_all_sites(None).await.unwrap();
        assert!(result.entries.is_empty());
        assert!(result.site_errors.is_empty());
    }

    #[tokio::test]
    async fn test_failed_site_is_reported_not_raised() {
        let agg = aggregator(Arc::new(MockPageSource::new()), &["alpha"]);
        let result = agg.search_all_sites(Some("zzz")).await.unwrap();
        assert!(result.entries.is_empty());
        assert!(result.site_errors.contains_key("alpha"));
    }

    #[tokio::test]
    async fn test_launch_failure_retried_once() {
        let source = Arc::new(MockPageSource::new());
        source
            .set_html(
                &fixtures::site("alpha").base_url,
                fixtures::catalog_page(&[("Naruto", "/n")]),
            )
            .await;
        source.fail_launches(1);

        let agg = aggregator(source.clone(), &["alpha"]);
        let result = agg.search_all_sites(None).await.unwrap();
        assert_eq!(result.entries.len(), 1);
        assert_eq!(source.requests().await.len(), 2);
    }

    #[tokio::test]
    async fn test_browser_unavailable_everywhere_is_error() {
        let source = Arc::new(MockPageSource::new());
        source.fail_launches(usize::MAX);
        let agg = aggregator(source, &["alpha", "beta"]);
        let err = agg.search_all_sites(None).await.unwrap_err();
        assert!(matches!(err, ScrapeError::BrowserUnavailable(_)));
    }

    #[tokio::test]
    async fn test_search_unknown_site() {
        let agg = aggregator(Arc::new(MockPageSource::new()), &["alpha"]);
        let err = agg.search_site("nope", None).await.unwrap_err();
        assert!(matches!(err, ScrapeError::SiteNotFound(_)));
    }

    #[tokio::test]
    async fn test_search_site_uses_search_template() {
        let source = Arc::new(MockPageSource::new());
        let site = fixtures::site("alpha");
        source
            .set_html(
                &site.catalog_url(Some("one piece")),
                fixtures::catalog_page(&[("One Piece", "/op")]),
            )
            .await;
        let agg = aggregator(source.clone(), &["alpha"]);
        let result = agg.search_site("alpha", Some("one piece")).await.unwrap();
        assert_eq!(result.entries[0].title, "One Piece");
        assert_eq!(
            source.requests().await,
            vec![site.catalog_url(Some("one piece"))]
        );
    }

    #[tokio::test]
    async fn test_episodes_navigation_failure_is_empty() {
        let source = Arc::new(MockPageSource::new());
        let agg = aggregator(source, &["alpha"]);
        let episodes = agg
            .episodes("alpha", "alpha-0", "https://site.example/missing")
            .await
            .unwrap();
        assert!(episodes.is_empty());
    }

    #[tokio::test]
    async fn test_stream_uses_configured_user_agent() {
        let source = Arc::new(MockPageSource::new());
        let url = "https://site.example/watch/1";
        source.set_html(url, "<p>nothing</p>").await;
        let agg = aggregator(source, &["alpha"]);
        let data = agg.stream(url).await;
        assert!(data.external);
        assert_eq!(data.headers["User-Agent"], "TestAgent/1.0");
    }
}
