use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::browser::DEFAULT_USER_AGENT;
use crate::resolver::{HttpDiscoveryConfig, DEFAULT_PLACEHOLDERS};
use crate::sites::{builtin_sites, SiteDescriptor};

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub scraper: ScraperConfig,
    /// Registered sites, in registration order. Replaces the built-in
    /// catalog when present.
    #[serde(default = "builtin_sites")]
    pub sites: Vec<SiteDescriptor>,
    #[serde(default)]
    pub resolver: ResolverConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            browser: BrowserConfig::default(),
            scraper: ScraperConfig::default(),
            sites: builtin_sites(),
            resolver: ResolverConfig::default(),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Headless browser configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BrowserConfig {
    /// Run without a visible window (default: true).
    #[serde(default = "default_true")]
    pub headless: bool,
    /// Chrome/Chromium binary; auto-detected when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chrome_executable: Option<PathBuf>,
    /// DevTools endpoint of an already running browser
    /// (e.g. "http://localhost:9222"). Skips launching when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_url: Option<String>,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_viewport_width")]
    pub viewport_width: u32,
    #[serde(default = "default_viewport_height")]
    pub viewport_height: u32,
    /// Navigation timeout in seconds (default: 30)
    #[serde(default = "default_navigation_timeout")]
    pub navigation_timeout_secs: u64,
    /// Extra wait after navigation for client-rendered content (default: 2000)
    #[serde(default = "default_settle_delay")]
    pub settle_delay_ms: u64,
    /// Abort image and font requests (default: true)
    #[serde(default = "default_true")]
    pub block_resources: bool,
    /// Additional Chrome arguments.
    #[serde(default)]
    pub chrome_args: Vec<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            chrome_executable: None,
            remote_url: None,
            user_agent: default_user_agent(),
            viewport_width: default_viewport_width(),
            viewport_height: default_viewport_height(),
            navigation_timeout_secs: default_navigation_timeout(),
            settle_delay_ms: default_settle_delay(),
            block_resources: true,
            chrome_args: Vec::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_viewport_width() -> u32 {
    1366
}

fn default_viewport_height() -> u32 {
    768
}

fn default_navigation_timeout() -> u64 {
    30
}

fn default_settle_delay() -> u64 {
    2000
}

/// Multi-site dispatch configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScraperConfig {
    /// Upper bound for one site's scrape, including retry (default: 45)
    #[serde(default = "default_site_timeout")]
    pub site_timeout_secs: u64,
    /// Catalog elements considered per page (default: 20)
    #[serde(default = "default_max_catalog_items")]
    pub max_catalog_items: usize,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            site_timeout_secs: default_site_timeout(),
            max_catalog_items: default_max_catalog_items(),
        }
    }
}

fn default_site_timeout() -> u64 {
    45
}

fn default_max_catalog_items() -> usize {
    20
}

/// Client-side resolution cache and discovery chain configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResolverConfig {
    /// Cache entry lifetime in seconds (default: 300)
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,
    /// Per-API timeout in seconds (default: 10)
    #[serde(default = "default_api_timeout")]
    pub api_timeout_secs: u64,
    /// Base URL of the scraping service when deployed separately
    /// (e.g. "http://scraper.internal:8080"). Tried before `apis`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_url: Option<String>,
    /// Ordered discovery APIs.
    #[serde(default)]
    pub apis: Vec<HttpDiscoveryConfig>,
    /// Last-resort media pool.
    #[serde(default = "default_placeholders")]
    pub placeholders: Vec<String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: default_cache_ttl(),
            api_timeout_secs: default_api_timeout(),
            service_url: None,
            apis: Vec::new(),
            placeholders: default_placeholders(),
        }
    }
}

fn default_cache_ttl() -> u64 {
    300
}

fn default_api_timeout() -> u64 {
    10
}

fn default_placeholders() -> Vec<String> {
    DEFAULT_PLACEHOLDERS.iter().map(|s| s.to_string()).collect()
}

/// Sanitized config for API responses
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub browser: SanitizedBrowserConfig,
    pub scraper: ScraperConfig,
    pub sites: Vec<String>,
    pub resolver: SanitizedResolverConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedBrowserConfig {
    pub headless: bool,
    pub remote: bool,
    pub navigation_timeout_secs: u64,
    pub settle_delay_ms: u64,
    pub block_resources: bool,
}

/// Sanitized resolver config (service URL hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedResolverConfig {
    pub cache_ttl_secs: u64,
    pub api_timeout_secs: u64,
    pub service_url_configured: bool,
    pub apis: Vec<String>,
    pub placeholders: usize,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            browser: SanitizedBrowserConfig {
                headless: config.browser.headless,
                remote: config.browser.remote_url.is_some(),
                navigation_timeout_secs: config.browser.navigation_timeout_secs,
                settle_delay_ms: config.browser.settle_delay_ms,
                block_resources: config.browser.block_resources,
            },
            scraper: config.scraper.clone(),
            sites: config.sites.iter().map(|s| s.id.clone()).collect(),
            resolver: SanitizedResolverConfig {
                cache_ttl_secs: config.resolver.cache_ttl_secs,
                api_timeout_secs: config.resolver.api_timeout_secs,
                service_url_configured: config.resolver.service_url.is_some(),
                apis: config.resolver.apis.iter().map(|a| a.name.clone()).collect(),
                placeholders: config.resolver.placeholders.len(),
            },
        }
    }
}
