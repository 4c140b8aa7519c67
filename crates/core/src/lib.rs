pub mod browser;
pub mod client;
pub mod config;
pub mod dispatch;
pub mod extract;
pub mod fallback;
pub mod metrics;
pub mod resolver;
pub mod sites;
pub mod testing;

pub use browser::{BrowserError, ChromiumBrowser, LoadedPage, PageSource, DEFAULT_USER_AGENT};
pub use client::{ClientError, ScrapingServiceClient};
pub use config::{
    load_config, load_config_from_str, validate_config, BrowserConfig, Config, ConfigError,
    ResolverConfig, SanitizedConfig, ScraperConfig, ServerConfig,
};
pub use dispatch::{AggregateResult, Aggregator, ScrapeError};
pub use resolver::{
    build_resolver, DiscoveryApi, DiscoveryError, EpisodeVideoResolver, ResolvedVideo,
    ResolverStats, VideoSource,
};
pub use sites::{
    builtin_sites, CatalogEntry, EpisodeEntry, SiteDescriptor, StreamSource, StreamingData,
};
