use anistream_core::{Aggregator, Config, EpisodeVideoResolver, SanitizedConfig};

/// Shared application state
pub struct AppState {
    config: Config,
    aggregator: Aggregator,
    resolver: EpisodeVideoResolver,
}

impl AppState {
    pub fn new(config: Config, aggregator: Aggregator, resolver: EpisodeVideoResolver) -> Self {
        Self {
            config,
            aggregator,
            resolver,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    pub fn resolver(&self) -> &EpisodeVideoResolver {
        &self.resolver
    }
}
