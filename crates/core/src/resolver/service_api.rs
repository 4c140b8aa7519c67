use async_trait::async_trait;
use tracing::debug;

use super::{DiscoveryApi, DiscoveryError};
use crate::client::ScrapingServiceClient;

/// Discovery through the scraping service: search the title, list the
/// first hit's episodes and resolve the requested one.
///
/// Only a direct (non-external) stream counts as a source.
pub struct ScrapingServiceApi {
    client: ScrapingServiceClient,
}

impl ScrapingServiceApi {
    pub fn new(client: ScrapingServiceClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DiscoveryApi for ScrapingServiceApi {
    fn name(&self) -> &str {
        "scraping-service"
    }

    async fn discover(&self, title: &str, episode: u32) -> Result<Vec<String>, DiscoveryError> {
        let hits = self.client.search_animes(Some(title), None).await?;
        let Some(anime) = hits.first() else {
            debug!(title = title, "Scraping service found no catalog entry");
            return Ok(Vec::new());
        };

        let episodes = self
            .client
            .list_episodes(&anime.site_id, &anime.id, &anime.url)
            .await?;
        let Some(target) = episodes.iter().find(|e| e.number == episode) else {
            debug!(title = title, episode = episode, "Episode not listed");
            return Ok(Vec::new());
        };

        let stream = self
            .client
            .stream(&target.site_id, &target.id, &target.url)
            .await?;
        if stream.external || stream.streaming_url.is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![stream.streaming_url])
    }
}
