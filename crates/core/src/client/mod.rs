//! HTTP client for the scraping service's own API.
//!
//! Callers that run the scraping service as a separate deployment use
//! [`ScrapingServiceClient`] instead of linking the dispatch layer
//! directly.

use std::time::Duration;

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::sites::{CatalogEntry, EpisodeEntry, StreamingData};

/// Errors returned by [`ScrapingServiceClient`].
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Invalid service URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Service answered `{ success: false }` or a non-2xx status.
    #[error("Service error ({status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Service response had no data")]
    EmptyResponse,
}

/// Response envelope shared by every endpoint.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    data: Option<T>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Client for the catalog, episode and stream endpoints.
#[derive(Debug, Clone)]
pub struct ScrapingServiceClient {
    client: Client,
    base_url: Url,
}

impl ScrapingServiceClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ClientError::InvalidUrl(base_url.to_string()));
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// `GET /animes?q=&site=`
    pub async fn search_animes(
        &self,
        query: Option<&str>,
        site: Option<&str>,
    ) -> Result<Vec<CatalogEntry>, ClientError> {
        let mut request = self.client.get(self.endpoint(&["animes"])?);
        if let Some(q) = query {
            request = request.query(&[("q", q)]);
        }
        if let Some(s) = site {
            request = request.query(&[("site", s)]);
        }
        debug!(query = ?query, site = ?site, "Searching scraping service");
        unwrap_envelope(request.send().await?).await
    }

    /// `GET /animes/{siteId}/{animeId}/episodes?animeUrl=`
    pub async fn list_episodes(
        &self,
        site_id: &str,
        anime_id: &str,
        anime_url: &str,
    ) -> Result<Vec<EpisodeEntry>, ClientError> {
        let url = self.endpoint(&["animes", site_id, anime_id, "episodes"])?;
        let response = self
            .client
            .get(url)
            .query(&[("animeUrl", anime_url)])
            .send()
            .await?;
        unwrap_envelope(response).await
    }

    /// `GET /episodes/{siteId}/{episodeId}/stream?episodeUrl=`
    pub async fn stream(
        &self,
        site_id: &str,
        episode_id: &str,
        episode_url: &str,
    ) -> Result<StreamingData, ClientError> {
        let url = self.endpoint(&["episodes", site_id, episode_id, "stream"])?;
        let response = self
            .client
            .get(url)
            .query(&[("episodeUrl", episode_url)])
            .send()
            .await?;
        unwrap_envelope(response).await
    }
}

async fn unwrap_envelope<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    let envelope: Envelope<T> = match response.json().await {
        Ok(envelope) => envelope,
        Err(e) if status.is_success() => return Err(ClientError::HttpError(e)),
        Err(_) => {
            return Err(ClientError::ApiError {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("unknown").to_string(),
            })
        }
    };

    if !status.is_success() || !envelope.success {
        return Err(ClientError::ApiError {
            status: status.as_u16(),
            message: envelope
                .message
                .or(envelope.error)
                .unwrap_or_else(|| "request failed".to_string()),
        });
    }

    envelope.data.ok_or(ClientError::EmptyResponse)
}
