//! Generic JSON discovery API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::{DiscoveryApi, DiscoveryError};

/// Discovery API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpDiscoveryConfig {
    pub name: String,
    /// Request URL; `{title}` and `{episode}` are substituted.
    pub url_template: String,
    /// JSON pointer to the sources array (default: "/sources").
    #[serde(default = "default_sources_pointer")]
    pub sources_pointer: String,
    /// Field holding the URL inside each source object (default: "url").
    #[serde(default = "default_url_field")]
    pub url_field: String,
}

fn default_sources_pointer() -> String {
    "/sources".to_string()
}

fn default_url_field() -> String {
    "url".to_string()
}

impl HttpDiscoveryConfig {
    pub fn new(name: &str, url_template: &str) -> Self {
        Self {
            name: name.to_string(),
            url_template: url_template.to_string(),
            sources_pointer: default_sources_pointer(),
            url_field: default_url_field(),
        }
    }

    /// Request URL for `(title, episode)`.
    pub fn request_url(&self, title: &str, episode: u32) -> String {
        self.url_template
            .replace("{title}", &urlencoding::encode(title.trim()))
            .replace("{episode}", &episode.to_string())
    }
}

/// Source URLs found at `pointer` in `body`.
///
/// Entries may be plain strings or objects carrying the URL under
/// `url_field`.
pub fn extract_sources(body: &Value, pointer: &str, url_field: &str) -> Vec<String> {
    let Some(items) = body.pointer(pointer).and_then(Value::as_array) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(url) => Some(url.clone()),
            Value::Object(map) => map.get(url_field).and_then(Value::as_str).map(str::to_string),
            _ => None,
        })
        .filter(|url| !url.trim().is_empty())
        .collect()
}

/// Discovery API backed by a configurable JSON endpoint.
pub struct HttpDiscoveryApi {
    client: Client,
    config: HttpDiscoveryConfig,
}

impl HttpDiscoveryApi {
    pub fn new(config: HttpDiscoveryConfig, timeout: Duration) -> Result<Self, DiscoveryError> {
        if !config.url_template.starts_with("http://") && !config.url_template.starts_with("https://") {
            return Err(DiscoveryError::InvalidConfig(format!(
                "{}: url_template must be an absolute http(s) URL",
                config.name
            )));
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl DiscoveryApi for HttpDiscoveryApi {
    fn name(&self) -> &str {
        &self.config.name
    }

    async fn discover(&self, title: &str, episode: u32) -> Result<Vec<String>, DiscoveryError> {
        let url = self.config.request_url(title, episode);
        debug!(api = %self.config.name, url = %url, "Querying discovery API");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DiscoveryError::Status {
                status: status.as_u16(),
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| DiscoveryError::ParseError(e.to_string()))?;

        Ok(extract_sources(
            &body,
            &self.config.sources_pointer,
            &self.config.url_field,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_url_substitution() {
        let config = HttpDiscoveryConfig::new("m", "https://api.example/v1/{title}/{episode}");
        assert_eq!(
            config.request_url("Spy x Family", 3),
            "https://api.example/v1/Spy%20x%20Family/3"
        );
    }

    #[test]
    fn test_extract_sources_objects_and_strings() {
        let body = json!({
            "data": {
                "sources": [
                    { "url": "https://cdn.example/1.m3u8", "quality": "1080p" },
                    "https://cdn.example/2.mp4",
                    { "file": "https://cdn.example/ignored.mp4" },
                    42
                ]
            }
        });
        assert_eq!(
            extract_sources(&body, "/data/sources", "url"),
            vec!["https://cdn.example/1.m3u8", "https://cdn.example/2.mp4"]
        );
    }

    #[test]
    fn test_extract_sources_missing_pointer() {
        assert!(extract_sources(&json!({ "ok": true }), "/sources", "url").is_empty());
    }

    #[test]
    fn test_relative_template_rejected() {
        let config = HttpDiscoveryConfig::new("m", "/api/{title}");
        assert!(matches!(
            HttpDiscoveryApi::new(config, Duration::from_secs(1)),
            Err(DiscoveryError::InvalidConfig(_))
        ));
    }
}
