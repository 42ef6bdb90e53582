//! External metadata gateway
//!
//! Thin pass-through to the two external catalog services:
//! - the bestseller overview feed, returned provider-native and unchanged
//! - keyword/ISBN volume search, adapted into the same feed shape
//!
//! Every call carries a bounded timeout. Failures surface as upstream
//! errors and are never retried silently.

mod adapter;
mod book;

pub use adapter::{feed_from_search, FeedBook, FeedList, FeedResults, SearchFeed};
pub use book::{BookPayload, NormalizedBook};

use crate::errors::{AppError, Result};
use crate::metrics;
use serde::Deserialize;
use std::time::{Duration, Instant};

/// Query parameters accepted by the volume search
#[derive(Debug, Default, Clone, Deserialize)]
pub struct SearchParams {
    pub author: Option<String>,
    pub title: Option<String>,
    pub isbn: Option<String>,
}

impl SearchParams {
    /// At least one criterion must be present
    pub fn is_empty(&self) -> bool {
        self.author.is_none() && self.title.is_none() && self.isbn.is_none()
    }

    /// Build the provider query string, e.g. `intitle:dune+inauthor:herbert`
    pub fn provider_query(&self) -> String {
        let mut parts = Vec::new();
        if let Some(ref title) = self.title {
            parts.push(format!("intitle:{}", title));
        }
        if let Some(ref author) = self.author {
            parts.push(format!("inauthor:{}", author));
        }
        if let Some(ref isbn) = self.isbn {
            parts.push(format!("isbn:{}", isbn));
        }
        parts.join("+")
    }
}

/// Provider-native volume search response
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumesResponse {
    #[serde(default)]
    pub total_items: u64,
    #[serde(default)]
    pub items: Vec<Volume>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Volume {
    #[serde(default)]
    pub self_link: String,
    #[serde(default)]
    pub volume_info: VolumeInfo,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeInfo {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub publisher: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub industry_identifiers: Vec<IndustryIdentifier>,
    #[serde(default)]
    pub image_links: Option<ImageLinks>,
}

#[derive(Debug, Deserialize)]
pub struct IndustryIdentifier {
    #[serde(rename = "type")]
    pub id_type: String,
    #[serde(default)]
    pub identifier: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageLinks {
    #[serde(default)]
    pub thumbnail: String,
}

/// Client for both external catalog services
#[derive(Clone)]
pub struct CatalogClient {
    http: reqwest::Client,
    overview_base_url: String,
    overview_api_key: Option<String>,
    search_base_url: String,
    search_api_key: Option<String>,
    search_max_results: u32,
    timeout_ms: u64,
}

impl CatalogClient {
    /// Create a new client from configuration
    pub fn new(config: &crate::config::CatalogConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Configuration {
                message: format!("Failed to build catalog HTTP client: {}", e),
            })?;

        Ok(Self {
            http,
            overview_base_url: config.overview_base_url.clone(),
            overview_api_key: config.overview_api_key.clone(),
            search_base_url: config.search_base_url.clone(),
            search_api_key: config.search_api_key.clone(),
            search_max_results: config.search_max_results,
            timeout_ms: config.timeout_secs * 1000,
        })
    }

    /// Fetch the bestseller overview feed, provider-native and unchanged
    pub async fn fetch_bestsellers_overview(&self) -> Result<serde_json::Value> {
        let url = format!("{}/lists/overview.json", self.overview_base_url);
        let start = Instant::now();

        let mut request = self.http.get(&url);
        if let Some(ref key) = self.overview_api_key {
            request = request.query(&[("api-key", key.as_str())]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| self.upstream_error("bestsellers", e))?;

        if !response.status().is_success() {
            let status = response.status();
            metrics::record_upstream("bestsellers", start.elapsed().as_secs_f64(), false);
            return Err(AppError::Upstream {
                service: "bestsellers".to_string(),
                message: format!("API error {}", status),
            });
        }

        let feed = response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| self.upstream_error("bestsellers", e))?;

        metrics::record_upstream("bestsellers", start.elapsed().as_secs_f64(), true);
        Ok(feed)
    }

    /// Search volumes and adapt the response into the bestseller feed shape
    pub async fn search_volumes(&self, params: &SearchParams) -> Result<SearchFeed> {
        if params.is_empty() {
            return Err(AppError::Validation {
                message: "At least one search parameter (author, title, isbn) is required"
                    .to_string(),
                field: None,
            });
        }

        let url = format!("{}/volumes", self.search_base_url);
        let start = Instant::now();

        let mut query: Vec<(&str, String)> = vec![
            ("q", params.provider_query()),
            ("maxResults", self.search_max_results.to_string()),
        ];
        if let Some(ref key) = self.search_api_key {
            query.push(("key", key.clone()));
        }

        let response = self
            .http
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| self.upstream_error("volume-search", e))?;

        if !response.status().is_success() {
            let status = response.status();
            metrics::record_upstream("volume-search", start.elapsed().as_secs_f64(), false);
            return Err(AppError::Upstream {
                service: "volume-search".to_string(),
                message: format!("API error {}", status),
            });
        }

        let volumes = response
            .json::<VolumesResponse>()
            .await
            .map_err(|e| self.upstream_error("volume-search", e))?;

        metrics::record_upstream("volume-search", start.elapsed().as_secs_f64(), true);
        Ok(feed_from_search(&volumes))
    }

    fn upstream_error(&self, service: &str, err: reqwest::Error) -> AppError {
        if err.is_timeout() {
            AppError::UpstreamTimeout {
                service: service.to_string(),
                timeout_ms: self.timeout_ms,
            }
        } else {
            AppError::Upstream {
                service: service.to_string(),
                message: err.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_query_all_parts() {
        let params = SearchParams {
            author: Some("herbert".into()),
            title: Some("dune".into()),
            isbn: Some("9780441013593".into()),
        };
        assert_eq!(
            params.provider_query(),
            "intitle:dune+inauthor:herbert+isbn:9780441013593"
        );
    }

    #[test]
    fn test_provider_query_single_part() {
        let params = SearchParams {
            isbn: Some("9780441013593".into()),
            ..Default::default()
        };
        assert_eq!(params.provider_query(), "isbn:9780441013593");
    }

    #[test]
    fn test_empty_params_detected() {
        assert!(SearchParams::default().is_empty());
        assert!(!SearchParams {
            title: Some("dune".into()),
            ..Default::default()
        }
        .is_empty());
    }

    #[test]
    fn test_volumes_response_tolerates_missing_fields() {
        let parsed: VolumesResponse = serde_json::from_str(r#"{"totalItems": 0}"#).unwrap();
        assert_eq!(parsed.total_items, 0);
        assert!(parsed.items.is_empty());
    }
}
