//! HTTP source for an indexer over the referral contract
//!
//! Endpoints (relative to the configured base URL):
//! - `GET /accounts/{address}` returns the account's node
//! - `GET /accounts/{address}/referrals` returns `{ "referrals": [node, ...] }`
//!
//! An optional bearer token is read from `GENEALOGY_API_KEY`.

use super::{ReferralSource, RootProvider};
use crate::config::Config;
use crate::model::{Address, Node};
use crate::{Error, Result};
use async_trait::async_trait;
#[cfg(feature = "http-source")]
use serde::Deserialize;

/// Environment variable holding the API bearer token
pub const API_KEY_ENV: &str = "GENEALOGY_API_KEY";

/// Referral source calling a remote indexer
pub struct ApiSource {
    #[cfg(feature = "http-source")]
    client: reqwest::Client,
    #[cfg(feature = "http-source")]
    base_url: reqwest::Url,
    #[cfg(feature = "http-source")]
    api_key: Option<String>,
}

#[cfg(feature = "http-source")]
#[derive(Deserialize)]
struct ReferralsResponse {
    referrals: Vec<Node>,
}

#[cfg(feature = "http-source")]
impl ApiSource {
    /// Create a source from the loaded configuration
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;

        let base_url = reqwest::Url::parse(&config.api_url)
            .map_err(|e| Error::Config(format!("Invalid API URL {}: {}", config.api_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Config(format!(
                "Invalid API URL {}: not a base URL",
                config.api_url
            )));
        }

        Ok(ApiSource {
            client,
            base_url,
            api_key: std::env::var(API_KEY_ENV).ok(),
        })
    }

    /// Base URL with `segments` appended, each percent-encoded
    fn url(&self, segments: &[&str]) -> reqwest::Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, url: reqwest::Url) -> Result<T> {
        let mut request = self.client.get(url);
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {}", key));
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Http(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response body".to_string());
            return Err(Error::Http(format!(
                "request failed with status {}: {}",
                status, body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| Error::Http(format!("Failed to parse response: {}", e)))
    }
}

#[cfg(feature = "http-source")]
#[async_trait]
impl ReferralSource for ApiSource {
    async fn fetch_children(&self, address: &Address) -> Result<Vec<Node>> {
        let url = self.url(&["accounts", address.as_str(), "referrals"]);
        let response: ReferralsResponse = self
            .get(url)
            .await
            .map_err(|e| Error::fetch(address, e.to_string()))?;
        Ok(response.referrals)
    }

    fn name(&self) -> &str {
        "api"
    }
}

#[cfg(feature = "http-source")]
#[async_trait]
impl RootProvider for ApiSource {
    async fn fetch_root(&self, viewer: &Address) -> Result<Node> {
        let url = self.url(&["accounts", viewer.as_str()]);
        self.get(url)
            .await
            .map_err(|e| Error::RootUnavailable(e.to_string()))
    }
}

#[cfg(not(feature = "http-source"))]
impl ApiSource {
    pub fn new(_config: &Config) -> Result<Self> {
        Err(Error::Config(
            "HTTP source not enabled. Compile with --features http-source".to_string(),
        ))
    }
}

#[cfg(not(feature = "http-source"))]
#[async_trait]
impl ReferralSource for ApiSource {
    async fn fetch_children(&self, address: &Address) -> Result<Vec<Node>> {
        Err(Error::fetch(address, "HTTP source not enabled"))
    }

    fn name(&self) -> &str {
        "api"
    }
}

#[cfg(not(feature = "http-source"))]
#[async_trait]
impl RootProvider for ApiSource {
    async fn fetch_root(&self, _viewer: &Address) -> Result<Node> {
        Err(Error::RootUnavailable("HTTP source not enabled".to_string()))
    }
}
