//! HTTP fetching of application detail pages
//!
//! Detail pages are plain server-rendered HTML, so unlike discovery they need
//! no browser. Responses go through a [`ResponseCache`].

use crate::config::ExtractionConfig;
use crate::extract::cache::ResponseCache;
use crate::{ConfigError, Result, ScraperError};
use chrono::{Duration as CacheTtl, Utc};
use reqwest::Client;
use std::path::Path;
use std::time::Duration;

/// Builds the HTTP client used for detail pages
///
/// # Arguments
///
/// * `config` - The extraction configuration (user agent, timeout)
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &ExtractionConfig) -> std::result::Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches detail pages, serving repeats from the cache
pub struct DetailFetcher {
    client: Client,
    cache: ResponseCache,
}

impl DetailFetcher {
    pub fn new(client: Client, cache: ResponseCache) -> Self {
        Self { client, cache }
    }

    /// Builds the client and opens the cache file named in the configuration
    pub fn from_config(config: &ExtractionConfig) -> Result<Self> {
        let client = build_http_client(config)?;
        let ttl = i64::try_from(config.cache_ttl_hours)
            .ok()
            .and_then(CacheTtl::try_hours)
            .ok_or_else(|| {
                ConfigError::Validation(format!(
                    "cache-ttl-hours out of range: {}",
                    config.cache_ttl_hours
                ))
            })?;
        let cache = ResponseCache::open(Path::new(&config.cache_path), ttl)?;

        let purged = cache.purge_expired(Utc::now())?;
        if purged > 0 {
            tracing::debug!("Purged {} expired cache entries", purged);
        }

        Ok(Self::new(client, cache))
    }

    /// Returns the HTML of the detail page at `url`
    ///
    /// Any transport failure or non-2xx status is returned as
    /// [`ScraperError::Http`]; the caller is expected to abort the run.
    pub async fn fetch_application_page(&self, url: &str) -> Result<String> {
        if let Some(body) = self.cache.get(url, Utc::now())? {
            tracing::debug!("Cache hit for {}", url);
            return Ok(body);
        }

        tracing::debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|source| ScraperError::Http {
                url: url.to_string(),
                source,
            })?;

        let body = response.text().await.map_err(|source| ScraperError::Http {
            url: url.to_string(),
            source,
        })?;

        self.cache.put(url, &body, Utc::now())?;
        Ok(body)
    }
}
