//! Access tokens for the Cloud Billing API

use std::time::{Duration, Instant};

use parking_lot::Mutex;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::BillingError;
use crate::config::BillingConfig;

/// Tokens are refreshed this long before they expire
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Where bearer tokens come from
#[derive(Debug, Clone)]
pub enum TokenSource {
    /// A fixed token, e.g. from `gcloud auth print-access-token`
    Static(String),
    /// The GCE/Cloud Run metadata server
    Metadata {
        /// Token endpoint of the metadata server
        url: String,
    },
}

impl TokenSource {
    /// Pick the source for a billing configuration
    pub fn from_config(config: &BillingConfig) -> Self {
        match config.access_token.as_deref().map(str::trim) {
            Some(token) if !token.is_empty() => Self::Static(token.to_string()),
            _ => Self::Metadata {
                url: config.metadata_token_url.clone(),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct MetadataToken {
    access_token: String,
    #[serde(default)]
    expires_in: u64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    refresh_at: Instant,
}

/// Hands out bearer tokens, caching metadata server tokens until near expiry
pub struct AccessTokenProvider {
    source: TokenSource,
    http: Client,
    cached: Mutex<Option<CachedToken>>,
}

impl AccessTokenProvider {
    /// Create a provider that uses `http` for metadata server requests
    pub fn new(source: TokenSource, http: Client) -> Self {
        Self {
            source,
            http,
            cached: Mutex::new(None),
        }
    }

    /// Current bearer token
    pub async fn token(&self) -> Result<String, BillingError> {
        let url = match &self.source {
            TokenSource::Static(token) => return Ok(token.clone()),
            TokenSource::Metadata { url } => url,
        };

        let cached = self.cached.lock().clone();
        if let Some(cached) = cached.filter(|cached| Instant::now() < cached.refresh_at) {
            return Ok(cached.value);
        }

        let token = self.fetch_metadata_token(url).await?;
        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(EXPIRY_MARGIN);

        debug!(expires_in = token.expires_in, "Fetched access token from metadata server");

        *self.cached.lock() = Some(CachedToken {
            value: token.access_token.clone(),
            refresh_at: Instant::now() + lifetime,
        });

        Ok(token.access_token)
    }

    async fn fetch_metadata_token(&self, url: &str) -> Result<MetadataToken, BillingError> {
        let response = self
            .http
            .get(url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|e| BillingError::Auth(format!("metadata server unreachable: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(BillingError::Auth(format!(
                "metadata server returned {status}: {body}"
            )));
        }

        let token: MetadataToken = response
            .json()
            .await
            .map_err(|e| BillingError::Auth(format!("invalid metadata token response: {e}")))?;

        if token.access_token.is_empty() {
            return Err(BillingError::Auth(
                "metadata server returned an empty token".to_string(),
            ));
        }

        Ok(token)
    }
}
