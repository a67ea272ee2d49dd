//! HTTP transport to an orbiter collector
//!
//! POSTs the JSON envelope to `{base}/views`, `{base}/events` or
//! `{base}/metrics`. One request per envelope, no retries.

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, error};
use url::Url;

use super::{EndpointKind, Transport, TransportError};
use crate::config::{ConfigError, TrackingConfig};
use crate::protocol::Envelope;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct OrbiterApi {
    client: reqwest::Client,
    base_url: Url,
}

impl OrbiterApi {
    /// Target the collector selected by the configuration
    pub fn new(config: &TrackingConfig) -> Result<Self, ConfigError> {
        Ok(Self::with_base_url(config.collector_url()?))
    }

    pub fn with_base_url(base_url: Url) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                error!("[OrbiterApi] Unable to build HTTP client: {}, using defaults", e);
                reqwest::Client::new()
            });

        Self { client, base_url }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn endpoint(&self, kind: EndpointKind) -> String {
        format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            kind.path()
        )
    }
}

#[async_trait]
impl Transport for OrbiterApi {
    async fn submit(&self, kind: EndpointKind, envelope: Envelope) -> Result<(), TransportError> {
        let url = self.endpoint(kind);
        let started = std::time::Instant::now();

        let response = self.client.post(&url).json(&envelope).send().await?;
        let status = response.status();

        if status.is_success() {
            debug!(
                "[OrbiterApi] {} accepted in {:?}",
                kind.path(),
                started.elapsed()
            );
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(TransportError::Status {
            status: status.as_u16(),
            body,
        })
    }
}
