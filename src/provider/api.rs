use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, error};

use crate::provider::{types::ProviderFault, ProviderConfig, RawPayload, Request};

/// Failures of a single provider call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("provider responded with status {0}")]
    BadStatus(u16),
    #[error("undecodable provider payload: {0}")]
    Decode(String),
}

/// Status and body of an HTTP exchange, before any decoding.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Performs a GET against the provider endpoint.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(&self, url: &str, query: &[(&str, &str)]) -> Result<RawResponse, GatewayError>;
}

/// reqwest-backed transport
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Create a transport whose requests give up after `timeout`.
    ///
    /// # Errors
    ///
    /// Fails if the TLS backend cannot be initialised.
    pub fn new(timeout: Duration) -> reqwest::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, url: &str, query: &[(&str, &str)]) -> Result<RawResponse, GatewayError> {
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        Ok(RawResponse { status, body })
    }
}

/// Metadata provider client
pub struct Gateway {
    config: ProviderConfig,
    transport: Arc<dyn Transport>,
}

impl Gateway {
    pub fn new(config: ProviderConfig, transport: Arc<dyn Transport>) -> Self {
        Self { config, transport }
    }

    /// Issue one request and decode its body, without interpreting the payload.
    ///
    /// # Errors
    ///
    /// [`GatewayError::Transport`] when the call itself fails, [`GatewayError::BadStatus`]
    /// for a non-2xx answer and [`GatewayError::Decode`] when the body is not JSON.
    pub async fn send(&self, request: &Request) -> Result<RawPayload, GatewayError> {
        debug!("Request URL: {}", request.display_url(&self.config.base_url));

        let response = self
            .transport
            .fetch(
                &self.config.base_url,
                &request.query_pairs(&self.config.api_key),
            )
            .await
            .inspect_err(|e| error!(method = %request.method, "Provider request failed: {e}"))?;

        if !response.is_success() {
            let reason = serde_json::from_str::<ProviderFault>(&response.body)
                .ok()
                .and_then(|f| f.message);
            error!(
                method = %request.method,
                status = response.status,
                ?reason,
                "Provider returned unsuccessful status"
            );
            return Err(GatewayError::BadStatus(response.status));
        }

        let payload: RawPayload = serde_json::from_str(&response.body)
            .map_err(|e| GatewayError::Decode(e.to_string()))?;

        if let Ok(ProviderFault {
            error: Some(code),
            message,
        }) = serde_json::from_str::<ProviderFault>(&response.body)
        {
            debug!(method = %request.method, code, ?message, "Provider reported a fault in a successful response");
        }

        Ok(payload)
    }
}
