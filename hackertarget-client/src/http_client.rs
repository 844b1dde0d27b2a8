//! HTTP transport
//!
//! One GET per call against the HackerTarget API. This layer does not decide
//! whether a response is good or bad; it only reports what came back
//! ([`RawResponse`]) or why nothing came back ([`TransportError`]).
//!
//! # design principles
//! - **One connection pool per process** - [`HttpTransport`] owns a single
//!   `reqwest::Client`, created once and shared by every query and batch
//! - **Mockable seam** - executors hold an `Arc<dyn Transport>` so tests can
//!   script responses without a network

use std::error::Error as _;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use url::Url;

use crate::config::ClientConfig;
use crate::error::{ClientError, TransportError};
use crate::tool::Tool;
use crate::utils::log_sanitizer::{redact_api_key, truncate_for_log};

/// Idle connections kept per host.
const POOL_MAX_IDLE_PER_HOST: usize = 10;

/// Status, body and headers of one HTTP response, unclassified.
#[derive(Debug, Clone, Default)]
pub struct RawResponse {
    pub status_code: u16,
    pub body: Vec<u8>,
    pub headers: HeaderMap,
}

impl RawResponse {
    pub fn new(status_code: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status_code,
            body: body.into(),
            headers: HeaderMap::new(),
        }
    }

    /// Attach a header; invalid names or values are ignored.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            reqwest::header::HeaderName::from_bytes(name.as_bytes()),
            reqwest::header::HeaderValue::from_str(value),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Header value as text, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Sends a single request for a tool and target.
///
/// Implementations must be safe to share between concurrently running
/// queries and batches.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(
        &self,
        tool: Tool,
        target: &str,
        timeout: Duration,
    ) -> Result<RawResponse, TransportError>;
}

/// [`Transport`] backed by a pooled `reqwest::Client`.
///
/// Dropping the transport releases the pool.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
    api_key: Option<String>,
}

impl HttpTransport {
    /// Build the connection pool for `config`.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        config.validate()?;
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.timeout)
            .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ClientError::HttpClient(e.to_string()))?;

        log::debug!(
            "[transport] Connection pool ready for {} (timeout={}s)",
            config.base_url,
            config.timeout.as_secs_f32()
        );

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
        })
    }

    /// Full request URL: `{base}{tool path}?q={target}[&apikey={key}]`.
    pub fn request_url(&self, tool: Tool, target: &str) -> Result<Url, TransportError> {
        let mut url = self
            .base_url
            .join(tool.path().trim_start_matches('/'))
            .map_err(|e| TransportError::connection(format!("Invalid request URL: {e}")))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("q", target);
            if let Some(key) = &self.api_key {
                query.append_pair("apikey", key);
            }
        }
        Ok(url)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        tool: Tool,
        target: &str,
        timeout: Duration,
    ) -> Result<RawResponse, TransportError> {
        let url = self.request_url(tool, target)?;
        log::debug!("[{tool}] GET {}", redact_api_key(url.as_str()));

        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status_code = response.status().as_u16();
        let headers = response.headers().clone();
        log::debug!("[{tool}] Response Status: {status_code}");

        let body = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::timeout(format!("Timed out reading response body: {e}"))
            } else {
                TransportError::connection(format!("Failed to read response body: {e}"))
            }
        })?;

        log::debug!(
            "[{tool}] Response Body: {}",
            truncate_for_log(&String::from_utf8_lossy(&body))
        );

        Ok(RawResponse {
            status_code,
            body: body.to_vec(),
            headers,
        })
    }
}

/// Sort a reqwest failure into timeout / TLS / connection.
fn map_reqwest_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        return TransportError::timeout(e.to_string());
    }

    // reqwest does not expose TLS failures directly; look through the source chain.
    let mut detail = e.to_string();
    let mut source = e.source();
    let mut is_tls = false;
    while let Some(cause) = source {
        let text = cause.to_string();
        let lower = text.to_ascii_lowercase();
        if lower.contains("certificate") || lower.contains("tls") || lower.contains("ssl") {
            is_tls = true;
        }
        detail.push_str(": ");
        detail.push_str(&text);
        source = cause.source();
    }

    if is_tls {
        TransportError::tls(detail)
    } else {
        TransportError::connection(detail)
    }
}
