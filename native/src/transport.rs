//! Native platform implementations
//!
//! Implements the core platform traits using native Rust libraries:
//! - HttpClient: reqwest
//! - Clock: std::time::SystemTime

use async_trait::async_trait;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use oidc_extractor_core::platform::{Clock, HttpClient, HttpResponse};
use oidc_extractor_core::TransportError;

/// reqwest-based HTTP client
#[derive(Clone, Default)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a preconfigured client (proxies, custom roots, ...)
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Client whose requests fail with `TransportError::Timeout` after `timeout`
    pub fn with_timeout(timeout: Duration) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    async fn send(
        &self,
        method: &str,
        url: &str,
        builder: reqwest::RequestBuilder,
    ) -> Result<HttpResponse, TransportError> {
        let response = builder
            .send()
            .await
            .map_err(|e| transport_error(method, url, e))?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .bytes()
            .await
            .map_err(|e| transport_error(method, url, e))?
            .to_vec();

        tracing::debug!(method, url, status, "outbound request completed");

        Ok(HttpResponse {
            status,
            content_type,
            body,
        })
    }
}

fn transport_error(method: &str, url: &str, e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::timeout(url)
    } else {
        TransportError::request(url, format!("HTTP {} failed: {}", method, e))
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<HttpResponse, TransportError> {
        let mut builder = self.client.get(url);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }

        self.send("GET", url, builder).await
    }

    async fn post(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &[u8],
    ) -> Result<HttpResponse, TransportError> {
        let mut builder = self.client.post(url).body(body.to_vec());
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }

        self.send("POST", url, builder).await
    }
}

/// System clock using std::time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_secs(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .as_secs()
    }
}
