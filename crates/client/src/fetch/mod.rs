//! Network fetch for the caching agent.
//!
//! ### Network trait
//! - `Network::fetch` is the only way the worker reaches the network, so
//!   tests and embedders can substitute their own transport.
//!
//! ### Response semantics
//! - HTTP error statuses (404, 500, ...) are responses, not errors.
//! - Transport failures (DNS, connect, reset, timeout) are `Error::Network`.
//! - Bodies above `max_bytes` are `Error::FetchTooLarge`.
//! - Response type is `basic` when the final URL shares the scope's origin,
//!   `cors` otherwise.

pub mod url;

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, header};
use swcache_core::{AppConfig, Error, Request, Response, ResponseType};

pub use self::url::{UrlError, canonicalize, is_same_origin, resolve};

/// Transport used by the worker for every outgoing request.
#[async_trait]
pub trait Network: Send + Sync {
    /// Perform `request` and capture the full response.
    async fn fetch(&self, request: &Request) -> Result<Response, Error>;
}

#[async_trait]
impl<N: Network + ?Sized> Network for Arc<N> {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        (**self).fetch(request).await
    }
}

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "swcache/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 10MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,

    /// Origin that counts as same-origin for response typing.
    ///
    /// Without one, every response is typed `cors`.
    pub origin: Option<::url::Url>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "swcache/0.1".to_string(),
            max_bytes: 10 * 1024 * 1024,
            timeout: Duration::from_millis(20000),
            max_redirects: 5,
            origin: None,
        }
    }
}

impl FetchConfig {
    /// Derive fetch settings from the application config.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, Error> {
        let origin = config.scope_url().map_err(|e| Error::InvalidUrl(e.to_string()))?;
        Ok(Self {
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.timeout(),
            origin: Some(origin),
            ..Default::default()
        })
    }
}

/// reqwest-backed [`Network`].
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    fn response_type(&self, final_url: &::url::Url) -> ResponseType {
        match &self.config.origin {
            Some(origin) if is_same_origin(final_url, &origin.origin()) => ResponseType::Basic,
            _ => ResponseType::Cors,
        }
    }
}

#[async_trait]
impl Network for FetchClient {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        let start = Instant::now();

        let method = reqwest::Method::from_bytes(request.method.as_str().as_bytes())
            .map_err(|e| Error::InvalidInput(format!("invalid method: {}", e)))?;

        let mut builder = self.http.request(method, request.url.clone());
        for (name, value) in request.headers.iter().filter(|(name, _)| !is_hop_header(name)) {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::Network(format!("timeout fetching {}", request.url))
            } else {
                Error::Network(format!("network error: {}", e))
            }
        })?;

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", len, self.config.max_bytes)));
        }

        let status = response.status();
        let final_url = response.url().clone();
        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .map(|(k, v)| (k.as_str().to_string(), String::from_utf8_lossy(v.as_bytes()).into_owned()))
            .collect();

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Network(format!("failed to read response: {}", e)))?;

        if bytes.len() > self.config.max_bytes {
            return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", bytes.len(), self.config.max_bytes)));
        }

        tracing::debug!(
            "fetched {} {} -> {} {} in {}ms ({} bytes)",
            request.method,
            request.url,
            final_url,
            status.as_u16(),
            start.elapsed().as_millis(),
            bytes.len()
        );

        Ok(Response {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body: bytes,
            response_type: self.response_type(&final_url),
            url: Some(final_url),
        })
    }
}

/// Whether a header name is one reqwest manages itself.
fn is_hop_header(name: &str) -> bool {
    name.eq_ignore_ascii_case(header::CONNECTION.as_str())
        || name.eq_ignore_ascii_case(header::TRANSFER_ENCODING.as_str())
        || name.eq_ignore_ascii_case(header::HOST.as_str())
}
