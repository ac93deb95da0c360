//! HTTP transport for the script session service.
//!
//! A transport sends one request at a time to a fixed server and returns the
//! status code and raw body. It never retries and never inspects the status;
//! that is left to [`crate::client::SessionClient`].

use std::time::Duration;

use protocol::{script_prefix, Method};
use reqwest::header::AUTHORIZATION;
use thiserror::Error;

use crate::config::ConnectionConfig;

/// Status code and body of one response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body.
    pub body: Vec<u8>,
}

impl Response {
    /// Create a response from a status and body.
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Errors raised below the protocol layer.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The server could not be reached.
    #[error("cannot connect to {url}: {message}")]
    Connect {
        /// Target URL.
        url: String,
        /// Underlying error text.
        message: String,
    },

    /// The connection was established but the exchange failed.
    #[error("{method} {url} failed: {message}")]
    Request {
        /// Request method.
        method: Method,
        /// Target URL.
        url: String,
        /// Underlying error text.
        message: String,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Build(String),
}

/// Issues requests against one server.
///
/// Implementations must carry the same `Authorization` header on every
/// request and must not retry.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Send `method` to `path` (relative to the script root) with an optional body.
    async fn request(
        &mut self,
        method: Method,
        path: &str,
        body: Option<String>,
    ) -> Result<Response, TransportError>;
}

/// [`Transport`] over HTTP/1.1 with a kept-alive connection.
pub struct HttpTransport {
    client: reqwest::Client,
    prefix: String,
    authorization: String,
}

impl HttpTransport {
    /// Build a transport for the configured server.
    ///
    /// The `Authorization` header value is computed here once.
    pub fn new(config: &ConnectionConfig) -> Result<Self, TransportError> {
        Self::with_timeout(config, config.connect_timeout())
    }

    fn with_timeout(
        config: &ConnectionConfig,
        connect_timeout: Option<Duration>,
    ) -> Result<Self, TransportError> {
        let mut builder = reqwest::Client::builder()
            .pool_max_idle_per_host(1)
            .http1_only();
        if let Some(timeout) = connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| TransportError::Build(e.to_string()))?;

        Ok(Self {
            client,
            prefix: format!("{}{}", config.base_url(), script_prefix(&config.context)),
            authorization: config.authorization(),
        })
    }

    /// Absolute URL for a path relative to the script root.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.prefix, path.trim_start_matches('/'))
    }

    /// The header value attached to every request.
    pub fn authorization(&self) -> &str {
        &self.authorization
    }
}

impl Transport for HttpTransport {
    async fn request(
        &mut self,
        method: Method,
        path: &str,
        body: Option<String>,
    ) -> Result<Response, TransportError> {
        let url = self.url(path);
        let http_method = match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
        };

        let mut request = self
            .client
            .request(http_method, &url)
            .header(AUTHORIZATION, self.authorization.as_str());
        if let Some(body) = body {
            request = request.body(body);
        }

        tracing::debug!("{} {}", method, url);

        let response = request.send().await.map_err(|e| {
            if e.is_connect() {
                TransportError::Connect {
                    url: url.clone(),
                    message: e.to_string(),
                }
            } else {
                TransportError::Request {
                    method,
                    url: url.clone(),
                    message: e.to_string(),
                }
            }
        })?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::Request {
                method,
                url: url.clone(),
                message: e.to_string(),
            })?;

        tracing::debug!("{} {} -> {} ({} bytes)", method, url, status, body.len());
        Ok(Response::new(status, body.to_vec()))
    }
}
