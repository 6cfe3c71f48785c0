//! HTTP transport seam.
//!
//! The client builds fully-resolved requests and hands them to a
//! [`Transport`]. [`HttpTransport`] is the `reqwest`-backed default; tests
//! and embedders can supply their own implementation.

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use url::Url;

use crate::error::{BaasError, Result};
use crate::meta::HttpMethod;

const USER_AGENT: &str = concat!("baasapi/", env!("CARGO_PKG_VERSION"));

/// A request ready to go on the wire.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: HttpMethod,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

/// The raw outcome of a request. Status and body are passed through as-is.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl TransportResponse {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs exactly the HTTP verb it is given.
///
/// Implementations must only fail for network-level problems; non-2xx
/// statuses are returned as ordinary responses.
#[async_trait]
pub trait Transport: Send + Sync + Debug {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse>;
}

/// `reqwest`-backed transport.
///
/// Cheaply cloneable; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: Client,
}

impl HttpTransport {
    /// Build a transport with the given request timeout.
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .brotli(true)
            .gzip(true)
            .deflate(true)
            .timeout(timeout)
            .build()
            .map_err(BaasError::HttpError)?;

        Ok(Self { http })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse> {
        let mut builder = self.http.request(request.method.into(), request.url);

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(BaasError::HttpError)?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.text().await.map_err(BaasError::HttpError)?;

        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }
}
