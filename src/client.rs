//! BaaS API client.
//!
//! Low-level client that attaches the API key, resolves URLs and turns
//! non-2xx responses into errors. Model and query set operations are built
//! on top of it.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};
use url::Url;

use crate::error::{BaasError, Result};
use crate::meta::HttpMethod;
use crate::transport::{HttpTransport, Transport, TransportRequest, TransportResponse};

const DEFAULT_API_URL: &str = "https://api.syncano.io";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const API_KEY_HEADER: &str = "X-API-KEY";

/// Low-level BaaS API client.
///
/// This struct is cheaply cloneable; clones share the same transport.
///
/// # Example
///
/// ```no_run
/// use baasapi::BaasClient;
///
/// # fn example() -> baasapi::Result<()> {
/// // Create from environment variables
/// let client = BaasClient::from_env()?;
///
/// // Or configure manually
/// let client = BaasClient::new("your-api-key", "https://api.syncano.io")?
///     .with_instance("my-instance");
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct BaasClient {
    transport: Arc<dyn Transport>,
    base_url: Arc<Url>,
    api_key: String,
    instance: Option<String>,
}

impl std::fmt::Debug for BaasClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BaasClient")
            .field("base_url", &self.base_url.as_str())
            .field("instance", &self.instance)
            .finish_non_exhaustive()
    }
}

impl BaasClient {
    /// Create a client from environment variables.
    ///
    /// Reads `BAAS_API_KEY` (required), `BAAS_API_URL`, `BAAS_INSTANCE` and
    /// `BAAS_TIMEOUT_SECS`.
    ///
    /// # Errors
    ///
    /// Returns an error if `BAAS_API_KEY` is not set or a value is malformed.
    pub fn from_env() -> Result<Self> {
        let api_key = env::var("BAAS_API_KEY").map_err(|_| {
            BaasError::ConfigMissing("BAAS_API_KEY environment variable not set".to_string())
        })?;

        let base_url = env::var("BAAS_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        let mut client = Self::new(&api_key, &base_url)?;

        if let Ok(secs) = env::var("BAAS_TIMEOUT_SECS") {
            let secs: u64 = secs.parse().map_err(|_| {
                BaasError::ConfigMissing(format!("BAAS_TIMEOUT_SECS is not a number: {secs}"))
            })?;
            client = client.with_timeout(Duration::from_secs(secs))?;
        }

        if let Ok(instance) = env::var("BAAS_INSTANCE") {
            client = client.with_instance(instance);
        }

        Ok(client)
    }

    /// Create a new client with the provided API key and base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid.
    pub fn new(api_key: &str, base_url: &str) -> Result<Self> {
        // Ensure base URL ends with /
        let base_url_str = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };

        let base_url = Url::parse(&base_url_str)?;
        let transport = HttpTransport::new(Duration::from_secs(DEFAULT_TIMEOUT_SECS))?;

        Ok(Self {
            transport: Arc::new(transport),
            base_url: Arc::new(base_url),
            api_key: api_key.to_string(),
            instance: None,
        })
    }

    /// Scope the client to an instance.
    ///
    /// The name fills the `{instance}` placeholder of endpoint templates when
    /// a model or filter does not carry its own.
    #[must_use]
    pub fn with_instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = Some(instance.into());
        self
    }

    /// Replace the default transport with one using the given timeout.
    pub fn with_timeout(self, timeout: Duration) -> Result<Self> {
        Ok(self.with_transport(HttpTransport::new(timeout)?))
    }

    /// Replace the transport.
    #[must_use]
    pub fn with_transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Arc::new(transport);
        self
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Instance context, if any.
    pub fn instance(&self) -> Option<&str> {
        self.instance.as_deref()
    }

    /// Path parameters supplied by the client itself.
    pub fn context(&self) -> Map<String, Value> {
        let mut context = Map::new();
        if let Some(instance) = &self.instance {
            context.insert("instance".to_string(), Value::String(instance.clone()));
        }
        context
    }

    /// Resolve an API path or an absolute URL against the base URL.
    ///
    /// Leading slashes are dropped so a base URL path prefix is preserved.
    pub fn url_for(&self, path_or_url: &str) -> Result<Url> {
        if let Ok(url) = Url::parse(path_or_url) {
            return Ok(url);
        }
        Ok(self.base_url.join(path_or_url.trim_start_matches('/'))?)
    }

    /// Send a request and parse the JSON response.
    ///
    /// Empty bodies (e.g. `204 No Content`) parse to `Value::Null`.
    #[tracing::instrument(skip(self, method, query, body), fields(method = method.as_upper()))]
    pub async fn request(
        &self,
        method: HttpMethod,
        path: &str,
        query: &[(String, String)],
        body: Option<&Value>,
    ) -> Result<Value> {
        let mut url = self.url_for(path)?;
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }

        tracing::debug!(url = %url, "sending request");

        let request = TransportRequest {
            method,
            url,
            headers: vec![
                (API_KEY_HEADER.to_string(), self.api_key.clone()),
                ("Content-Type".to_string(), "application/json".to_string()),
            ],
            body: body.cloned(),
        };

        let response = self.transport.send(request).await?;
        let response = Self::check_response(response)?;

        if response.body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&response.body)?)
    }

    /// Make a GET request with query parameters.
    pub async fn get(&self, path: &str, query: &[(String, String)]) -> Result<Value> {
        self.request(HttpMethod::Get, path, query, None).await
    }

    /// Make a POST request with JSON body.
    pub async fn post(&self, path: &str, body: &Value) -> Result<Value> {
        self.request(HttpMethod::Post, path, &[], Some(body)).await
    }

    /// Make a PATCH request with JSON body.
    pub async fn patch(&self, path: &str, body: &Value) -> Result<Value> {
        self.request(HttpMethod::Patch, path, &[], Some(body)).await
    }

    /// Make a PUT request with JSON body.
    pub async fn put(&self, path: &str, body: &Value) -> Result<Value> {
        self.request(HttpMethod::Put, path, &[], Some(body)).await
    }

    /// Make a DELETE request.
    pub async fn delete(&self, path: &str) -> Result<()> {
        self.request(HttpMethod::Delete, path, &[], None).await?;
        Ok(())
    }

    /// Check response status and convert errors.
    fn check_response(response: TransportResponse) -> Result<TransportResponse> {
        if response.is_success() {
            return Ok(response);
        }

        // Handle rate limiting
        if response.status == 429 {
            let retry_after = response
                .header("retry-after")
                .and_then(|v| v.parse().ok());
            return Err(BaasError::RateLimited {
                retry_after_secs: retry_after,
                body: response.body,
            });
        }

        let message = Self::extract_error_message(&response);
        Err(BaasError::Request {
            status: response.status,
            message,
            body: response.body,
        })
    }

    /// Extract error message from a failed response.
    fn extract_error_message(response: &TransportResponse) -> String {
        if let Ok(json) = serde_json::from_str::<Value>(&response.body) {
            for key in ["detail", "message", "error"] {
                if let Some(msg) = json.get(key).and_then(|m| m.as_str()) {
                    return msg.to_string();
                }
            }
        }

        if response.body.trim().is_empty() {
            format!("HTTP {}", response.status)
        } else {
            response.body.clone()
        }
    }
}
