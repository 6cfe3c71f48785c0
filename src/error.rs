//! Error types for BaaS API operations.

use thiserror::Error;

use crate::validation::ValidationErrors;

/// Errors that can occur during BaaS API operations.
#[derive(Debug, Error)]
pub enum BaasError {
    /// Configuration is missing or incomplete.
    #[error("BaaS configuration required: {0}")]
    ConfigMissing(String),

    /// Local validation failed before any request was sent.
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// The endpoint key is not declared in the model metadata.
    #[error("Invalid endpoint name: {0}")]
    InvalidEndpoint(String),

    /// A path template placeholder could not be resolved.
    #[error("Missing \"{endpoint}\" path properties \"{property}\"")]
    MissingPathProperties { endpoint: String, property: String },

    /// The HTTP verb is not allowed on the endpoint.
    #[error("Unsupported request methods: {0}")]
    UnsupportedMethod(String),

    /// Page size must be a positive integer.
    #[error("Invalid page size {0}: must be a positive integer")]
    InvalidPageSize(u32),

    /// No record matched a get-style lookup.
    #[error("{resource} matching {lookup} not found")]
    NotFound {
        resource: &'static str,
        lookup: String,
    },

    /// The server answered with a non-2xx status.
    #[error("API request failed with status {status}: {message}")]
    Request {
        status: u16,
        message: String,
        body: String,
    },

    /// An item inside a batch request failed.
    #[error("Batch item {index} failed with status {status}: {body}")]
    Batch {
        index: usize,
        status: u16,
        body: String,
    },

    /// Records passed to one bulk create target different instances.
    #[error("Batch item {index} targets {found}, expected {expected}")]
    MixedBatch {
        index: usize,
        expected: String,
        found: String,
    },

    /// Rate limited.
    #[error("Rate limited, retry after {retry_after_secs:?} seconds")]
    RateLimited {
        retry_after_secs: Option<u64>,
        body: String,
    },

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("Failed to parse response: {0}")]
    ParseError(#[from] serde_json::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),
}

impl BaasError {
    /// Returns true for `NotFound` and for 404 responses.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            BaasError::NotFound { .. } | BaasError::Request { status: 404, .. }
        )
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            BaasError::Request { status, .. } | BaasError::Batch { status, .. } => Some(*status),
            BaasError::NotFound { .. } => Some(404),
            BaasError::RateLimited { .. } => Some(429),
            _ => None,
        }
    }
}

/// Result type alias for BaaS operations.
pub type Result<T> = core::result::Result<T, BaasError>;
