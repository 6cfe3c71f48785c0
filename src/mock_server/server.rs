//! Mock BaaS API server.
//!
//! Provides an axum-based HTTP server that simulates the BaaS API.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use super::fixtures::Fixtures;
use super::handlers;
use super::state::MockState;
use crate::meta::HttpMethod;

/// A mock BaaS API server for testing.
///
/// The server runs in the background and can be used to test the client
/// against a stateful implementation of the API.
pub struct MockServer {
    /// The URL where the server is listening.
    url: String,
    /// Handle to the server task.
    handle: JoinHandle<()>,
    /// Shared state that can be modified during tests.
    state: Arc<RwLock<MockState>>,
}

impl MockServer {
    /// Start a new mock server with default fixtures.
    ///
    /// The server listens on a random available port and returns immediately.
    /// Use `url()` to get the server's base URL.
    pub async fn start() -> Self {
        Self::with_state(Fixtures::default_state()).await
    }

    /// Start a mock server with empty state.
    ///
    /// Useful when you want to control exactly what data is available.
    pub async fn start_empty() -> Self {
        Self::with_state(MockState::new()).await
    }

    /// Start a mock server with custom state.
    pub async fn with_state(state: MockState) -> Self {
        let shared_state = state.shared();
        let app = Self::create_router(shared_state.clone());

        // Bind to a random available port
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to address");
        let addr = listener.local_addr().expect("Failed to get local address");

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Server error");
        });

        Self {
            url: format!("http://{}", addr),
            handle,
            state: shared_state,
        }
    }

    /// Get the base URL of the mock server.
    ///
    /// Use this URL when creating a `BaasClient` for testing.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Get access to the server's shared state.
    ///
    /// This allows inspecting or modifying the mock data during a test.
    pub fn state(&self) -> Arc<RwLock<MockState>> {
        self.state.clone()
    }

    /// Shutdown the server.
    ///
    /// This aborts the server task. It's safe to call multiple times.
    pub async fn shutdown(self) {
        self.handle.abort();
        let _ = self.handle.await;
    }

    /// Resource routes are matched from metadata in the fallback handler.
    fn create_router(state: Arc<RwLock<MockState>>) -> Router {
        Router::new()
            .route("/health", get(health_check))
            .fallback(dispatch)
            .with_state(state)
    }
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "ok"
}

async fn dispatch(
    State(state): State<Arc<RwLock<MockState>>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let mut state = state.write().await;

    if let Some(required) = &state.required_key {
        let sent = headers.get("x-api-key").and_then(|v| v.to_str().ok());
        if sent != Some(required.as_str()) {
            return reply(
                StatusCode::FORBIDDEN,
                json!({ "detail": "Invalid API key." }),
            );
        }
    }

    let Ok(method) = method.as_str().parse::<HttpMethod>() else {
        return reply(
            StatusCode::METHOD_NOT_ALLOWED,
            json!({ "detail": format!("Method \"{method}\" not allowed.") }),
        );
    };
    let body = if body.is_empty() {
        None
    } else {
        match serde_json::from_slice::<Value>(&body) {
            Ok(value) => Some(value),
            Err(_) => {
                return reply(
                    StatusCode::BAD_REQUEST,
                    json!({ "detail": "JSON parse error." }),
                )
            }
        }
    };

    let query = handlers::parse_query(uri.query());
    let (status, content) = handlers::execute(&mut state, method, uri.path(), &query, body);
    tracing::debug!(%method, path = uri.path(), status = status.as_u16(), "mock request");
    reply(status, content)
}

fn reply(status: StatusCode, content: Value) -> Response {
    if content.is_null() {
        status.into_response()
    } else {
        (status, Json(content)).into_response()
    }
}
