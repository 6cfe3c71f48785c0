//! Mock BaaS API server for E2E testing.
//!
//! This module provides an in-memory mock server that simulates the BaaS API
//! for integration and end-to-end testing. Unlike wiremock which mocks at the
//! HTTP level per-test, this server maintains state across requests, enabling
//! realistic workflow testing. Routes are derived from the same resource
//! metadata the client uses.
//!
//! # Example
//!
//! ```ignore
//! use baasapi::mock_server::{Fixtures, MockServer};
//! use baasapi::{BaasClient, Class, Resource};
//!
//! #[tokio::test]
//! async fn test_workflow() {
//!     let server = MockServer::start().await;
//!     let client = BaasClient::new("test-key", server.url())
//!         .unwrap()
//!         .with_instance(Fixtures::INSTANCE);
//!
//!     // Server comes with default fixtures
//!     let classes = Class::please(&client).list(Default::default()).await.unwrap();
//!     assert_eq!(classes.len(), 2);
//!
//!     server.shutdown().await;
//! }
//! ```

mod fixtures;
mod handlers;
mod routes;
mod server;
mod state;

pub use fixtures::Fixtures;
pub use server::MockServer;
pub use state::MockState;
