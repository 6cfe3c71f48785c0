//! Client library for a backend-as-a-service REST API.
//!
//! Remote records are exposed as [`Model`]s, one per resource kind, and
//! queried through chainable [`QuerySet`]s. Each resource kind implements
//! [`Resource`], declaring its endpoint templates and field constraints;
//! everything else is generic.
//!
//! # Quick Start
//!
//! ```no_run
//! use baasapi::{BaasClient, Class, Order, Resource};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> baasapi::Result<()> {
//!     // Create client from environment variables
//!     let client = BaasClient::from_env()?.with_instance("my-instance");
//!
//!     // Create a class
//!     let data = json!({"name": "books", "description": "Library"});
//!     let class = Class::please(&client)
//!         .create(data.as_object().cloned().unwrap_or_default())
//!         .await?;
//!     println!("Created: {:?}", class.get_str("name"));
//!
//!     // List classes, newest first
//!     let classes = Class::please(&client)
//!         .ordering(Order::Desc)
//!         .list(Default::default())
//!         .await?;
//!     println!("Found {} classes", classes.len());
//!
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - [`ModelMeta`] - endpoint templates and allowed verbs for one resource
//! - [`Model`] - one record with `is_new`, `validate`, `save`, `delete`
//! - [`QuerySet`] - list, get, create, bulk create, get-or-create and friends
//! - [`Transport`] - the HTTP seam; [`HttpTransport`] is the default
//!
//! # Configuration
//!
//! The client reads configuration from environment variables:
//!
//! - `BAAS_API_KEY` (required) - API key sent as `X-API-KEY`
//! - `BAAS_API_URL` (optional) - Base URL (defaults to `https://api.syncano.io`)
//! - `BAAS_INSTANCE` (optional) - Default instance for `{instance}` paths
//! - `BAAS_TIMEOUT_SECS` (optional) - Request timeout

pub mod cli;
mod client;
mod error;
mod meta;
mod model;
mod models;
mod output;
mod pagination;
mod queryset;
mod traits;
mod transport;
pub mod validation;

#[cfg(feature = "test-server")]
pub mod mock_server;

// Re-export core types
pub use client::BaasClient;
pub use error::{BaasError, Result};
pub use meta::{placeholders, Endpoint, HttpMethod, Layered, ModelMeta, PathParams};
pub use model::Model;
pub use output::PrettyPrint;
pub use pagination::Page;
pub use queryset::{DeleteRequest, GetRequest, Order, QuerySet};
pub use transport::{HttpTransport, Transport, TransportRequest, TransportResponse};
pub use validation::{Constraint, Constraints, FieldType, ValidationErrors};

// Re-export traits
pub use traits::{Properties, Resource};

// Re-export resource kinds
pub use models::{
    ApnsDevice, ApnsDeviceRecord, Class, ClassRecord, Instance, InstanceInvitation,
    InstanceRecord, InvitationRecord, SchemaField, User, UserRecord, INVITATION_ROLES,
};
