//! Instance resource.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::meta::{Endpoint, HttpMethod, ModelMeta};
use crate::traits::Resource;
use crate::validation::{Constraint, Constraints, FieldType};

static INSTANCE_META: ModelMeta = ModelMeta {
    name: "instance",
    plural_name: "instances",
    endpoints: &[
        (
            "detail",
            Endpoint {
                methods: &[
                    HttpMethod::Delete,
                    HttpMethod::Patch,
                    HttpMethod::Put,
                    HttpMethod::Get,
                ],
                path: "/v1/instances/{name}/",
            },
        ),
        (
            "list",
            Endpoint {
                methods: &[HttpMethod::Post, HttpMethod::Get],
                path: "/v1/instances/",
            },
        ),
    ],
};

/// A top-level instance: the container every other resource lives in.
#[derive(Debug, Clone, Copy, Default)]
pub struct Instance;

impl Resource for Instance {
    fn meta() -> &'static ModelMeta {
        &INSTANCE_META
    }

    fn constraints() -> Constraints {
        Constraints::new()
            .field(
                "name",
                [
                    Constraint::Presence,
                    Constraint::Type(FieldType::String),
                    Constraint::Length {
                        min: None,
                        max: Some(64),
                    },
                ],
            )
            .field("description", [Constraint::Type(FieldType::String)])
    }
}

/// Typed view of an instance record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceRecord {
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Owner account, as returned by the server.
    #[serde(default)]
    pub owner: Option<Value>,

    #[serde(default)]
    pub metadata: Map<String, Value>,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub links: Map<String, Value>,
}
