//! Class resource: a schema for data objects inside an instance.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::meta::{Endpoint, HttpMethod, ModelMeta};
use crate::traits::Resource;
use crate::validation::{Constraint, Constraints, FieldType};

static CLASS_META: ModelMeta = ModelMeta {
    name: "class",
    plural_name: "classes",
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
                path: "/v1/instances/{instance}/classes/{name}/",
            },
        ),
        (
            "list",
            Endpoint {
                methods: &[HttpMethod::Post, HttpMethod::Get],
                path: "/v1/instances/{instance}/classes/",
            },
        ),
    ],
};

#[derive(Debug, Clone, Copy, Default)]
pub struct Class;

impl Resource for Class {
    fn meta() -> &'static ModelMeta {
        &CLASS_META
    }

    fn constraints() -> Constraints {
        Constraints::new()
            .field(
                "name",
                [Constraint::Presence, Constraint::Type(FieldType::String)],
            )
            .field("schema", [Constraint::Type(FieldType::Array)])
    }
}

/// One column of a class schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_index: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_index: Option<bool>,
}

/// Typed view of a class record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassRecord {
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub schema: Vec<SchemaField>,

    /// Number of data objects stored under the class.
    #[serde(default)]
    pub objects_count: Option<u64>,

    #[serde(default)]
    pub status: Option<String>,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub links: Map<String, Value>,
}
