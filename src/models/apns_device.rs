//! APNS device resource.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::meta::{Endpoint, HttpMethod, ModelMeta};
use crate::traits::Resource;
use crate::validation::{Constraint, Constraints, FieldType};

/// APNS registration ids are 64 hex characters.
static REGISTRATION_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new("^[0-9a-fA-F]{64}$").expect("registration id regex is valid"));

static APNS_DEVICE_META: ModelMeta = ModelMeta {
    name: "apnsdevice",
    plural_name: "apnsdevices",
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
                path: "/v1/instances/{instance}/push_notifications/apns/devices/{registration_id}/",
            },
        ),
        (
            "list",
            Endpoint {
                methods: &[HttpMethod::Post, HttpMethod::Get],
                path: "/v1/instances/{instance}/push_notifications/apns/devices/",
            },
        ),
    ],
};

/// An iOS device registered for push notifications.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApnsDevice;

impl Resource for ApnsDevice {
    fn meta() -> &'static ModelMeta {
        &APNS_DEVICE_META
    }

    fn constraints() -> Constraints {
        Constraints::new()
            .field(
                "user",
                [Constraint::Presence, Constraint::Type(FieldType::Integer)],
            )
            .field(
                "registration_id",
                [
                    Constraint::Presence,
                    Constraint::Format(REGISTRATION_ID.clone()),
                ],
            )
            .field(
                "device_id",
                [Constraint::Presence, Constraint::Type(FieldType::String)],
            )
            .field("label", [Constraint::Type(FieldType::String)])
            .field("is_active", [Constraint::Type(FieldType::Boolean)])
    }
}

/// Typed view of an APNS device record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApnsDeviceRecord {
    pub registration_id: String,

    #[serde(default)]
    pub device_id: Option<String>,

    #[serde(default)]
    pub label: Option<String>,

    #[serde(default)]
    pub user: Option<i64>,

    #[serde(default = "default_active")]
    pub is_active: bool,

    #[serde(default)]
    pub metadata: Map<String, Value>,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub links: Map<String, Value>,
}

fn default_active() -> bool {
    true
}
