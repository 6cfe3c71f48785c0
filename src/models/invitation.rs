//! Instance invitation resource.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::meta::{Endpoint, HttpMethod, ModelMeta};
use crate::traits::Resource;
use crate::validation::{Constraint, Constraints};

static INVITATION_META: ModelMeta = ModelMeta {
    name: "invitation",
    plural_name: "invitations",
    endpoints: &[
        (
            "detail",
            Endpoint {
                methods: &[HttpMethod::Delete, HttpMethod::Get],
                path: "/v1/instances/{instance}/invitations/{id}/",
            },
        ),
        (
            "list",
            Endpoint {
                methods: &[HttpMethod::Post, HttpMethod::Get],
                path: "/v1/instances/{instance}/invitations/",
            },
        ),
    ],
};

/// Roles an invitation can grant.
pub const INVITATION_ROLES: &[&str] = &["full", "write", "read"];

/// An invitation for another account to join an instance.
///
/// Invitations cannot be edited once sent; only created, fetched and
/// deleted.
#[derive(Debug, Clone, Copy, Default)]
pub struct InstanceInvitation;

impl Resource for InstanceInvitation {
    fn meta() -> &'static ModelMeta {
        &INVITATION_META
    }

    fn constraints() -> Constraints {
        Constraints::new()
            .field("email", [Constraint::Presence, Constraint::Email])
            .field(
                "role",
                [
                    Constraint::Presence,
                    Constraint::inclusion(INVITATION_ROLES.iter().copied()),
                ],
            )
    }
}

/// Typed view of an invitation record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvitationRecord {
    pub id: i64,
    pub email: String,
    pub role: String,

    /// Secret key the invitee uses to accept.
    #[serde(default)]
    pub key: Option<String>,

    #[serde(default)]
    pub inviter: Option<String>,

    /// `new`, `declined` or `accepted`.
    #[serde(default)]
    pub state: Option<String>,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub links: Map<String, Value>,
}
