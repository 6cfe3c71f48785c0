//! Instance user resource.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::client::BaasClient;
use crate::error::Result;
use crate::meta::{Endpoint, HttpMethod, ModelMeta};
use crate::model::Model;
use crate::traits::Resource;
use crate::validation::{Constraint, Constraints, FieldType};

static USER_META: ModelMeta = ModelMeta {
    name: "user",
    plural_name: "users",
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
                path: "/v1/instances/{instance}/users/{id}/",
            },
        ),
        (
            "list",
            Endpoint {
                methods: &[HttpMethod::Post, HttpMethod::Get],
                path: "/v1/instances/{instance}/users/",
            },
        ),
        (
            "reset_key",
            Endpoint {
                methods: &[HttpMethod::Post],
                path: "/v1/instances/{instance}/users/{id}/reset_key/",
            },
        ),
    ],
};

/// An end user of an instance.
#[derive(Debug, Clone, Copy, Default)]
pub struct User;

impl Resource for User {
    fn meta() -> &'static ModelMeta {
        &USER_META
    }

    fn constraints() -> Constraints {
        Constraints::new()
            .field(
                "username",
                [Constraint::Presence, Constraint::Type(FieldType::String)],
            )
            .field(
                "password",
                [Constraint::Presence, Constraint::Type(FieldType::String)],
            )
    }
}

impl Model<User> {
    /// Ask the server to issue a new user key.
    ///
    /// Returns the record refreshed with the new `user_key`.
    #[tracing::instrument(skip(self, client))]
    pub async fn reset_key(&self, client: &BaasClient) -> Result<Self> {
        let method = User::meta().find_allowed_method("reset_key", "post")?;
        let path = self.endpoint_path(client, "reset_key")?;
        let response = client.request(method, &path, &[], None).await?;
        self.merge_response(response)
    }
}

/// Typed view of a user record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: i64,
    pub username: String,

    /// Key used by the user to authenticate against the instance.
    #[serde(default)]
    pub user_key: Option<String>,

    #[serde(default)]
    pub profile: Option<Value>,

    #[serde(default)]
    pub links: Map<String, Value>,
}
