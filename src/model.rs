//! Generic record type and its lifecycle.

use std::fmt;
use std::marker::PhantomData;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::client::BaasClient;
use crate::error::{BaasError, Result};
use crate::meta::{HttpMethod, Layered, PathParams};
use crate::traits::{Properties, Resource};
use crate::validation::{self, Constraints, ValidationErrors};

/// Attributes the server owns and which are never sent back.
const READ_ONLY_FIELDS: &[&str] = &["links", "created_at", "updated_at"];

/// One remote record of resource kind `R`.
///
/// A record is persisted once the server has given it `links`; until then
/// [`Model::is_new`] returns true and [`Model::save`] creates it.
pub struct Model<R: Resource> {
    attributes: Properties,
    constraints: Option<Constraints>,
    _resource: PhantomData<R>,
}

impl<R: Resource> Model<R> {
    /// Create an unsaved record from attributes.
    pub fn new(attributes: Properties) -> Self {
        Self {
            attributes,
            constraints: None,
            _resource: PhantomData,
        }
    }

    /// Create an empty record.
    pub fn empty() -> Self {
        Self::new(Map::new())
    }

    /// Build a record from a JSON object.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not an object.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(attributes) => Ok(Self::new(attributes)),
            other => Err(BaasError::ParseError(serde::de::Error::custom(format!(
                "expected a {} object, got {other}",
                R::meta().name
            )))),
        }
    }

    /// Override the resource's default constraints for this record.
    ///
    /// An empty set disables validation.
    #[must_use]
    pub fn with_constraints(mut self, constraints: Constraints) -> Self {
        self.constraints = Some(constraints);
        self
    }

    /// Builder-style attribute setter.
    #[must_use]
    pub fn with(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    /// True iff the record has no `links` attribute.
    pub fn is_new(&self) -> bool {
        !self.attributes.contains_key("links")
    }

    pub fn attributes(&self) -> &Properties {
        &self.attributes
    }

    pub fn into_attributes(self) -> Properties {
        self.attributes
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.attributes.get(field)
    }

    /// String attribute, if present and a string.
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    /// Deserialize one attribute.
    pub fn get_as<T: DeserializeOwned>(&self, field: &str) -> Result<Option<T>> {
        self.get(field)
            .filter(|v| !v.is_null())
            .map(|v| serde_json::from_value(v.clone()))
            .transpose()
            .map_err(BaasError::from)
    }

    pub fn set(&mut self, field: &str, value: impl Into<Value>) -> &mut Self {
        self.attributes.insert(field.to_string(), value.into());
        self
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.attributes.remove(field)
    }

    /// Relation URLs given by the server.
    pub fn links(&self) -> Option<&Map<String, Value>> {
        self.get("links").and_then(Value::as_object)
    }

    /// Numeric server id, if the resource has one.
    pub fn id(&self) -> Option<i64> {
        self.get("id").and_then(Value::as_i64)
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.timestamp("created_at")
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.timestamp("updated_at")
    }

    fn timestamp(&self, field: &str) -> Option<DateTime<Utc>> {
        self.get_str(field)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// Deserialize the whole record into a typed struct.
    pub fn into_typed<T: DeserializeOwned>(self) -> Result<T> {
        Ok(serde_json::from_value(Value::Object(self.attributes))?)
    }

    /// Check the record against its constraints.
    pub fn validate(&self) -> std::result::Result<(), ValidationErrors> {
        match &self.constraints {
            Some(constraints) => validation::validate(&self.attributes, constraints),
            None => validation::validate(&self.attributes, &R::constraints()),
        }
    }

    /// Resolve one of the resource's endpoints for this record.
    ///
    /// Placeholders are looked up on the record first, then on the client
    /// context.
    pub fn endpoint_path(&self, client: &BaasClient, key: &str) -> Result<String> {
        let context = client.context();
        let params = Layered {
            primary: &self.attributes,
            fallback: &context,
        };
        R::meta().resolve_endpoint_path(key, Some(&params))
    }

    /// Body sent on create/update.
    ///
    /// Drops server-owned fields and values that only fill the list path.
    pub(crate) fn payload(&self) -> Value {
        let path_only = R::meta().path_placeholders("list").unwrap_or_default();
        let body: Properties = self
            .attributes
            .iter()
            .filter(|(key, _)| {
                !READ_ONLY_FIELDS.iter().any(|f| *f == key.as_str())
                    && !path_only.iter().any(|p| *p == key.as_str())
            })
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Value::Object(body)
    }

    /// Overlay a server response on the current attributes.
    pub(crate) fn merge_response(&self, response: Value) -> Result<Self> {
        let fields = match response {
            Value::Object(fields) => fields,
            Value::Null => return Ok(self.clone()),
            other => return Self::from_value(other),
        };
        let mut attributes = self.attributes.clone();
        attributes.extend(fields);
        Ok(Self {
            attributes,
            constraints: self.constraints.clone(),
            _resource: PhantomData,
        })
    }

    /// Validate, then create or update the record.
    ///
    /// New records are POSTed to `list`; persisted ones are PATCHed (or PUT
    /// where PATCH is not allowed) on `detail`. Returns the record refreshed
    /// from the response.
    ///
    /// # Errors
    ///
    /// `Validation` before any request, resolver errors for bad metadata, or
    /// `Request` for a non-2xx response.
    #[tracing::instrument(skip(self, client), fields(resource = R::meta().name))]
    pub async fn save(&self, client: &BaasClient) -> Result<Self> {
        self.validate().map_err(BaasError::Validation)?;

        let meta = R::meta();
        let response = if self.is_new() {
            let method = meta.find_allowed_method("list", "post")?;
            let path = self.endpoint_path(client, "list")?;
            client
                .request(method, &path, &[], Some(&self.payload()))
                .await?
        } else {
            let method = meta
                .find_allowed_method("detail", "patch")
                .or_else(|_| meta.find_allowed_method("detail", "put"))?;
            let path = self.endpoint_path(client, "detail")?;
            client
                .request(method, &path, &[], Some(&self.payload()))
                .await?
        };

        self.merge_response(response)
    }

    /// PATCH only the given fields on `detail`.
    #[tracing::instrument(skip(self, client, fields), fields(resource = R::meta().name))]
    pub async fn update(&self, client: &BaasClient, fields: Properties) -> Result<Self> {
        let method = R::meta().find_allowed_method("detail", "patch")?;
        let path = self.endpoint_path(client, "detail")?;
        let response = client
            .request(method, &path, &[], Some(&Value::Object(fields)))
            .await?;
        self.merge_response(response)
    }

    /// DELETE the record.
    #[tracing::instrument(skip(self, client), fields(resource = R::meta().name))]
    pub async fn delete(&self, client: &BaasClient) -> Result<()> {
        let method = R::meta().find_allowed_method("detail", HttpMethod::Delete.as_str())?;
        let path = self.endpoint_path(client, "detail")?;
        client.request(method, &path, &[], None).await?;
        Ok(())
    }
}

impl<R: Resource> PathParams for Model<R> {
    fn path_param(&self, name: &str) -> Option<String> {
        self.attributes.path_param(name)
    }
}

impl<R: Resource> Clone for Model<R> {
    fn clone(&self) -> Self {
        Self {
            attributes: self.attributes.clone(),
            constraints: self.constraints.clone(),
            _resource: PhantomData,
        }
    }
}

impl<R: Resource> fmt::Debug for Model<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("resource", &R::meta().name)
            .field("attributes", &self.attributes)
            .finish()
    }
}

impl<R: Resource> PartialEq for Model<R> {
    fn eq(&self, other: &Self) -> bool {
        self.attributes == other.attributes
    }
}

impl<R: Resource> Default for Model<R> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<R: Resource> From<Properties> for Model<R> {
    fn from(attributes: Properties) -> Self {
        Self::new(attributes)
    }
}

impl<R: Resource> Serialize for Model<R> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.attributes.serialize(serializer)
    }
}

impl<'de, R: Resource> Deserialize<'de> for Model<R> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Properties::deserialize(deserializer).map(Self::new)
    }
}
