//! Mock server state management.
//!
//! Provides the in-memory record store for the mock API server.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Value};
use tokio::sync::RwLock;

use crate::meta::{param_string, placeholders, Layered};
use crate::traits::{Properties, Resource};

/// Attributes owned by the server; ignored in request bodies.
const SERVER_FIELDS: &[&str] = &["links", "created_at", "updated_at"];

/// Shared state for the mock server.
///
/// Records are grouped by the concrete list path of their collection
/// (e.g. `/v1/instances/demo/classes/`) and kept in insertion order.
#[derive(Debug, Default)]
pub struct MockState {
    /// Records indexed by collection path.
    pub collections: HashMap<String, Vec<Properties>>,

    /// Optional API key. If set, requests must send it as `X-API-KEY`.
    pub required_key: Option<String>,

    next_id: i64,
}

impl MockState {
    /// Create a new empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create state wrapped in Arc<RwLock> for sharing.
    pub fn shared(self) -> Arc<RwLock<Self>> {
        Arc::new(RwLock::new(self))
    }

    /// Set the required API key.
    pub fn with_required_key(mut self, key: &str) -> Self {
        self.required_key = Some(key.to_string());
        self
    }

    /// Seed a record of kind `R`.
    ///
    /// List path placeholders (such as `instance`) are read from the
    /// attributes and not stored on the record. Records whose list path
    /// cannot be resolved are skipped with a warning.
    pub fn with_record<R: Resource>(mut self, attributes: Properties) -> Self {
        let meta = R::meta();
        let empty = Properties::new();
        let params = Layered {
            primary: &attributes,
            fallback: &empty,
        };
        let (collection, list_fields) = match (
            meta.resolve_endpoint_path("list", Some(&params)),
            meta.path_placeholders("list"),
        ) {
            (Ok(path), Ok(fields)) => (path, fields),
            (Err(err), _) | (_, Err(err)) => {
                tracing::warn!(resource = meta.name, %err, "skipping fixture");
                return self;
            }
        };
        let key_field = meta
            .endpoint("detail")
            .ok()
            .and_then(|e| placeholders(e.path).last().copied())
            .unwrap_or("id");

        let body: Properties = attributes
            .into_iter()
            .filter(|(k, _)| !list_fields.iter().any(|f| *f == k.as_str()))
            .collect();
        if let Err(err) = self.create(&collection, key_field, body) {
            tracing::warn!(resource = meta.name, %err, "skipping fixture");
        }
        self
    }

    /// Records of a collection, in insertion order.
    pub fn list(&self, collection: &str) -> &[Properties] {
        self.collections
            .get(collection)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Look up one record by its key field.
    pub fn get(&self, collection: &str, key_field: &str, key: &str) -> Option<&Properties> {
        self.list(collection)
            .iter()
            .find(|r| key_matches(r, key_field, key))
    }

    /// Store a new record, stamping id, timestamps and links.
    ///
    /// # Errors
    ///
    /// Returns a message when the key field is missing or already taken.
    pub fn create(
        &mut self,
        collection: &str,
        key_field: &str,
        body: Properties,
    ) -> Result<Properties, String> {
        let mut record = strip_server_fields(body);

        if key_field == "id" {
            self.next_id += 1;
            record.insert("id".to_string(), json!(self.next_id));
        }
        let key = record
            .get(key_field)
            .and_then(param_string)
            .ok_or_else(|| format!("{key_field}: This field is required."))?;
        if self.get(collection, key_field, &key).is_some() {
            return Err(format!("{key_field}: \"{key}\" already exists."));
        }

        let now = Utc::now().to_rfc3339();
        record.insert("created_at".to_string(), json!(now));
        record.insert("updated_at".to_string(), json!(now));
        record.insert(
            "links".to_string(),
            json!({ "self": format!("{collection}{}/", urlencoding::encode(&key)) }),
        );

        self.collections
            .entry(collection.to_string())
            .or_default()
            .push(record.clone());
        Ok(record)
    }

    /// Merge (or, with `replace`, overwrite) a record's fields.
    ///
    /// The key field, `created_at` and `links` survive a replace.
    pub fn update(
        &mut self,
        collection: &str,
        key_field: &str,
        key: &str,
        body: Properties,
        replace: bool,
    ) -> Option<Properties> {
        let record = self
            .collections
            .get_mut(collection)?
            .iter_mut()
            .find(|r| key_matches(r, key_field, key))?;

        let body = strip_server_fields(body);
        if replace {
            let kept: Properties = record
                .iter()
                .filter(|(k, _)| *k == key_field || SERVER_FIELDS.iter().any(|f| f == k))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            *record = kept;
            for (k, v) in body {
                if k != key_field {
                    record.insert(k, v);
                }
            }
        } else {
            record.extend(body);
        }
        record.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));
        Some(record.clone())
    }

    /// Set a single server-generated field.
    pub fn touch(
        &mut self,
        collection: &str,
        key_field: &str,
        key: &str,
        field: &str,
        value: Value,
    ) -> Option<Properties> {
        let mut body = Properties::new();
        body.insert(field.to_string(), value);
        self.update(collection, key_field, key, body, false)
    }

    /// Remove a record; returns false if it did not exist.
    pub fn remove(&mut self, collection: &str, key_field: &str, key: &str) -> bool {
        let Some(records) = self.collections.get_mut(collection) else {
            return false;
        };
        let before = records.len();
        records.retain(|r| !key_matches(r, key_field, key));
        records.len() != before
    }

    /// Next value for generated tokens.
    pub(crate) fn next_token(&mut self) -> String {
        self.next_id += 1;
        format!("{:040x}", (self.next_id as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15))
    }
}

fn key_matches(record: &Properties, key_field: &str, key: &str) -> bool {
    record.get(key_field).and_then(param_string).as_deref() == Some(key)
}

fn strip_server_fields(body: Properties) -> Properties {
    body.into_iter()
        .filter(|(k, _)| !SERVER_FIELDS.iter().any(|f| f == k))
        .collect()
}
