//! Per-resource metadata interface.

use std::fmt::Debug;

use serde_json::{Map, Value};

use crate::client::BaasClient;
use crate::meta::ModelMeta;
use crate::model::Model;
use crate::queryset::QuerySet;
use crate::validation::Constraints;

/// Attribute bag used for filters, lookups, defaults and record data.
pub type Properties = Map<String, Value>;

/// Metadata for one resource kind.
///
/// Implementors are zero-sized markers; all record data lives in
/// [`Model`].
///
/// # Example
///
/// ```ignore
/// use baasapi::{BaasClient, Class, Resource};
///
/// let client = BaasClient::from_env()?.with_instance("my-instance");
/// let classes = Class::please(&client).list(Default::default()).await?;
/// ```
pub trait Resource: Clone + Debug + Default + Send + Sync + 'static {
    /// Endpoint configuration.
    fn meta() -> &'static ModelMeta;

    /// Field constraints applied before saving. Empty by default.
    fn constraints() -> Constraints {
        Constraints::new()
    }

    /// Start a query set for this resource.
    fn please(client: &BaasClient) -> QuerySet<Self> {
        QuerySet::new(client.clone())
    }

    /// Build an unsaved record from attributes.
    fn build(attributes: Properties) -> Model<Self> {
        Model::new(attributes)
    }
}
