//! Chainable query builder over one resource kind.
//!
//! A [`QuerySet`] is a value: builder methods consume it and return the
//! refined state, terminal methods borrow it and perform the request. Clone a
//! base query to reuse it without aliasing.
//!
//! # Example
//!
//! ```ignore
//! use baasapi::{ApnsDevice, BaasClient, Order, Resource};
//! use serde_json::json;
//!
//! let client = BaasClient::from_env()?.with_instance("my-instance");
//! let devices = ApnsDevice::please(&client)
//!     .ordering(Order::Desc)
//!     .page_size(10)
//!     .list(Default::default())
//!     .await?;
//! ```

use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;

use serde_json::{json, Value};

use crate::client::BaasClient;
use crate::error::{BaasError, Result};
use crate::meta::{param_string, Endpoint, HttpMethod, Layered, ModelMeta};
use crate::model::Model;
use crate::pagination::Page;
use crate::traits::{Properties, Resource};
use crate::validation::Constraints;

/// Maximum pages followed by an unbounded list (safety limit).
const MAX_PAGES: u32 = 1000;

/// Instance-level endpoint accepting batched requests.
static BATCH_META: ModelMeta = ModelMeta {
    name: "batch",
    plural_name: "batch",
    endpoints: &[(
        "batch",
        Endpoint {
            methods: &[HttpMethod::Post],
            path: "/v1/instances/{instance}/batch/",
        },
    )],
};

/// Sort direction requested from the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

impl Order {
    pub fn as_str(self) -> &'static str {
        match self {
            Order::Asc => "asc",
            Order::Desc => "desc",
        }
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Order {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(Order::Asc),
            "desc" => Ok(Order::Desc),
            other => Err(format!("unknown ordering '{other}', expected asc or desc")),
        }
    }
}

/// Lazily executed list/filter/ordering/pagination request.
#[derive(Debug, Clone)]
pub struct QuerySet<R: Resource> {
    client: BaasClient,
    filters: Properties,
    page_size: Option<u32>,
    ordering: Option<Order>,
    constraints: Option<Constraints>,
    _resource: PhantomData<R>,
}

impl<R: Resource> QuerySet<R> {
    pub fn new(client: BaasClient) -> Self {
        Self {
            client,
            filters: Properties::new(),
            page_size: None,
            ordering: None,
            constraints: None,
            _resource: PhantomData,
        }
    }

    pub fn client(&self) -> &BaasClient {
        &self.client
    }

    /// Add base properties applied to every terminal call.
    #[must_use]
    pub fn filter(mut self, filters: Properties) -> Self {
        self.filters.extend(filters);
        self
    }

    /// Limit list calls to a single page of `size` records.
    ///
    /// Zero is rejected when the query runs.
    #[must_use]
    pub fn page_size(mut self, size: u32) -> Self {
        self.page_size = Some(size);
        self
    }

    #[must_use]
    pub fn ordering(mut self, order: Order) -> Self {
        self.ordering = Some(order);
        self
    }

    /// Override the constraints used when creating records.
    #[must_use]
    pub fn with_constraints(mut self, constraints: Constraints) -> Self {
        self.constraints = Some(constraints);
        self
    }

    /// All records matching the filters.
    ///
    /// Follows `next` links until the list is exhausted, unless a page size
    /// was set, in which case only that page is returned.
    #[tracing::instrument(skip(self, filters), fields(resource = R::meta().name))]
    pub async fn list(&self, filters: Properties) -> Result<Vec<Model<R>>> {
        let props = self.merged(filters);
        let (path, query, context) = self.list_request(&props)?;

        let mut page = self.fetch(&path, &query).await?;
        let mut records = self.hydrate_all(page.objects, &context)?;

        if self.page_size.is_some() {
            return Ok(records);
        }

        let mut fetched = 1;
        while let Some(next) = page.next.take() {
            if fetched >= MAX_PAGES {
                tracing::warn!("Reached pagination limit of {} pages, stopping", MAX_PAGES);
                break;
            }
            page = self.fetch(&next, &[]).await?;
            records.extend(self.hydrate_all(page.objects, &context)?);
            fetched += 1;
        }

        Ok(records)
    }

    /// The first page envelope, unprocessed.
    #[tracing::instrument(skip(self, filters), fields(resource = R::meta().name))]
    pub async fn raw(&self, filters: Properties) -> Result<Page<Value>> {
        let props = self.merged(filters);
        let (path, query, _) = self.list_request(&props)?;
        self.fetch(&path, &query).await
    }

    /// Follow a page's `next` link.
    pub async fn next_page(&self, page: &Page<Value>) -> Result<Option<Page<Value>>> {
        match &page.next {
            Some(url) => self.fetch(url, &[]).await.map(Some),
            None => Ok(None),
        }
    }

    /// Follow a page's `prev` link.
    pub async fn prev_page(&self, page: &Page<Value>) -> Result<Option<Page<Value>>> {
        match &page.prev {
            Some(url) => self.fetch(url, &[]).await.map(Some),
            None => Ok(None),
        }
    }

    /// Prepare a single-record lookup.
    ///
    /// When the filters name exactly the `detail` path properties the record
    /// is fetched directly; otherwise the list is filtered and the first
    /// match wins.
    pub fn get(&self, filters: Properties) -> GetRequest<R> {
        GetRequest {
            query: self.clone(),
            filters,
        }
    }

    /// First record of the filtered list, if any.
    #[tracing::instrument(skip(self, filters), fields(resource = R::meta().name))]
    pub async fn first(&self, filters: Properties) -> Result<Option<Model<R>>> {
        let props = self.merged(filters);
        self.first_match(&props).await
    }

    /// Validate and create one record.
    #[tracing::instrument(skip(self, data), fields(resource = R::meta().name))]
    pub async fn create(&self, data: Properties) -> Result<Model<R>> {
        self.build(data).save(&self.client).await
    }

    /// Create many records with one batched request.
    ///
    /// Every record is validated before anything is sent. All records must
    /// resolve to the same instance batch endpoint. A failed batch call or
    /// any failed item fails the whole operation.
    #[tracing::instrument(skip(self, objects), fields(resource = R::meta().name))]
    pub async fn bulk_create<I, T>(&self, objects: I) -> Result<Vec<Model<R>>>
    where
        I: IntoIterator<Item = T>,
        T: Into<Model<R>>,
    {
        let models: Vec<Model<R>> = objects
            .into_iter()
            .map(|object| self.build(object.into().into_attributes()))
            .collect();

        let Some(first) = models.first() else {
            return Ok(Vec::new());
        };

        for model in &models {
            model.validate().map_err(BaasError::Validation)?;
        }

        let method = R::meta().find_allowed_method("list", "post")?;
        let requests = models
            .iter()
            .map(|model| -> Result<Value> {
                Ok(json!({
                    "method": method.as_upper(),
                    "path": model.endpoint_path(&self.client, "list")?,
                    "body": model.payload(),
                }))
            })
            .collect::<Result<Vec<Value>>>()?;

        let batch_path = self.batch_path(first)?;
        for (index, model) in models.iter().enumerate().skip(1) {
            let path = self.batch_path(model)?;
            if path != batch_path {
                return Err(BaasError::MixedBatch {
                    index,
                    expected: batch_path,
                    found: path,
                });
            }
        }
        let response = self
            .client
            .post(&batch_path, &json!({ "requests": requests }))
            .await?;

        let results = match response {
            Value::Array(results) => results,
            other => {
                return Err(BaasError::ParseError(serde::de::Error::custom(format!(
                    "expected batch result array, got {other}"
                ))))
            }
        };
        if results.len() != models.len() {
            return Err(BaasError::ParseError(serde::de::Error::custom(format!(
                "batch returned {} results for {} requests",
                results.len(),
                models.len()
            ))));
        }

        models
            .iter()
            .zip(results)
            .enumerate()
            .map(|(index, (model, result))| {
                let status = result
                    .get("code")
                    .and_then(Value::as_u64)
                    .and_then(|c| u16::try_from(c).ok())
                    .unwrap_or(0);
                let content = result.get("content").cloned().unwrap_or(Value::Null);
                if !(200..300).contains(&status) {
                    return Err(BaasError::Batch {
                        index,
                        status,
                        body: content.to_string(),
                    });
                }
                model.merge_response(content)
            })
            .collect()
    }

    /// Prepare deletion of the records matching the filters.
    pub fn delete(&self, filters: Properties) -> DeleteRequest<R> {
        DeleteRequest {
            query: self.clone(),
            filters,
        }
    }

    /// Return the matching record, or create `lookup` overlaid with `defaults`.
    ///
    /// An existing record is returned untouched.
    #[tracing::instrument(skip_all, fields(resource = R::meta().name))]
    pub async fn get_or_create(
        &self,
        lookup: Properties,
        defaults: Properties,
    ) -> Result<Model<R>> {
        match self.get(lookup.clone()).request().await {
            Err(err) if err.is_not_found() => {
                tracing::debug!("no match, creating");
                let mut data = lookup;
                data.extend(defaults);
                self.create(data).await
            }
            other => other,
        }
    }

    /// Patch the matching record with `update_fields`, or create one.
    ///
    /// Creation uses `lookup` overlaid with `defaults`, or with
    /// `update_fields` when no defaults are given.
    #[tracing::instrument(skip_all, fields(resource = R::meta().name))]
    pub async fn update_or_create(
        &self,
        lookup: Properties,
        update_fields: Properties,
        defaults: Option<Properties>,
    ) -> Result<Model<R>> {
        match self.get(lookup.clone()).request().await {
            Ok(found) => found.update(&self.client, update_fields).await,
            Err(err) if err.is_not_found() => {
                tracing::debug!("no match, creating");
                let mut data = lookup;
                data.extend(defaults.unwrap_or(update_fields));
                self.create(data).await
            }
            Err(err) => Err(err),
        }
    }

    /// Patch the record matching the filters.
    #[tracing::instrument(skip_all, fields(resource = R::meta().name))]
    pub async fn update(&self, filters: Properties, fields: Properties) -> Result<Model<R>> {
        let props = self.merged(filters);

        if let Some(path) = self.direct_detail_path(&props, HttpMethod::Patch)? {
            let response = self
                .client
                .patch(&path, &Value::Object(fields))
                .await
                .map_err(|err| not_found::<R>(err, &props))?;
            return self.hydrate(response, &props);
        }

        let found = self.find(&props).await?;
        found.update(&self.client, fields).await
    }

    // -- internals --------------------------------------------------------

    fn merged(&self, extra: Properties) -> Properties {
        let mut props = self.filters.clone();
        props.extend(extra);
        props
    }

    fn build(&self, data: Properties) -> Model<R> {
        let model = Model::new(self.merged(data));
        match &self.constraints {
            Some(constraints) => model.with_constraints(constraints.clone()),
            None => model,
        }
    }

    fn batch_path(&self, model: &Model<R>) -> Result<String> {
        let context = self.client.context();
        let params = Layered {
            primary: model.attributes(),
            fallback: &context,
        };
        BATCH_META.resolve_endpoint_path("batch", Some(&params))
    }

    /// Split properties into the list path, query pairs and the path
    /// properties to carry onto hydrated records.
    fn list_request(
        &self,
        props: &Properties,
    ) -> Result<(String, Vec<(String, String)>, Properties)> {
        let meta = R::meta();
        meta.find_allowed_method("list", "get")?;

        let context = self.client.context();
        let params = Layered {
            primary: props,
            fallback: &context,
        };
        let path = meta.resolve_endpoint_path("list", Some(&params))?;
        let placeholders = meta.path_placeholders("list")?;

        let mut query = Vec::new();
        let mut path_props = Properties::new();
        for (key, value) in props {
            if placeholders.iter().any(|p| *p == key.as_str()) {
                path_props.insert(key.clone(), value.clone());
            } else {
                query.push((key.clone(), query_value(value)));
            }
        }

        if let Some(size) = self.page_size {
            if size == 0 {
                return Err(BaasError::InvalidPageSize(size));
            }
            query.push(("page_size".to_string(), size.to_string()));
        }
        if let Some(order) = self.ordering {
            query.push(("ordering".to_string(), order.as_str().to_string()));
        }

        Ok((path, query, path_props))
    }

    /// `detail` path when the properties name exactly its placeholders and
    /// the verb is allowed there.
    fn direct_detail_path(
        &self,
        props: &Properties,
        method: HttpMethod,
    ) -> Result<Option<String>> {
        let meta = R::meta();
        if !meta.allows("detail", method) {
            return Ok(None);
        }

        let placeholders = meta.path_placeholders("detail")?;
        if props
            .keys()
            .any(|key| !placeholders.iter().any(|p| *p == key.as_str()))
        {
            return Ok(None);
        }

        let context = self.client.context();
        let params = Layered {
            primary: props,
            fallback: &context,
        };
        match meta.resolve_endpoint_path("detail", Some(&params)) {
            Ok(path) => Ok(Some(path)),
            Err(BaasError::MissingPathProperties { .. }) => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn fetch(&self, path: &str, query: &[(String, String)]) -> Result<Page<Value>> {
        let response = self.client.get(path, query).await?;
        Ok(serde_json::from_value(response)?)
    }

    async fn find(&self, props: &Properties) -> Result<Model<R>> {
        if let Some(path) = self.direct_detail_path(props, HttpMethod::Get)? {
            let response = self
                .client
                .get(&path, &[])
                .await
                .map_err(|err| not_found::<R>(err, props))?;
            return self.hydrate(response, props);
        }

        self.first_match(props)
            .await?
            .ok_or_else(|| missing::<R>(props))
    }

    async fn first_match(&self, props: &Properties) -> Result<Option<Model<R>>> {
        let single = self.clone().page_size(1);
        let (path, query, context) = single.list_request(props)?;
        let page = single.fetch(&path, &query).await?;
        page.objects
            .into_iter()
            .next()
            .map(|object| self.hydrate(object, &context))
            .transpose()
    }

    /// Turn a response object into a record, filling in path properties the
    /// server does not echo back.
    fn hydrate(&self, value: Value, path_props: &Properties) -> Result<Model<R>> {
        let mut model = Model::<R>::from_value(value)?;
        for (key, value) in path_props {
            if model.get(key).is_none() {
                model.set(key, value.clone());
            }
        }
        Ok(match &self.constraints {
            Some(constraints) => model.with_constraints(constraints.clone()),
            None => model,
        })
    }

    fn hydrate_all(&self, objects: Vec<Value>, path_props: &Properties) -> Result<Vec<Model<R>>> {
        objects
            .into_iter()
            .map(|object| self.hydrate(object, path_props))
            .collect()
    }
}

/// Render a filter value as a query parameter.
fn query_value(value: &Value) -> String {
    param_string(value).unwrap_or_else(|| match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    })
}

fn missing<R: Resource>(props: &Properties) -> BaasError {
    BaasError::NotFound {
        resource: R::meta().name,
        lookup: Value::Object(props.clone()).to_string(),
    }
}

/// Map a 404 to `NotFound`; pass other errors through.
fn not_found<R: Resource>(err: BaasError, props: &Properties) -> BaasError {
    match err {
        BaasError::Request { status: 404, .. } => missing::<R>(props),
        other => other,
    }
}

/// Pending single-record lookup; run it with [`GetRequest::request`].
#[derive(Debug, Clone)]
pub struct GetRequest<R: Resource> {
    query: QuerySet<R>,
    filters: Properties,
}

impl<R: Resource> GetRequest<R> {
    /// Fetch the record.
    ///
    /// # Errors
    ///
    /// `NotFound` when nothing matches.
    #[tracing::instrument(skip(self), fields(resource = R::meta().name))]
    pub async fn request(self) -> Result<Model<R>> {
        let props = self.query.merged(self.filters);
        self.query.find(&props).await
    }
}

/// Pending deletion; run it with [`DeleteRequest::request`].
#[derive(Debug, Clone)]
pub struct DeleteRequest<R: Resource> {
    query: QuerySet<R>,
    filters: Properties,
}

impl<R: Resource> DeleteRequest<R> {
    /// Delete the matching record(s).
    ///
    /// A direct `detail` lookup issues one DELETE; otherwise every listed
    /// match is deleted in turn.
    ///
    /// # Errors
    ///
    /// `NotFound` when nothing matches.
    #[tracing::instrument(skip(self), fields(resource = R::meta().name))]
    pub async fn request(self) -> Result<()> {
        let query = self.query;
        let props = query.merged(self.filters);

        if let Some(path) = query.direct_detail_path(&props, HttpMethod::Delete)? {
            return query
                .client
                .delete(&path)
                .await
                .map_err(|err| not_found::<R>(err, &props));
        }

        let matches = query.list(props.clone()).await?;
        if matches.is_empty() {
            return Err(missing::<R>(&props));
        }
        for model in &matches {
            model.delete(&query.client).await?;
        }
        Ok(())
    }
}
