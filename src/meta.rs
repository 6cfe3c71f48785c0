//! Model metadata and endpoint resolution.
//!
//! Every resource kind declares a static [`ModelMeta`] naming its endpoints.
//! An endpoint pairs a path template such as
//! `/v1/instances/{instance}/classes/{name}/` with the HTTP verbs it accepts.
//! Resolution is a pure function of that configuration.

use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};

use crate::error::{BaasError, Result};

/// HTTP verbs an endpoint may allow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    /// Lower-cased canonical verb.
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Post => "post",
            HttpMethod::Put => "put",
            HttpMethod::Patch => "patch",
            HttpMethod::Delete => "delete",
        }
    }

    /// Upper-cased verb as sent on the wire.
    pub fn as_upper(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = BaasError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "get" => Ok(HttpMethod::Get),
            "post" => Ok(HttpMethod::Post),
            "put" => Ok(HttpMethod::Put),
            "patch" => Ok(HttpMethod::Patch),
            "delete" => Ok(HttpMethod::Delete),
            _ => Err(BaasError::UnsupportedMethod(s.to_string())),
        }
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

/// A named path template plus its allowed verbs.
#[derive(Debug, Clone, Copy)]
pub struct Endpoint {
    pub methods: &'static [HttpMethod],
    pub path: &'static str,
}

/// Static description of one resource kind.
#[derive(Debug)]
pub struct ModelMeta {
    /// Singular resource name (e.g. `class`).
    pub name: &'static str,
    /// Plural resource name (e.g. `classes`).
    pub plural_name: &'static str,
    /// Endpoints keyed by logical name (`list`, `detail`, ...).
    pub endpoints: &'static [(&'static str, Endpoint)],
}

/// Source of values for path template placeholders.
pub trait PathParams {
    /// Value for a placeholder, already rendered as a string.
    fn path_param(&self, name: &str) -> Option<String>;
}

impl PathParams for Map<String, Value> {
    fn path_param(&self, name: &str) -> Option<String> {
        self.get(name).and_then(param_string)
    }
}

/// Two parameter sources consulted in order.
pub struct Layered<'a> {
    pub primary: &'a dyn PathParams,
    pub fallback: &'a dyn PathParams,
}

impl PathParams for Layered<'_> {
    fn path_param(&self, name: &str) -> Option<String> {
        self.primary
            .path_param(name)
            .or_else(|| self.fallback.path_param(name))
    }
}

/// Render a JSON scalar for use in a path segment.
pub(crate) fn param_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Placeholder names in a template, in order of appearance.
pub fn placeholders(template: &str) -> Vec<&str> {
    let mut names = Vec::new();
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        let Some(len) = rest[start + 1..].find('}') else {
            break;
        };
        names.push(&rest[start + 1..start + 1 + len]);
        rest = &rest[start + len + 2..];
    }
    names
}

impl ModelMeta {
    /// Look up an endpoint by key.
    pub fn endpoint(&self, key: &str) -> Result<&Endpoint> {
        self.endpoints
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, endpoint)| endpoint)
            .ok_or_else(|| BaasError::InvalidEndpoint(key.to_string()))
    }

    /// Returns true if the endpoint exists and allows the verb.
    pub fn allows(&self, key: &str, method: HttpMethod) -> bool {
        self.endpoint(key)
            .map(|e| e.methods.contains(&method))
            .unwrap_or(false)
    }

    /// Placeholder names used by an endpoint's template.
    pub fn path_placeholders(&self, key: &str) -> Result<Vec<&'static str>> {
        Ok(placeholders(self.endpoint(key)?.path))
    }

    /// Substitute every placeholder of an endpoint template.
    ///
    /// Values are percent-encoded as single path segments.
    pub fn resolve_endpoint_path(
        &self,
        key: &str,
        params: Option<&dyn PathParams>,
    ) -> Result<String> {
        let endpoint = self.endpoint(key)?;
        let mut path = endpoint.path.to_string();

        for name in placeholders(endpoint.path) {
            let value = params.and_then(|p| p.path_param(name)).ok_or_else(|| {
                BaasError::MissingPathProperties {
                    endpoint: key.to_string(),
                    property: name.to_string(),
                }
            })?;
            path = path.replace(&format!("{{{name}}}"), &urlencoding::encode(&value));
        }

        Ok(path)
    }

    /// Check a requested verb against the endpoint and normalize it.
    pub fn find_allowed_method(&self, key: &str, requested: &str) -> Result<HttpMethod> {
        let endpoint = self.endpoint(key)?;
        let unsupported = || BaasError::UnsupportedMethod(requested.to_string());

        let method: HttpMethod = requested.parse().map_err(|_| unsupported())?;
        if endpoint.methods.contains(&method) {
            Ok(method)
        } else {
            Err(unsupported())
        }
    }
}
