//! Request path matching against resource endpoint templates.
//!
//! The mock serves exactly the endpoints the client-side metadata declares,
//! so a template change on a resource is picked up by both sides.

use crate::meta::{placeholders, HttpMethod, ModelMeta};
use crate::models::{ApnsDevice, Class, Instance, InstanceInvitation, User};
use crate::traits::Resource;

const BATCH_TEMPLATE: &str = "/v1/instances/{instance}/batch/";

/// Resource kinds the mock knows about.
pub(crate) fn resources() -> [&'static ModelMeta; 5] {
    [
        Instance::meta(),
        Class::meta(),
        ApnsDevice::meta(),
        InstanceInvitation::meta(),
        User::meta(),
    ]
}

/// Where a request lands.
#[derive(Debug, Clone)]
pub(crate) enum Route {
    /// A collection, addressed by its concrete list path.
    List {
        collection: String,
        key_field: &'static str,
    },
    /// One record of a collection.
    Detail {
        collection: String,
        key_field: &'static str,
        key: String,
    },
    /// A named action below a record (e.g. `reset_key`).
    Action {
        collection: String,
        key_field: &'static str,
        key: String,
        action: &'static str,
    },
    Batch,
}

impl Route {
    /// Match a request path, returning the route and its allowed verbs.
    pub(crate) fn resolve(path: &str) -> Option<(Route, &'static [HttpMethod])> {
        if match_template(BATCH_TEMPLATE, path).is_some() {
            return Some((Route::Batch, &[HttpMethod::Post]));
        }

        for meta in resources() {
            let key_field = meta
                .endpoint("detail")
                .ok()
                .and_then(|e| placeholders(e.path).last().copied())?;

            for (name, endpoint) in meta.endpoints {
                let Some(mut captures) = match_template(endpoint.path, path) else {
                    continue;
                };
                let segments = segments(path);
                let route = match *name {
                    "list" => Route::List {
                        collection: join(&segments),
                        key_field,
                    },
                    "detail" => Route::Detail {
                        collection: join(&segments[..segments.len() - 1]),
                        key_field,
                        key: captures.pop()?,
                    },
                    action => Route::Action {
                        collection: join(&segments[..segments.len().saturating_sub(2)]),
                        key_field,
                        key: captures.pop()?,
                        action,
                    },
                };
                return Some((route, endpoint.methods));
            }
        }
        None
    }
}

fn segments(path: &str) -> Vec<&str> {
    path.trim_matches('/').split('/').collect()
}

fn join(segments: &[&str]) -> String {
    format!("/{}/", segments.join("/"))
}

/// Match a path against a template, returning decoded placeholder values.
fn match_template(template: &str, path: &str) -> Option<Vec<String>> {
    let expected = segments(template);
    let actual = segments(path);
    if expected.len() != actual.len() {
        return None;
    }

    let mut captures = Vec::new();
    for (t, p) in expected.iter().zip(&actual) {
        if t.starts_with('{') && t.ends_with('}') {
            if p.is_empty() {
                return None;
            }
            let value = urlencoding::decode(p)
                .map(|s| s.into_owned())
                .unwrap_or_else(|_| p.to_string());
            captures.push(value);
        } else if t != p {
            return None;
        }
    }
    Some(captures)
}
