//! Request handling for the mock server.
//!
//! [`execute`] is transport-free so batch items run through the same code
//! as top-level requests.

use axum::http::StatusCode;
use serde_json::{json, Value};

use super::routes::Route;
use super::state::MockState;
use crate::meta::{param_string, HttpMethod};
use crate::traits::Properties;

const DEFAULT_PAGE_SIZE: usize = 100;

/// Query parameters that control paging rather than filter records.
const RESERVED_PARAMS: &[&str] = &["page", "page_size", "ordering"];

pub(crate) type Reply = (StatusCode, Value);

/// Run one request against the state.
pub(crate) fn execute(
    state: &mut MockState,
    method: HttpMethod,
    path: &str,
    query: &[(String, String)],
    body: Option<Value>,
) -> Reply {
    let Some((route, methods)) = Route::resolve(path) else {
        return error(StatusCode::NOT_FOUND, "Not found.");
    };
    if !methods.contains(&method) {
        return error(
            StatusCode::METHOD_NOT_ALLOWED,
            &format!("Method \"{}\" not allowed.", method.as_upper()),
        );
    }

    match route {
        Route::List {
            collection,
            key_field,
            ..
        } => match method {
            HttpMethod::Get => list(state, &collection, path, query),
            _ => create(state, &collection, key_field, body),
        },
        Route::Detail {
            collection,
            key_field,
            key,
            ..
        } => detail(state, method, &collection, key_field, &key, body),
        Route::Action {
            collection,
            key_field,
            key,
            action,
            ..
        } => match action {
            "reset_key" => {
                let token = state.next_token();
                state
                    .touch(&collection, key_field, &key, "user_key", json!(token))
                    .map(|record| (StatusCode::OK, Value::Object(record)))
                    .unwrap_or_else(|| error(StatusCode::NOT_FOUND, "Not found."))
            }
            _ => error(StatusCode::NOT_FOUND, "Not found."),
        },
        Route::Batch => batch(state, body),
    }
}

/// Split a raw query string into decoded pairs.
pub(crate) fn parse_query(raw: Option<&str>) -> Vec<(String, String)> {
    raw.map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default()
}

fn list(state: &MockState, collection: &str, path: &str, query: &[(String, String)]) -> Reply {
    let param = |name: &str| {
        query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    };

    let page_size = match param("page_size").map(str::parse::<usize>) {
        None => DEFAULT_PAGE_SIZE,
        Some(Ok(size)) if size > 0 => size,
        Some(_) => return error(StatusCode::BAD_REQUEST, "Invalid page_size."),
    };
    let page = param("page")
        .and_then(|p| p.parse::<usize>().ok())
        .filter(|p| *p > 0)
        .unwrap_or(1);

    let mut records: Vec<&Properties> = state
        .list(collection)
        .iter()
        .filter(|record| {
            query
                .iter()
                .filter(|(k, _)| !RESERVED_PARAMS.iter().any(|r| r == k))
                .all(|(k, v)| record.get(k).and_then(param_string).as_deref() == Some(v.as_str()))
        })
        .collect();
    if param("ordering") == Some("desc") {
        records.reverse();
    }

    let start = (page - 1) * page_size;
    let objects: Vec<Value> = records
        .iter()
        .skip(start)
        .take(page_size)
        .map(|r| Value::Object((*r).clone()))
        .collect();
    let next = (start + page_size < records.len()).then(|| page_link(path, query, page + 1));
    let prev = (page > 1).then(|| page_link(path, query, page - 1));

    (
        StatusCode::OK,
        json!({ "objects": objects, "next": next, "prev": prev }),
    )
}

fn page_link(path: &str, query: &[(String, String)], page: usize) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (k, v) in query.iter().filter(|(k, _)| k != "page") {
        serializer.append_pair(k, v);
    }
    serializer.append_pair("page", &page.to_string());
    format!("{path}?{}", serializer.finish())
}

fn create(
    state: &mut MockState,
    collection: &str,
    key_field: &str,
    body: Option<Value>,
) -> Reply {
    let body = match object_body(body) {
        Ok(body) => body,
        Err(reply) => return reply,
    };
    match state.create(collection, key_field, body) {
        Ok(record) => (StatusCode::CREATED, Value::Object(record)),
        Err(message) => error(StatusCode::BAD_REQUEST, &message),
    }
}

fn detail(
    state: &mut MockState,
    method: HttpMethod,
    collection: &str,
    key_field: &str,
    key: &str,
    body: Option<Value>,
) -> Reply {
    let found = match method {
        HttpMethod::Get => state
            .get(collection, key_field, key)
            .cloned()
            .map(|record| (StatusCode::OK, Value::Object(record))),
        HttpMethod::Patch | HttpMethod::Put => {
            let body = match object_body(body) {
                Ok(body) => body,
                Err(reply) => return reply,
            };
            let replace = method == HttpMethod::Put;
            state
                .update(collection, key_field, key, body, replace)
                .map(|record| (StatusCode::OK, Value::Object(record)))
        }
        HttpMethod::Delete => state
            .remove(collection, key_field, key)
            .then_some((StatusCode::NO_CONTENT, Value::Null)),
        HttpMethod::Post => {
            return error(StatusCode::METHOD_NOT_ALLOWED, "Method \"POST\" not allowed.")
        }
    };
    found.unwrap_or_else(|| error(StatusCode::NOT_FOUND, "Not found."))
}

fn batch(state: &mut MockState, body: Option<Value>) -> Reply {
    let Some(requests) = body
        .as_ref()
        .and_then(|b| b.get("requests"))
        .and_then(Value::as_array)
    else {
        return error(StatusCode::BAD_REQUEST, "requests: This field is required.");
    };

    let results: Vec<Value> = requests
        .iter()
        .map(|request| {
            let method = request
                .get("method")
                .and_then(Value::as_str)
                .and_then(|m| m.parse::<HttpMethod>().ok());
            let target = request.get("path").and_then(Value::as_str);

            let (status, content) = match (method, target) {
                (Some(method), Some(target)) => {
                    let (path, raw_query) = match target.split_once('?') {
                        Some((path, query)) => (path, Some(query)),
                        None => (target, None),
                    };
                    if matches!(Route::resolve(path), Some((Route::Batch, _))) {
                        error(StatusCode::BAD_REQUEST, "Nested batch requests are not allowed.")
                    } else {
                        let query = parse_query(raw_query);
                        execute(state, method, path, &query, request.get("body").cloned())
                    }
                }
                _ => error(StatusCode::BAD_REQUEST, "method and path are required."),
            };
            json!({ "code": status.as_u16(), "content": content })
        })
        .collect();

    (StatusCode::OK, Value::Array(results))
}

fn object_body(body: Option<Value>) -> Result<Properties, Reply> {
    match body {
        None | Some(Value::Null) => Ok(Properties::new()),
        Some(Value::Object(fields)) => Ok(fields),
        Some(_) => Err(error(
            StatusCode::BAD_REQUEST,
            "Invalid data. Expected a dictionary.",
        )),
    }
}

fn error(status: StatusCode, message: &str) -> Reply {
    (status, json!({ "detail": message }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Instance;

    fn seeded() -> MockState {
        let mut state = MockState::new();
        for name in ["alpha", "beta", "gamma"] {
            state = state.with_record::<Instance>(json!({"name": name}).as_object().cloned().unwrap());
        }
        state
    }

    #[test]
    fn test_list_paging_and_ordering() {
        let mut state = seeded();
        let query = vec![
            ("page_size".to_string(), "2".to_string()),
            ("ordering".to_string(), "desc".to_string()),
        ];
        let (status, body) = execute(&mut state, HttpMethod::Get, "/v1/instances/", &query, None);
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["objects"][0]["name"], json!("gamma"));
        assert_eq!(body["objects"].as_array().unwrap().len(), 2);
        let next = body["next"].as_str().unwrap();
        assert!(next.starts_with("/v1/instances/?"));
        assert!(next.contains("page=2"));
        assert!(body["prev"].is_null());
    }

    #[test]
    fn test_list_filters_by_field() {
        let mut state = seeded();
        let query = vec![("name".to_string(), "beta".to_string())];
        let (_, body) = execute(&mut state, HttpMethod::Get, "/v1/instances/", &query, None);
        assert_eq!(body["objects"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_method_not_allowed() {
        let mut state = seeded();
        let (status, _) = execute(
            &mut state,
            HttpMethod::Patch,
            "/v1/instances/demo/invitations/1/",
            &[],
            Some(json!({})),
        );
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[test]
    fn test_batch_runs_each_request() {
        let mut state = seeded();
        let body = json!({"requests": [
            {"method": "POST", "path": "/v1/instances/alpha/classes/", "body": {"name": "books"}},
            {"method": "POST", "path": "/v1/instances/alpha/classes/", "body": {"name": "books"}}
        ]});
        let (status, results) = execute(
            &mut state,
            HttpMethod::Post,
            "/v1/instances/alpha/batch/",
            &[],
            Some(body),
        );
        assert_eq!(status, StatusCode::OK);
        assert_eq!(results[0]["code"], json!(201));
        assert_eq!(results[1]["code"], json!(400));
    }
}
