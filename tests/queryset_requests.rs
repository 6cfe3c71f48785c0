//! QuerySet execution tests.
//!
//! Uses wiremock to check the exact requests each query issues.

use baasapi::{
    ApnsDevice, BaasClient, BaasError, Class, Model, Order, Properties, Resource, User,
};
use serde_json::{json, Value};
use wiremock::matchers::{body_json, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> BaasClient {
    BaasClient::new("test-key", &server.uri())
        .unwrap()
        .with_instance("demo")
}

fn props(value: Value) -> Properties {
    value.as_object().cloned().unwrap()
}

fn user(id: i64, username: &str) -> Value {
    json!({
        "id": id,
        "username": username,
        "links": {"self": format!("/v1/instances/demo/users/{id}/")}
    })
}

#[tokio::test]
async fn test_list_follows_next_links() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/instances/demo/users/"))
        .and(query_param_is_missing("page"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "objects": [user(1, "alice")],
            "next": "/v1/instances/demo/users/?page=2",
            "prev": null
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/instances/demo/users/"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "objects": [user(2, "bob")],
            "next": null,
            "prev": "/v1/instances/demo/users/"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let users = User::please(&client(&mock_server))
        .list(Properties::new())
        .await
        .unwrap();

    let names: Vec<_> = users.iter().filter_map(|u| u.get_str("username")).collect();
    assert_eq!(names, ["alice", "bob"]);
}

#[tokio::test]
async fn test_page_size_and_ordering_return_single_page() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/instances/demo/users/"))
        .and(query_param("page_size", "1"))
        .and(query_param("ordering", "desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "objects": [user(2, "bob")],
            "next": "/v1/instances/demo/users/?page=2&page_size=1&ordering=desc",
            "prev": null
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let users = User::please(&client(&mock_server))
        .page_size(1)
        .ordering(Order::Desc)
        .list(Properties::new())
        .await
        .unwrap();

    assert_eq!(users.len(), 1);
    assert_eq!(users[0].get_str("username"), Some("bob"));
}

#[tokio::test]
async fn test_zero_page_size_is_rejected() {
    let mock_server = MockServer::start().await;

    let err = User::please(&client(&mock_server))
        .page_size(0)
        .list(Properties::new())
        .await
        .unwrap_err();

    assert!(matches!(err, BaasError::InvalidPageSize(0)));
}

#[tokio::test]
async fn test_raw_returns_envelope() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/instances/demo/users/"))
        .and(query_param("username", "alice"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "objects": [user(1, "alice")],
            "next": "/v1/instances/demo/users/?page=2",
            "prev": null
        })))
        .mount(&mock_server)
        .await;

    let page = User::please(&client(&mock_server))
        .raw(props(json!({"username": "alice"})))
        .await
        .unwrap();

    assert_eq!(page.len(), 1);
    assert!(page.has_next());
    assert!(!page.has_prev());
    assert_eq!(page.objects[0]["id"], json!(1));
}

#[tokio::test]
async fn test_get_by_detail_properties_fetches_directly() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/instances/demo/classes/books/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "books",
            "links": {}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let class = Class::please(&client(&mock_server))
        .get(props(json!({"name": "books"})))
        .request()
        .await
        .unwrap();

    assert_eq!(class.get_str("name"), Some("books"));
}

#[tokio::test]
async fn test_get_by_other_fields_filters_list() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/instances/other/users/"))
        .and(query_param("username", "alice"))
        .and(query_param("page_size", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "objects": [user(1, "alice")],
            "next": null,
            "prev": null
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let found = User::please(&client(&mock_server))
        .get(props(json!({"instance": "other", "username": "alice"})))
        .request()
        .await
        .unwrap();

    assert_eq!(found.id(), Some(1));
    // Path properties are carried onto the record
    assert_eq!(found.get_str("instance"), Some("other"));
}

#[tokio::test]
async fn test_get_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/instances/demo/classes/missing/"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Not found."})))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/instances/demo/users/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "objects": [],
            "next": null,
            "prev": null
        })))
        .mount(&mock_server)
        .await;

    let client = client(&mock_server);

    let err = Class::please(&client)
        .get(props(json!({"name": "missing"})))
        .request()
        .await
        .unwrap_err();
    assert!(matches!(err, BaasError::NotFound { resource: "class", .. }));

    let err = User::please(&client)
        .get(props(json!({"username": "nobody"})))
        .request()
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_first_returns_none_on_empty_list() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/instances/demo/users/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"objects": []})))
        .mount(&mock_server)
        .await;

    let first = User::please(&client(&mock_server))
        .first(Properties::new())
        .await
        .unwrap();
    assert!(first.is_none());
}

#[tokio::test]
async fn test_create_posts_validated_record() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/instances/demo/users/"))
        .and(body_json(json!({"username": "carol", "password": "pw"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 3,
            "username": "carol",
            "links": {}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let created = User::please(&client(&mock_server))
        .create(props(json!({"username": "carol", "password": "pw"})))
        .await
        .unwrap();

    assert_eq!(created.id(), Some(3));
    assert!(!created.is_new());
}

#[tokio::test]
async fn test_bulk_create_sends_one_batch() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/instances/demo/batch/"))
        .and(body_json(json!({"requests": [
            {
                "method": "POST",
                "path": "/v1/instances/demo/classes/",
                "body": {"name": "books"}
            },
            {
                "method": "POST",
                "path": "/v1/instances/demo/classes/",
                "body": {"name": "authors"}
            }
        ]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"code": 201, "content": {"name": "books", "links": {}}},
            {"code": 201, "content": {"name": "authors", "links": {}}}
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let created = Class::please(&client(&mock_server))
        .bulk_create(vec![
            props(json!({"name": "books"})),
            props(json!({"name": "authors"})),
        ])
        .await
        .unwrap();

    assert_eq!(created.len(), 2);
    assert!(created.iter().all(|c| !c.is_new()));
}

#[tokio::test]
async fn test_bulk_create_reports_failed_item() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/instances/demo/batch/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"code": 201, "content": {"name": "books", "links": {}}},
            {"code": 400, "content": {"detail": "name: already exists."}}
        ])))
        .mount(&mock_server)
        .await;

    let err = Class::please(&client(&mock_server))
        .bulk_create(vec![
            Model::<Class>::empty().with("name", "books"),
            Model::<Class>::empty().with("name", "books"),
        ])
        .await
        .unwrap_err();

    match err {
        BaasError::Batch { index, status, .. } => {
            assert_eq!(index, 1);
            assert_eq!(status, 400);
        }
        other => panic!("Expected batch error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_bulk_create_validates_everything_first() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let err = Class::please(&client(&mock_server))
        .bulk_create(vec![props(json!({"name": "books"})), props(json!({}))])
        .await
        .unwrap_err();

    assert!(matches!(err, BaasError::Validation(_)));
}

#[tokio::test]
async fn test_get_or_create_returns_existing() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/instances/demo/users/"))
        .and(query_param("username", "alice"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "objects": [user(1, "alice")]
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&mock_server)
        .await;

    let found = User::please(&client(&mock_server))
        .get_or_create(
            props(json!({"username": "alice"})),
            props(json!({"password": "pw"})),
        )
        .await
        .unwrap();

    assert_eq!(found.id(), Some(1));
}

#[tokio::test]
async fn test_get_or_create_creates_with_defaults() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/instances/demo/users/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"objects": []})))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/instances/demo/users/"))
        .and(body_json(json!({"username": "dave", "password": "pw"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(user(4, "dave")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let created = User::please(&client(&mock_server))
        .get_or_create(
            props(json!({"username": "dave"})),
            props(json!({"password": "pw"})),
        )
        .await
        .unwrap();

    assert_eq!(created.id(), Some(4));
}

#[tokio::test]
async fn test_update_or_create_patches_existing() {
    let mock_server = MockServer::start().await;
    let registration_id = "ab".repeat(32);
    let detail = format!("/v1/instances/demo/push_notifications/apns/devices/{registration_id}/");

    Mock::given(method("GET"))
        .and(path(detail.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "registration_id": registration_id,
            "label": "old",
            "links": {}
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path(detail.as_str()))
        .and(body_json(json!({"label": "new"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "registration_id": registration_id,
            "label": "new",
            "links": {}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let device = ApnsDevice::please(&client(&mock_server))
        .update_or_create(
            props(json!({"registration_id": registration_id})),
            props(json!({"label": "new"})),
            None,
        )
        .await
        .unwrap();

    assert_eq!(device.get_str("label"), Some("new"));
}

#[tokio::test]
async fn test_update_or_create_creates_from_defaults() {
    let mock_server = MockServer::start().await;
    let registration_id = "cd".repeat(32);
    let detail = format!("/v1/instances/demo/push_notifications/apns/devices/{registration_id}/");

    Mock::given(method("GET"))
        .and(path(detail.as_str()))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Not found."})))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    // Defaults win over the update fields on creation
    Mock::given(method("POST"))
        .and(path("/v1/instances/demo/push_notifications/apns/devices/"))
        .and(body_json(json!({
            "registration_id": registration_id,
            "user": 1,
            "device_id": "dev-1",
            "label": "dflt"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "registration_id": registration_id,
            "user": 1,
            "device_id": "dev-1",
            "label": "dflt",
            "links": {}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let device = ApnsDevice::please(&client(&mock_server))
        .update_or_create(
            props(json!({"registration_id": registration_id})),
            props(json!({"label": "new label"})),
            Some(props(json!({"user": 1, "device_id": "dev-1", "label": "dflt"}))),
        )
        .await
        .unwrap();

    assert!(!device.is_new());
    assert_eq!(device.get_str("label"), Some("dflt"));
}

#[tokio::test]
async fn test_update_or_create_without_defaults_creates_from_update_fields() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/instances/demo/classes/books/"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Not found."})))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/instances/demo/classes/"))
        .and(body_json(json!({"name": "books", "description": "from update"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "name": "books",
            "description": "from update",
            "links": {}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let class = Class::please(&client(&mock_server))
        .update_or_create(
            props(json!({"name": "books"})),
            props(json!({"description": "from update"})),
            None,
        )
        .await
        .unwrap();

    assert_eq!(class.get_str("description"), Some("from update"));
}

#[tokio::test]
async fn test_update_by_detail_properties() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/v1/instances/demo/classes/books/"))
        .and(body_json(json!({"description": "Shelf"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "books",
            "description": "Shelf",
            "links": {}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let updated = Class::please(&client(&mock_server))
        .update(
            props(json!({"name": "books"})),
            props(json!({"description": "Shelf"})),
        )
        .await
        .unwrap();

    assert_eq!(updated.get_str("description"), Some("Shelf"));
}

#[tokio::test]
async fn test_delete_by_detail_properties() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/v1/instances/demo/classes/books/"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    Class::please(&client(&mock_server))
        .delete(props(json!({"name": "books"})))
        .request()
        .await
        .unwrap();
}

#[tokio::test]
async fn test_delete_by_filter_deletes_each_match() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/instances/demo/users/"))
        .and(query_param("is_active", "false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "objects": [user(1, "alice"), user(2, "bob")],
            "next": null
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/v1/instances/demo/users/1/"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/v1/instances/demo/users/2/"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    User::please(&client(&mock_server))
        .delete(props(json!({"is_active": false})))
        .request()
        .await
        .unwrap();
}
