//! Record lifecycle tests: validate, save, update, delete.
//!
//! Uses wiremock to mock the BaaS API and test actual execution flow.

use baasapi::{BaasClient, BaasError, Class, Instance, InstanceInvitation, Model, User};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> BaasClient {
    BaasClient::new("test-key", &server.uri())
        .unwrap()
        .with_instance("demo")
}

#[tokio::test]
async fn test_save_new_record_posts_to_list() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/instances/demo/classes/"))
        .and(header("X-API-KEY", "test-key"))
        .and(body_json(json!({"name": "books", "description": "Library"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "name": "books",
            "description": "Library",
            "created_at": "2024-05-01T10:00:00Z",
            "updated_at": "2024-05-01T10:00:00Z",
            "links": {"self": "/v1/instances/demo/classes/books/"}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let model = Model::<Class>::empty()
        .with("name", "books")
        .with("description", "Library");
    assert!(model.is_new());

    let saved = model.save(&client(&mock_server)).await.unwrap();

    assert!(!saved.is_new());
    assert!(saved.created_at().is_some());
    assert_eq!(saved.get_str("description"), Some("Library"));
}

#[tokio::test]
async fn test_save_persisted_record_patches_detail() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/v1/instances/demo/classes/books/"))
        .and(body_json(json!({"name": "books", "description": "Updated"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "books",
            "description": "Updated",
            "links": {"self": "/v1/instances/demo/classes/books/"}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let model = Model::<Class>::empty()
        .with("name", "books")
        .with("description", "Updated")
        .with("links", json!({"self": "/v1/instances/demo/classes/books/"}))
        .with("created_at", "2024-05-01T10:00:00Z");

    let saved = model.save(&client(&mock_server)).await.unwrap();
    assert_eq!(saved.get_str("description"), Some("Updated"));
}

#[tokio::test]
async fn test_invalid_record_is_never_sent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&mock_server)
        .await;

    let err = Model::<Instance>::empty()
        .with("description", 42)
        .save(&client(&mock_server))
        .await
        .unwrap_err();

    match err {
        BaasError::Validation(errors) => {
            assert!(errors.contains("name"));
            assert!(errors.contains("description"));
        }
        other => panic!("Expected validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_delete_record() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/v1/instances/demo/classes/books/"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let model = Model::<Class>::empty().with("name", "books");
    model.delete(&client(&mock_server)).await.unwrap();
}

#[tokio::test]
async fn test_delete_without_key_fails_before_request() {
    let mock_server = MockServer::start().await;

    let err = Model::<Class>::empty()
        .delete(&client(&mock_server))
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "Missing \"detail\" path properties \"name\""
    );
}

#[tokio::test]
async fn test_save_where_update_is_not_allowed() {
    let mock_server = MockServer::start().await;

    let model = Model::<InstanceInvitation>::empty()
        .with("id", 3)
        .with("email", "carol@example.com")
        .with("role", "read")
        .with("links", json!({}));

    let err = model.save(&client(&mock_server)).await.unwrap_err();
    assert!(matches!(err, BaasError::UnsupportedMethod(_)));
    assert_eq!(err.to_string(), "Unsupported request methods: put");
}

#[tokio::test]
async fn test_server_error_is_reported() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/instances/"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"detail": "name: already exists."})),
        )
        .mount(&mock_server)
        .await;

    let err = Model::<Instance>::empty()
        .with("name", "demo")
        .save(&client(&mock_server))
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(400));
    assert!(err.to_string().contains("already exists"));
}

#[tokio::test]
async fn test_user_reset_key() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/instances/demo/users/7/reset_key/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 7,
            "username": "alice",
            "user_key": "fresh"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let user = Model::<User>::empty()
        .with("id", 7)
        .with("username", "alice")
        .with("user_key", "stale")
        .with("links", json!({}));

    let refreshed = user.reset_key(&client(&mock_server)).await.unwrap();
    assert_eq!(refreshed.get_str("user_key"), Some("fresh"));
    assert_eq!(refreshed.id(), Some(7));
}
