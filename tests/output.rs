//! Human-readable output tests.

use baasapi::{Instance, InstanceInvitation, Model, PrettyPrint, User};
use serde_json::json;

#[test]
fn test_pretty_print_starts_with_resource_name() {
    let model = Model::<Instance>::empty()
        .with("name", "demo")
        .with("description", "Demo instance")
        .with("links", json!({"self": "/v1/instances/demo/"}));

    let output = model.pretty_print();
    let mut lines = output.lines();
    assert_eq!(lines.next(), Some("Instance demo"));
    assert!(lines.next().unwrap().starts_with('─'));
    assert!(output.contains("description:"));
    assert!(output.contains("Demo instance"));
}

#[test]
fn test_pretty_print_hides_password() {
    let model = Model::<User>::empty()
        .with("id", 7)
        .with("username", "alice")
        .with("password", "secret")
        .with("links", json!({}));

    let output = model.pretty_print();
    assert!(output.starts_with("User alice"));
    assert!(!output.contains("secret"));
    // Leading fields come first
    let id_at = output.find("id:").unwrap();
    let username_at = output.find("username:").unwrap();
    assert!(id_at < username_at);
}

#[test]
fn test_pretty_print_falls_back_to_id() {
    let model = Model::<InstanceInvitation>::empty()
        .with("id", 3)
        .with("role", "read");

    let output = model.pretty_print();
    assert!(output.starts_with("Invitation #3"));
    assert!(output.ends_with("(unsaved)"));
}
