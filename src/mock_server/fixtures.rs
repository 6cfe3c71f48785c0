//! Test data fixtures for the mock server.
//!
//! Provides factory functions for creating realistic test data.

use serde_json::{json, Value};

use super::state::MockState;
use crate::models::{ApnsDevice, Class, Instance, InstanceInvitation, User};
use crate::traits::Properties;

/// Collection of fixture factories for test data.
pub struct Fixtures;

impl Fixtures {
    /// Instance the default scenario lives in.
    pub const INSTANCE: &'static str = "demo";

    /// Create an instance.
    pub fn instance(name: &str, description: &str) -> Properties {
        object(json!({ "name": name, "description": description }))
    }

    /// Create a data class with a small schema.
    pub fn class(instance: &str, name: &str) -> Properties {
        object(json!({
            "instance": instance,
            "name": name,
            "description": format!("{name} class"),
            "schema": [
                { "name": "title", "type": "string" },
                { "name": "year", "type": "integer", "filter_index": true }
            ]
        }))
    }

    /// Create a user.
    pub fn user(instance: &str, username: &str) -> Properties {
        object(json!({
            "instance": instance,
            "username": username,
            "password": "secret",
        }))
    }

    /// Create an APNS device.
    pub fn apns_device(instance: &str, registration_id: &str, user: i64) -> Properties {
        object(json!({
            "instance": instance,
            "registration_id": registration_id,
            "device_id": format!("device-{user}"),
            "user": user,
            "label": "iPhone",
            "is_active": true,
        }))
    }

    /// Create an invitation.
    pub fn invitation(instance: &str, email: &str, role: &str) -> Properties {
        object(json!({
            "instance": instance,
            "email": email,
            "role": role,
            "state": "new",
        }))
    }

    /// The default scenario: one instance with classes, users, a device
    /// and an invitation.
    pub fn default_state() -> MockState {
        let instance = Self::INSTANCE;
        MockState::new()
            .with_record::<Instance>(Self::instance(instance, "Demo instance"))
            .with_record::<Class>(Self::class(instance, "books"))
            .with_record::<Class>(Self::class(instance, "authors"))
            .with_record::<User>(Self::user(instance, "alice"))
            .with_record::<User>(Self::user(instance, "bob"))
            .with_record::<ApnsDevice>(Self::apns_device(instance, &"a1".repeat(32), 1))
            .with_record::<InstanceInvitation>(Self::invitation(
                instance,
                "carol@example.com",
                "read",
            ))
    }
}

fn object(value: Value) -> Properties {
    match value {
        Value::Object(fields) => fields,
        _ => Properties::new(),
    }
}
