//! Output formatting for CLI display.
//!
//! Provides the [`PrettyPrint`] trait for human-readable output
//! as an alternative to JSON serialization.

use serde_json::Value;

use crate::model::Model;
use crate::traits::Resource;

/// Fields shown first, in this order, when present.
const LEADING_FIELDS: &[&str] = &["id", "name", "username", "email", "registration_id", "label"];

/// Fields left out of the key-value listing.
const HIDDEN_FIELDS: &[&str] = &["links", "password"];

/// Trait for human-readable key-value output.
pub trait PrettyPrint {
    /// Returns a formatted string for terminal display.
    fn pretty_print(&self) -> String;
}

impl<R: Resource> PrettyPrint for Model<R> {
    fn pretty_print(&self) -> String {
        let meta = R::meta();
        let header = match self.title() {
            Some(title) => format!("{} {}", capitalize(meta.name), title),
            None => capitalize(meta.name),
        };
        let divider = "─".repeat(header.chars().count().max(30));

        let mut keys: Vec<&str> = LEADING_FIELDS
            .iter()
            .copied()
            .filter(|k| self.get(k).is_some())
            .collect();
        let mut rest: Vec<&str> = self
            .attributes()
            .keys()
            .map(String::as_str)
            .filter(|k| {
                !LEADING_FIELDS.iter().any(|f| f == k) && !HIDDEN_FIELDS.iter().any(|f| f == k)
            })
            .collect();
        rest.sort_unstable();
        keys.extend(rest);

        let width = keys.iter().map(|k| k.len()).max().unwrap_or(0) + 2;

        let mut lines = vec![header, divider];
        for key in keys {
            if let Some(value) = self.get(key) {
                lines.push(format!("{:<width$}{}", format!("{key}:"), render(value)));
            }
        }

        if self.is_new() {
            lines.push("(unsaved)".to_string());
        }

        lines.join("\n")
    }
}

impl<R: Resource> Model<R> {
    /// Short identifying label for display.
    fn title(&self) -> Option<String> {
        ["name", "username", "email", "registration_id"]
            .iter()
            .find_map(|k| self.get_str(k).map(str::to_string))
            .or_else(|| self.id().map(|id| format!("#{id}")))
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "-".to_string(),
        other => other.to_string(),
    }
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ApnsDevice, Class};
    use serde_json::json;

    #[test]
    fn test_model_pretty_print_format() {
        let model: Model<Class> = serde_json::from_value(json!({
            "name": "books",
            "description": "Library",
            "links": {"self": "/v1/instances/i/classes/books/"}
        }))
        .unwrap();

        let output = model.pretty_print();
        assert!(output.starts_with("Class books"));
        assert!(output.contains("description:"));
        assert!(!output.contains("links"));
        assert!(!output.contains("(unsaved)"));
    }

    #[test]
    fn test_unsaved_marker() {
        let model = Model::<ApnsDevice>::empty().with("label", "phone");
        let output = model.pretty_print();
        assert!(output.starts_with("Apnsdevice"));
        assert!(output.ends_with("(unsaved)"));
    }
}
