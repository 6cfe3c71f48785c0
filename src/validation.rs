//! Constraint-based field validation.
//!
//! Each model declares a [`Constraints`] set mapping field names to the
//! rules they must satisfy. [`validate`] evaluates every rule against a bag
//! of attributes and collects the failing messages per field.

use std::collections::BTreeMap;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$")
        .expect("email regex is valid")
});

/// JSON type expected by [`Constraint::Type`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Integer,
    Number,
    Boolean,
    Object,
    Array,
}

impl FieldType {
    fn matches(self, value: &Value) -> bool {
        match self {
            FieldType::String => value.is_string(),
            FieldType::Integer => value.is_i64() || value.is_u64(),
            FieldType::Number => value.is_number(),
            FieldType::Boolean => value.is_boolean(),
            FieldType::Object => value.is_object(),
            FieldType::Array => value.is_array(),
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Integer => "integer",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Object => "object",
            FieldType::Array => "array",
        }
    }
}

/// A single rule applied to one field.
///
/// Apart from [`Constraint::Presence`], rules are skipped when the field is
/// absent or null.
#[derive(Debug, Clone)]
pub enum Constraint {
    /// The field must be present and not blank.
    Presence,
    /// The field must have the given JSON type.
    Type(FieldType),
    /// Character count (strings) or element count (arrays) bounds.
    Length {
        min: Option<usize>,
        max: Option<usize>,
    },
    /// The field must be one of the listed strings.
    Inclusion(Vec<String>),
    /// The field must look like an email address.
    Email,
    /// The field must match the pattern.
    Format(Regex),
    /// The field must be numeric, optionally bounded.
    Numericality {
        only_integer: bool,
        greater_than: Option<f64>,
        less_than: Option<f64>,
    },
}

impl Constraint {
    /// Shorthand for an inclusion rule over string literals.
    pub fn inclusion<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Constraint::Inclusion(values.into_iter().map(Into::into).collect())
    }

    /// Evaluate the rule, returning the failure message if any.
    fn check(&self, value: Option<&Value>) -> Option<String> {
        let value = match (self, value) {
            (Constraint::Presence, v) => {
                return if v.map_or(true, is_blank) {
                    Some("can't be blank".to_string())
                } else {
                    None
                };
            }
            (_, None | Some(Value::Null)) => return None,
            (_, Some(v)) => v,
        };

        match self {
            Constraint::Presence => None,
            Constraint::Type(ty) => (!ty.matches(value))
                .then(|| format!("must be of type {}", ty.as_str())),
            Constraint::Length { min, max } => {
                let len = match value {
                    Value::String(s) => s.chars().count(),
                    Value::Array(a) => a.len(),
                    _ => return Some("has an incorrect length".to_string()),
                };
                if let Some(min) = min.filter(|m| len < *m) {
                    return Some(format!("is too short (minimum is {min} characters)"));
                }
                if let Some(max) = max.filter(|m| len > *m) {
                    return Some(format!("is too long (maximum is {max} characters)"));
                }
                None
            }
            Constraint::Inclusion(allowed) => {
                let ok = value
                    .as_str()
                    .map(|s| allowed.iter().any(|a| a == s))
                    .unwrap_or(false);
                (!ok).then(|| format!("{} is not included in the list", render(value)))
            }
            Constraint::Email => {
                let ok = value.as_str().is_some_and(|s| EMAIL_REGEX.is_match(s));
                (!ok).then(|| "is not a valid email".to_string())
            }
            Constraint::Format(pattern) => {
                let ok = value.as_str().is_some_and(|s| pattern.is_match(s));
                (!ok).then(|| "is invalid".to_string())
            }
            Constraint::Numericality {
                only_integer,
                greater_than,
                less_than,
            } => {
                let Some(n) = value.as_f64() else {
                    return Some("is not a number".to_string());
                };
                if *only_integer && n.fract() != 0.0 {
                    return Some("must be an integer".to_string());
                }
                if let Some(gt) = greater_than.filter(|gt| n <= *gt) {
                    return Some(format!("must be greater than {gt}"));
                }
                if let Some(lt) = less_than.filter(|lt| n >= *lt) {
                    return Some(format!("must be less than {lt}"));
                }
                None
            }
        }
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        _ => false,
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Per-field constraint declarations for one model.
///
/// An empty set disables validation entirely.
#[derive(Debug, Clone, Default)]
pub struct Constraints {
    fields: Vec<(String, Vec<Constraint>)>,
}

impl Constraints {
    /// Create an empty constraint set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare rules for a field, appending to any already declared.
    #[must_use]
    pub fn field<I>(mut self, name: &str, rules: I) -> Self
    where
        I: IntoIterator<Item = Constraint>,
    {
        match self.fields.iter_mut().find(|(field, _)| field == name) {
            Some((_, existing)) => existing.extend(rules),
            None => self.fields.push((name.to_string(), rules.into_iter().collect())),
        }
        self
    }

    /// Returns true if no field declares any rule.
    pub fn is_empty(&self) -> bool {
        self.fields.iter().all(|(_, rules)| rules.is_empty())
    }

    /// Iterate over `(field, rules)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Constraint])> {
        self.fields
            .iter()
            .map(|(field, rules)| (field.as_str(), rules.as_slice()))
    }
}

/// Failing messages keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    /// Messages recorded for a field.
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// Returns true if the field has at least one message.
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Field names with errors, sorted.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    fn push(&mut self, field: &str, message: String) {
        self.0.entry(field.to_string()).or_default().push(message);
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{field} {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

/// Validate attributes against a constraint set.
///
/// Fields without declared constraints are never reported.
pub fn validate(
    attributes: &Map<String, Value>,
    constraints: &Constraints,
) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();

    for (field, rules) in constraints.iter() {
        let value = attributes.get(field);
        for rule in rules {
            if let Some(message) = rule.check(value) {
                errors.push(field, message);
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
