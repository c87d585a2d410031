//! Generic request validation pipeline.
//!
//! Every write path declares its fields as a `FieldSpec` table and runs the
//! raw request body through [`validate`]. The gates run in a fixed order and
//! each failure short-circuits the rest: parse + duplicate-key rejection,
//! shape (required/unknown fields), blank values, primitive type, and finally
//! the per-field semantic rules from [`rules`].

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use thiserror::Error;

pub mod rules;

/// Primitive type a field must carry on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Count,
}

/// A cleaned field value after type and semantic checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Count(i64),
}

impl FieldValue {
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Count(_) => None,
        }
    }

    #[must_use]
    pub fn as_count(&self) -> Option<i64> {
        match self {
            Self::Count(count) => Some(*count),
            Self::Text(_) => None,
        }
    }
}

/// A semantic rule: accept, accept with a normalized replacement, or reject
/// with a human-readable reason.
pub type Semantic = fn(&FieldValue) -> Result<Option<FieldValue>, String>;

/// Declarative descriptor for one request field.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub required: bool,
    pub kind: FieldKind,
    pub semantic: Option<Semantic>,
}

impl FieldSpec {
    #[must_use]
    pub const fn required(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            required: true,
            kind,
            semantic: None,
        }
    }

    #[must_use]
    pub const fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            required: false,
            kind,
            semantic: None,
        }
    }

    #[must_use]
    pub const fn check(mut self, semantic: Semantic) -> Self {
        self.semantic = Some(semantic);
        self
    }
}

/// Structured rejection produced by the pipeline.
///
/// The `Display` text is the client-facing `error` message.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationFailure {
    #[error("Request body must be a JSON object")]
    NotAnObject,
    #[error("Duplicate fields in request body: {0}. Each field may appear only once")]
    DuplicateKeys(String),
    #[error("Missing required fields: {0}")]
    MissingFields(String),
    #[error("Unknown fields: {0}. Allowed fields are: {1}")]
    UnknownFields(String, String),
    #[error("{0} cannot be empty or contain only spaces")]
    Blank(String),
    #[error("{0} must be a string")]
    ExpectedText(String),
    #[error("{0} must be an integer, without quotes")]
    ExpectedCount(String),
    #[error("{field}: {reason}")]
    Semantic { field: String, reason: String },
}

impl IntoResponse for ValidationFailure {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.to_string() }));
        (StatusCode::BAD_REQUEST, body).into_response()
    }
}

/// Cleaned field→value mapping for one request, used once and discarded.
#[derive(Debug, Default, PartialEq)]
pub struct Validated(BTreeMap<&'static str, FieldValue>);

impl Validated {
    #[must_use]
    pub fn text(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(FieldValue::as_text)
    }

    #[must_use]
    pub fn count(&self, name: &str) -> Option<i64> {
        self.0.get(name).and_then(FieldValue::as_count)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Raw JSON object as an ordered entry list.
///
/// `serde_json` would silently keep the last value for a repeated key, so the
/// object is collected entry by entry and duplicates stay visible.
struct RawBody(Vec<(String, Value)>);

impl<'de> Deserialize<'de> for RawBody {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct RawBodyVisitor;

        impl<'de> Visitor<'de> for RawBodyVisitor {
            type Value = RawBody;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a JSON object")
            }

            fn visit_map<A>(self, mut map: A) -> Result<RawBody, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::new();
                while let Some((key, value)) = map.next_entry::<String, Value>()? {
                    entries.push((key, value));
                }
                Ok(RawBody(entries))
            }
        }

        deserializer.deserialize_map(RawBodyVisitor)
    }
}

/// Run the full pipeline over a raw request body.
///
/// # Errors
///
/// Returns the first gate failure; no partial result is ever produced.
pub fn validate(body: &str, schema: &[FieldSpec]) -> Result<Validated, ValidationFailure> {
    let entries: RawBody =
        serde_json::from_str(body).map_err(|_| ValidationFailure::NotAnObject)?;

    let mut seen = BTreeSet::new();
    let mut duplicated = BTreeSet::new();
    for (key, _) in &entries.0 {
        if !seen.insert(key.as_str()) {
            duplicated.insert(key.as_str());
        }
    }
    if !duplicated.is_empty() {
        let names = duplicated.into_iter().collect::<Vec<_>>().join(", ");
        return Err(ValidationFailure::DuplicateKeys(names));
    }

    let missing = schema
        .iter()
        .filter(|spec| spec.required && !seen.contains(spec.name))
        .map(|spec| spec.name)
        .collect::<Vec<_>>();
    if !missing.is_empty() {
        return Err(ValidationFailure::MissingFields(missing.join(", ")));
    }

    let declared = schema.iter().map(|spec| spec.name).collect::<BTreeSet<_>>();
    let unknown = entries
        .0
        .iter()
        .map(|(key, _)| key.as_str())
        .filter(|key| !declared.contains(key))
        .collect::<Vec<_>>();
    if !unknown.is_empty() {
        let allowed = declared.into_iter().collect::<Vec<_>>().join(", ");
        return Err(ValidationFailure::UnknownFields(unknown.join(", "), allowed));
    }

    // Blank rejection applies to any supplied string value, optional fields
    // included, and runs before the type gate.
    for (key, value) in &entries.0 {
        if let Value::String(text) = value {
            if text.trim().is_empty() {
                return Err(ValidationFailure::Blank(key.clone()));
            }
        }
    }

    let mut cleaned = BTreeMap::new();
    for spec in schema {
        let Some((_, value)) = entries.0.iter().find(|(key, _)| key == spec.name) else {
            continue;
        };

        let field_value = match spec.kind {
            FieldKind::Text => match value {
                Value::String(text) => FieldValue::Text(text.clone()),
                _ => return Err(ValidationFailure::ExpectedText(spec.name.to_string())),
            },
            // Quoted numbers and floats both fail here; no silent coercion.
            FieldKind::Count => match value.as_i64() {
                Some(count) if value.is_i64() => FieldValue::Count(count),
                _ => return Err(ValidationFailure::ExpectedCount(spec.name.to_string())),
            },
        };

        let field_value = match spec.semantic {
            Some(check) => match check(&field_value) {
                Ok(Some(normalized)) => normalized,
                Ok(None) => field_value,
                Err(reason) => {
                    return Err(ValidationFailure::Semantic {
                        field: spec.name.to_string(),
                        reason,
                    })
                }
            },
            None => field_value,
        };

        cleaned.insert(spec.name, field_value);
    }

    Ok(Validated(cleaned))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: &[FieldSpec] = &[
        FieldSpec::required("username", FieldKind::Text).check(rules::username),
        FieldSpec::required("count", FieldKind::Count).check(rules::item_count),
        FieldSpec::optional("note", FieldKind::Text),
    ];

    #[test]
    fn accepts_a_clean_body() {
        let data = validate(r#"{"username": "Alice", "count": 3}"#, SCHEMA)
            .expect("body should validate");
        assert_eq!(data.text("username"), Some("alice"));
        assert_eq!(data.count("count"), Some(3));
        assert!(!data.contains("note"));
    }

    #[test]
    fn rejects_non_object_bodies() {
        assert_eq!(
            validate("[1, 2]", SCHEMA),
            Err(ValidationFailure::NotAnObject)
        );
        assert_eq!(
            validate("not json", SCHEMA),
            Err(ValidationFailure::NotAnObject)
        );
    }

    #[test]
    fn rejects_duplicate_keys_instead_of_last_value_wins() {
        let result = validate(
            r#"{"username": "alice", "count": 1, "username": "bob"}"#,
            SCHEMA,
        );
        assert_eq!(
            result,
            Err(ValidationFailure::DuplicateKeys("username".to_string()))
        );
    }

    #[test]
    fn rejects_missing_required_fields_by_name() {
        let result = validate(r#"{"username": "alice"}"#, SCHEMA);
        assert_eq!(
            result,
            Err(ValidationFailure::MissingFields("count".to_string()))
        );
    }

    #[test]
    fn rejects_fields_outside_the_declared_set() {
        let result = validate(
            r#"{"username": "alice", "count": 1, "color": "red"}"#,
            SCHEMA,
        );
        assert_eq!(
            result,
            Err(ValidationFailure::UnknownFields(
                "color".to_string(),
                "count, note, username".to_string()
            ))
        );
    }

    #[test]
    fn rejects_blank_values_even_for_optional_fields() {
        let result = validate(r#"{"username": "alice", "count": 1, "note": "  "}"#, SCHEMA);
        assert_eq!(result, Err(ValidationFailure::Blank("note".to_string())));
    }

    #[test]
    fn blank_gate_runs_before_the_type_gate() {
        // A count supplied as an empty string is reported blank, not mistyped.
        let result = validate(r#"{"username": "alice", "count": ""}"#, SCHEMA);
        assert_eq!(result, Err(ValidationFailure::Blank("count".to_string())));
    }

    #[test]
    fn rejects_quoted_numbers_for_count_fields() {
        let result = validate(r#"{"username": "alice", "count": "3"}"#, SCHEMA);
        assert_eq!(
            result,
            Err(ValidationFailure::ExpectedCount("count".to_string()))
        );
    }

    #[test]
    fn rejects_floats_for_count_fields() {
        let result = validate(r#"{"username": "alice", "count": 1.5}"#, SCHEMA);
        assert_eq!(
            result,
            Err(ValidationFailure::ExpectedCount("count".to_string()))
        );
    }

    #[test]
    fn rejects_non_string_text_fields() {
        let result = validate(r#"{"username": 42, "count": 1}"#, SCHEMA);
        assert_eq!(
            result,
            Err(ValidationFailure::ExpectedText("username".to_string()))
        );
    }

    #[test]
    fn semantic_failures_name_the_offending_field() {
        let result = validate(r#"{"username": "al!ce", "count": 1}"#, SCHEMA);
        match result {
            Err(ValidationFailure::Semantic { field, .. }) => assert_eq!(field, "username"),
            other => panic!("expected semantic failure, got {other:?}"),
        }
    }

    #[test]
    fn semantic_rules_skip_absent_optional_fields() {
        const PARTIAL: &[FieldSpec] = &[
            FieldSpec::optional("count", FieldKind::Count).check(rules::item_count),
            FieldSpec::optional("used_by_date", FieldKind::Text).check(rules::expiry_date),
        ];
        let data = validate(r#"{"count": 2}"#, PARTIAL).expect("subset should validate");
        assert_eq!(data.count("count"), Some(2));
        assert!(!data.contains("used_by_date"));
    }

    #[test]
    fn failure_messages_are_client_facing() {
        assert_eq!(
            ValidationFailure::Blank("email".to_string()).to_string(),
            "email cannot be empty or contain only spaces"
        );
        assert_eq!(
            ValidationFailure::Semantic {
                field: "password".to_string(),
                reason: "too weak".to_string()
            }
            .to_string(),
            "password: too weak"
        );
    }
}
