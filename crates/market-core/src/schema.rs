//! Path-based field extraction over arbitrary JSON.
//!
//! Upstream bodies are walked with dot-separated paths (`source.name`). A
//! missing or falsy segment anywhere along the path resolves to nothing
//! rather than an error, so a sparse upstream object degrades to `null`
//! fields instead of a failed request.

use serde_json::{Map, Value};

use crate::NormalizeError;

/// One `source path -> output key` rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMapping<'a> {
    pub source_path: &'a str,
    pub target_key: &'a str,
}

impl<'a> FieldMapping<'a> {
    pub const fn new(source_path: &'a str, target_key: &'a str) -> Self {
        Self {
            source_path,
            target_key,
        }
    }
}

/// JSON truthiness: `null`, `false`, zero and `""` are falsy, everything
/// else (including empty arrays and objects) is truthy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Walks `path` segment by segment, stopping at the first missing or falsy
/// value.
pub fn resolve_path<'v>(source: &'v Value, path: &str) -> Option<&'v Value> {
    let mut current = source;
    for segment in path.split('.') {
        match current.get(segment) {
            Some(next) if is_truthy(next) => current = next,
            _ => return None,
        }
    }
    Some(current)
}

/// Requires a non-array JSON object.
pub fn expect_object(source: &Value) -> Result<&Map<String, Value>, NormalizeError> {
    source.as_object().ok_or(NormalizeError::ExpectedObject)
}

/// Requires a non-empty JSON array.
pub fn expect_non_empty_array(source: &Value) -> Result<&[Value], NormalizeError> {
    match source.as_array() {
        Some(items) if !items.is_empty() => Ok(items),
        _ => Err(NormalizeError::ExpectedNonEmptyArray),
    }
}

/// Applies `schema` to `source`, producing one output key per rule plus
/// `success: true`. Unresolvable paths become `null`.
pub fn apply_schema(
    source: &Value,
    schema: &[FieldMapping<'_>],
) -> Result<Map<String, Value>, NormalizeError> {
    expect_object(source)?;

    let mut record = Map::new();
    record.insert("success".to_string(), Value::Bool(true));
    for mapping in schema {
        let resolved = resolve_path(source, mapping.source_path)
            .cloned()
            .unwrap_or(Value::Null);
        record.insert(mapping.target_key.to_string(), resolved);
    }
    Ok(record)
}
