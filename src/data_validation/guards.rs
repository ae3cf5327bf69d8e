//! Shape guards: turn whatever the server sent into something a consumer can
//! iterate without failing.
//!
//! These never fail. They are meant for the consumer boundary, after the typed
//! decoder in `api_client::envelope` has already rejected what it cannot read.

use log::warn;
use serde_json::{Map, Value};

use super::types::{FieldKind, FieldSpec, Paged, DEFAULT_PAGE, DEFAULT_PAGE_SIZE};

/// Coerces `value` into a list.
///
/// - arrays pass through;
/// - `null` becomes `default`;
/// - array-like objects (`{"length": 2, "0": a, "1": b}`) are materialized;
/// - any other value is wrapped as a one-element list.
pub fn ensure_list(value: Value, default: Vec<Value>) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Null => default,
        Value::Object(map) => match materialize_array_like(&map) {
            Some(items) => items,
            None => vec![Value::Object(map)],
        },
        other => vec![other],
    }
}

fn materialize_array_like(map: &Map<String, Value>) -> Option<Vec<Value>> {
    let length = map.get("length")?.as_u64()?;
    let items = (0..length)
        .map(|i| map.get(&i.to_string()).cloned().unwrap_or(Value::Null))
        .collect();
    Some(items)
}

/// Reads a paginated payload of any of the shapes seen in the wild.
///
/// - `{list, total, page, size}`: a non-array `list` falls back to `default`,
///   missing numbers fall back to 0 / 1 / 10;
/// - a bare array: `total` is its length, page 1, size 10;
/// - anything else: `default` with total 0.
pub fn parse_paged_envelope(raw: &Value, default: Vec<Value>) -> Paged<Value> {
    match raw {
        Value::Object(map) if map.contains_key("list") => {
            let items = match map.get("list") {
                Some(Value::Array(list)) => list.clone(),
                Some(Value::Null) | None => default,
                Some(other) => {
                    warn!("Paged `list` is not an array: {}", other);
                    default
                }
            };
            let total = map.get("total").and_then(Value::as_u64).unwrap_or(0);
            let page = positive_u32(map.get("page")).unwrap_or(DEFAULT_PAGE);
            let size = positive_u32(map.get("size")).unwrap_or(DEFAULT_PAGE_SIZE);
            Paged::new(items, total, page, size)
        }
        Value::Array(list) => {
            Paged::new(list.clone(), list.len() as u64, DEFAULT_PAGE, DEFAULT_PAGE_SIZE)
        }
        other => {
            if !other.is_null() {
                warn!("Unrecognized paged payload, using default: {}", other);
            }
            Paged::new(default, 0, DEFAULT_PAGE, DEFAULT_PAGE_SIZE)
        }
    }
}

fn positive_u32(value: Option<&Value>) -> Option<u32> {
    value
        .and_then(Value::as_u64)
        .filter(|n| *n >= 1)
        .and_then(|n| u32::try_from(n).ok())
}

/// Keeps the objects that carry every field in `required_fields`.
///
/// A field set to `null` counts as missing. When nothing survives, `default`
/// is returned instead so the consumer shows fallback rows rather than an
/// empty table.
pub fn filter_valid_records(
    records: &[Value],
    required_fields: &[&str],
    default: Vec<Value>,
) -> Vec<Value> {
    let valid: Vec<Value> = records
        .iter()
        .filter(|record| match record.as_object() {
            Some(map) => required_fields
                .iter()
                .all(|field| map.get(*field).is_some_and(|v| !v.is_null())),
            None => false,
        })
        .cloned()
        .collect();

    if valid.is_empty() {
        if !records.is_empty() {
            warn!(
                "No record out of {} carries {:?}, using default",
                records.len(),
                required_fields
            );
        }
        return default;
    }
    valid
}

/// Reads `key` from `obj`, or `default` when `obj` is not an object or lacks it.
pub fn safe_property(obj: &Value, key: &str, default: Value) -> Value {
    obj.as_object()
        .and_then(|map| map.get(key))
        .cloned()
        .unwrap_or(default)
}

/// Projects `obj` onto `schema`, coercing every field to its declared kind.
///
/// Fields absent from `schema` are dropped; a non-object `obj` yields `{}`.
pub fn validate_object(obj: &Value, schema: &[(&str, FieldSpec)]) -> Map<String, Value> {
    let Some(map) = obj.as_object() else {
        return Map::new();
    };

    schema
        .iter()
        .map(|(key, spec)| {
            let value = map.get(*key).cloned().unwrap_or(Value::Null);
            (key.to_string(), coerce_field(value, spec))
        })
        .collect()
}

fn coerce_field(value: Value, spec: &FieldSpec) -> Value {
    let fallback = |zero: Value| spec.default.clone().unwrap_or(zero);
    match spec.kind {
        FieldKind::Array => {
            let default = match fallback(Value::Array(Vec::new())) {
                Value::Array(items) => items,
                other => vec![other],
            };
            Value::Array(ensure_list(value, default))
        }
        FieldKind::String if value.is_string() => value,
        FieldKind::String => fallback(Value::String(String::new())),
        FieldKind::Number if value.is_number() => value,
        FieldKind::Number => fallback(Value::from(0)),
        FieldKind::Boolean if value.is_boolean() => value,
        FieldKind::Boolean => fallback(Value::Bool(false)),
        FieldKind::Any if value.is_null() => fallback(Value::Null),
        FieldKind::Any => value,
    }
}
