//! Named extractors for the server's duck-typed error payloads.
//!
//! Different endpoints ship the same information under different keys
//! (`mensaje` vs `message`, `errores` vs `errors`, details nested or at the
//! top level). Each extractor tries a fixed list of shapes in order and
//! returns the first match, so the ambiguity stays in one place.

use super::NON_FIELD_ERRORS_KEY;
use serde_json::Value;
use std::collections::BTreeMap;

const MESSAGE_KEYS: [&str; 4] = ["mensaje", "message", "detail", "error"];
const FIELD_ERROR_KEYS: [&str; 2] = ["errores", "errors"];
const DETAIL_KEYS: [&str; 2] = ["detalles", "details"];

/// Detail keys the server sometimes emits at the payload top level instead
/// of inside the details object.
const HOISTED_DETAIL_KEYS: [&str; 8] = [
    "bloqueado",
    "locked",
    "intentos_restantes",
    "retry_after",
    "tipo",
    "mensaje_advertencia",
    "bloqueado_hasta",
    "locked_until",
];

pub(crate) const LOCKED_FLAG_KEYS: [&str; 2] = ["bloqueado", "locked"];
pub(crate) const LOCKED_UNTIL_KEYS: [&str; 2] = ["bloqueado_hasta", "locked_until"];

/// Human-readable summary, falling back to the first global field error.
pub(crate) fn message(payload: &Value) -> Option<String> {
    for key in MESSAGE_KEYS {
        if let Some(text) = payload.get(key).and_then(Value::as_str) {
            if !text.is_empty() {
                return Some(text.to_string());
            }
        }
    }

    field_errors(payload)
        .as_ref()
        .and_then(|fields| fields.get(NON_FIELD_ERRORS_KEY))
        .and_then(first_message)
}

/// The per-field validation error map, if the payload carries one.
pub(crate) fn field_errors(payload: &Value) -> Option<BTreeMap<String, Value>> {
    for key in FIELD_ERROR_KEYS {
        if let Some(map) = payload.get(key).and_then(Value::as_object) {
            return Some(
                map.iter()
                    .map(|(field, value)| (field.clone(), value.clone()))
                    .collect(),
            );
        }
    }
    None
}

/// The auxiliary details map, merging top-level well-known keys into it.
pub(crate) fn details(payload: &Value) -> BTreeMap<String, Value> {
    let mut details: BTreeMap<String, Value> = DETAIL_KEYS
        .iter()
        .find_map(|key| payload.get(*key).and_then(Value::as_object))
        .map(|map| {
            map.iter()
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect()
        })
        .unwrap_or_default();

    for key in HOISTED_DETAIL_KEYS {
        if !details.contains_key(key) {
            if let Some(value) = payload.get(key) {
                details.insert(key.to_string(), value.clone());
            }
        }
    }

    details
}

/// First message out of a field-error value: the string itself, or the head
/// of a list of strings. Bare flags and other shapes carry no message.
pub(crate) fn first_message(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Array(items) => items.iter().find_map(|item| match item {
            Value::String(text) => Some(text.clone()),
            _ => None,
        }),
        _ => None,
    }
}

/// Truthiness across the flag shapes the server has shipped.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(flag) => *flag,
        Value::Number(n) => n.as_u64() == Some(1),
        Value::String(text) => text == "true" || text == "1",
        _ => false,
    }
}

/// Seconds from a numeric or stringified duration value.
pub(crate) fn as_seconds(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(text) => text.parse().ok(),
        _ => None,
    }
}
