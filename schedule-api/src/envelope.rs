//! Response envelopes: `{ "<resource>": ... }` on success,
//! `{ "message" }` or `{ "error" }` on failure.

use schedule_core::Resource;
use serde_json::Value;

use crate::ApiError;

/// Records of a list response. A missing or null key is an empty list.
pub fn decode_collection<R: Resource>(body: Value) -> Result<Vec<R>, ApiError> {
    match take_key(body, R::COLLECTION_KEY) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(items) => Ok(serde_json::from_value(items)?),
    }
}

/// Record of a create/update response. Bodies without the item key are
/// read as the bare record.
pub fn decode_item<R: Resource>(body: Value) -> Result<R, ApiError> {
    let has_key = body.get(R::ITEM_KEY).is_some_and(|item| !item.is_null());
    let item = if has_key {
        take_key(body, R::ITEM_KEY).unwrap_or(Value::Null)
    } else {
        body
    };
    Ok(serde_json::from_value(item)?)
}

/// Message carried by an error body, if any.
pub fn error_message(body: &Value) -> Option<String> {
    if let Some(message) = body.get("message").and_then(Value::as_str) {
        return Some(message.to_string());
    }

    match body.get("error")? {
        Value::String(message) => Some(message.clone()),
        Value::Object(inner) => inner
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}

fn take_key(body: Value, key: &str) -> Option<Value> {
    match body {
        Value::Object(mut map) => map.remove(key),
        _ => None,
    }
}
