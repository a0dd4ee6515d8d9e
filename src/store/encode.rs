//! Helpers for encoding JSON documents into Firestore REST values.

use serde_json::{Map, Value, json};

use super::types::StoreError;

/// Encode a JSON object as a Firestore `Document` body (`{"fields": {...}}`).
pub fn encode_document(document: &Value) -> Result<Value, StoreError> {
    let Value::Object(fields) = document else {
        return Err(StoreError::NotAnObject);
    };
    Ok(json!({ "fields": encode_fields(fields) }))
}

fn encode_fields(fields: &Map<String, Value>) -> Map<String, Value> {
    fields
        .iter()
        .map(|(key, value)| (key.clone(), encode_value(value)))
        .collect()
}

/// Encode a single JSON value as a Firestore typed `Value`.
///
/// Integers travel as decimal strings, as the REST API requires for `integerValue`.
pub fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(flag) => json!({ "booleanValue": flag }),
        Value::Number(number) => {
            if let Some(integer) = number.as_i64() {
                json!({ "integerValue": integer.to_string() })
            } else if let Some(integer) = number.as_u64() {
                json!({ "integerValue": integer.to_string() })
            } else {
                json!({ "doubleValue": number.as_f64().unwrap_or_default() })
            }
        }
        Value::String(text) => json!({ "stringValue": text }),
        Value::Array(items) => {
            if items.is_empty() {
                json!({ "arrayValue": {} })
            } else {
                json!({ "arrayValue": { "values": items.iter().map(encode_value).collect::<Vec<_>>() } })
            }
        }
        Value::Object(fields) => json!({ "mapValue": { "fields": encode_fields(fields) } }),
    }
}
