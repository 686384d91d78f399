//! Document format used by the legacy client generation.
//!
//! Scalars, lists and maps are plain JSON. Sets travel in the client's set wrapper:
//!
//! ```json
//! {"wrapperName": "Set", "type": "String", "values": ["a", "b"]}
//! ```
//!
//! Binary set members are base64 on the wire and widened back into byte vectors on the way
//! in, so both generations hand out identical [`TableAttribute::BinarySet`]s. Binary scalars
//! use `{"wrapperName": "Binary", "value": "<base64>"}`.
use crate::{errors::FormatError, Item, TableAttribute};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde_json::{json, Map, Number, Value};
use std::collections::BTreeSet;

const WRAPPER_NAME: &str = "wrapperName";
const SET_WRAPPER: &str = "Set";
const BINARY_WRAPPER: &str = "Binary";

pub fn to_document(item: &Item) -> Result<Value, FormatError> {
    item.iter()
        .map(|(k, v)| Ok((k.clone(), to_document_value(v)?)))
        .collect::<Result<Map<_, _>, _>>()
        .map(Value::Object)
}

pub fn to_document_value(value: &TableAttribute) -> Result<Value, FormatError> {
    let document = match value {
        TableAttribute::String(s) => Value::String(s.clone()),
        TableAttribute::Number(n) => Value::Number(number(n)?),
        TableAttribute::Bool(b) => Value::Bool(*b),
        TableAttribute::Null => Value::Null,
        TableAttribute::Bytes(b) => json!({
            WRAPPER_NAME: BINARY_WRAPPER,
            "value": STANDARD.encode(b),
        }),
        TableAttribute::List(l) => Value::Array(
            l.iter()
                .map(to_document_value)
                .collect::<Result<_, _>>()?,
        ),
        TableAttribute::Map(m) => Value::Object(
            m.iter()
                .map(|(k, v)| Ok((k.clone(), to_document_value(v)?)))
                .collect::<Result<_, FormatError>>()?,
        ),
        set => create_set(set)?,
    };

    Ok(document)
}

/// Wrap a native set into the legacy client's set representation.
pub fn create_set(set: &TableAttribute) -> Result<Value, FormatError> {
    let (set_type, values) = match set {
        TableAttribute::StringSet(s) => ("String", s.iter().cloned().map(Value::String).collect()),
        TableAttribute::NumberSet(n) => (
            "Number",
            n.iter()
                .map(|n| number(n).map(Value::Number))
                .collect::<Result<Vec<_>, _>>()?,
        ),
        TableAttribute::BinarySet(b) => (
            "Binary",
            b.iter().map(|b| Value::String(STANDARD.encode(b))).collect(),
        ),
        other => {
            return Err(FormatError::InvalidWire(format!(
                "cannot wrap {other:?} as a set"
            )))
        }
    };

    Ok(json!({
        WRAPPER_NAME: SET_WRAPPER,
        "type": set_type,
        "values": Value::Array(values),
    }))
}

pub fn from_document(wire: &Value) -> Result<Item, FormatError> {
    let Value::Object(map) = wire else {
        return Err(FormatError::NotAnItem(wire.to_string()));
    };

    map.iter()
        .map(|(k, v)| Ok((k.clone(), from_document_value(v)?)))
        .collect()
}

pub fn from_document_value(wire: &Value) -> Result<TableAttribute, FormatError> {
    let attribute = match wire {
        Value::String(s) => TableAttribute::String(s.clone()),
        Value::Number(n) => TableAttribute::Number(n.to_string()),
        Value::Bool(b) => TableAttribute::Bool(*b),
        Value::Null => TableAttribute::Null,
        Value::Array(l) => TableAttribute::List(
            l.iter()
                .map(from_document_value)
                .collect::<Result<_, _>>()?,
        ),
        Value::Object(map) => match map.get(WRAPPER_NAME).and_then(Value::as_str) {
            Some(SET_WRAPPER) => from_set_wrapper(map)?,
            Some(BINARY_WRAPPER) => {
                let value = map.get("value").and_then(Value::as_str).ok_or_else(|| {
                    FormatError::InvalidWire(format!("binary wrapper without value: {wire}"))
                })?;
                TableAttribute::Bytes(decode(value)?)
            }
            _ => TableAttribute::Map(from_document(wire)?),
        },
    };

    Ok(attribute)
}

fn from_set_wrapper(wrapper: &Map<String, Value>) -> Result<TableAttribute, FormatError> {
    let invalid = || FormatError::InvalidWire(format!("malformed set wrapper: {wrapper:?}"));

    let values = wrapper
        .get("values")
        .and_then(Value::as_array)
        .ok_or_else(invalid)?;

    let set_type = match wrapper.get("type").and_then(Value::as_str) {
        Some(t) => t,
        // Older writers left the type off; infer it from the members
        None => match values.first() {
            Some(Value::Number(_)) => "Number",
            _ => "String",
        },
    };

    let attribute = match set_type {
        "String" => TableAttribute::StringSet(
            values
                .iter()
                .map(|v| v.as_str().map(str::to_string))
                .collect::<Option<_>>()
                .ok_or_else(invalid)?,
        ),
        "Number" => TableAttribute::NumberSet(
            values
                .iter()
                .map(|v| match v {
                    Value::Number(n) => Some(n.to_string()),
                    Value::String(s) => Some(s.clone()),
                    _ => None,
                })
                .collect::<Option<_>>()
                .ok_or_else(invalid)?,
        ),
        "Binary" => TableAttribute::BinarySet(
            values
                .iter()
                .map(|v| v.as_str().ok_or_else(invalid).and_then(decode))
                .collect::<Result<BTreeSet<_>, _>>()?,
        ),
        _ => return Err(invalid()),
    };

    Ok(attribute)
}

fn number(n: &str) -> Result<Number, FormatError> {
    n.parse()
        .map_err(|_| FormatError::InvalidWire(format!("not a document number: {n}")))
}

fn decode(b64: &str) -> Result<Vec<u8>, FormatError> {
    STANDARD
        .decode(b64)
        .map_err(|e| FormatError::InvalidWire(format!("invalid base64 binary: {e}")))
}
