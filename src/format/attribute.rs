//! Attribute-value wire format used by the current client generation.
//!
//! ```json
//! {"pk": {"S": "User#1"}, "tags": {"SS": ["a", "b"]}, "avatar": {"B": "AAEC"}}
//! ```
use super::MarshallOptions;
use crate::{errors::FormatError, Item, TableAttribute};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde_json::{json, Map, Value};
use std::collections::BTreeSet;

pub fn to_attribute_map(item: &Item, options: &MarshallOptions) -> Value {
    Value::Object(to_map(item.iter(), options))
}

fn to_map<'a>(
    entries: impl Iterator<Item = (&'a String, &'a TableAttribute)>,
    options: &MarshallOptions,
) -> Map<String, Value> {
    entries
        .filter_map(|(k, v)| to_attribute_value(v, options).map(|v| (k.clone(), v)))
        .collect()
}

/// Returns `None` when `options` say the value should be left out of its map.
pub fn to_attribute_value(value: &TableAttribute, options: &MarshallOptions) -> Option<Value> {
    if options.convert_empty_values && is_empty(value) {
        return Some(json!({ "NULL": true }));
    }

    let wire = match value {
        TableAttribute::String(s) => json!({ "S": s }),
        TableAttribute::Number(n) => json!({ "N": n }),
        TableAttribute::Bool(b) => json!({ "BOOL": b }),
        TableAttribute::Bytes(b) => json!({ "B": STANDARD.encode(b) }),
        TableAttribute::StringSet(s) => json!({ "SS": s }),
        TableAttribute::NumberSet(n) => json!({ "NS": n }),
        TableAttribute::BinarySet(b) => {
            json!({ "BS": b.iter().map(|b| STANDARD.encode(b)).collect::<Vec<_>>() })
        }
        // NULL entries inside lists are kept so positions do not shift
        TableAttribute::List(l) => json!({
            "L": l
                .iter()
                .map(|v| to_attribute_value(v, options).unwrap_or(json!({ "NULL": true })))
                .collect::<Vec<_>>()
        }),
        TableAttribute::Map(m) => json!({ "M": to_map(m.iter(), options) }),
        TableAttribute::Null if options.remove_null_values => return None,
        TableAttribute::Null => json!({ "NULL": true }),
    };

    Some(wire)
}

fn is_empty(value: &TableAttribute) -> bool {
    match value {
        TableAttribute::String(s) => s.is_empty(),
        TableAttribute::Bytes(b) => b.is_empty(),
        TableAttribute::StringSet(s) | TableAttribute::NumberSet(s) => s.is_empty(),
        TableAttribute::BinarySet(b) => b.is_empty(),
        _ => false,
    }
}

pub fn from_attribute_map(wire: &Value) -> Result<Item, FormatError> {
    let Value::Object(map) = wire else {
        return Err(FormatError::NotAnItem(wire.to_string()));
    };

    map.iter()
        .map(|(k, v)| Ok((k.clone(), from_attribute_value(v)?)))
        .collect()
}

pub fn from_attribute_value(wire: &Value) -> Result<TableAttribute, FormatError> {
    let invalid = || FormatError::InvalidWire(wire.to_string());

    let (tag, value) = match wire {
        Value::Object(map) if map.len() == 1 => map.iter().next().ok_or_else(invalid)?,
        _ => return Err(invalid()),
    };

    let attribute = match (tag.as_str(), value) {
        ("S", Value::String(s)) => TableAttribute::String(s.clone()),
        ("N", Value::String(n)) => TableAttribute::Number(n.clone()),
        ("BOOL", Value::Bool(b)) => TableAttribute::Bool(*b),
        ("B", Value::String(b)) => TableAttribute::Bytes(decode(b)?),
        ("NULL", _) => TableAttribute::Null,
        ("SS", Value::Array(s)) => TableAttribute::StringSet(strings(s).ok_or_else(invalid)?),
        ("NS", Value::Array(n)) => TableAttribute::NumberSet(strings(n).ok_or_else(invalid)?),
        ("BS", Value::Array(b)) => TableAttribute::BinarySet(
            strings(b)
                .ok_or_else(invalid)?
                .iter()
                .map(|b| decode(b))
                .collect::<Result<_, _>>()?,
        ),
        ("L", Value::Array(l)) => TableAttribute::List(
            l.iter()
                .map(from_attribute_value)
                .collect::<Result<_, _>>()?,
        ),
        ("M", Value::Object(_)) => TableAttribute::Map(from_attribute_map(value)?),
        _ => return Err(invalid()),
    };

    Ok(attribute)
}

fn strings(values: &[Value]) -> Option<BTreeSet<String>> {
    values
        .iter()
        .map(|v| v.as_str().map(str::to_string))
        .collect()
}

fn decode(b64: &str) -> Result<Vec<u8>, FormatError> {
    STANDARD
        .decode(b64)
        .map_err(|e| FormatError::InvalidWire(format!("invalid base64 binary: {e}")))
}
