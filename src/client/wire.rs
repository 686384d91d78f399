//! Conversions between attribute-value JSON commands and `aws-sdk-dynamodb` request and
//! response types.
use crate::{
    errors::StoreError,
    format::{attribute, MarshallOptions},
    Item,
};
use aws_sdk_dynamodb::types::{AttributeValue, ConsumedCapacity, ItemCollectionMetrics};
use serde_json::{json, Map, Value};
use std::collections::HashMap;

pub type AwsItem = HashMap<String, AttributeValue>;

// Tags are read and written by `format::attribute`; this module only maps the
// native values onto SDK types.

pub fn to_item(value: &Value) -> Result<AwsItem, String> {
    let item = attribute::from_attribute_map(value).map_err(|e| e.to_string())?;

    Ok(item.into_iter().map(|(k, v)| (k, v.into())).collect())
}

pub fn from_item(item: &AwsItem) -> Value {
    let item: Item = item
        .iter()
        .map(|(k, v)| (k.clone(), v.clone().into()))
        .collect();

    attribute::to_attribute_map(&item, &MarshallOptions::default())
}

pub fn from_items<'a>(items: impl IntoIterator<Item = &'a AwsItem>) -> Value {
    Value::Array(items.into_iter().map(from_item).collect())
}

pub fn from_consumed_capacity(capacity: &ConsumedCapacity) -> Value {
    let mut out = Map::new();

    if let Some(name) = &capacity.table_name {
        out.insert("TableName".into(), json!(name));
    }
    if let Some(units) = capacity.capacity_units {
        out.insert("CapacityUnits".into(), json!(units));
    }
    if let Some(units) = capacity.read_capacity_units {
        out.insert("ReadCapacityUnits".into(), json!(units));
    }
    if let Some(units) = capacity.write_capacity_units {
        out.insert("WriteCapacityUnits".into(), json!(units));
    }

    Value::Object(out)
}

pub fn from_item_collection_metrics(metrics: &ItemCollectionMetrics) -> Value {
    json!({
        "ItemCollectionKey": metrics.item_collection_key.as_ref().map(from_item),
        "SizeEstimateRangeGB": metrics.size_estimate_range_gb,
    })
}

/// Typed accessors over a [`Command`](super::Command) that report malformed fields as
/// validation failures of `operation`.
pub struct CommandReader<'c> {
    command: &'c Map<String, Value>,
    operation: &'static str,
}

impl<'c> CommandReader<'c> {
    pub fn new(command: &'c Map<String, Value>, operation: &'static str) -> Self {
        Self { command, operation }
    }

    /// Read a nested object as a command of its own.
    pub fn nested(value: &'c Value, operation: &'static str) -> Result<Self, StoreError> {
        value
            .as_object()
            .map(|command| Self::new(command, operation))
            .ok_or_else(|| StoreError::validation(operation, format!("expected an object: {value}")))
    }

    fn invalid(&self, key: &str, expected: &str) -> StoreError {
        StoreError::validation(self.operation, format!("{key} must be {expected}"))
    }

    pub fn get(&self, key: &str) -> Option<&'c Value> {
        self.command.get(key).filter(|v| !v.is_null())
    }

    pub fn string(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.get(key)
            .map(|v| {
                v.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| self.invalid(key, "a string"))
            })
            .transpose()
    }

    pub fn bool(&self, key: &str) -> Result<Option<bool>, StoreError> {
        self.get(key)
            .map(|v| v.as_bool().ok_or_else(|| self.invalid(key, "a boolean")))
            .transpose()
    }

    pub fn int(&self, key: &str) -> Result<Option<i32>, StoreError> {
        self.get(key)
            .map(|v| {
                v.as_i64()
                    .and_then(|i| i32::try_from(i).ok())
                    .ok_or_else(|| self.invalid(key, "an integer"))
            })
            .transpose()
    }

    pub fn item(&self, key: &str) -> Result<Option<AwsItem>, StoreError> {
        self.get(key)
            .map(|v| to_item(v).map_err(|e| StoreError::validation(self.operation, e)))
            .transpose()
    }

    pub fn required_item(&self, key: &str) -> Result<AwsItem, StoreError> {
        self.item(key)?
            .ok_or_else(|| StoreError::validation(self.operation, format!("missing {key}")))
    }

    pub fn items(&self, key: &str) -> Result<Vec<AwsItem>, StoreError> {
        match self.get(key) {
            None => Ok(vec![]),
            Some(Value::Array(items)) => items
                .iter()
                .map(|v| to_item(v).map_err(|e| StoreError::validation(self.operation, e)))
                .collect(),
            Some(_) => Err(self.invalid(key, "a list of items")),
        }
    }

    pub fn names(&self, key: &str) -> Result<Option<HashMap<String, String>>, StoreError> {
        self.get(key)
            .map(|v| {
                v.as_object()
                    .and_then(|names| {
                        names
                            .iter()
                            .map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())))
                            .collect()
                    })
                    .ok_or_else(|| self.invalid(key, "a map of names"))
            })
            .transpose()
    }

    pub fn array(&self, key: &str) -> Result<&'c [Value], StoreError> {
        match self.get(key) {
            None => Ok(&[]),
            Some(Value::Array(values)) => Ok(values),
            Some(_) => Err(self.invalid(key, "a list")),
        }
    }

    pub fn object(&self, key: &str) -> Result<Option<&'c Map<String, Value>>, StoreError> {
        self.get(key)
            .map(|v| v.as_object().ok_or_else(|| self.invalid(key, "an object")))
            .transpose()
    }

    /// An SDK enum such as `ReturnValue` or `Select`, parsed from its wire name.
    pub fn enumeration<T: for<'a> From<&'a str>>(&self, key: &str) -> Result<Option<T>, StoreError> {
        Ok(self.string(key)?.as_deref().map(T::from))
    }
}
