//! Conversions between native [`Item`]s and the wire format of the active client generation.
pub mod attribute;
pub mod document;

use crate::{client::Generation, errors::FormatError, Item, StoreClient};
use serde::Deserialize;
use serde_json::Value;

/// Options handed to the newer generation's marshaller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarshallOptions {
    /// Drop `Null` attributes from maps instead of writing `{"NULL": true}`.
    #[serde(default)]
    pub remove_null_values: bool,
    /// Write empty strings, binaries and sets as `{"NULL": true}`.
    #[serde(default)]
    pub convert_empty_values: bool,
}

/// One item or a batch of them.
#[derive(Debug, Clone, Copy)]
pub enum Marshall<'i> {
    One(&'i Item),
    Many(&'i [Item]),
}

pub fn marshall(
    client: &dyn StoreClient,
    items: Marshall<'_>,
    options: &MarshallOptions,
) -> Result<Value, FormatError> {
    match items {
        Marshall::One(item) => client.marshall(item, options),
        Marshall::Many(items) => items
            .iter()
            .map(|item| client.marshall(item, options))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
    }
}

pub fn unmarshall(client: &dyn StoreClient, wire: &Value) -> Result<Item, FormatError> {
    client.unmarshall(wire)
}

/// Unmarshall every item of a wire sequence.
pub fn unmarshall_all(client: &dyn StoreClient, wire: &Value) -> Result<Vec<Item>, FormatError> {
    match wire {
        Value::Array(items) => items.iter().map(|item| client.unmarshall(item)).collect(),
        Value::Null => Ok(vec![]),
        other => Err(FormatError::InvalidWire(format!(
            "expected a sequence of items, got {other}"
        ))),
    }
}

pub(crate) fn marshall_for(
    generation: Generation,
    item: &Item,
    options: &MarshallOptions,
) -> Result<Value, FormatError> {
    match generation {
        Generation::Modern => Ok(attribute::to_attribute_map(item, options)),
        Generation::Legacy => document::to_document(item),
    }
}

pub(crate) fn unmarshall_for(generation: Generation, wire: &Value) -> Result<Item, FormatError> {
    match generation {
        Generation::Modern => attribute::from_attribute_map(wire),
        Generation::Legacy => document::from_document(wire),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TableAttribute;

    fn sample() -> Item {
        [
            ("pk".to_string(), TableAttribute::from("User#1")),
            ("age".to_string(), TableAttribute::from(42)),
            ("active".to_string(), TableAttribute::from(true)),
            ("avatar".to_string(), TableAttribute::Bytes(vec![0, 1, 2, 255])),
            ("tags".to_string(), TableAttribute::string_set(["a", "b"])),
            ("scores".to_string(), TableAttribute::number_set([1, 5, 10])),
            (
                "keys".to_string(),
                TableAttribute::binary_set([vec![1u8, 2], vec![3u8]]),
            ),
            ("none".to_string(), TableAttribute::StringSet(Default::default())),
            (
                "profile".to_string(),
                TableAttribute::from(
                    [("city", TableAttribute::from("Paris"))]
                        .into_iter()
                        .collect::<std::collections::HashMap<_, _>>(),
                ),
            ),
            (
                "history".to_string(),
                TableAttribute::List(vec![
                    TableAttribute::from("x"),
                    TableAttribute::from(1.5),
                    TableAttribute::Null,
                ]),
            ),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_round_trip_both_generations() {
        let item = sample();

        for generation in [Generation::Modern, Generation::Legacy] {
            let wire = marshall_for(generation, &item, &MarshallOptions::default()).unwrap();
            let back = unmarshall_for(generation, &wire).unwrap();

            assert_eq!(back, item, "round trip through {generation:?}");
        }
    }

    #[test]
    fn test_generations_are_distinct_on_the_wire() {
        let item = sample();
        let modern = marshall_for(Generation::Modern, &item, &Default::default()).unwrap();
        let legacy = marshall_for(Generation::Legacy, &item, &Default::default()).unwrap();

        assert_eq!(modern["pk"], serde_json::json!({"S": "User#1"}));
        assert_eq!(legacy["pk"], serde_json::json!("User#1"));
        assert_eq!(legacy["tags"]["wrapperName"], "Set");
    }
}
