use aws_sdk_dynamodb::{primitives::Blob, types::AttributeValue};
use std::{
    collections::{BTreeMap, BTreeSet, HashMap, HashSet},
    str::FromStr,
};
use thiserror::Error;

/// An item as the application sees it: attribute name to native value.
pub type Item = HashMap<String, TableAttribute>;

#[derive(Debug, Error)]
pub enum ReadConversionError {
    #[error("Missing attribute: {0}")]
    NoSuchAttribute(String),
    #[error("Failed to convert attribute to {0}")]
    ConversionFailed(String),
}

/// Trait for converting `TableAttribute` to `Self`
pub trait TryFromTableAttr: Sized {
    /// Try to convert `value` to `Self`
    fn try_from_table_attr(value: TableAttribute) -> Result<Self, ReadConversionError>;
}

/// Native, generation-independent attribute value.
///
/// Sets are stored in ordered collections so equality is set equality; the store itself
/// never guarantees member order.
#[derive(Clone, PartialEq, Debug)]
pub enum TableAttribute {
    String(String),
    Number(String),
    Bool(bool),
    Bytes(Vec<u8>),

    StringSet(BTreeSet<String>),
    NumberSet(BTreeSet<String>),
    BinarySet(BTreeSet<Vec<u8>>),
    Map(HashMap<String, TableAttribute>),
    List(Vec<TableAttribute>),

    Null,
}

impl TableAttribute {
    pub fn is_set(&self) -> bool {
        matches!(
            self,
            Self::StringSet(_) | Self::NumberSet(_) | Self::BinarySet(_)
        )
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&HashMap<String, TableAttribute>> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn number(value: impl ToString) -> Self {
        Self::Number(value.to_string())
    }

    pub fn string_set<S: Into<String>>(values: impl IntoIterator<Item = S>) -> Self {
        Self::StringSet(values.into_iter().map(Into::into).collect())
    }

    pub fn number_set<N: ToString>(values: impl IntoIterator<Item = N>) -> Self {
        Self::NumberSet(values.into_iter().map(|n| n.to_string()).collect())
    }

    pub fn binary_set<B: Into<Vec<u8>>>(values: impl IntoIterator<Item = B>) -> Self {
        Self::BinarySet(values.into_iter().map(Into::into).collect())
    }
}

macro_rules! impl_table_attr {
    ($($ty:ty => Number),* $(,)?) => {
        $(
            impl From<$ty> for TableAttribute {
                fn from(value: $ty) -> Self {
                    TableAttribute::Number(value.to_string())
                }
            }

            impl TryFromTableAttr for $ty {
                fn try_from_table_attr(value: TableAttribute) -> Result<Self, ReadConversionError> {
                    let TableAttribute::Number(value) = value else {
                        return Err(ReadConversionError::ConversionFailed(
                            stringify!($ty).to_string(),
                        ));
                    };

                    value
                        .parse()
                        .map_err(|_| ReadConversionError::ConversionFailed(stringify!($ty).to_string()))
                }
            }
        )*
    };
}

impl_table_attr!(
    i16 => Number,
    i32 => Number,
    i64 => Number,
    u16 => Number,
    u32 => Number,
    u64 => Number,
    usize => Number,
    f32 => Number,
    f64 => Number,
);

impl From<String> for TableAttribute {
    fn from(value: String) -> Self {
        TableAttribute::String(value)
    }
}

impl From<&str> for TableAttribute {
    fn from(value: &str) -> Self {
        TableAttribute::String(value.to_string())
    }
}

impl From<bool> for TableAttribute {
    fn from(value: bool) -> Self {
        TableAttribute::Bool(value)
    }
}

impl From<Vec<u8>> for TableAttribute {
    fn from(value: Vec<u8>) -> Self {
        TableAttribute::Bytes(value)
    }
}

impl From<BTreeSet<String>> for TableAttribute {
    fn from(value: BTreeSet<String>) -> Self {
        TableAttribute::StringSet(value)
    }
}

impl From<HashSet<String>> for TableAttribute {
    fn from(value: HashSet<String>) -> Self {
        TableAttribute::StringSet(value.into_iter().collect())
    }
}

impl From<BTreeSet<Vec<u8>>> for TableAttribute {
    fn from(value: BTreeSet<Vec<u8>>) -> Self {
        TableAttribute::BinarySet(value)
    }
}

impl<T> From<Option<T>> for TableAttribute
where
    T: Into<TableAttribute>,
{
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => value.into(),
            None => TableAttribute::Null,
        }
    }
}

// Vec<T> is always a list. Sets have to be asked for explicitly since a list
// of strings and a string set behave differently in the store.
impl<T> From<Vec<T>> for TableAttribute
where
    T: Into<TableAttribute>,
{
    fn from(value: Vec<T>) -> Self {
        TableAttribute::List(value.into_iter().map(Into::into).collect())
    }
}

impl<K, V> From<HashMap<K, V>> for TableAttribute
where
    K: ToString,
    V: Into<TableAttribute>,
{
    fn from(map: HashMap<K, V>) -> Self {
        TableAttribute::Map(
            map.into_iter()
                .map(|(k, v)| (k.to_string(), v.into()))
                .collect(),
        )
    }
}

impl<K, V> From<BTreeMap<K, V>> for TableAttribute
where
    K: ToString,
    V: Into<TableAttribute>,
{
    fn from(map: BTreeMap<K, V>) -> Self {
        TableAttribute::Map(
            map.into_iter()
                .map(|(k, v)| (k.to_string(), v.into()))
                .collect(),
        )
    }
}

impl From<TableAttribute> for AttributeValue {
    fn from(attribute: TableAttribute) -> Self {
        match attribute {
            TableAttribute::String(s) => AttributeValue::S(s),
            TableAttribute::StringSet(s) => AttributeValue::Ss(s.into_iter().collect()),

            TableAttribute::Number(i) => AttributeValue::N(i),
            TableAttribute::NumberSet(x) => AttributeValue::Ns(x.into_iter().collect()),

            TableAttribute::Bytes(x) => AttributeValue::B(Blob::new(x)),
            TableAttribute::BinarySet(x) => {
                AttributeValue::Bs(x.into_iter().map(Blob::new).collect())
            }

            TableAttribute::Bool(x) => AttributeValue::Bool(x),
            TableAttribute::List(x) => AttributeValue::L(x.into_iter().map(|x| x.into()).collect()),
            TableAttribute::Map(x) => {
                AttributeValue::M(x.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
            TableAttribute::Null => AttributeValue::Null(true),
        }
    }
}

impl From<AttributeValue> for TableAttribute {
    fn from(attribute: AttributeValue) -> Self {
        match attribute {
            AttributeValue::S(s) => TableAttribute::String(s),
            AttributeValue::N(n) => TableAttribute::Number(n),
            AttributeValue::Bool(n) => TableAttribute::Bool(n),
            AttributeValue::B(n) => TableAttribute::Bytes(n.into_inner()),
            AttributeValue::L(l) => {
                TableAttribute::List(l.into_iter().map(TableAttribute::from).collect())
            }
            AttributeValue::M(l) => TableAttribute::Map(
                l.into_iter()
                    .map(|(k, v)| (k, TableAttribute::from(v)))
                    .collect(),
            ),
            AttributeValue::Bs(x) => {
                TableAttribute::BinarySet(x.into_iter().map(|x| x.into_inner()).collect())
            }
            AttributeValue::Ss(x) => TableAttribute::StringSet(x.into_iter().collect()),
            AttributeValue::Ns(x) => TableAttribute::NumberSet(x.into_iter().collect()),
            // Includes variants added by newer service versions
            _ => TableAttribute::Null,
        }
    }
}

impl TryFromTableAttr for String {
    fn try_from_table_attr(value: TableAttribute) -> Result<Self, ReadConversionError> {
        match value {
            TableAttribute::String(s) => Ok(s),
            _ => Err(ReadConversionError::ConversionFailed("String".to_string())),
        }
    }
}

impl TryFromTableAttr for bool {
    fn try_from_table_attr(value: TableAttribute) -> Result<Self, ReadConversionError> {
        match value {
            TableAttribute::Bool(b) => Ok(b),
            _ => Err(ReadConversionError::ConversionFailed("bool".to_string())),
        }
    }
}

impl TryFromTableAttr for Vec<u8> {
    fn try_from_table_attr(value: TableAttribute) -> Result<Self, ReadConversionError> {
        match value {
            TableAttribute::Bytes(b) => Ok(b),
            _ => Err(ReadConversionError::ConversionFailed("Vec<u8>".to_string())),
        }
    }
}

impl<T> TryFromTableAttr for Option<T>
where
    T: TryFromTableAttr,
{
    fn try_from_table_attr(value: TableAttribute) -> Result<Self, ReadConversionError> {
        if matches!(value, TableAttribute::Null) {
            Ok(None)
        } else {
            Ok(Some(T::try_from_table_attr(value)?))
        }
    }
}

impl<T> TryFromTableAttr for Vec<T>
where
    T: TryFromTableAttr,
{
    fn try_from_table_attr(value: TableAttribute) -> Result<Self, ReadConversionError> {
        match value {
            TableAttribute::StringSet(v) => v
                .into_iter()
                .map(TableAttribute::String)
                .map(T::try_from_table_attr)
                .collect(),
            TableAttribute::NumberSet(v) => v
                .into_iter()
                .map(TableAttribute::Number)
                .map(T::try_from_table_attr)
                .collect(),
            TableAttribute::BinarySet(v) => v
                .into_iter()
                .map(TableAttribute::Bytes)
                .map(T::try_from_table_attr)
                .collect(),
            TableAttribute::List(v) => v.into_iter().map(T::try_from_table_attr).collect(),
            _ => Err(ReadConversionError::ConversionFailed(
                std::any::type_name::<Vec<T>>().to_string(),
            )),
        }
    }
}

impl<K, V> TryFromTableAttr for HashMap<K, V>
where
    K: FromStr + std::hash::Hash + std::cmp::Eq,
    V: TryFromTableAttr,
{
    fn try_from_table_attr(value: TableAttribute) -> Result<Self, ReadConversionError> {
        let TableAttribute::Map(map) = value else {
            return Err(ReadConversionError::ConversionFailed(
                std::any::type_name::<Self>().to_string(),
            ));
        };

        map.into_iter()
            .map(|(k, v)| {
                let k = k.parse().map_err(|_| {
                    ReadConversionError::ConversionFailed(std::any::type_name::<Self>().to_string())
                })?;
                let v = V::try_from_table_attr(v)?;

                Ok((k, v))
            })
            .collect()
    }
}

/// Take attribute `name` out of `item` and convert it.
pub fn take_attr<T: TryFromTableAttr>(
    item: &mut Item,
    name: &str,
) -> Result<T, ReadConversionError> {
    let value = item
        .remove(name)
        .ok_or_else(|| ReadConversionError::NoSuchAttribute(name.to_string()))?;

    T::try_from_table_attr(value)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_vec_of_strings_is_a_list() {
        let attr = TableAttribute::from(vec!["a".to_string(), "b".to_string()]);

        assert!(matches!(&attr, TableAttribute::List(x) if x.len() == 2));
        assert!(!attr.is_set());
    }

    #[test]
    fn test_number_round_trip() {
        let attr = TableAttribute::from(42_u64);
        assert_eq!(attr, TableAttribute::Number("42".to_string()));
        assert_eq!(u64::try_from_table_attr(attr).unwrap(), 42);
    }

    #[test]
    fn test_number_set_from_list() {
        let attr = TableAttribute::number_set([3, 1, 2, 3]);

        assert!(matches!(&attr, TableAttribute::NumberSet(x) if x.len() == 3));

        let mut values = Vec::<i32>::try_from_table_attr(attr).unwrap();
        values.sort();
        assert_eq!(values, vec![1, 2, 3]);
    }

    #[test]
    fn test_attribute_value_conversion() {
        let attr = TableAttribute::Map(
            [
                ("tags".to_string(), TableAttribute::string_set(["b", "a"])),
                ("bin".to_string(), TableAttribute::Bytes(vec![1, 2])),
                ("none".to_string(), TableAttribute::Null),
            ]
            .into_iter()
            .collect(),
        );

        let AttributeValue::M(map) = AttributeValue::from(attr.clone()) else {
            panic!("expected a map");
        };
        assert_eq!(map["tags"], AttributeValue::Ss(vec!["a".into(), "b".into()]));
        assert_eq!(map["none"], AttributeValue::Null(true));

        assert_eq!(TableAttribute::from(AttributeValue::M(map)), attr);
    }

    #[test]
    fn test_option_null() {
        let attr = TableAttribute::from(None::<String>);
        assert_eq!(attr, TableAttribute::Null);
        assert_eq!(Option::<String>::try_from_table_attr(attr).unwrap(), None);
    }

    #[test]
    fn test_take_attr_missing() {
        let mut item = Item::new();
        item.insert("name".into(), "Jane".into());

        let err = take_attr::<String>(&mut item, "email").unwrap_err();
        assert!(matches!(err, ReadConversionError::NoSuchAttribute(x) if x == "email"));

        let name: String = take_attr(&mut item, "name").unwrap();
        assert_eq!(name, "Jane");
        assert!(item.is_empty());
    }

    #[test]
    fn test_hashmap() {
        let map: HashMap<String, String> =
            [("A".to_string(), "Something in A".to_string())].into();

        let attr = TableAttribute::from(map.clone());
        let original = HashMap::<String, String>::try_from_table_attr(attr).unwrap();

        assert_eq!(original, map);
    }
}
