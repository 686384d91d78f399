use crate::{
    errors::ConfigError,
    schema::{Indexes, Projection, PRIMARY_INDEX},
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

const STRING_TYPE: &str = "S";
const PAY_PER_REQUEST: &str = "PAY_PER_REQUEST";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum KeyType {
    Hash,
    Range,
}

impl KeyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hash => "HASH",
            Self::Range => "RANGE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct KeySchemaElement {
    pub attribute_name: String,
    pub key_type: KeyType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AttributeDefinition {
    pub attribute_name: String,
    pub attribute_type: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectionType {
    All,
    KeysOnly,
    Include,
}

impl ProjectionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "ALL",
            Self::KeysOnly => "KEYS_ONLY",
            Self::Include => "INCLUDE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProjectionDefinition {
    pub projection_type: ProjectionType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub non_key_attributes: Vec<String>,
}

impl From<&Projection> for ProjectionDefinition {
    fn from(projection: &Projection) -> Self {
        match projection {
            Projection::All => Self {
                projection_type: ProjectionType::All,
                non_key_attributes: vec![],
            },
            Projection::Keys => Self {
                projection_type: ProjectionType::KeysOnly,
                non_key_attributes: vec![],
            },
            Projection::Include(attrs) => Self {
                projection_type: ProjectionType::Include,
                non_key_attributes: attrs.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Throughput {
    pub read_capacity_units: i64,
    pub write_capacity_units: i64,
}

impl Throughput {
    pub fn new(read_capacity_units: i64, write_capacity_units: i64) -> Self {
        Self {
            read_capacity_units,
            write_capacity_units,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SecondaryIndex {
    pub index_name: String,
    pub key_schema: Vec<KeySchemaElement>,
    pub projection: ProjectionDefinition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioned_throughput: Option<Throughput>,
}

/// The payload used to create the physical table.
///
/// Serializes to the store's `CreateTable` shape. Empty index collections are left out
/// entirely since the store rejects them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TableDefinition {
    pub table_name: String,
    pub attribute_definitions: Vec<AttributeDefinition>,
    pub key_schema: Vec<KeySchemaElement>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub local_secondary_indexes: Vec<SecondaryIndex>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub global_secondary_indexes: Vec<SecondaryIndex>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioned_throughput: Option<Throughput>,
}

#[derive(Default)]
struct AttributeDefinitions {
    seen: HashSet<String>,
    definitions: Vec<AttributeDefinition>,
}

impl AttributeDefinitions {
    fn add(&mut self, name: &str) {
        if self.seen.insert(name.to_string()) {
            self.definitions.push(AttributeDefinition {
                attribute_name: name.to_string(),
                attribute_type: STRING_TYPE.to_string(),
            });
        }
    }
}

fn key_schema(
    hash: &str,
    sort: Option<&str>,
    attributes: &mut AttributeDefinitions,
) -> Vec<KeySchemaElement> {
    attributes.add(hash);

    let mut keys = vec![KeySchemaElement {
        attribute_name: hash.to_string(),
        key_type: KeyType::Hash,
    }];

    if let Some(sort) = sort {
        attributes.add(sort);
        keys.push(KeySchemaElement {
            attribute_name: sort.to_string(),
            key_type: KeyType::Range,
        });
    }

    keys
}

impl TableDefinition {
    /// Derive the physical definition from a schema's index declarations.
    ///
    /// The primary index is processed first so its attributes lead the definition list.
    /// Secondary indexes follow in name order. A secondary index whose hash is the primary
    /// hash is local and may not narrow its projection.
    pub fn build(
        table_name: impl Into<String>,
        indexes: &Indexes,
        provisioned: Option<Throughput>,
    ) -> Result<Self, ConfigError> {
        let primary = indexes
            .get(PRIMARY_INDEX)
            .ok_or(ConfigError::MissingPrimaryIndex)?;

        let mut attributes = AttributeDefinitions::default();
        let key_schema_primary =
            key_schema(&primary.hash, primary.sort.as_deref(), &mut attributes);

        let mut local_secondary_indexes = vec![];
        let mut global_secondary_indexes = vec![];

        for (name, index) in indexes.iter().filter(|(name, _)| *name != PRIMARY_INDEX) {
            let is_local = index.hash == primary.hash;

            if is_local && !matches!(index.project, None | Some(Projection::All)) {
                return Err(ConfigError::LocalIndexProjection(name.clone()));
            }

            let secondary = SecondaryIndex {
                index_name: name.clone(),
                key_schema: key_schema(&index.hash, index.sort.as_deref(), &mut attributes),
                projection: index.projection().into(),
                provisioned_throughput: if is_local { None } else { provisioned },
            };

            if is_local {
                local_secondary_indexes.push(secondary);
            } else {
                global_secondary_indexes.push(secondary);
            }
        }

        Ok(Self {
            table_name: table_name.into(),
            attribute_definitions: attributes.definitions,
            key_schema: key_schema_primary,
            local_secondary_indexes,
            global_secondary_indexes,
            billing_mode: provisioned.is_none().then(|| PAY_PER_REQUEST.to_string()),
            provisioned_throughput: provisioned,
        })
    }
}
