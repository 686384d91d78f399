//! Interfaces onto the schema and model layer that shapes items for the table.
use crate::{
    client::Operation, errors::ConfigError, table::ExecuteOptions, Item,
};
use serde::Deserialize;
use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

pub const PRIMARY_INDEX: &str = "primary";
pub const TYPE_FIELD: &str = "_type";
pub const UNIQUE_MODEL: &str = "_Unique";
pub const GENERIC_MODEL: &str = "_Generic";

/// Which attributes a secondary index carries.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "ProjectionRepr")]
pub enum Projection {
    #[default]
    All,
    Keys,
    Include(Vec<String>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ProjectionRepr {
    Named(String),
    Attributes(Vec<String>),
}

impl TryFrom<ProjectionRepr> for Projection {
    type Error = String;

    fn try_from(repr: ProjectionRepr) -> Result<Self, Self::Error> {
        match repr {
            ProjectionRepr::Named(name) if name == "all" => Ok(Self::All),
            ProjectionRepr::Named(name) if name == "keys" => Ok(Self::Keys),
            ProjectionRepr::Named(name) => Err(format!("unknown projection \"{name}\"")),
            ProjectionRepr::Attributes(attrs) => Ok(Self::Include(attrs)),
        }
    }
}

/// `{hash, sort?, project?}` as declared by a schema.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IndexDefinition {
    pub hash: String,
    #[serde(default)]
    pub sort: Option<String>,
    /// Left out means [`Projection::All`]
    #[serde(default)]
    pub project: Option<Projection>,
}

impl IndexDefinition {
    pub fn new(hash: impl Into<String>) -> Self {
        Self {
            hash: hash.into(),
            sort: None,
            project: None,
        }
    }

    pub fn sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    pub fn project(mut self, project: Projection) -> Self {
        self.project = Some(project);
        self
    }

    pub fn projection(&self) -> &Projection {
        const ALL: &Projection = &Projection::All;
        self.project.as_ref().unwrap_or(ALL)
    }
}

pub type Indexes = BTreeMap<String, IndexDefinition>;

/// A model compiled by the schema layer.
pub trait Model: Send + Sync {
    fn name(&self) -> &str;

    /// Shape an item read back from the table into what callers of `operation` expect.
    fn transform_read_item(
        &self,
        operation: Operation,
        item: Item,
        properties: &Item,
        options: &ExecuteOptions,
    ) -> Item;
}

pub trait Schema: Send + Sync {
    fn indexes(&self) -> &Indexes;

    fn model(&self, name: &str) -> Option<Arc<dyn Model>>;

    fn model_names(&self) -> Vec<String>;

    /// Attribute recording which model an item belongs to.
    fn type_field(&self) -> &str {
        TYPE_FIELD
    }

    /// Model holding uniqueness markers. Its items never appear in parsed results.
    fn unique_model(&self) -> &str {
        UNIQUE_MODEL
    }

    /// Model used for schema-less item access.
    fn generic_model(&self) -> &str {
        GENERIC_MODEL
    }

    fn primary_index(&self) -> Result<&IndexDefinition, ConfigError> {
        self.indexes()
            .get(PRIMARY_INDEX)
            .ok_or(ConfigError::MissingPrimaryIndex)
    }
}

/// A model that hands items back exactly as they were stored.
#[derive(Debug, Clone)]
pub struct PassThroughModel {
    name: String,
}

impl PassThroughModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Model for PassThroughModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn transform_read_item(
        &self,
        _operation: Operation,
        item: Item,
        _properties: &Item,
        _options: &ExecuteOptions,
    ) -> Item {
        item
    }
}

/// A schema built from index declarations plus explicitly registered models.
///
/// The generic and unique models are always present.
#[derive(Clone)]
pub struct TableSchema {
    indexes: Indexes,
    models: HashMap<String, Arc<dyn Model>>,
}

impl TableSchema {
    pub fn new(indexes: Indexes) -> Self {
        let models = [GENERIC_MODEL, UNIQUE_MODEL]
            .into_iter()
            .map(|name| {
                let model: Arc<dyn Model> = Arc::new(PassThroughModel::new(name));
                (name.to_string(), model)
            })
            .collect();

        Self { indexes, models }
    }

    /// Parse index declarations such as
    /// `{"primary": {"hash": "pk", "sort": "sk"}, "gs1": {"hash": "gs1pk", "project": "keys"}}`.
    pub fn from_json(indexes: serde_json::Value) -> Result<Self, serde_json::Error> {
        Ok(Self::new(serde_json::from_value(indexes)?))
    }

    pub fn with_model(mut self, model: impl Model + 'static) -> Self {
        self.models
            .insert(model.name().to_string(), Arc::new(model));
        self
    }
}

impl std::fmt::Debug for TableSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableSchema")
            .field("indexes", &self.indexes)
            .field("models", &self.model_names())
            .finish()
    }
}

impl Schema for TableSchema {
    fn indexes(&self) -> &Indexes {
        &self.indexes
    }

    fn model(&self, name: &str) -> Option<Arc<dyn Model>> {
        self.models.get(name).cloned()
    }

    fn model_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.models.keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_projections() {
        let schema = TableSchema::from_json(json!({
            "primary": {"hash": "pk", "sort": "sk"},
            "gs1": {"hash": "gs1pk", "project": "keys"},
            "gs2": {"hash": "gs2pk", "project": ["name", "email"]},
            "gs3": {"hash": "gs3pk", "project": "all"},
        }))
        .unwrap();

        let indexes = schema.indexes();
        assert_eq!(indexes["primary"].projection(), &Projection::All);
        assert_eq!(indexes["primary"].project, None);
        assert_eq!(indexes["gs1"].projection(), &Projection::Keys);
        assert_eq!(
            indexes["gs2"].projection(),
            &Projection::Include(vec!["name".into(), "email".into()])
        );
        assert_eq!(indexes["gs3"].project, Some(Projection::All));
    }

    #[test]
    fn test_unknown_projection() {
        assert!(TableSchema::from_json(json!({
            "primary": {"hash": "pk", "project": "some"}
        }))
        .is_err());
    }

    #[test]
    fn test_reserved_models() {
        let schema = TableSchema::new(Indexes::new());

        assert_eq!(schema.model_names(), ["_Generic", "_Unique"]);
        assert!(schema.model("_Unique").is_some());
        assert_eq!(schema.primary_index(), Err(ConfigError::MissingPrimaryIndex));
    }
}
