mod config;
mod context;
pub mod definition;
mod dispatch;
mod items;
pub mod merge;

pub use self::{
    config::{TableConfig, CRYPTO_CIPHER_ENV, CRYPTO_PASSWORD_ENV, TABLE_NAME_ENV},
    context::Context,
    definition::{TableDefinition, Throughput},
    dispatch::{ExecuteOptions, InfoSlot, OperationInfo, ReadResult, TransactKind},
};

use crate::{
    crypto::CryptoConfig,
    errors::{ConfigError, CryptoError, Error, FormatError, MergeError, StoreError},
    format::{self, Marshall, MarshallOptions},
    metrics::Metrics,
    schema::{Model, Schema},
    Crypto, Item, StoreClient,
};
use itertools::Itertools;
use log::info;
use serde_json::Value;
use std::{collections::HashMap, sync::Arc};

/// Phrase [`Table::delete_table`] insists on before removing the physical table.
pub const DELETE_CONFIRMATION: &str = "DeleteTableForever";

/// Group key for items that carry no type field.
pub const UNKNOWN_TYPE: &str = "_unknown";

/// Entry point for working with one physical table.
///
/// Cloning is cheap. Clones share the client, schema, crypto and metrics but each holds
/// its own context snapshot.
#[derive(Clone)]
pub struct Table {
    name: String,
    client: Arc<dyn StoreClient>,
    schema: Arc<dyn Schema>,
    crypto: Arc<Crypto>,
    metrics: Option<Arc<dyn Metrics>>,
    marshall_options: MarshallOptions,
    context: Context,
}

impl std::fmt::Debug for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table")
            .field("name", &self.name)
            .field("generation", &self.client.generation())
            .field("models", &self.schema.model_names())
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

impl Table {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn client(&self) -> &dyn StoreClient {
        self.client.as_ref()
    }

    pub fn schema(&self) -> Arc<dyn Schema> {
        self.schema.clone()
    }

    pub fn set_schema(&mut self, schema: impl Schema + 'static) {
        self.schema = Arc::new(schema);
    }

    pub fn get_model(&self, name: &str) -> Result<Arc<dyn Model>, ConfigError> {
        self.schema
            .model(name)
            .ok_or_else(|| ConfigError::UnknownModel(name.to_string()))
    }

    pub fn list_models(&self) -> Vec<String> {
        self.schema.model_names()
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Replace the context with `values`.
    pub fn set_context(&mut self, values: Item) {
        self.context = Context::new(values);
    }

    /// Layer `values` over the current context.
    pub fn add_context(&mut self, values: Item) {
        self.context = self.context.with(values);
    }

    pub fn clear_context(&mut self) {
        self.context = Context::default();
    }

    /// A table sharing this one's resources whose context has `overrides` layered on top.
    pub fn child(&self, overrides: Item) -> Self {
        Self {
            context: self.context.with(overrides),
            ..self.clone()
        }
    }

    pub fn crypto(&self) -> &Crypto {
        &self.crypto
    }

    pub fn encrypt(&self, text: &str, profile: &str) -> Result<String, CryptoError> {
        self.crypto.encrypt(text, profile)
    }

    pub fn decrypt(&self, token: &str) -> Result<String, CryptoError> {
        self.crypto.decrypt(token)
    }

    /// Swap in a new set of crypto profiles. Returns the new registry version.
    pub fn set_crypto(&self, config: &CryptoConfig) -> Result<u64, ConfigError> {
        self.crypto.install(config)
    }

    pub fn marshall(&self, items: Marshall<'_>) -> Result<Value, FormatError> {
        format::marshall(self.client.as_ref(), items, &self.marshall_options)
    }

    pub fn unmarshall(&self, wire: &Value) -> Result<Item, FormatError> {
        format::unmarshall(self.client.as_ref(), wire)
    }

    pub fn unmarshall_all(&self, wire: &Value) -> Result<Vec<Item>, FormatError> {
        format::unmarshall_all(self.client.as_ref(), wire)
    }

    pub fn merge(&self, dest: &mut Item, src: &Item) -> Result<(), MergeError> {
        merge::merge(dest, src)
    }

    pub fn uuid(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }

    /// Group items by the schema's type field.
    pub fn group_by_type(&self, items: Vec<Item>) -> HashMap<String, Vec<Item>> {
        let type_field = self.schema.type_field();

        items.into_iter().into_group_map_by(|item| {
            item.get(type_field)
                .and_then(|t| t.as_str())
                .unwrap_or(UNKNOWN_TYPE)
                .to_string()
        })
    }

    pub fn table_definition(
        &self,
        provisioned: Option<Throughput>,
    ) -> Result<TableDefinition, ConfigError> {
        TableDefinition::build(&self.name, self.schema.indexes(), provisioned)
    }

    pub async fn create_table(&self, provisioned: Option<Throughput>) -> Result<Value, Error> {
        let definition = self.table_definition(provisioned)?;

        info!("Creating table \"{}\"", self.name);

        Ok(self.client.create_table(&definition).await?)
    }

    /// Remove the physical table. `confirmation` must be [`DELETE_CONFIRMATION`].
    pub async fn delete_table(&self, confirmation: &str) -> Result<(), Error> {
        if confirmation != DELETE_CONFIRMATION {
            return Err(ConfigError::ConfirmationRequired(DELETE_CONFIRMATION).into());
        }

        info!("Deleting table \"{}\"", self.name);

        Ok(self.client.delete_table(&self.name).await?)
    }

    pub async fn describe_table(&self) -> Result<Value, StoreError> {
        self.client.describe_table(&self.name).await
    }

    pub async fn exists(&self) -> Result<bool, StoreError> {
        Ok(self.list_tables().await?.contains(&self.name))
    }

    pub async fn list_tables(&self) -> Result<Vec<String>, StoreError> {
        self.client.list_tables().await
    }
}
