use super::Table;
use crate::{
    client::{Command, Operation},
    errors::{DispatchError, StoreError},
    format, Item,
};
use log::{debug, error, info, trace};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::{fmt, sync::Arc, time::Instant};

/// Per-call options understood by [`Table::execute`] and the item helpers built on it.
#[derive(Debug, Clone)]
pub struct ExecuteOptions {
    /// Propagate store failures. When `false` a failed call yields `{}`.
    pub throw: bool,
    /// Log store failures at error level.
    pub log: bool,
    /// Ask the store to report consumed capacity.
    pub stats: bool,
    /// `ReturnConsumedCapacity` level, `TOTAL` when unset.
    pub capacity: Option<String>,
    /// Unmarshall and type-resolve items returned by batch and transaction reads.
    pub parse: bool,
    pub consistent: bool,
    pub info: Option<InfoSlot>,
    /// `Some(false)` makes a put fail if the item already exists, `Some(true)` if it doesn't.
    pub exists: Option<bool>,
    pub limit: Option<i32>,
    pub index: Option<String>,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            throw: true,
            log: true,
            stats: false,
            capacity: None,
            parse: false,
            consistent: false,
            info: None,
            exists: None,
            limit: None,
            index: None,
        }
    }
}

impl ExecuteOptions {
    pub fn throw(mut self, throw: bool) -> Self {
        self.throw = throw;
        self
    }

    pub fn log(mut self, log: bool) -> Self {
        self.log = log;
        self
    }

    pub fn stats(mut self, stats: bool) -> Self {
        self.stats = stats;
        self
    }

    pub fn capacity(mut self, capacity: impl Into<String>) -> Self {
        self.capacity = Some(capacity.into());
        self
    }

    pub fn parse(mut self, parse: bool) -> Self {
        self.parse = parse;
        self
    }

    pub fn consistent(mut self, consistent: bool) -> Self {
        self.consistent = consistent;
        self
    }

    pub fn info(mut self, info: InfoSlot) -> Self {
        self.info = Some(info);
        self
    }

    pub fn exists(mut self, exists: bool) -> Self {
        self.exists = Some(exists);
        self
    }

    pub fn limit(mut self, limit: i32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn index(mut self, index: impl Into<String>) -> Self {
        self.index = Some(index.into());
        self
    }
}

/// What was sent for a dispatched operation.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationInfo {
    /// Store API name, e.g. `PutItem`
    pub operation: &'static str,
    pub command: Command,
    pub properties: Item,
}

/// Output slot filled in by [`Table::execute`]. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct InfoSlot(Arc<Mutex<Option<OperationInfo>>>);

impl InfoSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<OperationInfo> {
        self.0.lock().clone()
    }

    pub fn take(&self) -> Option<OperationInfo> {
        self.0.lock().take()
    }

    fn set(&self, info: OperationInfo) {
        *self.0.lock() = Some(info);
    }
}

/// Items of a batch or transaction read, either as the store returned them or parsed.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadResult {
    Raw(Value),
    Items(Vec<Item>),
}

impl ReadResult {
    pub fn items(self) -> Option<Vec<Item>> {
        match self {
            Self::Items(items) => Some(items),
            Self::Raw(_) => None,
        }
    }

    pub fn raw(self) -> Option<Value> {
        match self {
            Self::Raw(value) => Some(value),
            Self::Items(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactKind {
    Write,
    Get,
}

impl From<&str> for TransactKind {
    fn from(kind: &str) -> Self {
        if kind == "write" {
            Self::Write
        } else {
            Self::Get
        }
    }
}

struct Trace<'t> {
    model: &'t str,
    operation: Operation,
    command: &'t Command,
    properties: &'t Item,
    error: Option<&'t StoreError>,
}

impl fmt::Display for Trace<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "model={} operation={} command={} properties={:?}",
            self.model,
            self.operation,
            Value::Object(self.command.clone()),
            self.properties
        )?;

        if let Some(error) = self.error {
            write!(f, " error={error}")?;
        }

        Ok(())
    }
}

fn is_empty_batch(batch: &Command) -> bool {
    match batch.get("RequestItems") {
        Some(Value::Object(tables)) => tables.is_empty(),
        _ => true,
    }
}

impl Table {
    /// Run one store operation on behalf of `model`.
    ///
    /// Every read, write, batch and transaction goes through here. `properties` are the
    /// caller's original properties and are only used for tracing and the info slot.
    pub async fn execute(
        &self,
        model: &str,
        operation: Operation,
        command: Command,
        options: &ExecuteOptions,
        properties: &Item,
    ) -> Result<Value, DispatchError> {
        Ok(self
            .dispatch(model, operation, command, options, properties)
            .await?
            .unwrap_or_else(|| json!({})))
    }

    /// Same as [`Table::execute`] but a failure suppressed by `throw(false)` comes back as
    /// `None` rather than `{}`.
    pub(crate) async fn dispatch(
        &self,
        model: &str,
        operation: Operation,
        mut command: Command,
        options: &ExecuteOptions,
        properties: &Item,
    ) -> Result<Option<Value>, DispatchError> {
        let started = Instant::now();

        if options.stats || self.metrics.is_some() {
            command.insert(
                "ReturnConsumedCapacity".into(),
                json!(options.capacity.as_deref().unwrap_or("TOTAL")),
            );
            if operation.is_write() {
                command.insert("ReturnItemCollectionMetrics".into(), json!("SIZE"));
            }
        }

        if let Some(info) = &options.info {
            info.set(OperationInfo {
                operation: operation.api_name(),
                command: command.clone(),
                properties: properties.clone(),
            });
        }

        let sent = command.clone();
        let client = self.client.as_ref();
        let response = match operation {
            Operation::Get => client.get(command).await,
            Operation::Put => client.put(command).await,
            Operation::Update => client.update(command).await,
            Operation::Delete => client.delete(command).await,
            Operation::Find => client.find(command).await,
            Operation::Scan => client.scan(command).await,
            Operation::BatchGet => client.batch_get(command).await,
            Operation::BatchWrite => client.batch_write(command).await,
            Operation::TransactGet => client.transact_get(command).await,
            Operation::TransactWrite => client.transact_write(command).await,
        };

        match response {
            Ok(result) => {
                if let Some(metrics) = &self.metrics {
                    metrics.add(model, operation, &result, options, started);
                }
                trace!("OneTable result for \"{operation}\" \"{model}\": {result}");

                Ok(Some(result))
            }
            Err(err) => {
                let trace = Trace {
                    model,
                    operation,
                    command: &sent,
                    properties,
                    error: Some(&err),
                };

                if !options.throw {
                    debug!("OneTable suppressed exception: {trace}");
                    return Ok(None);
                }

                if operation == Operation::Put && err.is_conditional_check_failed() {
                    info!("Conditional check failed: {trace}");

                    return Err(DispatchError::Conflict {
                        model: model.to_string(),
                        operation,
                        message: format!("Conditional create failed for \"{model}\""),
                    });
                }

                if options.log {
                    error!("OneTable exception in \"{operation}\" on \"{model}\": {trace}");
                }

                Err(err.into())
            }
        }
    }

    /// Execute a `BatchGetItem`. An empty batch returns without reaching the store.
    pub async fn batch_get(
        &self,
        mut batch: Command,
        options: &ExecuteOptions,
    ) -> Result<ReadResult, DispatchError> {
        if is_empty_batch(&batch) {
            return Ok(ReadResult::Items(vec![]));
        }

        if let Some(Value::Object(tables)) = batch.get_mut("RequestItems") {
            for entry in tables.values_mut() {
                if let Value::Object(entry) = entry {
                    entry.insert("ConsistentRead".into(), json!(options.consistent));
                }
            }
        }

        let generic = self.schema.generic_model().to_string();
        let result = self
            .execute(&generic, Operation::BatchGet, batch, options, &Item::new())
            .await?;

        if !options.parse {
            return Ok(ReadResult::Raw(result));
        }

        let mut items = vec![];
        for responses in result["Responses"].as_object().into_iter().flat_map(|t| t.values()) {
            items.extend(format::unmarshall_all(self.client.as_ref(), responses)?);
        }

        Ok(ReadResult::Items(self.resolve_items(Operation::Get, items, options)))
    }

    /// Execute a `BatchWriteItem`. An empty batch returns `{}` without reaching the store.
    pub async fn batch_write(
        &self,
        batch: Command,
        options: &ExecuteOptions,
    ) -> Result<Value, DispatchError> {
        if is_empty_batch(&batch) {
            return Ok(json!({}));
        }

        let generic = self.schema.generic_model().to_string();
        self.execute(&generic, Operation::BatchWrite, batch, options, &Item::new())
            .await
    }

    pub async fn transact(
        &self,
        kind: TransactKind,
        transaction: Command,
        options: &ExecuteOptions,
    ) -> Result<ReadResult, DispatchError> {
        let generic = self.schema.generic_model().to_string();
        let operation = match kind {
            TransactKind::Write => Operation::TransactWrite,
            TransactKind::Get => Operation::TransactGet,
        };

        let result = self
            .execute(&generic, operation, transaction, options, &Item::new())
            .await?;

        if kind == TransactKind::Write || !options.parse {
            return Ok(ReadResult::Raw(result));
        }

        let items = result["Responses"]
            .as_array()
            .into_iter()
            .flatten()
            .filter_map(|response| response.get("Item"))
            .map(|item| format::unmarshall(self.client.as_ref(), item))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ReadResult::Items(self.resolve_items(Operation::Get, items, options)))
    }

    /// Hand each item to the model named by its type field. Uniqueness markers and items
    /// of unknown models are dropped.
    fn resolve_items(
        &self,
        operation: Operation,
        items: Vec<Item>,
        options: &ExecuteOptions,
    ) -> Vec<Item> {
        let type_field = self.schema.type_field();
        let unique = self.schema.unique_model();
        let properties = Item::new();

        items
            .into_iter()
            .filter_map(|item| {
                let name = item.get(type_field)?.as_str()?;
                if name == unique {
                    return None;
                }
                let model = self.schema.model(name)?;

                Some(model.transform_read_item(operation, item, &properties, options))
            })
            .collect()
    }
}
