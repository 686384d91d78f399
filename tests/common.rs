#![allow(dead_code)]

use async_trait::async_trait;
use dynamo_onetable::{
    client::Operation,
    schema::{Model, TableSchema},
    table::TableDefinition,
    Command, ExecuteOptions, Generation, Item, StoreClient, StoreError, StoreErrorKind,
    TableAttribute, TableConfig,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::{collections::VecDeque, sync::Arc};

pub const TABLE_NAME: &str = "test-table";

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Records every command and replies from a queue of canned responses.
/// An empty queue answers `{}`.
pub struct MockClient {
    generation: Generation,
    pub calls: Mutex<Vec<(Operation, Command)>>,
    pub responses: Mutex<VecDeque<Result<Value, StoreError>>>,
    pub created: Mutex<Vec<TableDefinition>>,
    pub deleted: Mutex<Vec<String>>,
    pub tables: Mutex<Vec<String>>,
}

impl MockClient {
    pub fn new(generation: Generation) -> Arc<Self> {
        Arc::new(Self {
            generation,
            calls: Default::default(),
            responses: Default::default(),
            created: Default::default(),
            deleted: Default::default(),
            tables: Default::default(),
        })
    }

    pub fn respond(&self, response: Result<Value, StoreError>) {
        self.responses.lock().push_back(response);
    }

    pub fn fail(&self, kind: StoreErrorKind, operation: &'static str) {
        self.respond(Err(StoreError::new(kind, operation, "simulated failure")));
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn last_call(&self) -> Option<(Operation, Command)> {
        self.calls.lock().last().cloned()
    }

    fn record(&self, operation: Operation, command: Command) -> Result<Value, StoreError> {
        self.calls.lock().push((operation, command));
        self.responses.lock().pop_front().unwrap_or(Ok(json!({})))
    }
}

#[async_trait]
impl StoreClient for MockClient {
    fn generation(&self) -> Generation {
        self.generation
    }

    async fn get(&self, command: Command) -> Result<Value, StoreError> {
        self.record(Operation::Get, command)
    }

    async fn put(&self, command: Command) -> Result<Value, StoreError> {
        self.record(Operation::Put, command)
    }

    async fn update(&self, command: Command) -> Result<Value, StoreError> {
        self.record(Operation::Update, command)
    }

    async fn delete(&self, command: Command) -> Result<Value, StoreError> {
        self.record(Operation::Delete, command)
    }

    async fn find(&self, command: Command) -> Result<Value, StoreError> {
        self.record(Operation::Find, command)
    }

    async fn scan(&self, command: Command) -> Result<Value, StoreError> {
        self.record(Operation::Scan, command)
    }

    async fn batch_get(&self, command: Command) -> Result<Value, StoreError> {
        self.record(Operation::BatchGet, command)
    }

    async fn batch_write(&self, command: Command) -> Result<Value, StoreError> {
        self.record(Operation::BatchWrite, command)
    }

    async fn transact_get(&self, command: Command) -> Result<Value, StoreError> {
        self.record(Operation::TransactGet, command)
    }

    async fn transact_write(&self, command: Command) -> Result<Value, StoreError> {
        self.record(Operation::TransactWrite, command)
    }

    async fn create_table(&self, definition: &TableDefinition) -> Result<Value, StoreError> {
        self.created.lock().push(definition.clone());
        self.tables.lock().push(definition.table_name.clone());
        Ok(json!({}))
    }

    async fn delete_table(&self, table_name: &str) -> Result<(), StoreError> {
        self.deleted.lock().push(table_name.to_string());
        self.tables.lock().retain(|name| name != table_name);
        Ok(())
    }

    async fn describe_table(&self, table_name: &str) -> Result<Value, StoreError> {
        Ok(json!({ "Table": { "TableName": table_name } }))
    }

    async fn list_tables(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.tables.lock().clone())
    }
}

/// Marks every item it reads so tests can tell which model resolved it.
pub struct MarkingModel {
    name: String,
}

impl MarkingModel {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

impl Model for MarkingModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn transform_read_item(
        &self,
        _operation: Operation,
        mut item: Item,
        _properties: &Item,
        _options: &ExecuteOptions,
    ) -> Item {
        item.insert("resolvedBy".into(), TableAttribute::from(self.name.as_str()));
        item
    }
}

pub fn schema() -> TableSchema {
    TableSchema::from_json(json!({
        "primary": {"hash": "pk", "sort": "sk"},
        "gs1": {"hash": "gs1pk", "sort": "gs1sk", "project": "keys"},
    }))
    .expect("Failed to parse schema")
    .with_model(MarkingModel::new("User"))
    .with_model(MarkingModel::new("Post"))
}

pub fn item(entries: &[(&str, &str)]) -> Item {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), TableAttribute::from(*v)))
        .collect()
}

pub fn table_with(client: Arc<MockClient>) -> dynamo_onetable::Table {
    TableConfig::builder()
        .name(TABLE_NAME)
        .shared_client(client)
        .schema(schema())
        .build()
        .expect("Failed to build table")
}

#[macro_export]
macro_rules! assert_err {
    ($cond:expr,) => {
        $crate::assert_err!($cond);
    };
    ($cond:expr) => {
        match $cond {
            Ok(t) => {
                panic!("assertion failed, expected Err(..), got Ok({:?})", t);
            },
            Err(e) => e,
        }
    };
    ($cond:expr, $($arg:tt)+) => {
        match $cond {
            Ok(t) => {
                panic!("assertion failed, expected Err(..), got Ok({:?}): {}", t, format_args!($($arg)+));
            },
            Err(e) => e,
        }
    };
}

#[macro_export]
macro_rules! assert_none {
    ($cond:expr,) => {
        $crate::assert_none!($cond);
    };
    ($cond:expr) => {
        match $cond {
            Some(t) => {
                panic!("assertion failed, expected None, got Some({:?})", t);
            },
            None => (),
        }
    };
}
