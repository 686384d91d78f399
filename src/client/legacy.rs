use super::{Command, Generation, Operation, StoreClient};
use crate::{errors::StoreError, table::TableDefinition};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::{fmt, future::Future, pin::Pin};

type BoxedResponse = Pin<Box<dyn Future<Output = Result<Value, StoreError>> + Send>>;

/// A request issued on a document-style client that has not been awaited yet.
///
/// Nothing is observable until [`PendingRequest::promise`] is called.
pub struct PendingRequest {
    response: BoxedResponse,
}

impl PendingRequest {
    pub fn new(response: impl Future<Output = Result<Value, StoreError>> + Send + 'static) -> Self {
        Self {
            response: Box::pin(response),
        }
    }

    /// A request whose response is already known.
    pub fn ready(response: Result<Value, StoreError>) -> Self {
        Self::new(async move { response })
    }

    pub async fn promise(self) -> Result<Value, StoreError> {
        self.response.await
    }
}

impl fmt::Debug for PendingRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingRequest").finish_non_exhaustive()
    }
}

/// The legacy document client's calling convention: methods are named `get`, `put`,
/// `batchGet`, `createTable`, ... and take plain document parameters.
pub trait DocumentTransport: Send + Sync {
    fn request(&self, method: &'static str, params: Value) -> PendingRequest;
}

/// Store client for the legacy document generation.
#[derive(Debug, Clone)]
pub struct LegacyClient<T> {
    transport: T,
}

impl<T: DocumentTransport> LegacyClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    async fn call(&self, operation: Operation, command: Command) -> Result<Value, StoreError> {
        self.transport
            .request(operation.document_name(), Value::Object(command))
            .promise()
            .await
    }
}

#[async_trait]
impl<T: DocumentTransport> StoreClient for LegacyClient<T> {
    fn generation(&self) -> Generation {
        Generation::Legacy
    }

    async fn get(&self, command: Command) -> Result<Value, StoreError> {
        self.call(Operation::Get, command).await
    }

    async fn put(&self, command: Command) -> Result<Value, StoreError> {
        self.call(Operation::Put, command).await
    }

    async fn update(&self, command: Command) -> Result<Value, StoreError> {
        self.call(Operation::Update, command).await
    }

    async fn delete(&self, command: Command) -> Result<Value, StoreError> {
        self.call(Operation::Delete, command).await
    }

    async fn find(&self, command: Command) -> Result<Value, StoreError> {
        self.call(Operation::Find, command).await
    }

    async fn scan(&self, command: Command) -> Result<Value, StoreError> {
        self.call(Operation::Scan, command).await
    }

    async fn batch_get(&self, command: Command) -> Result<Value, StoreError> {
        self.call(Operation::BatchGet, command).await
    }

    async fn batch_write(&self, command: Command) -> Result<Value, StoreError> {
        self.call(Operation::BatchWrite, command).await
    }

    async fn transact_get(&self, command: Command) -> Result<Value, StoreError> {
        self.call(Operation::TransactGet, command).await
    }

    async fn transact_write(&self, command: Command) -> Result<Value, StoreError> {
        self.call(Operation::TransactWrite, command).await
    }

    async fn create_table(&self, definition: &TableDefinition) -> Result<Value, StoreError> {
        let params = serde_json::to_value(definition)
            .map_err(|e| StoreError::validation("CreateTable", e.to_string()))?;

        self.transport
            .request("createTable", params)
            .promise()
            .await
    }

    async fn delete_table(&self, table_name: &str) -> Result<(), StoreError> {
        self.transport
            .request("deleteTable", json!({ "TableName": table_name }))
            .promise()
            .await?;

        Ok(())
    }

    async fn describe_table(&self, table_name: &str) -> Result<Value, StoreError> {
        self.transport
            .request("describeTable", json!({ "TableName": table_name }))
            .promise()
            .await
    }

    async fn list_tables(&self) -> Result<Vec<String>, StoreError> {
        let response = self
            .transport
            .request("listTables", json!({}))
            .promise()
            .await?;

        Ok(response["TableNames"]
            .as_array()
            .map(|names| {
                names
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default())
    }
}
