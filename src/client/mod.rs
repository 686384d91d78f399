//! The store client seam.
//!
//! Everything above this module talks to the store through [`StoreClient`]. The two
//! adapters are the only code that knows how a client generation is called:
//!
//! * [`DynamoClient`] wraps the current `aws-sdk-dynamodb` client and awaits each call directly.
//! * [`LegacyClient`] wraps a document-style [`DocumentTransport`] whose calls hand back a
//!   [`PendingRequest`] that must be turned into a future with `promise()`.
mod dynamo;
mod legacy;
mod wire;

pub use dynamo::DynamoClient;
pub use legacy::{DocumentTransport, LegacyClient, PendingRequest};

use crate::{
    errors::{FormatError, StoreError},
    format::{self, MarshallOptions},
    table::TableDefinition,
    Item,
};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::fmt;

/// A request payload in the store's API shape (`TableName`, `Key`, `Item`, ...).
/// Item positions hold values already marshalled for the active client generation.
pub type Command = Map<String, Value>;

/// Which wire-marshalling generation a client speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Generation {
    /// Attribute-value wire format: `{"S": "..."}`, `{"SS": [...]}`, ...
    Modern,
    /// Plain documents with sets wrapped in the client's set type.
    Legacy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operation {
    Get,
    Put,
    Update,
    Delete,
    Find,
    Scan,
    BatchGet,
    BatchWrite,
    TransactGet,
    TransactWrite,
}

impl Operation {
    pub const ALL: [Operation; 10] = [
        Self::Get,
        Self::Put,
        Self::Update,
        Self::Delete,
        Self::Find,
        Self::Scan,
        Self::BatchGet,
        Self::BatchWrite,
        Self::TransactGet,
        Self::TransactWrite,
    ];

    /// The store API name of the underlying call.
    pub fn api_name(&self) -> &'static str {
        match self {
            Self::Get => "GetItem",
            Self::Put => "PutItem",
            Self::Update => "UpdateItem",
            Self::Delete => "DeleteItem",
            Self::Find => "Query",
            Self::Scan => "Scan",
            Self::BatchGet => "BatchGetItem",
            Self::BatchWrite => "BatchWriteItem",
            Self::TransactGet => "TransactGetItems",
            Self::TransactWrite => "TransactWriteItems",
        }
    }

    /// Method name on a document-style client.
    pub fn document_name(&self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Put => "put",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Find => "query",
            Self::Scan => "scan",
            Self::BatchGet => "batchGet",
            Self::BatchWrite => "batchWrite",
            Self::TransactGet => "transactGet",
            Self::TransactWrite => "transactWrite",
        }
    }

    pub fn is_write(&self) -> bool {
        matches!(
            self,
            Self::Put | Self::Update | Self::Delete | Self::BatchWrite | Self::TransactWrite
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Get => "get",
            Self::Put => "put",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Find => "find",
            Self::Scan => "scan",
            Self::BatchGet => "batchGet",
            Self::BatchWrite => "batchWrite",
            Self::TransactGet => "transactGet",
            Self::TransactWrite => "transactWrite",
        };

        f.write_str(name)
    }
}

/// Capability interface over a store client generation.
///
/// Responses are returned in the store's API shape with items in the client's wire format.
/// Failures must be tagged with a [`StoreErrorKind`](crate::StoreErrorKind) by the adapter.
#[async_trait]
pub trait StoreClient: Send + Sync {
    fn generation(&self) -> Generation;

    async fn get(&self, command: Command) -> Result<Value, StoreError>;
    async fn put(&self, command: Command) -> Result<Value, StoreError>;
    async fn update(&self, command: Command) -> Result<Value, StoreError>;
    async fn delete(&self, command: Command) -> Result<Value, StoreError>;
    async fn find(&self, command: Command) -> Result<Value, StoreError>;
    async fn scan(&self, command: Command) -> Result<Value, StoreError>;
    async fn batch_get(&self, command: Command) -> Result<Value, StoreError>;
    async fn batch_write(&self, command: Command) -> Result<Value, StoreError>;
    async fn transact_get(&self, command: Command) -> Result<Value, StoreError>;
    async fn transact_write(&self, command: Command) -> Result<Value, StoreError>;

    async fn create_table(&self, definition: &TableDefinition) -> Result<Value, StoreError>;
    async fn delete_table(&self, table_name: &str) -> Result<(), StoreError>;
    async fn describe_table(&self, table_name: &str) -> Result<Value, StoreError>;
    async fn list_tables(&self) -> Result<Vec<String>, StoreError>;

    /// Convert a native item into this client's wire format.
    fn marshall(&self, item: &Item, options: &MarshallOptions) -> Result<Value, FormatError> {
        format::marshall_for(self.generation(), item, options)
    }

    /// Convert an item in this client's wire format back to native values.
    fn unmarshall(&self, wire: &Value) -> Result<Item, FormatError> {
        format::unmarshall_for(self.generation(), wire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use itertools::Itertools;

    #[test]
    fn test_operation_names_are_unique() {
        assert!(Operation::ALL.iter().map(Operation::api_name).all_unique());
        assert!(Operation::ALL
            .iter()
            .map(Operation::document_name)
            .all_unique());
        assert_eq!(Operation::Find.api_name(), "Query");
        assert_eq!(Operation::Find.to_string(), "find");
    }

    #[test]
    fn test_writes() {
        let writes = Operation::ALL.iter().filter(|op| op.is_write()).count();
        assert_eq!(writes, 5);
        assert!(!Operation::BatchGet.is_write());
    }
}
