//! Single-table mapping over DynamoDB-shaped stores.
//!
//! A [`Table`] derives its physical definition from a [`Schema`](schema::Schema), runs
//! every store operation through one dispatcher ([`Table::execute`]) and speaks either
//! client generation through the [`StoreClient`] seam:
//!
//! * [`DynamoClient`] for `aws-sdk-dynamodb` and attribute-value items,
//! * [`LegacyClient`] for document-style clients and their set wrappers.
//!
//! String fields can be encrypted into self-describing tokens with [`Crypto`].
pub mod client;
pub mod crypto;
pub mod errors;
pub mod format;
pub mod metrics;
pub mod schema;
pub mod table;
mod value;

pub use crate::{
    client::{
        Command, DocumentTransport, DynamoClient, Generation, LegacyClient, Operation,
        PendingRequest, StoreClient,
    },
    crypto::Crypto,
    errors::{
        ConfigError, CryptoError, DispatchError, Error, FormatError, MergeError, StoreError,
        StoreErrorKind,
    },
    format::{Marshall, MarshallOptions},
    table::{
        ExecuteOptions, InfoSlot, OperationInfo, ReadResult, Table, TableConfig,
        TableDefinition, Throughput, TransactKind,
    },
    value::{take_attr, Item, ReadConversionError, TableAttribute, TryFromTableAttr},
};
