use crate::client::Operation;
use thiserror::Error;

pub use crate::value::ReadConversionError;

/// Raised before any network call when the table, schema or crypto setup is invalid.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Schema must declare a \"primary\" index")]
    MissingPrimaryIndex,
    #[error("Local secondary index \"{0}\" cannot declare a projection")]
    LocalIndexProjection(String),
    #[error("Missing required confirmation \"{0}\" to remove the table")]
    ConfirmationRequired(&'static str),
    #[error("Cannot find model \"{0}\"")]
    UnknownModel(String),
    #[error("Cannot find index \"{0}\"")]
    UnknownIndex(String),
    #[error("Missing table configuration: {0}")]
    Missing(&'static str),
    #[error("InvalidCipher: {0}")]
    InvalidCipher(String),
}

/// Error returned by [`Crypto::encrypt`](crate::Crypto::encrypt) and
/// [`Crypto::decrypt`](crate::Crypto::decrypt).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CryptoError {
    #[error("Database crypto not defined for \"{0}\"")]
    MissingProfile(String),
    #[error("Invalid ciphertext token: {0}")]
    InvalidToken(String),
    // Tag mismatch and corrupted ciphertext both land here
    #[error("Ciphertext failed authentication - value may have been tampered with")]
    Authentication,
    #[error("Invalid ciphertext padding")]
    Padding,
    #[error("Decrypted value is not valid UTF-8")]
    Utf8,
}

/// Malformed values met while converting between native and wire formats.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormatError {
    #[error("Invalid wire value: {0}")]
    InvalidWire(String),
    #[error("Expected an item (map of attributes), got: {0}")]
    NotAnItem(String),
}

/// Classification tag attached by a [`StoreClient`](crate::StoreClient) adapter to every failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    ConditionalCheckFailed,
    TransactionCanceled,
    Throttled,
    ResourceNotFound,
    Validation,
    Transport,
    Service,
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("{operation} failed ({kind:?}): {message}")]
pub struct StoreError {
    pub kind: StoreErrorKind,
    /// Canonical name of the store call, e.g. `PutItem` or `CreateTable`
    pub operation: &'static str,
    pub message: String,
}

impl StoreError {
    pub fn new(kind: StoreErrorKind, operation: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind,
            operation,
            message: message.into(),
        }
    }

    /// A command that could not be turned into a request for the store.
    pub fn validation(operation: &'static str, message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::Validation, operation, message)
    }

    pub fn is_conditional_check_failed(&self) -> bool {
        self.kind == StoreErrorKind::ConditionalCheckFailed
    }
}

/// Error returned by [`Table::execute`](crate::Table::execute) and the batch and transaction
/// wrappers built on it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DispatchError {
    /// A uniqueness precondition rejected the write. Callers branch on this to detect
    /// "already exists" without treating it as a fault.
    #[error("{message} ({operation})")]
    Conflict {
        model: String,
        operation: Operation,
        message: String,
    },
    #[error("StoreError: {0}")]
    Store(#[from] StoreError),
    #[error("FormatError: {0}")]
    Format(#[from] FormatError),
}

impl DispatchError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MergeError {
    #[error("Recursive merge exceeded {0} levels")]
    TooDeep(usize),
}

/// Error abstracting all errors returned by `dynamo-onetable`.
///
/// If you use this error you can use `?` to convert from the other errors in this crate.
#[derive(Error, Debug)]
pub enum Error {
    #[error("ConfigError: {0}")]
    Config(#[from] ConfigError),
    #[error("CryptoError: {0}")]
    Crypto(#[from] CryptoError),
    #[error("DispatchError: {0}")]
    Dispatch(#[from] DispatchError),
    #[error("FormatError: {0}")]
    Format(#[from] FormatError),
    #[error("StoreError: {0}")]
    Store(#[from] StoreError),
    #[error("MergeError: {0}")]
    Merge(#[from] MergeError),
    #[error("ReadConversionError: {0}")]
    ReadConversion(#[from] ReadConversionError),
}
