//! Database error types.

use thiserror::Error;

use crate::model::{ColumnId, RecordId, TableId};
use crate::store::StoreName;
use crate::types::TypeError;

/// Database operation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DbError {
    /// Input rejected before any write was attempted
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Table not found
    #[error("Table {table} not found")]
    TableNotFound { table: TableId },

    /// Column not found
    #[error("Column {column} not found")]
    ColumnNotFound { column: ColumnId },

    /// Record not found
    #[error("Record {record} not found")]
    RecordNotFound { record: RecordId },

    /// Column name already used in the table
    #[error("Column '{name}' already exists in table {table}")]
    ColumnAlreadyExists { table: TableId, name: String },

    /// Operation needs a current table in the session
    #[error("No table selected")]
    NoTableSelected,

    /// Column position outside the loaded column list
    #[error("Column index {index} out of range (columns: {len})")]
    ColumnIndexOutOfRange { index: usize, len: usize },

    /// Explicit key already present in a collection
    #[error("Key {key} already exists in '{store}'")]
    KeyConflict { store: StoreName, key: u64 },

    /// Index not declared on the collection
    #[error("Index '{index}' does not exist on '{store}'")]
    UnknownIndex { store: StoreName, index: String },

    /// Collection accessed outside the transaction scope
    #[error("Collection '{0}' is not part of the transaction scope")]
    OutOfScope(StoreName),

    /// Write attempted in a readonly transaction
    #[error("Transaction is readonly")]
    ReadOnlyTransaction,

    /// Transaction conflict
    #[error("Transaction conflict: {0}")]
    TransactionConflict(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Data corruption detected
    #[error("Data corruption detected: {0}")]
    DataCorruption(String),

    /// Lock poisoned (Mutex or RwLock poisoned)
    #[error("Lock poisoned")]
    LockPoisoned,

    /// Disk full error during persistence
    #[error("Disk full: {0}")]
    DiskFull(String),

    /// I/O error during persistence
    #[error("I/O error: {0}")]
    IoError(String),

    /// Transient I/O error that may succeed on retry
    #[error("Transient I/O error: {0}")]
    TransientIoError(String),
}

impl DbError {
    /// Shorthand for a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        DbError::Validation(message.into())
    }
}

impl From<serde_json::Error> for DbError {
    fn from(error: serde_json::Error) -> Self {
        DbError::SerializationError(error.to_string())
    }
}

impl From<TypeError> for DbError {
    fn from(error: TypeError) -> Self {
        DbError::Validation(error.to_string())
    }
}
