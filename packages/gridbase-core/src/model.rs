//! Tables, columns and records as stored in the object store.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ColumnOptions, ColumnType};
use crate::value::Value;

/// Table identity assigned by the object store.
pub type TableId = u64;
/// Column identity assigned by the object store.
pub type ColumnId = u64;
/// Record identity assigned by the object store (or by bulk import).
pub type RecordId = u64;

/// Record payload keyed by column id.
pub type RecordData = BTreeMap<ColumnId, Value>;

/// Top-level named collection of columns and records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    #[serde(default)]
    pub id: TableId,
    pub name: String,
    pub created: DateTime<Utc>,
}

impl Table {
    /// Creates an unsaved table; the store assigns its id on insert.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            created: Utc::now(),
        }
    }
}

/// Typed field definition within a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    #[serde(default)]
    pub id: ColumnId,
    pub table_id: TableId,
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    /// Dense zero-based rank among the table's columns
    pub order: usize,
    pub created: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<DateTime<Utc>>,
    #[serde(default)]
    pub options: ColumnOptions,
}

impl Column {
    /// Creates an unsaved column with default options for its type.
    pub fn new(
        table_id: TableId,
        name: impl Into<String>,
        column_type: ColumnType,
        order: usize,
    ) -> Self {
        Self {
            id: 0,
            table_id,
            name: name.into(),
            column_type,
            order,
            created: Utc::now(),
            modified: None,
            options: ColumnOptions::defaults_for(column_type),
        }
    }
}

/// One row of a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    #[serde(default)]
    pub id: RecordId,
    pub table_id: TableId,
    #[serde(default)]
    pub data: RecordData,
}

impl Record {
    /// Creates an unsaved record.
    pub fn new(table_id: TableId, data: RecordData) -> Self {
        Self {
            id: 0,
            table_id,
            data,
        }
    }

    /// Returns the value stored under a column, if any.
    pub fn value(&self, column_id: ColumnId) -> Option<&Value> {
        self.data.get(&column_id)
    }
}
