//! Reversible actions recorded in the undo history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{Column, ColumnId, Record, RecordId, Table};
use crate::value::Value;

/// A reversible mutation, serialized as `{ "type": kind, "data": payload }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum Action {
    DeleteColumn(DeleteColumnData),
    DeleteTable(DeleteTableData),
    DeleteRow(DeleteRowData),
    RenameColumn(RenameColumnData),
}

impl Action {
    /// Serialized kind of the action.
    pub fn kind(&self) -> &'static str {
        match self {
            Action::DeleteColumn(_) => "deleteColumn",
            Action::DeleteTable(_) => "deleteTable",
            Action::DeleteRow(_) => "deleteRow",
            Action::RenameColumn(_) => "renameColumn",
        }
    }

    /// One-line description for listings.
    pub fn describe(&self) -> String {
        match self {
            Action::DeleteColumn(data) => format!(
                "delete column '{}' ({} values)",
                data.column.name,
                data.records.len()
            ),
            Action::DeleteTable(data) => format!(
                "delete table '{}' ({} columns, {} records)",
                data.table.name,
                data.columns.len(),
                data.records.len()
            ),
            Action::DeleteRow(data) => format!("delete row {}", data.record.id),
            Action::RenameColumn(data) => {
                format!("rename column '{}' to '{}'", data.old_name, data.new_name)
            }
        }
    }
}

/// Value a record held under a deleted column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordValue {
    pub record_id: RecordId,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteColumnData {
    pub column: Column,
    #[serde(default)]
    pub records: Vec<RecordValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteTableData {
    pub table: Table,
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(default)]
    pub records: Vec<Record>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteRowData {
    pub record: Record,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameColumnData {
    pub column_id: ColumnId,
    pub old_name: String,
    pub new_name: String,
    /// Column `modified` stamp before the rename
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_modified: Option<DateTime<Utc>>,
    /// Column `modified` stamp written by the rename
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_modified: Option<DateTime<Utc>>,
}
