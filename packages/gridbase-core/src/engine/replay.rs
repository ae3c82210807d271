//! Inverse and forward application of recorded actions.

use chrono::{DateTime, Utc};

use super::columns::{ensure_unique_name, remove_column, restore_column};
use super::tables::{remove_table, restore_table};
use crate::error::DbError;
use crate::history::Action;
use crate::model::{Column, ColumnId, Record, Table, TableId};
use crate::store::IndexName;
use crate::transaction::Transaction;

/// Reverts `action` inside `tx`.
pub(super) fn apply_inverse(tx: &mut Transaction<'_>, action: &Action) -> Result<(), DbError> {
    match action {
        Action::DeleteColumn(data) => {
            require_table(tx, data.column.table_id)?;
            restore_column(tx, data)
        }
        Action::DeleteTable(data) => restore_table(tx, data),
        Action::DeleteRow(data) => {
            require_table(tx, data.record.table_id)?;
            tx.add_with_key(data.record.clone()).map(|_| ())
        }
        Action::RenameColumn(data) => {
            set_column_name(tx, data.column_id, &data.old_name, data.old_modified)
        }
    }
}

/// Re-applies `action` inside `tx`, including its cascades.
pub(super) fn apply_forward(tx: &mut Transaction<'_>, action: &Action) -> Result<(), DbError> {
    match action {
        Action::DeleteColumn(data) => remove_column(tx, data.column.id).map(|_| ()),
        Action::DeleteTable(data) => remove_table(tx, data.table.id).map(|_| ()),
        Action::DeleteRow(data) => {
            let id = data.record.id;
            if tx.get::<Record>(id)?.is_none() {
                return Err(DbError::RecordNotFound { record: id });
            }
            tx.delete::<Record>(id)
        }
        Action::RenameColumn(data) => {
            set_column_name(tx, data.column_id, &data.new_name, data.new_modified)
        }
    }
}

fn require_table(tx: &Transaction<'_>, table_id: TableId) -> Result<(), DbError> {
    match tx.get::<Table>(table_id)? {
        Some(_) => Ok(()),
        None => Err(DbError::TableNotFound { table: table_id }),
    }
}

/// Writes a recorded name and `modified` stamp back to a column.
///
/// Fails with `ColumnAlreadyExists` when another column of the table
/// now uses the name.
fn set_column_name(
    tx: &mut Transaction<'_>,
    column_id: ColumnId,
    name: &str,
    modified: Option<DateTime<Utc>>,
) -> Result<(), DbError> {
    let mut column = tx
        .get::<Column>(column_id)?
        .ok_or(DbError::ColumnNotFound { column: column_id })?;
    let siblings: Vec<Column> = tx.get_all_by_index(IndexName::TableId, column.table_id)?;
    ensure_unique_name(&siblings, column.table_id, Some(column_id), name)?;

    column.name = name.to_string();
    column.modified = modified;
    tx.put(column).map(|_| ())
}
