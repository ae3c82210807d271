//! Column operations: add, rename, delete, retype and reorder.

use std::sync::OnceLock;

use chrono::Utc;
use regex::Regex;
use serde::Serialize;

use super::Engine;
use crate::error::DbError;
use crate::history::{Action, DeleteColumnData, RecordValue, RenameColumnData};
use crate::model::{Column, ColumnId, Record, Table, TableId};
use crate::session::Session;
use crate::store::{IndexName, StoreName};
use crate::transaction::{Transaction, TxMode};
use crate::types::{convert, ColumnOptions, ColumnType};

/// Outcome of a column type change.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeChange {
    pub column_id: ColumnId,
    pub old_type: ColumnType,
    pub new_type: ColumnType,
    /// Values rewritten into the new type
    pub converted: usize,
    /// Non-empty values that could not be converted and were blanked
    pub reset: usize,
}

fn column_name_pattern() -> &'static Regex {
    static NAME: OnceLock<Regex> = OnceLock::new();
    NAME.get_or_init(|| Regex::new(r"^[A-Za-z0-9 _-]+$").expect("valid column name regex"))
}

/// Validates a new column name, returning it trimmed.
pub fn validate_column_name(name: &str) -> Result<String, DbError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DbError::validation("Column name cannot be empty"));
    }
    let len = name.chars().count();
    if !(2..=50).contains(&len) {
        return Err(DbError::validation(
            "Column name must be between 2 and 50 characters",
        ));
    }
    if !column_name_pattern().is_match(name) {
        return Err(DbError::validation(
            "Column name can only contain letters, numbers, spaces, hyphens and underscores",
        ));
    }
    Ok(name.to_string())
}

/// Stages a column appended after the table's existing columns.
///
/// Fails with `ColumnAlreadyExists` when the table has a column of the
/// same trimmed name.
pub(super) fn insert_column(
    tx: &mut Transaction<'_>,
    table_id: TableId,
    name: &str,
    column_type: ColumnType,
) -> Result<ColumnId, DbError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DbError::validation("Column name cannot be empty"));
    }
    if tx.get::<Table>(table_id)?.is_none() {
        return Err(DbError::TableNotFound { table: table_id });
    }

    let siblings: Vec<Column> = tx.get_all_by_index(IndexName::TableId, table_id)?;
    ensure_unique_name(&siblings, table_id, None, name)?;

    let id = tx.add(Column::new(table_id, name, column_type, siblings.len()))?;
    tracing::debug!("Added column {} '{}' to table {}", id, name, table_id);
    Ok(id)
}

/// Fails with `ColumnAlreadyExists` if a column other than `except` uses `name`.
pub(super) fn ensure_unique_name(
    siblings: &[Column],
    table_id: TableId,
    except: Option<ColumnId>,
    name: &str,
) -> Result<(), DbError> {
    if siblings
        .iter()
        .any(|other| Some(other.id) != except && other.name == name)
    {
        return Err(DbError::ColumnAlreadyExists {
            table: table_id,
            name: name.to_string(),
        });
    }
    Ok(())
}

impl Engine {
    /// Appends a column to a table.
    ///
    /// # Arguments
    /// * `session` - Caller session, whose column cache is refreshed
    /// * `table_id` - Table receiving the column
    /// * `name` - Column name, trimmed
    /// * `column_type` - Column type
    ///
    /// # Returns
    /// `Result<ColumnId, DbError>` containing the new column's identity.
    pub fn add_column(
        &mut self,
        session: &mut Session,
        table_id: TableId,
        name: &str,
        column_type: ColumnType,
    ) -> Result<ColumnId, DbError> {
        let id = self.run("add column", |engine| {
            let mut tx = engine
                .store
                .transaction(&[StoreName::Tables, StoreName::Columns], TxMode::ReadWrite);
            let id = insert_column(&mut tx, table_id, name, column_type)?;
            tx.commit()?;
            engine.reload_columns(session)?;
            Ok(id)
        })?;
        self.notify_success(&format!("Column '{}' added", name.trim()));
        Ok(id)
    }

    /// Renames a column and records the rename for undo.
    pub fn rename_column(
        &mut self,
        session: &mut Session,
        column_id: ColumnId,
        new_name: &str,
    ) -> Result<(), DbError> {
        self.run("rename column", |engine| {
            let new_name = validate_column_name(new_name)?;

            let mut tx = engine
                .store
                .transaction(&[StoreName::Columns], TxMode::ReadWrite);
            let mut column = tx
                .get::<Column>(column_id)?
                .ok_or(DbError::ColumnNotFound { column: column_id })?;

            let siblings: Vec<Column> = tx.get_all_by_index(IndexName::TableId, column.table_id)?;
            ensure_unique_name(&siblings, column.table_id, Some(column_id), &new_name)?;

            let old_name = std::mem::replace(&mut column.name, new_name.clone());
            let old_modified = column.modified;
            let new_modified = Some(Utc::now());
            column.modified = new_modified;
            tx.put(column)?;
            tx.commit()?;

            engine
                .history
                .add_action(Action::RenameColumn(RenameColumnData {
                    column_id,
                    old_name,
                    new_name,
                    old_modified,
                    new_modified,
                }));
            engine.reload_columns(session)
        })?;
        self.notify_success("Column renamed");
        Ok(())
    }

    /// Deletes a column, strips its values from every record and
    /// renumbers the remaining columns.
    pub fn delete_column(
        &mut self,
        session: &mut Session,
        column_id: ColumnId,
    ) -> Result<(), DbError> {
        self.run("delete column", |engine| {
            let mut tx = engine
                .store
                .transaction(&[StoreName::Columns, StoreName::Records], TxMode::ReadWrite);
            let data = remove_column(&mut tx, column_id)?;
            tx.commit()?;

            tracing::debug!(
                "Deleted column {} '{}' ({} values captured)",
                column_id,
                data.column.name,
                data.records.len()
            );
            engine.history.add_action(Action::DeleteColumn(data));
            engine.reload_table(session)
        })?;
        self.notify_success("Column deleted");
        Ok(())
    }

    /// Changes a column's type, converting every stored value.
    ///
    /// Values that cannot be converted become the empty string. The change
    /// is not recorded in the history.
    pub fn update_column_type(
        &mut self,
        session: &mut Session,
        column_id: ColumnId,
        new_type: ColumnType,
    ) -> Result<TypeChange, DbError> {
        let change = self.run("change column type", |engine| {
            let mut tx = engine
                .store
                .transaction(&[StoreName::Columns, StoreName::Records], TxMode::ReadWrite);
            let mut column = tx
                .get::<Column>(column_id)?
                .ok_or(DbError::ColumnNotFound { column: column_id })?;
            let old_type = column.column_type;

            column.column_type = new_type;
            column.modified = Some(Utc::now());
            column.options = ColumnOptions::defaults_for(new_type);
            let table_id = column.table_id;
            tx.put(column)?;

            let mut change = TypeChange {
                column_id,
                old_type,
                new_type,
                converted: 0,
                reset: 0,
            };
            let records: Vec<Record> = tx.get_all_by_index(IndexName::TableId, table_id)?;
            for mut record in records {
                let Some(value) = record.data.get_mut(&column_id) else {
                    continue;
                };
                let next = convert(value, old_type, new_type);
                if next.is_empty() && !value.is_empty() {
                    change.reset += 1;
                } else {
                    change.converted += 1;
                }
                if next == *value {
                    continue;
                }
                *value = next;
                tx.put(record)?;
            }
            tx.commit()?;

            tracing::debug!(
                "Column {} retyped {} -> {} ({} converted, {} reset)",
                column_id,
                old_type,
                new_type,
                change.converted,
                change.reset
            );
            engine.reload_table(session)?;
            Ok(change)
        })?;
        self.notify_success(&format!("Column type changed to {}", new_type.label()));
        Ok(change)
    }

    /// Moves the column at position `from` of the session's column list
    /// to position `to` and persists the new order.
    pub fn move_column(
        &mut self,
        session: &mut Session,
        from: usize,
        to: usize,
    ) -> Result<(), DbError> {
        self.run("move column", |engine| {
            let len = session.columns.len();
            for index in [from, to] {
                if index >= len {
                    return Err(DbError::ColumnIndexOutOfRange { index, len });
                }
            }

            let mut ordered: Vec<ColumnId> = session.columns.iter().map(|c| c.id).collect();
            let moved = ordered.remove(from);
            ordered.insert(to, moved);

            let mut tx = engine
                .store
                .transaction(&[StoreName::Columns], TxMode::ReadWrite);
            for (order, id) in ordered.into_iter().enumerate() {
                let mut column = tx
                    .get::<Column>(id)?
                    .ok_or(DbError::ColumnNotFound { column: id })?;
                if column.order != order {
                    column.order = order;
                    tx.put(column)?;
                }
            }
            tx.commit()?;
            engine.reload_columns(session)
        })
    }
}

/// Deletes a column inside `tx`, capturing what undo needs to restore it.
pub(super) fn remove_column(
    tx: &mut Transaction<'_>,
    column_id: ColumnId,
) -> Result<DeleteColumnData, DbError> {
    let column = tx
        .get::<Column>(column_id)?
        .ok_or(DbError::ColumnNotFound { column: column_id })?;

    let mut captured = Vec::new();
    let records: Vec<Record> = tx.get_all_by_index(IndexName::TableId, column.table_id)?;
    for mut record in records {
        if let Some(value) = record.data.remove(&column_id) {
            captured.push(RecordValue {
                record_id: record.id,
                value,
            });
            tx.put(record)?;
        }
    }

    tx.delete::<Column>(column_id)?;
    renumber_columns(tx, column.table_id, None)?;

    Ok(DeleteColumnData {
        column,
        records: captured,
    })
}

/// Re-inserts a deleted column with its identity, position and values.
pub(super) fn restore_column(
    tx: &mut Transaction<'_>,
    data: &DeleteColumnData,
) -> Result<(), DbError> {
    let column = &data.column;
    tx.add_with_key(column.clone())?;
    renumber_columns(tx, column.table_id, Some(column))?;

    for captured in &data.records {
        match tx.get::<Record>(captured.record_id)? {
            Some(mut record) => {
                record.data.insert(column.id, captured.value.clone());
                tx.put(record)?;
            }
            None => tracing::debug!(
                "Record {} no longer exists, value for column {} not restored",
                captured.record_id,
                column.id
            ),
        }
    }
    Ok(())
}

/// Rewrites sibling orders to `0..n`, placing `pinned` at its own order.
pub(super) fn renumber_columns(
    tx: &mut Transaction<'_>,
    table_id: TableId,
    pinned: Option<&Column>,
) -> Result<(), DbError> {
    let mut columns: Vec<Column> = tx.get_all_by_index(IndexName::TableId, table_id)?;
    let pinned = pinned.and_then(|pinned| {
        let index = columns.iter().position(|c| c.id == pinned.id)?;
        Some(columns.remove(index))
    });
    columns.sort_by_key(|column| (column.order, column.id));

    if let Some(pinned) = pinned {
        let at = pinned.order.min(columns.len());
        columns.insert(at, pinned);
    }

    for (order, mut column) in columns.into_iter().enumerate() {
        if column.order != order {
            column.order = order;
            tx.put(column)?;
        }
    }
    Ok(())
}
