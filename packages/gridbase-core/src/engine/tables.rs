//! Table lifecycle: create, list, select and cascade delete.

use super::Engine;
use crate::error::DbError;
use crate::history::{Action, DeleteTableData};
use crate::model::{Column, Record, Table, TableId};
use crate::session::Session;
use crate::store::{IndexName, StoreName};
use crate::transaction::{Transaction, TxMode};

/// Stages a new table in `tx`.
pub(super) fn insert_table(tx: &mut Transaction<'_>, name: &str) -> Result<TableId, DbError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DbError::validation("Table name cannot be empty"));
    }
    let id = tx.add(Table::new(name))?;
    tracing::debug!("Created table {} '{}'", id, name);
    Ok(id)
}

impl Engine {
    /// Creates a table and makes it the session's current table.
    pub fn create_table(&mut self, session: &mut Session, name: &str) -> Result<TableId, DbError> {
        let id = self.run("create table", |engine| {
            let mut tx = engine
                .store
                .transaction(&[StoreName::Tables], TxMode::ReadWrite);
            let id = insert_table(&mut tx, name)?;
            tx.commit()?;
            session.current_table_id = Some(id);
            session.current_sort = None;
            engine.refresh(session)?;
            Ok(id)
        })?;
        self.notify_success(&format!("Table '{}' created", name.trim()));
        Ok(id)
    }

    /// Returns every table in identity order.
    pub fn list_tables(&self) -> Result<Vec<Table>, DbError> {
        let tx = self.store.transaction(&[StoreName::Tables], TxMode::ReadOnly);
        tx.get_all()
    }

    /// Refreshes the session's table list.
    ///
    /// Selects the first table when nothing is selected or the selected
    /// table no longer exists, and loads its data when the selection changed.
    pub fn load_tables(&mut self, session: &mut Session) -> Result<(), DbError> {
        self.run("load tables", |engine| {
            if engine.select_tables(session)? {
                engine.reload_table(session)?;
            }
            Ok(())
        })
    }

    /// Loads the table list, returning whether the selection changed.
    pub(super) fn select_tables(&self, session: &mut Session) -> Result<bool, DbError> {
        session.tables = self.list_tables()?;

        let current_exists = session
            .current_table_id
            .is_some_and(|id| session.tables.iter().any(|table| table.id == id));
        if current_exists {
            return Ok(false);
        }

        let selected = session.tables.first().map(|table| table.id);
        let changed = selected != session.current_table_id;
        if changed {
            session.clear_table();
            session.current_table_id = selected;
        }
        Ok(changed)
    }

    /// Makes another table current and loads its data.
    pub fn switch_table(&mut self, session: &mut Session, table_id: TableId) -> Result<(), DbError> {
        self.run("switch table", |engine| {
            let tx = engine
                .store
                .transaction(&[StoreName::Tables], TxMode::ReadOnly);
            if tx.get::<Table>(table_id)?.is_none() {
                return Err(DbError::TableNotFound { table: table_id });
            }
            drop(tx);

            if session.current_table_id != Some(table_id) {
                session.clear_table();
                session.current_table_id = Some(table_id);
            }
            engine.reload_table(session)
        })
    }

    /// Reloads the current table's columns and records.
    pub fn load_table_data(&mut self, session: &mut Session) -> Result<(), DbError> {
        self.run("load table data", |engine| engine.reload_table(session))
    }

    /// Deletes a table with all of its columns and records.
    pub fn delete_table(&mut self, session: &mut Session, table_id: TableId) -> Result<(), DbError> {
        self.run("delete table", |engine| {
            let mut tx = engine
                .store
                .transaction(&StoreName::ALL, TxMode::ReadWrite);
            let data = remove_table(&mut tx, table_id)?;
            tx.commit()?;

            tracing::debug!(
                "Deleted table {} '{}' ({} columns, {} records)",
                table_id,
                data.table.name,
                data.columns.len(),
                data.records.len()
            );
            engine.history.add_action(Action::DeleteTable(data));

            if session.current_table_id == Some(table_id) {
                session.clear_table();
            }
            engine.refresh(session)
        })?;
        self.notify_success("Table deleted");
        Ok(())
    }
}

/// Deletes a table and everything belonging to it inside `tx`.
pub(super) fn remove_table(
    tx: &mut Transaction<'_>,
    table_id: TableId,
) -> Result<DeleteTableData, DbError> {
    let table = tx
        .get::<Table>(table_id)?
        .ok_or(DbError::TableNotFound { table: table_id })?;
    let mut columns: Vec<Column> = tx.get_all_by_index(IndexName::TableId, table_id)?;
    columns.sort_by_key(|column| (column.order, column.id));
    let records: Vec<Record> = tx.get_all_by_index(IndexName::TableId, table_id)?;

    tx.delete::<Table>(table_id)?;
    for column in &columns {
        tx.delete::<Column>(column.id)?;
    }
    for record in &records {
        tx.delete::<Record>(record.id)?;
    }

    Ok(DeleteTableData {
        table,
        columns,
        records,
    })
}

/// Re-inserts a deleted table with its columns and records under their
/// original identities.
pub(super) fn restore_table(
    tx: &mut Transaction<'_>,
    data: &DeleteTableData,
) -> Result<(), DbError> {
    tx.add_with_key(data.table.clone())?;
    for column in &data.columns {
        tx.add_with_key(column.clone())?;
    }
    for record in &data.records {
        tx.add_with_key(record.clone())?;
    }
    Ok(())
}
