//! Record operations: add, update, delete and renumber.

use std::collections::HashMap;

use super::Engine;
use crate::error::DbError;
use crate::history::{Action, DeleteRowData};
use crate::model::{Column, ColumnId, Record, RecordData, RecordId, TableId};
use crate::session::Session;
use crate::store::{IndexName, StoreName};
use crate::transaction::{Transaction, TxMode};
use crate::value::Value;

/// Options for record updates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOptions {
    /// Suppresses the success notification
    pub silent: bool,
}

impl UpdateOptions {
    pub fn silent() -> Self {
        Self { silent: true }
    }
}

fn current_table(session: &Session) -> Result<TableId, DbError> {
    session.current_table_id.ok_or(DbError::NoTableSelected)
}

/// Stages a record keyed one past the largest record identity in `tx`.
pub(super) fn insert_record_with_data(
    tx: &mut Transaction<'_>,
    table_id: TableId,
    data: RecordData,
) -> Result<RecordId, DbError> {
    let id = tx.max_key::<Record>()?.unwrap_or(0) + 1;
    let mut record = Record::new(table_id, data);
    record.id = id;
    tx.add_with_key(record)?;
    Ok(id)
}

impl Engine {
    /// Adds an empty row to the current table.
    ///
    /// Every loaded column gets an empty value; the store assigns the identity.
    pub fn add_row(&mut self, session: &mut Session) -> Result<RecordId, DbError> {
        let id = self.run("add row", |engine| {
            let table_id = current_table(session)?;
            let data: RecordData = session
                .columns
                .iter()
                .map(|column| (column.id, Value::empty()))
                .collect();

            let mut tx = engine
                .store
                .transaction(&[StoreName::Records], TxMode::ReadWrite);
            let id = tx.add(Record::new(table_id, data))?;
            tx.commit()?;

            tracing::debug!("Added row {} to table {}", id, table_id);
            engine.reload_records(session)?;
            Ok(id)
        })?;
        self.notify_success("Row added");
        Ok(id)
    }

    /// Adds a row with the given data to the current table.
    ///
    /// The identity is one past the largest record identity in the store.
    pub fn add_row_with_data(
        &mut self,
        session: &mut Session,
        data: RecordData,
    ) -> Result<RecordId, DbError> {
        let id = self.run("add row", |engine| {
            let table_id = current_table(session)?;
            let mut tx = engine
                .store
                .transaction(&[StoreName::Records], TxMode::ReadWrite);
            let id = insert_record_with_data(&mut tx, table_id, data)?;
            tx.commit()?;
            engine.reload_records(session)?;
            Ok(id)
        })?;
        self.notify_success("Row added");
        Ok(id)
    }

    /// Replaces a record's data and patches the session cache in place.
    pub fn update_record(
        &mut self,
        session: &mut Session,
        record_id: RecordId,
        data: RecordData,
        options: UpdateOptions,
    ) -> Result<(), DbError> {
        self.run("update record", |engine| {
            let mut tx = engine
                .store
                .transaction(&[StoreName::Records], TxMode::ReadWrite);
            let mut record = tx
                .get::<Record>(record_id)?
                .ok_or(DbError::RecordNotFound { record: record_id })?;
            record.data = data;
            tx.put(record.clone())?;
            tx.commit()?;

            if let Some(cached) = session.records.iter_mut().find(|r| r.id == record_id) {
                *cached = record;
            }
            Ok(())
        })?;
        if !options.silent {
            self.notify_success("Record updated");
        }
        Ok(())
    }

    /// Sets one cell of a record in the current table.
    ///
    /// A non-empty value must pass the column type's validation.
    pub fn update_cell(
        &mut self,
        session: &mut Session,
        record_id: RecordId,
        column_id: ColumnId,
        value: Value,
        options: UpdateOptions,
    ) -> Result<(), DbError> {
        let data = self.run("update cell", |engine| {
            let table_id = current_table(session)?;
            let tx = engine.store.transaction(
                &[StoreName::Columns, StoreName::Records],
                TxMode::ReadOnly,
            );
            let column = tx
                .get::<Column>(column_id)?
                .filter(|column| column.table_id == table_id)
                .ok_or(DbError::ColumnNotFound { column: column_id })?;
            if !value.is_empty() && !column.column_type.validate(&value) {
                return Err(DbError::validation(format!(
                    "'{}' is not a valid {} value",
                    value,
                    column.column_type.label()
                )));
            }

            let mut record = tx
                .get::<Record>(record_id)?
                .ok_or(DbError::RecordNotFound { record: record_id })?;
            record.data.insert(column_id, value);
            Ok(record.data)
        })?;
        self.update_record(session, record_id, data, options)
    }

    /// Deletes a record and records the deletion for undo.
    ///
    /// Remaining identities are left untouched.
    pub fn delete_record(&mut self, session: &mut Session, record_id: RecordId) -> Result<(), DbError> {
        self.run("delete record", |engine| {
            let mut tx = engine
                .store
                .transaction(&[StoreName::Records], TxMode::ReadWrite);
            let record = tx
                .get::<Record>(record_id)?
                .ok_or(DbError::RecordNotFound { record: record_id })?;
            tx.delete::<Record>(record_id)?;
            tx.commit()?;

            let table_id = record.table_id;
            session.records.retain(|r| r.id != record_id);
            engine
                .history
                .add_action(Action::DeleteRow(DeleteRowData { record }));
            engine.observer.table_data_reloaded(table_id);
            Ok(())
        })?;
        self.notify_success("Row deleted");
        Ok(())
    }

    /// Renumbers the current table's records to `1..=n` in session order.
    ///
    /// # Returns
    /// `Result<usize, DbError>` with the number of renumbered records.
    /// Fails with `KeyConflict` if a target identity belongs to a record
    /// of another table.
    pub fn reindex_records(&mut self, session: &mut Session) -> Result<usize, DbError> {
        let count = self.run("reindex records", |engine| {
            let table_id = current_table(session)?;
            let position: HashMap<RecordId, usize> = session
                .records
                .iter()
                .enumerate()
                .map(|(i, record)| (record.id, i))
                .collect();

            let mut tx = engine
                .store
                .transaction(&[StoreName::Records], TxMode::ReadWrite);
            let mut records: Vec<Record> = tx.get_all_by_index(IndexName::TableId, table_id)?;
            records.sort_by_key(|record| {
                (position.get(&record.id).copied().unwrap_or(usize::MAX), record.id)
            });

            for record in &records {
                tx.delete::<Record>(record.id)?;
            }
            let count = records.len();
            for (index, mut record) in records.into_iter().enumerate() {
                record.id = index as RecordId + 1;
                tx.add_with_key(record)?;
            }
            tx.commit()?;

            tracing::debug!("Reindexed {} records of table {}", count, table_id);
            engine.reload_records(session)?;
            Ok(count)
        })?;
        self.notify_success("Records reindexed");
        Ok(count)
    }
}
