//! Bulk import into a new table and export of a whole table.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use super::columns::insert_column;
use super::records::insert_record_with_data;
use super::tables::insert_table;
use super::Engine;
use crate::error::DbError;
use crate::model::{Column, Record, RecordData, Table, TableId};
use crate::session::Session;
use crate::store::{IndexName, StoreName};
use crate::transaction::TxMode;
use crate::types::{email_pattern, parse_date, parse_number, ColumnType};
use crate::value::Value;

/// Name of the leading number column every imported table gets.
pub const RECORD_NUMBER_COLUMN: &str = "Record #";

/// Column of an import, with an optional explicit type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportColumn {
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub column_type: Option<ColumnType>,
}

/// Parsed tabular data ready to become a table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportData {
    pub columns: Vec<ImportColumn>,
    /// Rows keyed by column name
    pub rows: Vec<BTreeMap<String, Value>>,
}

impl ImportData {
    /// Checks that there is at least one column and one row and that
    /// column names are present, distinct and not the record number
    /// column's name.
    pub fn validate(&self) -> Result<(), DbError> {
        if self.columns.is_empty() {
            return Err(DbError::validation("No columns found in import data"));
        }
        if self.rows.is_empty() {
            return Err(DbError::validation("No rows found in import data"));
        }
        if self.columns.iter().any(|column| column.name.trim().is_empty()) {
            return Err(DbError::validation("Invalid column name in import data"));
        }

        let mut seen = HashSet::with_capacity(self.columns.len());
        for column in &self.columns {
            let name = column.name.trim();
            if name == RECORD_NUMBER_COLUMN {
                return Err(DbError::validation(format!(
                    "Column name '{}' is reserved",
                    RECORD_NUMBER_COLUMN
                )));
            }
            if !seen.insert(name) {
                return Err(DbError::validation(format!(
                    "Duplicate column name '{}' in import data",
                    name
                )));
            }
        }
        Ok(())
    }

    /// Builds import data from an export, leaving out the record number
    /// column that every import recreates.
    pub fn from_export(export: &TableExport) -> Self {
        let columns: Vec<&Column> = export
            .columns
            .iter()
            .filter(|column| column.name != RECORD_NUMBER_COLUMN)
            .collect();

        let rows = export
            .records
            .iter()
            .map(|record| {
                columns
                    .iter()
                    .map(|column| {
                        let value = record.value(column.id).cloned().unwrap_or_else(Value::empty);
                        (column.name.clone(), value)
                    })
                    .collect()
            })
            .collect();

        Self {
            columns: columns
                .into_iter()
                .map(|column| ImportColumn {
                    name: column.name.clone(),
                    column_type: Some(column.column_type),
                })
                .collect(),
            rows,
        }
    }

    fn column_type_of(&self, column: &ImportColumn) -> ColumnType {
        column.column_type.unwrap_or_else(|| {
            self.rows
                .first()
                .and_then(|row| row.get(&column.name))
                .map(infer_column_type)
                .unwrap_or(ColumnType::Text)
        })
    }
}

/// A table with its columns in order and its records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableExport {
    pub table: Table,
    pub columns: Vec<Column>,
    pub records: Vec<Record>,
}

/// Guesses a column type from a sample value.
pub fn infer_column_type(value: &Value) -> ColumnType {
    match value {
        Value::Number(_) => ColumnType::Number,
        Value::Text(text) => {
            let text = text.trim();
            let trimmed = Value::from(text);
            if text.is_empty() {
                ColumnType::Text
            } else if parse_date(&trimmed).is_ok() {
                ColumnType::Date
            } else if parse_number(&trimmed).is_ok() {
                ColumnType::Number
            } else if email_pattern().is_match(text) {
                ColumnType::Email
            } else {
                ColumnType::Text
            }
        }
        Value::Null | Value::Bool(_) => ColumnType::Text,
    }
}

impl Engine {
    /// Creates a table from import data and makes it current.
    ///
    /// The table gets a leading `Record #` number column, then one column
    /// per import column, then one record per row with its values as text.
    /// Everything is written in one transaction, so a failure leaves the
    /// store unchanged.
    pub fn import_table(
        &mut self,
        session: &mut Session,
        name: &str,
        data: &ImportData,
    ) -> Result<TableId, DbError> {
        let table_id = self.run("import table", |engine| {
            data.validate()?;
            let mut tx = engine.store.transaction(&StoreName::ALL, TxMode::ReadWrite);
            let table_id = insert_table(&mut tx, name)?;
            insert_column(&mut tx, table_id, RECORD_NUMBER_COLUMN, ColumnType::Number)?;

            let mut column_ids = Vec::with_capacity(data.columns.len());
            for column in &data.columns {
                let column_type = data.column_type_of(column);
                column_ids.push(insert_column(&mut tx, table_id, &column.name, column_type)?);
            }

            for row in &data.rows {
                let record: RecordData = data
                    .columns
                    .iter()
                    .zip(&column_ids)
                    .map(|(column, id)| {
                        let value = match row.get(&column.name) {
                            Some(value) if !value.is_empty() => Value::Text(value.to_text()),
                            _ => Value::empty(),
                        };
                        (*id, value)
                    })
                    .collect();
                insert_record_with_data(&mut tx, table_id, record)?;
            }
            tx.commit()?;

            tracing::debug!(
                "Imported table {} with {} columns and {} rows",
                table_id,
                data.columns.len(),
                data.rows.len()
            );
            session.clear_table();
            session.current_table_id = Some(table_id);
            engine.refresh(session)?;
            Ok(table_id)
        })?;
        self.notify_success(&format!("Imported {} rows", data.rows.len()));
        Ok(table_id)
    }

    /// Returns a table with its columns in order and its records.
    pub fn export_table(&self, table_id: TableId) -> Result<TableExport, DbError> {
        let tx = self.store.transaction(&StoreName::ALL, TxMode::ReadOnly);
        let table = tx
            .get::<Table>(table_id)?
            .ok_or(DbError::TableNotFound { table: table_id })?;
        let mut columns: Vec<Column> = tx.get_all_by_index(IndexName::TableId, table_id)?;
        columns.sort_by_key(|column| (column.order, column.id));
        let records: Vec<Record> = tx.get_all_by_index(IndexName::TableId, table_id)?;

        Ok(TableExport {
            table,
            columns,
            records,
        })
    }
}
