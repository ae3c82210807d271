//! Schema, table and record operations over the object store, with
//! undo/redo of recorded actions.

mod columns;
mod records;
mod replay;
mod tables;
mod transfer;

pub use columns::{validate_column_name, TypeChange};
pub use records::UpdateOptions;
pub use transfer::{infer_column_type, ImportColumn, ImportData, TableExport, RECORD_NUMBER_COLUMN};

use std::sync::Arc;

use crate::config::DbConfig;
use crate::error::DbError;
use crate::history::ActionHistory;
use crate::model::{Column, Record, TableId};
use crate::observer::{EngineObserver, NoopObserver, NotificationLevel};
use crate::persistence::KeyValueArea;
use crate::session::Session;
use crate::store::{IndexName, ObjectStore, StoreName};
use crate::transaction::TxMode;

/// Local data engine.
///
/// Owns the object store, the key-string area and the action history.
/// Mutations take `&mut self` and the caller's [`Session`], which is
/// reloaded from the store after each successful operation.
pub struct Engine {
    store: Arc<ObjectStore>,
    kv: Arc<KeyValueArea>,
    history: ActionHistory,
    observer: Arc<dyn EngineObserver>,
    config: DbConfig,
}

impl Engine {
    /// Opens the engine over the files in `config.data_dir`.
    ///
    /// # Arguments
    /// * `config` - Database configuration
    ///
    /// # Returns
    /// `Result<Engine, DbError>`, failing if the persisted snapshot is
    /// unreadable or corrupt.
    pub fn open(config: DbConfig) -> Result<Self, DbError> {
        let store = Arc::new(ObjectStore::open(&config)?);
        let kv = Arc::new(KeyValueArea::open(&config)?);
        Ok(Self::assemble(store, kv, config))
    }

    /// Creates an engine that keeps everything in memory.
    pub fn in_memory(config: DbConfig) -> Self {
        Self::assemble(
            Arc::new(ObjectStore::in_memory()),
            Arc::new(KeyValueArea::in_memory()),
            config,
        )
    }

    fn assemble(store: Arc<ObjectStore>, kv: Arc<KeyValueArea>, config: DbConfig) -> Self {
        let history = ActionHistory::load(kv.clone(), &config);
        Self {
            store,
            kv,
            history,
            observer: Arc::new(NoopObserver),
            config,
        }
    }

    /// Replaces the observer receiving reload and notification events.
    pub fn with_observer(mut self, observer: Arc<dyn EngineObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &DbConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<ObjectStore> {
        &self.store
    }

    pub fn kv(&self) -> &Arc<KeyValueArea> {
        &self.kv
    }

    pub fn history(&self) -> &ActionHistory {
        &self.history
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Returns the columns of a table sorted by `order`.
    pub fn load_columns(&self, table_id: TableId) -> Result<Vec<Column>, DbError> {
        let tx = self.store.transaction(&[StoreName::Columns], TxMode::ReadOnly);
        let mut columns: Vec<Column> = tx.get_all_by_index(IndexName::TableId, table_id)?;
        columns.sort_by_key(|column| (column.order, column.id));
        Ok(columns)
    }

    /// Returns the records of a table in identity order.
    pub fn load_records(&self, table_id: TableId) -> Result<Vec<Record>, DbError> {
        let tx = self.store.transaction(&[StoreName::Records], TxMode::ReadOnly);
        tx.get_all_by_index(IndexName::TableId, table_id)
    }

    /// Reverts the most recently applied action.
    ///
    /// # Returns
    /// `Ok(false)` when there is nothing to undo. On failure the store
    /// and the cursor are unchanged.
    pub fn undo(&mut self, session: &mut Session) -> Result<bool, DbError> {
        let Some(action) = self.history.undo_target().cloned() else {
            return Ok(false);
        };

        let result = {
            let mut tx = self.store.transaction(&StoreName::ALL, TxMode::ReadWrite);
            replay::apply_inverse(&mut tx, &action).and_then(|()| tx.commit())
        };
        if let Err(e) = result {
            tracing::warn!("Undo of {} failed: {}", action.kind(), e);
            self.observer
                .notify(NotificationLevel::Warning, &format!("Undo failed: {}", e));
            return Err(e);
        }

        self.history.mark_undone();
        tracing::debug!("Undid {}", action.describe());
        self.refresh(session)?;
        self.observer
            .notify(NotificationLevel::Success, "Action undone");
        Ok(true)
    }

    /// Re-applies the most recently undone action.
    ///
    /// # Returns
    /// `Ok(false)` when there is nothing to redo. On failure the store
    /// and the cursor are unchanged.
    pub fn redo(&mut self, session: &mut Session) -> Result<bool, DbError> {
        let Some(action) = self.history.redo_target().cloned() else {
            return Ok(false);
        };

        let result = {
            let mut tx = self.store.transaction(&StoreName::ALL, TxMode::ReadWrite);
            replay::apply_forward(&mut tx, &action).and_then(|()| tx.commit())
        };
        if let Err(e) = result {
            tracing::warn!("Redo of {} failed: {}", action.kind(), e);
            self.observer
                .notify(NotificationLevel::Warning, &format!("Redo failed: {}", e));
            return Err(e);
        }

        self.history.mark_redone();
        tracing::debug!("Redid {}", action.describe());
        self.refresh(session)?;
        self.observer
            .notify(NotificationLevel::Success, "Action redone");
        Ok(true)
    }

    /// Drops the whole undo/redo history.
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Runs an operation, logging and reporting its failure.
    fn run<T>(
        &mut self,
        operation: &str,
        f: impl FnOnce(&mut Self) -> Result<T, DbError>,
    ) -> Result<T, DbError> {
        f(self).inspect_err(|e| {
            match e {
                DbError::Validation(_) => tracing::warn!("Failed to {}: {}", operation, e),
                _ => tracing::error!("Failed to {}: {}", operation, e),
            }
            self.observer.notify(
                NotificationLevel::Error,
                &format!("Failed to {}: {}", operation, e),
            );
        })
    }

    fn notify_success(&self, message: &str) {
        self.observer.notify(NotificationLevel::Success, message);
    }

    /// Reloads the table list and the current table's data.
    fn refresh(&self, session: &mut Session) -> Result<(), DbError> {
        self.select_tables(session)?;
        self.reload_table(session)
    }

    /// Reloads the current table's columns and records.
    fn reload_table(&self, session: &mut Session) -> Result<(), DbError> {
        let Some(table_id) = session.current_table_id else {
            session.columns.clear();
            session.records.clear();
            return Ok(());
        };
        session.columns = self.load_columns(table_id)?;
        session.records = self.load_records(table_id)?;
        self.observer.table_data_reloaded(table_id);
        Ok(())
    }

    fn reload_columns(&self, session: &mut Session) -> Result<(), DbError> {
        if let Some(table_id) = session.current_table_id {
            session.columns = self.load_columns(table_id)?;
        }
        Ok(())
    }

    fn reload_records(&self, session: &mut Session) -> Result<(), DbError> {
        if let Some(table_id) = session.current_table_id {
            session.records = self.load_records(table_id)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("store", &self.store)
            .field("history", &self.history)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
