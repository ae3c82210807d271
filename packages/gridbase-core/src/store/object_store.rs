use std::sync::{Arc, Mutex};

use arc_swap::ArcSwap;

use super::collection::Collection;
use super::entity::{Entity, StoreName};
use crate::config::DbConfig;
use crate::error::DbError;
use crate::model::{Column, Record, Table};
use crate::persistence::PersistenceManager;
use crate::transaction::{Transaction, TxMode};

/// Immutable snapshot of every collection.
///
/// Collections are shared between snapshots until a transaction writes
/// to them, at which point that collection alone is copied.
#[derive(Debug, Clone, Default)]
pub struct StoreState {
    /// Commit counter, bumped on every successful commit
    pub(crate) version: u64,
    pub(crate) tables: Arc<Collection<Table>>,
    pub(crate) columns: Arc<Collection<Column>>,
    pub(crate) records: Arc<Collection<Record>>,
}

impl StoreState {
    /// Returns the commit counter of this snapshot.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Returns the collection holding rows of type `T`.
    pub fn collection<T: Entity>(&self) -> &Collection<T> {
        T::collection(self)
    }

    pub fn tables(&self) -> &Collection<Table> {
        &self.tables
    }

    pub fn columns(&self) -> &Collection<Column> {
        &self.columns
    }

    pub fn records(&self) -> &Collection<Record> {
        &self.records
    }
}

/// Embedded transactional object store.
///
/// Readers load the current snapshot without locking. Writers stage their
/// changes in a [`Transaction`] and publish them with a single atomic swap.
#[derive(Debug)]
pub struct ObjectStore {
    /// Current committed snapshot
    state: ArcSwap<StoreState>,
    /// Serializes commits
    commit_lock: Mutex<()>,
    /// Durable snapshot writer (absent for in-memory stores)
    persistence: Option<PersistenceManager>,
}

impl ObjectStore {
    /// Creates an empty store that is never written to disk.
    pub fn in_memory() -> Self {
        Self::with_state(StoreState::default(), None)
    }

    /// Opens the store persisted under `config.data_dir`.
    ///
    /// A missing snapshot yields an empty store.
    ///
    /// # Arguments
    /// * `config` - Database configuration
    ///
    /// # Returns
    /// `Result<ObjectStore, DbError>` containing the opened store.
    pub fn open(config: &DbConfig) -> Result<Self, DbError> {
        let persistence = PersistenceManager::new(config);
        let state = persistence.load_store()?.unwrap_or_default();
        tracing::debug!(
            "Opened object store at {} (version {}, {} tables, {} columns, {} records)",
            persistence.data_dir().display(),
            state.version,
            state.tables.len(),
            state.columns.len(),
            state.records.len()
        );
        Ok(Self::with_state(state, Some(persistence)))
    }

    fn with_state(state: StoreState, persistence: Option<PersistenceManager>) -> Self {
        Self {
            state: ArcSwap::from_pointee(state),
            commit_lock: Mutex::new(()),
            persistence,
        }
    }

    /// Returns the current committed snapshot.
    pub fn snapshot(&self) -> Arc<StoreState> {
        self.state.load_full()
    }

    /// Returns the current commit counter.
    pub fn version(&self) -> u64 {
        self.state.load().version
    }

    /// Returns whether commits are written to disk.
    pub fn is_persistent(&self) -> bool {
        self.persistence.is_some()
    }

    /// Opens a transaction over the given collections.
    ///
    /// # Arguments
    /// * `scope` - Collections the transaction may touch
    /// * `mode` - Readonly or readwrite
    pub fn transaction(&self, scope: &[StoreName], mode: TxMode) -> Transaction<'_> {
        Transaction::begin(self, scope, mode)
    }

    /// Publishes a staged state if no other commit landed since `base_version`.
    ///
    /// The durable snapshot is written before the swap, so a failed write
    /// leaves the previous state in place.
    pub(crate) fn commit_state(
        &self,
        base_version: u64,
        mut staged: StoreState,
    ) -> Result<u64, DbError> {
        let _guard = self.commit_lock.lock().map_err(|_| DbError::LockPoisoned)?;

        let current_version = self.state.load().version;
        if current_version != base_version {
            return Err(DbError::TransactionConflict(format!(
                "store advanced from version {} to {} during the transaction",
                base_version, current_version
            )));
        }

        staged.version = base_version + 1;
        if let Some(persistence) = &self.persistence {
            persistence.save_store(&staged)?;
        }

        let version = staged.version;
        self.state.store(Arc::new(staged));
        Ok(version)
    }
}

impl Default for ObjectStore {
    fn default() -> Self {
        Self::in_memory()
    }
}
