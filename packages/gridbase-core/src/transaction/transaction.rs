use std::sync::Arc;

use crate::error::DbError;
use crate::store::{Entity, IndexKey, IndexName, ObjectStore, StoreName, StoreState};

use super::change::Change;

/// Access mode of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxMode {
    ReadOnly,
    ReadWrite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TxState {
    Active,
    Committed,
    Aborted,
}

/// Unit of work over a subset of the object store's collections.
///
/// Writes are staged against a private copy of the touched collections and
/// become visible only through [`Transaction::commit`]. Dropping an active
/// transaction aborts it.
#[derive(Debug)]
pub struct Transaction<'a> {
    /// Store the transaction commits into
    store: &'a ObjectStore,
    /// Collections this transaction may touch
    scope: Vec<StoreName>,
    /// Access mode
    mode: TxMode,
    /// Store version the staged state was copied from
    base_version: u64,
    /// Snapshot with staged writes applied
    staged: StoreState,
    /// Writes staged so far
    changes: Vec<Change>,
    state: TxState,
}

impl<'a> Transaction<'a> {
    pub(crate) fn begin(store: &'a ObjectStore, scope: &[StoreName], mode: TxMode) -> Self {
        let base = store.snapshot();
        tracing::trace!(
            "Begin {:?} transaction over {:?} at version {}",
            mode,
            scope,
            base.version()
        );
        Self {
            store,
            scope: scope.to_vec(),
            mode,
            base_version: base.version(),
            staged: StoreState::clone(&base),
            changes: Vec::new(),
            state: TxState::Active,
        }
    }

    /// Returns the access mode.
    pub fn mode(&self) -> TxMode {
        self.mode
    }

    /// Returns the collections in scope.
    pub fn scope(&self) -> &[StoreName] {
        &self.scope
    }

    /// Returns the writes staged so far.
    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    /// Returns whether any write has been staged.
    pub fn has_staged_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    /// Reads a row by identity.
    pub fn get<T: Entity>(&self, id: u64) -> Result<Option<T>, DbError> {
        self.check_scope(T::STORE)?;
        Ok(self.staged.collection::<T>().get(id).cloned())
    }

    /// Reads every row of a collection in identity order.
    pub fn get_all<T: Entity>(&self) -> Result<Vec<T>, DbError> {
        self.check_scope(T::STORE)?;
        Ok(self.staged.collection::<T>().iter().cloned().collect())
    }

    /// Reads the rows matching a secondary index key, in identity order.
    ///
    /// # Arguments
    /// * `index` - Index declared on the collection
    /// * `key` - Value to match
    ///
    /// # Returns
    /// `Result<Vec<T>, DbError>` with the matching rows.
    pub fn get_all_by_index<T: Entity>(
        &self,
        index: IndexName,
        key: impl Into<IndexKey>,
    ) -> Result<Vec<T>, DbError> {
        self.check_scope(T::STORE)?;
        let key = key.into();
        Ok(self
            .staged
            .collection::<T>()
            .find_by_index(index, &key)?
            .into_iter()
            .cloned()
            .collect())
    }

    /// Returns the largest identity currently used in a collection.
    pub fn max_key<T: Entity>(&self) -> Result<Option<u64>, DbError> {
        self.check_scope(T::STORE)?;
        Ok(self.staged.collection::<T>().max_id())
    }

    /// Inserts a row under a newly generated identity.
    ///
    /// # Returns
    /// `Result<u64, DbError>` containing the assigned identity.
    pub fn add<T: Entity>(&mut self, mut row: T) -> Result<u64, DbError> {
        self.check_write(T::STORE)?;
        row.set_id(0);
        let key = Arc::make_mut(T::collection_mut(&mut self.staged)).insert_auto(row);
        self.changes.push(Change::Add {
            store: T::STORE,
            key,
        });
        Ok(key)
    }

    /// Inserts a row under its own identity.
    ///
    /// Fails with [`DbError::KeyConflict`] if the identity is taken.
    pub fn add_with_key<T: Entity>(&mut self, row: T) -> Result<u64, DbError> {
        self.check_write(T::STORE)?;
        let key = Arc::make_mut(T::collection_mut(&mut self.staged)).insert_new(row)?;
        self.changes.push(Change::Add {
            store: T::STORE,
            key,
        });
        Ok(key)
    }

    /// Inserts or replaces a row under its own identity.
    pub fn put<T: Entity>(&mut self, row: T) -> Result<u64, DbError> {
        self.check_write(T::STORE)?;
        let key = Arc::make_mut(T::collection_mut(&mut self.staged)).upsert(row);
        self.changes.push(Change::Put {
            store: T::STORE,
            key,
        });
        Ok(key)
    }

    /// Removes a row. Removing an absent identity is not an error.
    pub fn delete<T: Entity>(&mut self, id: u64) -> Result<(), DbError> {
        self.check_write(T::STORE)?;
        let existed = Arc::make_mut(T::collection_mut(&mut self.staged))
            .remove(id)
            .is_some();
        self.changes.push(Change::Delete {
            store: T::STORE,
            key: id,
            existed,
        });
        Ok(())
    }

    /// Commits all staged writes atomically.
    ///
    /// # Returns
    /// `Result<(), DbError>`; on error nothing staged becomes visible.
    pub fn commit(mut self) -> Result<(), DbError> {
        if self.changes.is_empty() {
            self.state = TxState::Committed;
            return Ok(());
        }

        let staged = std::mem::take(&mut self.staged);
        match self.store.commit_state(self.base_version, staged) {
            Ok(version) => {
                self.state = TxState::Committed;
                tracing::debug!(
                    "Committed {} changes over {:?} (version {})",
                    self.changes.len(),
                    self.scope,
                    version
                );
                Ok(())
            }
            Err(e) => {
                self.state = TxState::Aborted;
                tracing::debug!("Commit failed, {} changes discarded: {}", self.changes.len(), e);
                Err(e)
            }
        }
    }

    /// Aborts the transaction, discarding all staged writes.
    pub fn abort(mut self) {
        self.discard();
    }

    fn discard(&mut self) {
        if self.state == TxState::Active {
            self.state = TxState::Aborted;
            if !self.changes.is_empty() {
                tracing::debug!("Aborted transaction with {} staged changes", self.changes.len());
            }
            self.changes.clear();
        }
    }

    fn check_scope(&self, store: StoreName) -> Result<(), DbError> {
        if self.scope.contains(&store) {
            Ok(())
        } else {
            Err(DbError::OutOfScope(store))
        }
    }

    fn check_write(&self, store: StoreName) -> Result<(), DbError> {
        self.check_scope(store)?;
        match self.mode {
            TxMode::ReadWrite => Ok(()),
            TxMode::ReadOnly => Err(DbError::ReadOnlyTransaction),
        }
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        self.discard();
    }
}
