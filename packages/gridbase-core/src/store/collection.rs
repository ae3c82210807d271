use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::entity::{Entity, IndexKey, IndexName};
use crate::error::DbError;

/// Rows of one entity type keyed by identity, with an auto-increment
/// key generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection<T> {
    /// Next identity handed out by `insert_auto`
    next_id: u64,
    /// Rows ordered by identity
    rows: BTreeMap<u64, T>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self {
            next_id: 1, // Start IDs at 1
            rows: BTreeMap::new(),
        }
    }
}

impl<T: Entity> Collection<T> {
    /// Returns the row with the given identity.
    pub fn get(&self, id: u64) -> Option<&T> {
        self.rows.get(&id)
    }

    /// Returns whether a row with the given identity exists.
    pub fn contains(&self, id: u64) -> bool {
        self.rows.contains_key(&id)
    }

    /// Returns the number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns whether the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterates rows in identity order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.rows.values()
    }

    /// Returns the identity the key generator will hand out next.
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    /// Returns the largest identity in use.
    pub fn max_id(&self) -> Option<u64> {
        self.rows.keys().next_back().copied()
    }

    /// Returns rows whose index value equals `key`, in identity order.
    ///
    /// # Arguments
    /// * `index` - Secondary index to query
    /// * `key` - Index value to match
    ///
    /// # Returns
    /// `Result<Vec<&T>, DbError>`, failing if the index is not declared.
    pub fn find_by_index(&self, index: IndexName, key: &IndexKey) -> Result<Vec<&T>, DbError> {
        if !T::INDEXES.contains(&index) {
            return Err(DbError::UnknownIndex {
                store: T::STORE,
                index: index.as_str().to_string(),
            });
        }

        Ok(self
            .rows
            .values()
            .filter(|row| row.index_key(index).as_ref() == Some(key))
            .collect())
    }

    /// Inserts a row under a freshly generated identity.
    pub(crate) fn insert_auto(&mut self, mut row: T) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        row.set_id(id);
        self.rows.insert(id, row);
        id
    }

    /// Inserts a row under its own identity, failing if it is taken.
    ///
    /// A row without identity (0) gets a generated one.
    pub(crate) fn insert_new(&mut self, row: T) -> Result<u64, DbError> {
        let id = row.id();
        if id == 0 {
            return Ok(self.insert_auto(row));
        }
        if self.rows.contains_key(&id) {
            return Err(DbError::KeyConflict {
                store: T::STORE,
                key: id,
            });
        }
        self.advance_generator(id);
        self.rows.insert(id, row);
        Ok(id)
    }

    /// Inserts or replaces a row under its own identity.
    pub(crate) fn upsert(&mut self, row: T) -> u64 {
        let id = row.id();
        if id == 0 {
            return self.insert_auto(row);
        }
        self.advance_generator(id);
        self.rows.insert(id, row);
        id
    }

    /// Removes a row, returning it if present.
    pub(crate) fn remove(&mut self, id: u64) -> Option<T> {
        self.rows.remove(&id)
    }

    /// Repairs a key generator that lags behind stored identities.
    pub(crate) fn normalize(&mut self) {
        if let Some(max) = self.max_id() {
            self.advance_generator(max);
        }
        self.next_id = self.next_id.max(1);
    }

    fn advance_generator(&mut self, used: u64) {
        if used >= self.next_id {
            self.next_id = used + 1;
        }
    }
}
