//! Durable key → string storage used for the history snapshot.

use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::config::DbConfig;
use crate::error::DbError;

use super::persistence_manager::PersistenceManager;

/// Key-string area with write-through persistence.
///
/// A write is only applied in memory once it reached disk, so a failed
/// `set_item` leaves the previous value readable.
#[derive(Debug, Default)]
pub struct KeyValueArea {
    entries: RwLock<BTreeMap<String, String>>,
    persistence: Option<PersistenceManager>,
}

impl KeyValueArea {
    /// Creates an area that is never written to disk.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Opens the area persisted under `config.data_dir`.
    pub fn open(config: &DbConfig) -> Result<Self, DbError> {
        let persistence = PersistenceManager::new(config);
        let entries = persistence.load_kv()?;
        tracing::debug!("Opened key-string area with {} keys", entries.len());
        Ok(Self {
            entries: RwLock::new(entries),
            persistence: Some(persistence),
        })
    }

    /// Returns the string stored under `key`.
    pub fn get_item(&self, key: &str) -> Result<Option<String>, DbError> {
        let entries = self.entries.read().map_err(|_| DbError::LockPoisoned)?;
        Ok(entries.get(key).cloned())
    }

    /// Stores `value` under `key`.
    pub fn set_item(&self, key: &str, value: impl Into<String>) -> Result<(), DbError> {
        let value = value.into();
        self.update(|entries| {
            entries.insert(key.to_string(), value);
        })
    }

    /// Removes `key`. Removing an absent key is not an error.
    pub fn remove_item(&self, key: &str) -> Result<(), DbError> {
        self.update(|entries| {
            entries.remove(key);
        })
    }

    /// Returns all keys in order.
    pub fn keys(&self) -> Result<Vec<String>, DbError> {
        let entries = self.entries.read().map_err(|_| DbError::LockPoisoned)?;
        Ok(entries.keys().cloned().collect())
    }

    fn update(&self, apply: impl FnOnce(&mut BTreeMap<String, String>)) -> Result<(), DbError> {
        let mut entries = self.entries.write().map_err(|_| DbError::LockPoisoned)?;
        let mut next = entries.clone();
        apply(&mut next);
        if let Some(persistence) = &self.persistence {
            persistence.save_kv(&next)?;
        }
        *entries = next;
        Ok(())
    }
}
