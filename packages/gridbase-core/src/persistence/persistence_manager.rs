//! Durable snapshots of the object store and the key-string area.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_json::value::RawValue;

use crate::config::DbConfig;
use crate::error::DbError;
use crate::store::StoreState;

use super::io_utils::{read_optional, retry_io_operation, write_atomic};
use super::store_file::{checksum, Collections, CollectionsRef, StoreFile, STORE_FILE_VERSION};

/// File holding the object store snapshot.
pub const STORE_FILE: &str = "store.json";
/// File holding the key-string area.
pub const KV_FILE: &str = "kv.json";

/// Writes and reads the durable files under the data directory.
#[derive(Debug, Clone)]
pub struct PersistenceManager {
    /// Data directory path
    data_dir: PathBuf,
    /// Maximum retry attempts for transient I/O errors
    max_retries: u32,
    /// Delay between retry attempts in milliseconds
    retry_delay_ms: u64,
}

impl PersistenceManager {
    /// Creates a new persistence manager with the given configuration.
    pub fn new(config: &DbConfig) -> Self {
        Self {
            data_dir: config.data_dir.clone(),
            max_retries: config.persistence_max_retries,
            retry_delay_ms: config.persistence_retry_delay_ms,
        }
    }

    /// Returns the data directory.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Saves a store snapshot to `store.json`.
    ///
    /// # Arguments
    /// * `state` - Snapshot to save
    ///
    /// # Returns
    /// `Result<(), DbError>` indicating success or failure.
    pub fn save_store(&self, state: &StoreState) -> Result<(), DbError> {
        let collections = serde_json::to_string(&CollectionsRef::from(state))?;
        let file = StoreFile {
            version: STORE_FILE_VERSION,
            store_version: state.version,
            checksum: checksum(collections.as_bytes()),
            collections: RawValue::from_string(collections)?,
        };
        let contents = serde_json::to_vec(&file)?;

        retry_io_operation(
            || write_atomic(&self.data_dir, STORE_FILE, &contents),
            self.max_retries,
            self.retry_delay_ms,
            "save_store",
        )?;
        tracing::trace!("Saved store snapshot version {}", state.version);
        Ok(())
    }

    /// Loads the store snapshot, or `None` if none was saved yet.
    ///
    /// # Returns
    /// `Result<Option<StoreState>, DbError>`; fails with
    /// `DataCorruption` when the checksum does not match.
    pub fn load_store(&self) -> Result<Option<StoreState>, DbError> {
        let Some(contents) = self.read(STORE_FILE)? else {
            return Ok(None);
        };

        let file: StoreFile = serde_json::from_str(&contents).map_err(|e| {
            DbError::SerializationError(format!("Failed to parse {}: {}", STORE_FILE, e))
        })?;

        if file.version != STORE_FILE_VERSION {
            return Err(DbError::SerializationError(format!(
                "Unsupported store file version: {}",
                file.version
            )));
        }

        let actual = checksum(file.collections.get().as_bytes());
        if actual != file.checksum {
            tracing::error!(
                "Checksum mismatch in {}: expected {:#010x}, got {:#010x}",
                STORE_FILE,
                file.checksum,
                actual
            );
            return Err(DbError::DataCorruption(format!(
                "checksum mismatch in {}",
                STORE_FILE
            )));
        }

        let collections: Collections = serde_json::from_str(file.collections.get())
            .map_err(|e| DbError::DataCorruption(format!("Invalid collections: {}", e)))?;
        Ok(Some(collections.into_state(file.store_version)))
    }

    /// Saves the key-string area to `kv.json`.
    pub fn save_kv(&self, entries: &BTreeMap<String, String>) -> Result<(), DbError> {
        let contents = serde_json::to_vec_pretty(entries)?;
        retry_io_operation(
            || write_atomic(&self.data_dir, KV_FILE, &contents),
            self.max_retries,
            self.retry_delay_ms,
            "save_kv",
        )
    }

    /// Loads the key-string area; a missing file yields an empty area.
    pub fn load_kv(&self) -> Result<BTreeMap<String, String>, DbError> {
        match self.read(KV_FILE)? {
            Some(contents) => serde_json::from_str(&contents).map_err(|e| {
                DbError::SerializationError(format!("Failed to parse {}: {}", KV_FILE, e))
            }),
            None => Ok(BTreeMap::new()),
        }
    }

    fn read(&self, file_name: &str) -> Result<Option<String>, DbError> {
        retry_io_operation(
            || read_optional(&self.data_dir, file_name),
            self.max_retries,
            self.retry_delay_ms,
            file_name,
        )
    }
}
