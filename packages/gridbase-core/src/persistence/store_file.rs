//! On-disk layout of the object store snapshot.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use crate::model::{Column, Record, Table};
use crate::store::{Collection, StoreState};

/// Current layout version of `store.json`.
pub const STORE_FILE_VERSION: u32 = 1;

/// Contents of `store.json`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreFile {
    /// Layout version
    pub version: u32,
    /// Commit counter of the saved snapshot
    pub store_version: u64,
    /// crc32 of the serialized `collections` text
    pub checksum: u32,
    /// Collections, kept verbatim so the checksum covers the exact bytes
    pub collections: Box<RawValue>,
}

#[derive(Serialize)]
pub(crate) struct CollectionsRef<'a> {
    pub tables: &'a Collection<Table>,
    pub columns: &'a Collection<Column>,
    pub records: &'a Collection<Record>,
}

impl<'a> From<&'a StoreState> for CollectionsRef<'a> {
    fn from(state: &'a StoreState) -> Self {
        Self {
            tables: &state.tables,
            columns: &state.columns,
            records: &state.records,
        }
    }
}

#[derive(Deserialize)]
pub(crate) struct Collections {
    #[serde(default)]
    pub tables: Collection<Table>,
    #[serde(default)]
    pub columns: Collection<Column>,
    #[serde(default)]
    pub records: Collection<Record>,
}

impl Collections {
    pub fn into_state(mut self, version: u64) -> StoreState {
        self.tables.normalize();
        self.columns.normalize();
        self.records.normalize();
        StoreState {
            version,
            tables: Arc::new(self.tables),
            columns: Arc::new(self.columns),
            records: Arc::new(self.records),
        }
    }
}

pub(crate) fn checksum(bytes: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(bytes);
    hasher.finalize()
}
