use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::collection::Collection;
use super::object_store::StoreState;
use crate::model::{Column, Record, Table};

/// Names of the object store's collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StoreName {
    Tables,
    Columns,
    Records,
}

impl StoreName {
    /// Every collection, for transactions spanning the whole store.
    pub const ALL: [StoreName; 3] = [StoreName::Tables, StoreName::Columns, StoreName::Records];

    pub fn as_str(self) -> &'static str {
        match self {
            StoreName::Tables => "tables",
            StoreName::Columns => "columns",
            StoreName::Records => "records",
        }
    }
}

impl fmt::Display for StoreName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Secondary index names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexName {
    TableId,
    Order,
    Name,
}

impl IndexName {
    pub fn as_str(self) -> &'static str {
        match self {
            IndexName::TableId => "tableId",
            IndexName::Order => "order",
            IndexName::Name => "name",
        }
    }
}

/// Key looked up in a secondary index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexKey {
    Id(u64),
    Text(String),
}

impl From<u64> for IndexKey {
    fn from(id: u64) -> Self {
        IndexKey::Id(id)
    }
}

impl From<usize> for IndexKey {
    fn from(n: usize) -> Self {
        IndexKey::Id(n as u64)
    }
}

impl From<&str> for IndexKey {
    fn from(text: &str) -> Self {
        IndexKey::Text(text.to_string())
    }
}

impl From<String> for IndexKey {
    fn from(text: String) -> Self {
        IndexKey::Text(text)
    }
}

/// A row type stored in one of the object store's collections.
pub trait Entity: Clone + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Collection holding rows of this type
    const STORE: StoreName;
    /// Secondary indexes declared on the collection
    const INDEXES: &'static [IndexName];

    /// Identity key (0 when not yet assigned).
    fn id(&self) -> u64;

    /// Sets the identity key.
    fn set_id(&mut self, id: u64);

    /// Value of this row under a secondary index.
    fn index_key(&self, index: IndexName) -> Option<IndexKey>;

    /// Collection of this type within a store state.
    fn collection(state: &StoreState) -> &Arc<Collection<Self>>;

    /// Mutable collection slot of this type within a store state.
    fn collection_mut(state: &mut StoreState) -> &mut Arc<Collection<Self>>;
}

impl Entity for Table {
    const STORE: StoreName = StoreName::Tables;
    const INDEXES: &'static [IndexName] = &[IndexName::Name];

    fn id(&self) -> u64 {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = id;
    }

    fn index_key(&self, index: IndexName) -> Option<IndexKey> {
        match index {
            IndexName::Name => Some(IndexKey::from(self.name.as_str())),
            _ => None,
        }
    }

    fn collection(state: &StoreState) -> &Arc<Collection<Self>> {
        &state.tables
    }

    fn collection_mut(state: &mut StoreState) -> &mut Arc<Collection<Self>> {
        &mut state.tables
    }
}

impl Entity for Column {
    const STORE: StoreName = StoreName::Columns;
    const INDEXES: &'static [IndexName] = &[IndexName::TableId, IndexName::Order, IndexName::Name];

    fn id(&self) -> u64 {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = id;
    }

    fn index_key(&self, index: IndexName) -> Option<IndexKey> {
        match index {
            IndexName::TableId => Some(IndexKey::Id(self.table_id)),
            IndexName::Order => Some(IndexKey::from(self.order)),
            IndexName::Name => Some(IndexKey::from(self.name.as_str())),
        }
    }

    fn collection(state: &StoreState) -> &Arc<Collection<Self>> {
        &state.columns
    }

    fn collection_mut(state: &mut StoreState) -> &mut Arc<Collection<Self>> {
        &mut state.columns
    }
}

impl Entity for Record {
    const STORE: StoreName = StoreName::Records;
    const INDEXES: &'static [IndexName] = &[IndexName::TableId];

    fn id(&self) -> u64 {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = id;
    }

    fn index_key(&self, index: IndexName) -> Option<IndexKey> {
        match index {
            IndexName::TableId => Some(IndexKey::Id(self.table_id)),
            _ => None,
        }
    }

    fn collection(state: &StoreState) -> &Arc<Collection<Self>> {
        &state.records
    }

    fn collection_mut(state: &mut StoreState) -> &mut Arc<Collection<Self>> {
        &mut state.records
    }
}
