use crate::store::StoreName;

/// Represents a single staged write within a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    /// Insert of a new row
    Add {
        /// Collection written to
        store: StoreName,
        /// Identity of the inserted row
        key: u64,
    },
    /// Insert or replacement of a row
    Put {
        /// Collection written to
        store: StoreName,
        /// Identity of the written row
        key: u64,
    },
    /// Removal of a row
    Delete {
        /// Collection written to
        store: StoreName,
        /// Identity of the removed row
        key: u64,
        /// Whether a row existed under the key
        existed: bool,
    },
}

impl Change {
    /// Collection touched by this change.
    pub fn store(&self) -> StoreName {
        match self {
            Change::Add { store, .. } | Change::Put { store, .. } | Change::Delete { store, .. } => {
                *store
            }
        }
    }
}
