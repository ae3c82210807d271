//! Embedded object store: collections, identity keys and secondary indexes.

mod collection;
mod entity;
mod object_store;

pub use collection::Collection;
pub use entity::{Entity, IndexKey, IndexName, StoreName};
pub use object_store::{ObjectStore, StoreState};
