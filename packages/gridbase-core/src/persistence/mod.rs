//! Durable snapshot files, checksums and the key-string area.


mod io_utils;
mod kv_area;
mod persistence_manager;
mod store_file;

pub use io_utils::{classify_io_error, retry_io_operation};
pub use kv_area::KeyValueArea;
pub use persistence_manager::{PersistenceManager, KV_FILE, STORE_FILE};
pub use store_file::{StoreFile, STORE_FILE_VERSION};
