//! Local data engine for a tabular database editor.
//!
//! Provides an embedded transactional object store, a closed column type
//! system, schema and record managers, and a bounded undo/redo history
//! persisted to a key-string area.

pub mod config;
pub mod engine;
pub mod error;
pub mod history;
pub mod model;
pub mod observer;
pub mod persistence;
pub mod session;
pub mod store;
pub mod transaction;
pub mod types;
pub mod value;

pub use config::DbConfig;
pub use engine::Engine;
pub use error::DbError;
pub use session::Session;
