//! Integration test suite for the engine surface.
//!
//! Sections:
//! 1. Schema operations
//! 2. Record operations
//! 3. Undo/redo history
//! 4. Persistence across reopen

pub mod helpers;
pub mod history_tests;
pub mod record_tests;
pub mod schema_tests;
