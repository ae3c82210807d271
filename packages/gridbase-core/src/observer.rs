//! Hooks for the presentation layer.

use crate::model::TableId;

/// Severity of a user-facing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Warning,
    Error,
}

/// Receives reload and notification events from the engine.
///
/// Both methods default to no-ops. Implementations must not block.
pub trait EngineObserver: Send + Sync {
    /// Called after a table's columns and records were reloaded into the session.
    fn table_data_reloaded(&self, _table_id: TableId) {}

    /// Called with a short message after an operation succeeded or failed.
    fn notify(&self, _level: NotificationLevel, _message: &str) {}
}

/// Observer that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl EngineObserver for NoopObserver {}
