//! Bounded undo/redo history persisted to the key-string area.

mod action;

pub use action::{
    Action, DeleteColumnData, DeleteRowData, DeleteTableData, RecordValue, RenameColumnData,
};

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::DbConfig;
use crate::error::DbError;
use crate::persistence::KeyValueArea;

/// Persisted form of the history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistorySnapshot {
    pub history: Vec<Action>,
    /// Position of the last applied action, -1 when none is applied
    pub current_index: i64,
}

/// Ordered list of recorded actions with an applied-count cursor.
///
/// Actions before the cursor are applied and can be undone; actions after
/// it were undone and can be redone until a new action is recorded.
#[derive(Debug)]
pub struct ActionHistory {
    kv: Arc<KeyValueArea>,
    key: String,
    max: usize,
    actions: Vec<Action>,
    applied: usize,
}

impl ActionHistory {
    /// Loads the history stored under `config.history_key`.
    ///
    /// An unreadable or corrupt snapshot yields an empty history.
    pub fn load(kv: Arc<KeyValueArea>, config: &DbConfig) -> Self {
        let mut history = Self {
            kv,
            key: config.history_key.clone(),
            max: config.max_history.max(1),
            actions: Vec::new(),
            applied: 0,
        };

        match history.kv.get_item(&history.key) {
            Ok(Some(raw)) => match serde_json::from_str::<HistorySnapshot>(&raw) {
                Ok(snapshot) => history.restore(snapshot),
                Err(e) => tracing::warn!("Discarding corrupt action history: {}", e),
            },
            Ok(None) => {}
            Err(e) => tracing::warn!("Failed to read action history: {}", e),
        }

        tracing::debug!(
            "Loaded action history ({} actions, cursor {})",
            history.actions.len(),
            history.cursor()
        );
        history
    }

    fn restore(&mut self, snapshot: HistorySnapshot) {
        let mut actions = snapshot.history;
        let mut cursor = snapshot.current_index;

        if actions.len() > self.max {
            let dropped = actions.len() - self.max;
            actions.drain(..dropped);
            cursor -= dropped as i64;
        }

        let applied = (cursor + 1).clamp(0, actions.len() as i64);
        self.applied = applied as usize;
        self.actions = actions;
    }

    /// Records an action, discarding any redo branch and the oldest
    /// entries beyond the limit.
    pub fn add_action(&mut self, action: Action) {
        tracing::debug!("Recording action: {}", action.describe());
        self.actions.truncate(self.applied);
        self.actions.push(action);
        self.applied += 1;

        if self.actions.len() > self.max {
            let overflow = self.actions.len() - self.max;
            self.actions.drain(..overflow);
            self.applied -= overflow;
        }
        self.save_logged();
    }

    /// Action the next undo reverts.
    pub fn undo_target(&self) -> Option<&Action> {
        self.applied.checked_sub(1).and_then(|i| self.actions.get(i))
    }

    /// Action the next redo re-applies.
    pub fn redo_target(&self) -> Option<&Action> {
        self.actions.get(self.applied)
    }

    pub fn can_undo(&self) -> bool {
        self.applied > 0
    }

    pub fn can_redo(&self) -> bool {
        self.applied < self.actions.len()
    }

    pub(crate) fn mark_undone(&mut self) {
        if self.applied > 0 {
            self.applied -= 1;
            self.save_logged();
        }
    }

    pub(crate) fn mark_redone(&mut self) {
        if self.applied < self.actions.len() {
            self.applied += 1;
            self.save_logged();
        }
    }

    /// Index of the last applied action, -1 when none is applied.
    pub fn cursor(&self) -> i64 {
        self.applied as i64 - 1
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Maximum number of retained actions.
    pub fn max(&self) -> usize {
        self.max
    }

    /// Drops every recorded action.
    pub fn clear(&mut self) {
        self.actions.clear();
        self.applied = 0;
        self.save_logged();
    }

    pub fn snapshot(&self) -> HistorySnapshot {
        HistorySnapshot {
            history: self.actions.clone(),
            current_index: self.cursor(),
        }
    }

    /// Writes the snapshot to the key-string area.
    pub fn save(&self) -> Result<(), DbError> {
        let raw = serde_json::to_string(&self.snapshot())?;
        self.kv.set_item(&self.key, raw)
    }

    fn save_logged(&self) {
        if let Err(e) = self.save() {
            tracing::warn!("Failed to persist action history: {}", e);
        }
    }
}
