//! Shared fixtures for the integration tests.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use gridbase_core::model::{RecordData, TableId};
use gridbase_core::observer::{EngineObserver, NotificationLevel};
use gridbase_core::types::ColumnType;
use gridbase_core::value::Value;
use gridbase_core::{DbConfig, Engine, Session};

/// Observer that records every event it receives.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    pub reloads: Mutex<Vec<TableId>>,
    pub notifications: Mutex<Vec<(NotificationLevel, String)>>,
}

impl RecordingObserver {
    pub fn levels(&self) -> Vec<NotificationLevel> {
        self.notifications
            .lock()
            .unwrap()
            .iter()
            .map(|(level, _)| *level)
            .collect()
    }
}

impl EngineObserver for RecordingObserver {
    fn table_data_reloaded(&self, table_id: TableId) {
        self.reloads.lock().unwrap().push(table_id);
    }

    fn notify(&self, level: NotificationLevel, message: &str) {
        self.notifications
            .lock()
            .unwrap()
            .push((level, message.to_string()));
    }
}

/// Ids of the fixture built by [`people_table`].
pub struct People {
    pub table: TableId,
    pub name: u64,
    pub age: u64,
    pub ann: u64,
}

pub fn engine() -> Engine {
    Engine::in_memory(DbConfig::default())
}

pub fn data(pairs: &[(u64, &str)]) -> RecordData {
    pairs
        .iter()
        .map(|(column, value)| (*column, Value::from(*value)))
        .collect()
}

/// Table `T` with `Name:text`, `Age:number` and the record `{Name: "Ann", Age: "30"}`.
pub fn people_table(engine: &mut Engine, session: &mut Session) -> People {
    let table = engine.create_table(session, "T").unwrap();
    let name = engine
        .add_column(session, table, "Name", ColumnType::Text)
        .unwrap();
    let age = engine
        .add_column(session, table, "Age", ColumnType::Number)
        .unwrap();
    let ann = engine
        .add_row_with_data(session, data(&[(name, "Ann"), (age, "30")]))
        .unwrap();
    People {
        table,
        name,
        age,
        ann,
    }
}

/// Asserts the column orders of a table are exactly `0..n`.
pub fn assert_dense_orders(engine: &Engine, table: TableId) {
    let columns = engine.load_columns(table).unwrap();
    let orders: BTreeSet<usize> = columns.iter().map(|c| c.order).collect();
    let expected: BTreeSet<usize> = (0..columns.len()).collect();
    assert_eq!(orders, expected);
}

pub fn observed_engine() -> (Engine, Arc<RecordingObserver>) {
    let observer = Arc::new(RecordingObserver::default());
    let engine = engine().with_observer(observer.clone());
    (engine, observer)
}
