//! Section 3: undo/redo of recorded actions.

use ntest::timeout;

use gridbase_core::error::DbError;
use gridbase_core::model::Column;
use gridbase_core::observer::NotificationLevel;
use gridbase_core::types::ColumnType;
use gridbase_core::{DbConfig, Engine, Session};

use super::helpers::{assert_dense_orders, data, engine, observed_engine, people_table};

#[timeout(1000)]
#[test]
fn test_delete_column_undo_scenario() {
    let (mut engine, observer) = observed_engine();
    let mut session = Session::new();
    let people = people_table(&mut engine, &mut session);
    assert_eq!((people.name, people.age, people.ann), (1, 2, 1));
    let name_before: Column = session.column(people.name).unwrap().clone();

    engine.delete_column(&mut session, people.name).unwrap();
    assert_eq!(
        session.record(people.ann).unwrap().data,
        data(&[(people.age, "30")])
    );
    assert_eq!(engine.history().len(), 1);
    assert!(engine.can_undo());

    observer.reloads.lock().unwrap().clear();
    assert!(engine.undo(&mut session).unwrap());
    assert_eq!(session.column(people.name), Some(&name_before));
    assert_eq!(
        session.record(people.ann).unwrap().data,
        data(&[(people.name, "Ann"), (people.age, "30")])
    );
    assert!(!engine.can_undo());
    assert!(engine.can_redo());
    assert_dense_orders(&engine, people.table);
    assert_eq!(*observer.reloads.lock().unwrap(), vec![people.table]);

    assert!(engine.redo(&mut session).unwrap());
    assert!(session.column(people.name).is_none());
    assert_eq!(
        session.record(people.ann).unwrap().data,
        data(&[(people.age, "30")])
    );
    assert_dense_orders(&engine, people.table);
}

#[timeout(1000)]
#[test]
fn test_undo_restores_middle_column_position() {
    let mut engine = engine();
    let mut session = Session::new();
    let people = people_table(&mut engine, &mut session);
    let email = engine
        .add_column(&mut session, people.table, "Email", ColumnType::Email)
        .unwrap();

    engine.delete_column(&mut session, people.age).unwrap();
    assert_eq!(session.column(email).unwrap().order, 1);

    engine.undo(&mut session).unwrap();
    let ids: Vec<u64> = session.columns().iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![people.name, people.age, email]);
    assert_dense_orders(&engine, people.table);
}

#[timeout(1000)]
#[test]
fn test_rename_undo_redo() {
    let mut engine = engine();
    let mut session = Session::new();
    let people = people_table(&mut engine, &mut session);

    engine.rename_column(&mut session, people.age, "Yrs").unwrap();
    engine.undo(&mut session).unwrap();
    assert_eq!(session.column(people.age).unwrap().name, "Age");
    engine.redo(&mut session).unwrap();
    assert_eq!(session.column(people.age).unwrap().name, "Yrs");
    assert_eq!(engine.history().cursor(), 0);
}

#[timeout(1000)]
#[test]
fn test_rename_undo_restores_exact_column() {
    let mut engine = engine();
    let mut session = Session::new();
    let people = people_table(&mut engine, &mut session);
    let before = session.column(people.age).unwrap().clone();
    assert_eq!(before.modified, None);

    engine.rename_column(&mut session, people.age, "Yrs").unwrap();
    let renamed = session.column(people.age).unwrap().clone();
    assert!(renamed.modified.is_some());

    engine.undo(&mut session).unwrap();
    assert_eq!(session.column(people.age), Some(&before));

    engine.redo(&mut session).unwrap();
    assert_eq!(session.column(people.age), Some(&renamed));
}

#[timeout(1000)]
#[test]
fn test_rename_undo_blocked_by_sibling_name() {
    let (mut engine, observer) = observed_engine();
    let mut session = Session::new();
    let people = people_table(&mut engine, &mut session);

    engine.rename_column(&mut session, people.name, "Label").unwrap();
    let taken = engine
        .add_column(&mut session, people.table, "Name", ColumnType::Text)
        .unwrap();

    let result = engine.undo(&mut session);
    assert_eq!(
        result,
        Err(DbError::ColumnAlreadyExists {
            table: people.table,
            name: "Name".to_string(),
        })
    );
    assert_eq!(engine.history().cursor(), 0);
    assert_eq!(observer.levels().last(), Some(&NotificationLevel::Warning));

    let names: Vec<String> = engine
        .load_columns(people.table)
        .unwrap()
        .into_iter()
        .map(|column| column.name)
        .collect();
    assert_eq!(names, vec!["Label", "Age", "Name"]);
    assert_eq!(session.column(taken).unwrap().name, "Name");
}

#[timeout(1000)]
#[test]
fn test_delete_row_undo_redo() {
    let mut engine = engine();
    let mut session = Session::new();
    let people = people_table(&mut engine, &mut session);
    let before = session.record(people.ann).unwrap().clone();

    engine.delete_record(&mut session, people.ann).unwrap();
    assert!(session.records().is_empty());

    engine.undo(&mut session).unwrap();
    assert_eq!(session.record(people.ann), Some(&before));

    engine.redo(&mut session).unwrap();
    assert!(session.records().is_empty());
}

#[timeout(1000)]
#[test]
fn test_delete_table_undo_redo() {
    let mut engine = engine();
    let mut session = Session::new();
    let people = people_table(&mut engine, &mut session);
    let export = engine.export_table(people.table).unwrap();

    engine.delete_table(&mut session, people.table).unwrap();
    assert!(session.tables().is_empty());
    assert_eq!(session.current_table_id(), None);

    engine.undo(&mut session).unwrap();
    assert_eq!(session.current_table_id(), Some(people.table));
    assert_eq!(engine.export_table(people.table).unwrap(), export);

    engine.redo(&mut session).unwrap();
    assert!(engine.export_table(people.table).is_err());
    assert!(engine.load_columns(people.table).unwrap().is_empty());
    assert!(engine.load_records(people.table).unwrap().is_empty());
}

#[timeout(1000)]
#[test]
fn test_nothing_to_undo_or_redo() {
    let mut engine = engine();
    let mut session = Session::new();
    assert!(!engine.undo(&mut session).unwrap());
    assert!(!engine.redo(&mut session).unwrap());
}

#[timeout(1000)]
#[test]
fn test_failed_undo_keeps_cursor() {
    let (mut engine, observer) = observed_engine();
    let mut session = Session::new();
    let people = people_table(&mut engine, &mut session);

    engine.delete_record(&mut session, people.ann).unwrap();
    // Occupy the deleted identity so the undo cannot re-add it
    let reused = engine
        .add_row_with_data(&mut session, data(&[(people.name, "Zed")]))
        .unwrap();
    assert_eq!(reused, people.ann);

    let result = engine.undo(&mut session);
    assert!(matches!(result, Err(DbError::KeyConflict { .. })));
    assert_eq!(engine.history().cursor(), 0);
    assert!(engine.can_undo());
    assert_eq!(observer.levels().last(), Some(&NotificationLevel::Warning));
}

#[timeout(1000)]
#[test]
fn test_history_bound_and_truncation() {
    let config = DbConfig {
        max_history: 3,
        ..Default::default()
    };
    let mut engine = Engine::in_memory(config);
    let mut session = Session::new();
    let people = people_table(&mut engine, &mut session);

    for name in ["Aa", "Bb", "Cc", "Dd", "Ee"] {
        engine.rename_column(&mut session, people.age, name).unwrap();
    }
    assert_eq!(engine.history().len(), 3);
    assert_eq!(engine.history().cursor(), 2);
    assert_eq!(
        engine.history().actions()[0].describe(),
        "rename column 'Bb' to 'Cc'"
    );

    engine.undo(&mut session).unwrap();
    engine.undo(&mut session).unwrap();
    assert!(engine.can_redo());
    engine.rename_column(&mut session, people.age, "Zz").unwrap();
    assert!(!engine.can_redo());
    assert_eq!(engine.history().len(), 2);
}
