//! Section 1: column and table operations.

use ntest::timeout;

use gridbase_core::engine::TypeChange;
use gridbase_core::error::DbError;
use gridbase_core::types::ColumnType;
use gridbase_core::value::Value;
use gridbase_core::Session;

use super::helpers::{assert_dense_orders, data, engine, people_table};

#[timeout(1000)]
#[test]
fn test_add_column_appends_with_next_order() {
    let mut engine = engine();
    let mut session = Session::new();
    let people = people_table(&mut engine, &mut session);

    let email = engine
        .add_column(&mut session, people.table, "  Email ", ColumnType::Email)
        .unwrap();

    let names: Vec<&str> = session.columns().iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Name", "Age", "Email"]);
    assert_eq!(session.column(email).unwrap().order, 2);
    assert_dense_orders(&engine, people.table);
}

#[timeout(1000)]
#[test]
fn test_add_column_rejects_duplicates_and_unknown_tables() {
    let mut engine = engine();
    let mut session = Session::new();
    let people = people_table(&mut engine, &mut session);

    assert_eq!(
        engine.add_column(&mut session, people.table, "Name", ColumnType::Text),
        Err(DbError::ColumnAlreadyExists {
            table: people.table,
            name: "Name".to_string()
        })
    );
    // Case-sensitive collision check
    assert!(engine
        .add_column(&mut session, people.table, "name", ColumnType::Text)
        .is_ok());

    assert_eq!(
        engine.add_column(&mut session, 99, "X", ColumnType::Text),
        Err(DbError::TableNotFound { table: 99 })
    );
    assert!(matches!(
        engine.add_column(&mut session, people.table, "   ", ColumnType::Text),
        Err(DbError::Validation(_))
    ));
}

#[timeout(1000)]
#[test]
fn test_rename_validation_leaves_column_untouched() {
    let mut engine = engine();
    let mut session = Session::new();
    let people = people_table(&mut engine, &mut session);

    let result = engine.rename_column(&mut session, people.age, "A");
    assert!(matches!(result, Err(DbError::Validation(_))));
    assert_eq!(session.column(people.age).unwrap().name, "Age");
    assert!(engine.history().is_empty());
}

#[timeout(1000)]
#[test]
fn test_rename_records_history() {
    let mut engine = engine();
    let mut session = Session::new();
    let people = people_table(&mut engine, &mut session);

    engine
        .rename_column(&mut session, people.age, " Yrs ")
        .unwrap();
    let column = session.column(people.age).unwrap();
    assert_eq!(column.name, "Yrs");
    assert!(column.modified.is_some());
    assert_eq!(engine.history().len(), 1);
    assert_eq!(engine.history().actions()[0].kind(), "renameColumn");

    assert_eq!(
        engine.rename_column(&mut session, people.age, "Name"),
        Err(DbError::ColumnAlreadyExists {
            table: people.table,
            name: "Name".to_string()
        })
    );
    assert_eq!(
        engine.rename_column(&mut session, 77, "Other"),
        Err(DbError::ColumnNotFound { column: 77 })
    );
}

#[timeout(1000)]
#[test]
fn test_delete_column_cascades_and_renumbers() {
    let mut engine = engine();
    let mut session = Session::new();
    let people = people_table(&mut engine, &mut session);
    let bob = engine
        .add_row_with_data(&mut session, data(&[(people.name, "Bob")]))
        .unwrap();

    engine.delete_column(&mut session, people.name).unwrap();

    assert_eq!(session.columns().len(), 1);
    assert_eq!(session.columns()[0].order, 0);
    assert_dense_orders(&engine, people.table);
    for record in engine.load_records(people.table).unwrap() {
        assert!(!record.data.contains_key(&people.name));
    }
    assert_eq!(session.record(people.ann).unwrap().data, data(&[(people.age, "30")]));
    assert!(session.record(bob).unwrap().data.is_empty());

    assert_eq!(
        engine.delete_column(&mut session, people.name),
        Err(DbError::ColumnNotFound { column: people.name })
    );
}

#[timeout(1000)]
#[test]
fn test_update_column_type_converts_values() {
    let mut engine = engine();
    let mut session = Session::new();
    let people = people_table(&mut engine, &mut session);
    let bob = engine
        .add_row_with_data(&mut session, data(&[(people.name, "Bob"), (people.age, "")]))
        .unwrap();

    let change = engine
        .update_column_type(&mut session, people.name, ColumnType::Number)
        .unwrap();
    assert_eq!(
        change,
        TypeChange {
            column_id: people.name,
            old_type: ColumnType::Text,
            new_type: ColumnType::Number,
            converted: 0,
            reset: 2,
        }
    );
    let column = session.column(people.name).unwrap();
    assert_eq!(column.column_type, ColumnType::Number);
    assert_eq!(column.options.decimal, Some(false));
    assert_eq!(session.record(people.ann).unwrap().value(people.name), Some(&Value::empty()));

    let change = engine
        .update_column_type(&mut session, people.age, ColumnType::Text)
        .unwrap();
    assert_eq!((change.converted, change.reset), (2, 0));
    assert_eq!(
        session.record(people.ann).unwrap().value(people.age),
        Some(&Value::from("30"))
    );
    assert_eq!(session.record(bob).unwrap().value(people.age), Some(&Value::empty()));

    // Type changes are not undoable
    assert!(engine.history().is_empty());
}

#[timeout(1000)]
#[test]
fn test_move_column() {
    let mut engine = engine();
    let mut session = Session::new();
    let people = people_table(&mut engine, &mut session);
    let email = engine
        .add_column(&mut session, people.table, "Email", ColumnType::Email)
        .unwrap();

    engine.move_column(&mut session, 2, 0).unwrap();
    let ids: Vec<u64> = session.columns().iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![email, people.name, people.age]);
    assert_dense_orders(&engine, people.table);

    assert_eq!(
        engine.move_column(&mut session, 0, 3),
        Err(DbError::ColumnIndexOutOfRange { index: 3, len: 3 })
    );
}

#[timeout(1000)]
#[test]
fn test_tables_lifecycle() {
    let mut engine = engine();
    let mut session = Session::new();
    let people = people_table(&mut engine, &mut session);
    let other = engine.create_table(&mut session, "Other").unwrap();
    assert_eq!(session.current_table_id(), Some(other));
    assert!(session.columns().is_empty());

    engine.switch_table(&mut session, people.table).unwrap();
    assert_eq!(session.columns().len(), 2);
    assert_eq!(
        engine.switch_table(&mut session, 42),
        Err(DbError::TableNotFound { table: 42 })
    );

    engine.delete_table(&mut session, people.table).unwrap();
    assert_eq!(session.current_table_id(), Some(other));
    assert_eq!(session.tables().len(), 1);
    assert!(engine.load_columns(people.table).unwrap().is_empty());
    assert!(engine.load_records(people.table).unwrap().is_empty());

    let mut fresh = Session::new();
    engine.load_tables(&mut fresh).unwrap();
    assert_eq!(fresh.current_table_id(), Some(other));

    assert!(matches!(
        engine.create_table(&mut session, "  "),
        Err(DbError::Validation(_))
    ));
}

#[timeout(1000)]
#[test]
fn test_update_column_type_skips_unchanged_records() {
    let mut engine = engine();
    let mut session = Session::new();
    let people = people_table(&mut engine, &mut session);
    engine.add_row(&mut session).unwrap();

    let before = engine.store().snapshot();
    let change = engine
        .update_column_type(&mut session, people.name, ColumnType::Textarea)
        .unwrap();
    assert_eq!((change.converted, change.reset), (2, 0));

    // Only the column row was written; the records collection is shared
    let after = engine.store().snapshot();
    assert_eq!(after.version(), before.version() + 1);
    assert!(std::ptr::eq(before.records(), after.records()));
    assert_eq!(
        session.record(people.ann).unwrap().value(people.name),
        Some(&Value::from("Ann"))
    );
}
