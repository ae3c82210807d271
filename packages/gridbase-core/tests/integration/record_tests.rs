//! Section 2: record operations and notifications.

use ntest::timeout;

use gridbase_core::engine::{ImportColumn, ImportData, UpdateOptions, RECORD_NUMBER_COLUMN};
use gridbase_core::error::DbError;
use gridbase_core::observer::NotificationLevel;
use gridbase_core::session::SortDirection;
use gridbase_core::types::ColumnType;
use gridbase_core::value::Value;
use gridbase_core::Session;

use super::helpers::{data, engine, observed_engine, people_table};

#[timeout(1000)]
#[test]
fn test_add_row_requires_table() {
    let mut engine = engine();
    let mut session = Session::new();
    assert_eq!(engine.add_row(&mut session), Err(DbError::NoTableSelected));
}

#[timeout(1000)]
#[test]
fn test_add_row_fills_every_column() {
    let mut engine = engine();
    let mut session = Session::new();
    let people = people_table(&mut engine, &mut session);

    let id = engine.add_row(&mut session).unwrap();
    let record = session.record(id).unwrap();
    assert_eq!(record.table_id, people.table);
    assert_eq!(record.data, data(&[(people.name, ""), (people.age, "")]));
}

#[timeout(1000)]
#[test]
fn test_add_row_with_data_uses_max_id_across_tables() {
    let mut engine = engine();
    let mut session = Session::new();
    let people = people_table(&mut engine, &mut session);
    assert_eq!(people.ann, 1);

    engine.create_table(&mut session, "Other").unwrap();
    let id = engine
        .add_row_with_data(&mut session, Default::default())
        .unwrap();
    assert_eq!(id, 2);

    let next = engine.add_row(&mut session).unwrap();
    assert_eq!(next, 3);
}

#[timeout(1000)]
#[test]
fn test_update_cell_validates_and_patches_cache() {
    let (mut engine, observer) = observed_engine();
    let mut session = Session::new();
    let people = people_table(&mut engine, &mut session);

    engine
        .update_cell(
            &mut session,
            people.ann,
            people.age,
            Value::from("31"),
            UpdateOptions::default(),
        )
        .unwrap();
    assert_eq!(
        session.record(people.ann).unwrap().value(people.age),
        Some(&Value::from("31"))
    );

    let result = engine.update_cell(
        &mut session,
        people.ann,
        people.age,
        Value::from("old"),
        UpdateOptions::default(),
    );
    assert!(matches!(result, Err(DbError::Validation(_))));
    assert_eq!(observer.levels().last(), Some(&NotificationLevel::Error));

    let before = observer.notifications.lock().unwrap().len();
    engine
        .update_cell(
            &mut session,
            people.ann,
            people.age,
            Value::empty(),
            UpdateOptions::silent(),
        )
        .unwrap();
    assert_eq!(observer.notifications.lock().unwrap().len(), before);

    assert_eq!(
        engine.update_record(&mut session, 50, Default::default(), UpdateOptions::default()),
        Err(DbError::RecordNotFound { record: 50 })
    );
}

#[timeout(1000)]
#[test]
fn test_delete_record_keeps_other_ids() {
    let mut engine = engine();
    let mut session = Session::new();
    let people = people_table(&mut engine, &mut session);
    let second = engine.add_row(&mut session).unwrap();
    let third = engine.add_row(&mut session).unwrap();

    engine.delete_record(&mut session, second).unwrap();
    let ids: Vec<u64> = session.records().iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![people.ann, third]);
    assert_eq!(engine.history().actions()[0].kind(), "deleteRow");

    assert_eq!(
        engine.delete_record(&mut session, second),
        Err(DbError::RecordNotFound { record: second })
    );
}

#[timeout(1000)]
#[test]
fn test_reindex_records() {
    let mut engine = engine();
    let mut session = Session::new();
    people_table(&mut engine, &mut session);
    let second = engine.add_row(&mut session).unwrap();
    let third = engine.add_row(&mut session).unwrap();
    engine.delete_record(&mut session, second).unwrap();
    assert_eq!(third, 3);

    let count = engine.reindex_records(&mut session).unwrap();
    assert_eq!(count, 2);
    let ids: Vec<u64> = session.records().iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![1, 2]);
}

#[timeout(1000)]
#[test]
fn test_reindex_conflicts_with_other_table() {
    let mut engine = engine();
    let mut session = Session::new();
    let people = people_table(&mut engine, &mut session);
    engine.add_row(&mut session).unwrap();

    let other = engine.create_table(&mut session, "Other").unwrap();
    let moved = engine.add_row(&mut session).unwrap();
    assert_eq!(moved, 3);
    engine.switch_table(&mut session, people.table).unwrap();
    engine.delete_record(&mut session, people.ann).unwrap();

    // Record 2 becomes 1; then the other table is reindexed onto 1
    engine.reindex_records(&mut session).unwrap();
    engine.switch_table(&mut session, other).unwrap();
    let result = engine.reindex_records(&mut session);
    assert_eq!(
        result,
        Err(DbError::KeyConflict {
            store: gridbase_core::store::StoreName::Records,
            key: 1
        })
    );
    assert_eq!(session.records()[0].id, moved);
}

#[timeout(1000)]
#[test]
fn test_sorted_view() {
    let mut engine = engine();
    let mut session = Session::new();
    let people = people_table(&mut engine, &mut session);
    engine
        .add_row_with_data(&mut session, data(&[(people.name, "bob"), (people.age, "9")]))
        .unwrap();
    engine
        .add_row_with_data(&mut session, data(&[(people.name, "Cy"), (people.age, "")]))
        .unwrap();

    session.set_sort(people.age, SortDirection::Ascending);
    let ids: Vec<u64> = session.sorted_records().iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![3, 2, 1]);

    session.set_sort(people.name, SortDirection::Descending);
    let ids: Vec<u64> = session.sorted_records().iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![3, 2, 1]);
}

#[timeout(1000)]
#[test]
fn test_import_and_export() {
    let mut engine = engine();
    let mut session = Session::new();
    let data: ImportData = serde_json::from_str(
        r#"{"columns":[{"name":"Name"},{"name":"Age"},{"name":"Email","type":"email"}],
            "rows":[{"Name":"Ann","Age":30,"Email":"ann@example.com"},{"Name":"Bob"}]}"#,
    )
    .unwrap();

    let table = engine.import_table(&mut session, "People", &data).unwrap();
    assert_eq!(session.current_table_id(), Some(table));

    let columns: Vec<(&str, ColumnType)> = session
        .columns()
        .iter()
        .map(|c| (c.name.as_str(), c.column_type))
        .collect();
    assert_eq!(
        columns,
        vec![
            (RECORD_NUMBER_COLUMN, ColumnType::Number),
            ("Name", ColumnType::Text),
            ("Age", ColumnType::Number),
            ("Email", ColumnType::Email),
        ]
    );
    assert_eq!(session.records().len(), 2);
    let age = session.columns()[2].id;
    assert_eq!(session.records()[0].value(age), Some(&Value::from("30")));
    assert_eq!(session.records()[1].value(age), Some(&Value::empty()));

    let export = engine.export_table(table).unwrap();
    assert_eq!(export.columns.len(), 4);
    assert_eq!(export.records.len(), 2);

    let again = ImportData::from_export(&export);
    assert_eq!(
        again.columns[0],
        ImportColumn {
            name: "Name".to_string(),
            column_type: Some(ColumnType::Text)
        }
    );
    let copy = engine.import_table(&mut session, "Copy", &again).unwrap();
    assert_eq!(engine.export_table(copy).unwrap().columns.len(), 4);

    assert!(matches!(
        engine.import_table(&mut session, "Empty", &ImportData::default()),
        Err(DbError::Validation(_))
    ));
    assert_eq!(
        engine.export_table(99).unwrap_err(),
        DbError::TableNotFound { table: 99 }
    );
}

#[timeout(1000)]
#[test]
fn test_failed_import_leaves_store_unchanged() {
    let mut engine = engine();
    let mut session = Session::new();
    let people = people_table(&mut engine, &mut session);
    let version = engine.store().version();

    let duplicate: ImportData = serde_json::from_str(
        r#"{"columns":[{"name":"Name"},{"name":"Name"}],"rows":[{"Name":"Ann"}]}"#,
    )
    .unwrap();
    assert!(matches!(
        engine.import_table(&mut session, "Dup", &duplicate),
        Err(DbError::Validation(_))
    ));

    let reserved = ImportData {
        columns: vec![ImportColumn {
            name: RECORD_NUMBER_COLUMN.to_string(),
            column_type: None,
        }],
        rows: duplicate.rows.clone(),
    };
    assert!(matches!(
        engine.import_table(&mut session, "Reserved", &reserved),
        Err(DbError::Validation(_))
    ));

    // A blank table name fails after the import data passed validation
    let valid = ImportData {
        columns: vec![ImportColumn {
            name: "Name".to_string(),
            column_type: None,
        }],
        rows: duplicate.rows,
    };
    assert!(matches!(
        engine.import_table(&mut session, "  ", &valid),
        Err(DbError::Validation(_))
    ));

    assert_eq!(engine.store().version(), version);
    let tables: Vec<u64> = engine.list_tables().unwrap().iter().map(|t| t.id).collect();
    assert_eq!(tables, vec![people.table]);
    assert_eq!(session.current_table_id(), Some(people.table));
}

#[timeout(1000)]
#[test]
fn test_delete_record_reports_reload() {
    let (mut engine, observer) = observed_engine();
    let mut session = Session::new();
    let people = people_table(&mut engine, &mut session);
    observer.reloads.lock().unwrap().clear();

    engine.delete_record(&mut session, people.ann).unwrap();
    assert_eq!(*observer.reloads.lock().unwrap(), vec![people.table]);
    assert_eq!(observer.levels().last(), Some(&NotificationLevel::Success));
}
