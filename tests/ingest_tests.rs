//! Ingestion against a real DuckDB database

#![cfg(feature = "duckdb-backend")]

use serde_json::json;
use table_ingest::{
    Column, Connection, DuckDbConnection, ErrorPolicy, IngestError, IngestionEngine, InsertMode,
    Record, SchemaCatalog, Value, models::record_from_json,
};

fn records(value: serde_json::Value) -> Vec<Record> {
    value
        .as_array()
        .unwrap()
        .iter()
        .cloned()
        .map(|v| record_from_json(v).unwrap())
        .collect()
}

fn catalog(policy: ErrorPolicy) -> SchemaCatalog {
    SchemaCatalog::new(
        "t",
        vec![Column::new("id", "INTEGER"), Column::new("label", "VARCHAR")],
        Some("id".to_string()),
        policy,
    )
    .unwrap()
}

fn rows(conn: &DuckDbConnection) -> Vec<serde_json::Value> {
    conn.query("SELECT id, label FROM t ORDER BY id", &[])
        .unwrap()
        .rows
}

#[test]
fn test_convert_scenario() {
    let conn = DuckDbConnection::in_memory().unwrap();
    let catalog = catalog(ErrorPolicy::Convert);
    let engine = IngestionEngine::new(&catalog);
    assert!(engine.create_table(&conn));

    let outcome = engine
        .insert(
            &conn,
            &records(json!([{"id": "1", "label": 42}, {"id": 2, "label": "ok"}])),
        )
        .unwrap();

    assert_eq!(outcome.as_tuple(), (2, 0));
    let stored = rows(&conn);
    assert_eq!(stored[0], json!({"id": 1, "label": "42"}));
    assert_eq!(stored[1], json!({"id": 2, "label": "ok"}));
}

#[test]
fn test_row_isolation_on_primary_key_violation() {
    let conn = DuckDbConnection::in_memory().unwrap();
    let catalog = catalog(ErrorPolicy::Skip);
    let engine = IngestionEngine::new(&catalog);
    engine.create_table(&conn);

    let outcome = engine
        .insert(
            &conn,
            &records(json!([
                {"id": 1, "label": "a"},
                {"id": 1, "label": "duplicate"},
                {"id": 3, "label": "c"}
            ])),
        )
        .unwrap();

    assert_eq!(outcome.as_tuple(), (2, 1));
    assert_eq!(outcome.total(), 3);
    let stored = rows(&conn);
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0]["label"], "a");
    assert_eq!(stored[1]["id"], 3);
}

#[test]
fn test_create_table_is_idempotent() {
    let conn = DuckDbConnection::in_memory().unwrap();
    let catalog = catalog(ErrorPolicy::Skip);
    let engine = IngestionEngine::new(&catalog);

    assert!(engine.create_table(&conn));
    assert!(engine.create_table(&conn));

    let columns = conn
        .query(
            "SELECT column_name FROM information_schema.columns WHERE table_name = 't'",
            &[],
        )
        .unwrap();
    assert_eq!(columns.row_count(), 2);
}

#[test]
fn test_convert_unparseable_stores_null() {
    let conn = DuckDbConnection::in_memory().unwrap();
    let catalog = SchemaCatalog::new(
        "t",
        vec![Column::new("id", "INTEGER"), Column::new("label", "VARCHAR")],
        None,
        ErrorPolicy::Convert,
    )
    .unwrap();
    let engine = IngestionEngine::new(&catalog);
    engine.create_table(&conn);

    let outcome = engine
        .insert(&conn, &records(json!([{"id": "abc", "label": "x"}])))
        .unwrap();

    assert_eq!(outcome.as_tuple(), (1, 0));
    assert_eq!(rows(&conn)[0], json!({"id": null, "label": "x"}));
}

#[test]
fn test_skip_excludes_mismatched_rows() {
    let conn = DuckDbConnection::in_memory().unwrap();
    let catalog = catalog(ErrorPolicy::Skip);
    let engine = IngestionEngine::new(&catalog);
    engine.create_table(&conn);

    let outcome = engine
        .insert(
            &conn,
            &records(json!([{"id": "1", "label": "a"}, {"id": 2, "label": "b"}])),
        )
        .unwrap();

    assert_eq!(outcome.as_tuple(), (1, 1));
    assert_eq!(rows(&conn), vec![json!({"id": 2, "label": "b"})]);
}

#[test]
fn test_null_policy_keeps_row() {
    let conn = DuckDbConnection::in_memory().unwrap();
    let catalog = catalog(ErrorPolicy::Null);
    let engine = IngestionEngine::new(&catalog);
    engine.create_table(&conn);

    let outcome = engine
        .insert(&conn, &records(json!([{"id": 5, "label": 12}])))
        .unwrap();

    assert_eq!(outcome.as_tuple(), (1, 0));
    assert_eq!(rows(&conn)[0], json!({"id": 5, "label": null}));
}

#[test]
fn test_error_policy_writes_nothing() {
    let conn = DuckDbConnection::in_memory().unwrap();
    let catalog = catalog(ErrorPolicy::Error);
    let engine = IngestionEngine::new(&catalog);
    engine.create_table(&conn);

    let result = engine.insert(
        &conn,
        &records(json!([{"id": 1, "label": "a"}, {"id": "2", "label": "b"}])),
    );

    match result {
        Err(IngestError::TypeMismatch { column, .. }) => assert_eq!(column, "id"),
        other => panic!("expected a type mismatch, got {:?}", other),
    }
    assert!(rows(&conn).is_empty());
}

#[test]
fn test_missing_fields_insert_null() {
    let conn = DuckDbConnection::in_memory().unwrap();
    let catalog = catalog(ErrorPolicy::Skip);
    let engine = IngestionEngine::new(&catalog);
    engine.create_table(&conn);

    let outcome = engine
        .insert(&conn, &records(json!([{"id": 9, "extra": true}])))
        .unwrap();

    assert_eq!(outcome.as_tuple(), (1, 0));
    assert_eq!(rows(&conn)[0], json!({"id": 9, "label": null}));
}

#[test]
fn test_empty_batch() {
    let conn = DuckDbConnection::in_memory().unwrap();
    let catalog = catalog(ErrorPolicy::Skip);
    let engine = IngestionEngine::new(&catalog);
    engine.create_table(&conn);

    assert_eq!(engine.insert(&conn, &[]).unwrap().as_tuple(), (0, 0));
}

#[test]
fn test_bulk_mode() {
    let conn = DuckDbConnection::in_memory().unwrap();
    let catalog = catalog(ErrorPolicy::Skip);
    let engine = IngestionEngine::new(&catalog).with_mode(InsertMode::Bulk);
    engine.create_table(&conn);

    let outcome = engine
        .ingest(
            &conn,
            &records(json!([
                {"id": 1, "label": "a"},
                {"id": "x", "label": "skipped"},
                {"id": 2, "label": "b"}
            ])),
        )
        .unwrap();
    assert_eq!(outcome.as_tuple(), (2, 1));
    assert_eq!(rows(&conn).len(), 2);

    // a conflicting row fails the whole statement
    let outcome = engine
        .ingest(
            &conn,
            &records(json!([{"id": 3, "label": "c"}, {"id": 1, "label": "dup"}])),
        )
        .unwrap();
    assert_eq!(outcome.as_tuple(), (0, 2));
    assert_eq!(rows(&conn).len(), 2);
}

#[test]
fn test_float_and_boolean_columns() {
    let conn = DuckDbConnection::in_memory().unwrap();
    let catalog = SchemaCatalog::new(
        "m",
        vec![
            Column::new("score", "DOUBLE"),
            Column::new("active", "BOOLEAN"),
        ],
        None,
        ErrorPolicy::Convert,
    )
    .unwrap();
    let engine = IngestionEngine::new(&catalog);
    engine.create_table(&conn);

    let outcome = engine
        .insert(
            &conn,
            &records(json!([
                {"score": 3, "active": "yes"},
                {"score": "2.5", "active": 0}
            ])),
        )
        .unwrap();
    assert_eq!(outcome.as_tuple(), (2, 0));

    let stored = conn
        .query("SELECT score, active FROM m ORDER BY score", &[])
        .unwrap()
        .rows;
    assert_eq!(stored[0], json!({"score": 2.5, "active": false}));
    assert_eq!(stored[1], json!({"score": 3.0, "active": true}));
}

#[test]
fn test_bound_values_are_not_interpolated() {
    let conn = DuckDbConnection::in_memory().unwrap();
    let catalog = catalog(ErrorPolicy::Skip);
    let engine = IngestionEngine::new(&catalog);
    engine.create_table(&conn);

    let label = "x'); DROP TABLE t; --";
    let mut record = Record::new();
    record.insert("id".to_string(), Value::Integer(1));
    record.insert("label".to_string(), Value::from(label));

    assert_eq!(engine.insert(&conn, &[record]).unwrap().as_tuple(), (1, 0));
    assert_eq!(rows(&conn)[0]["label"], label);
}

#[test]
fn test_csv_mixed_column_ingests_under_skip() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("codes.csv");
    std::fs::write(&path, "id,label\n1,abc\n2,123\n").unwrap();

    let conn = DuckDbConnection::in_memory().unwrap();
    let catalog = catalog(ErrorPolicy::Skip);
    let engine = IngestionEngine::new(&catalog);
    engine.create_table(&conn);

    let records = table_ingest::source::read_csv(&path).unwrap();
    let outcome = engine.insert(&conn, &records).unwrap();

    assert_eq!(outcome.as_tuple(), (2, 0));
    assert_eq!(rows(&conn)[1], json!({"id": 2, "label": "123"}));
}
