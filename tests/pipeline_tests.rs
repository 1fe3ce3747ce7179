//! End-to-end runs driven by a RunConfig

#![cfg(feature = "duckdb-backend")]

use std::fs;
use std::path::{Path, PathBuf};

use table_ingest::database::config::load_table_definition;
use table_ingest::pipeline::{run, run_with};
use table_ingest::{
    Connection, DuckDbConnection, InsertMode, PipelineError, RunConfig, RunReport,
};
use tempfile::TempDir;

const TABLE_JSON: &str = r#"{
    "database": "warehouse",
    "name": "orders",
    "schema_definition": [["order_id", "INTEGER"], ["amount", "DOUBLE"], ["note", "VARCHAR"]],
    "primary_key": "order_id",
    "error_behavior": "convert"
}"#;

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

fn config(dir: &TempDir, execute: Option<PathBuf>) -> RunConfig {
    RunConfig {
        table: Some(write(dir.path(), "orders.json", TABLE_JSON)),
        execute,
        db_dir: dir.path().join("duckdb"),
        ..Default::default()
    }
}

#[test]
fn test_run_ingests_json_file() {
    let dir = TempDir::new().unwrap();
    let data = write(
        dir.path(),
        "data.json",
        r#"[{"order_id": 1, "amount": "9.5", "note": "first"}, {"order_id": 2, "amount": 3}]"#,
    );

    let report = run(&config(&dir, Some(data))).unwrap();
    match report {
        RunReport::Ingested(outcome) => assert_eq!(outcome.as_tuple(), (2, 0)),
        other => panic!("unexpected report: {:?}", other),
    }

    let conn = DuckDbConnection::open(dir.path().join("duckdb").join("warehouse.duckdb")).unwrap();
    let result = conn
        .query("SELECT amount FROM orders ORDER BY order_id", &[])
        .unwrap();
    assert_eq!(result.rows[0]["amount"], 9.5);
    assert_eq!(result.rows[1]["amount"], 3.0);
}

#[test]
fn test_run_ingests_csv_in_bulk() {
    let dir = TempDir::new().unwrap();
    let data = write(
        dir.path(),
        "data.csv",
        "order_id,amount,note\n1,1.25,a\n2,oops,b\n",
    );
    let mut config = config(&dir, Some(data));
    config.insert_mode = InsertMode::Bulk;

    let report = run(&config).unwrap();
    match report {
        RunReport::Ingested(outcome) => assert_eq!(outcome.as_tuple(), (2, 0)),
        other => panic!("unexpected report: {:?}", other),
    }
}

#[test]
fn test_run_without_execute_only_creates_table() {
    let dir = TempDir::new().unwrap();
    let report = run(&config(&dir, None)).unwrap();
    assert!(matches!(
        report,
        RunReport::TableOnly {
            table_created: true
        }
    ));
    assert!(dir.path().join("duckdb").join("warehouse.duckdb").exists());
}

#[test]
fn test_sql_file_materializes_table() {
    let dir = TempDir::new().unwrap();
    let conn = DuckDbConnection::in_memory().unwrap();
    let config = config(
        &dir,
        Some(write(
            dir.path(),
            "build.sql",
            "SELECT range AS order_id, 1.0 AS amount, 'x' AS note FROM range(4);",
        )),
    );
    let definition = config.table_definition().unwrap();

    let report = run_with(&conn, &config, definition.as_ref()).unwrap();
    match report {
        RunReport::Materialized { table, row_count } => {
            assert_eq!(table, "orders");
            assert_eq!(row_count, 4);
        }
        other => panic!("unexpected report: {:?}", other),
    }
}

#[test]
fn test_sql_script_without_table() {
    let dir = TempDir::new().unwrap();
    let conn = DuckDbConnection::in_memory().unwrap();
    let config = RunConfig {
        execute: Some(write(dir.path(), "q.sql", "SELECT 1 AS one;")),
        ..Default::default()
    };

    let report = run_with(&conn, &config, None).unwrap();
    match report {
        RunReport::Script(result) => assert_eq!(result.rows[0]["one"], 1),
        other => panic!("unexpected report: {:?}", other),
    }
}

#[test]
fn test_python_scripts_are_not_executed() {
    let dir = TempDir::new().unwrap();
    let conn = DuckDbConnection::in_memory().unwrap();
    let config = config(&dir, Some(write(dir.path(), "job.py", "print('hi')")));
    let definition = load_table_definition(config.table.as_deref().unwrap()).unwrap();

    let result = run_with(&conn, &config, Some(&definition));
    assert!(matches!(result, Err(PipelineError::Unsupported(_))));
}

#[test]
fn test_data_file_requires_table() {
    let dir = TempDir::new().unwrap();
    let conn = DuckDbConnection::in_memory().unwrap();
    let config = RunConfig {
        execute: Some(write(dir.path(), "data.json", "[]")),
        ..Default::default()
    };

    let result = run_with(&conn, &config, None);
    assert!(matches!(result, Err(PipelineError::MissingTable(_))));
}

#[test]
fn test_missing_database_name() {
    let dir = TempDir::new().unwrap();
    let config = RunConfig {
        table: Some(write(
            dir.path(),
            "t.json",
            r#"{"name": "t", "schema_definition": [["a", "INTEGER"]]}"#,
        )),
        db_dir: dir.path().join("duckdb"),
        ..Default::default()
    };

    assert!(matches!(run(&config), Err(PipelineError::MissingDatabase)));
}

#[test]
fn test_config_database_used_when_definition_has_none() {
    let dir = TempDir::new().unwrap();
    let config = RunConfig {
        table: Some(write(
            dir.path(),
            "t.yaml",
            "name: t\nschema_definition:\n  - [a, INTEGER]\n",
        )),
        database: Some("fallback".to_string()),
        db_dir: dir.path().join("duckdb"),
        ..Default::default()
    };

    run(&config).unwrap();
    assert!(dir.path().join("duckdb").join("fallback.duckdb").exists());
}
