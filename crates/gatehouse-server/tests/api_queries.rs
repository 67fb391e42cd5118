use gatehouse_db::{DatabaseConfig, DatabaseKind, ExecutorRegistry, Params, Value};
use gatehouse_server::{
    api::{query_rows, run_update, ApiError},
    config::AlertsConfig,
    AppState,
};
use std::sync::Arc;
use tempfile::TempDir;

fn state_with_database() -> (TempDir, AppState) {
    let dir = TempDir::new().unwrap();
    let config = DatabaseConfig {
        path: dir.path().join("queries.db").to_string_lossy().into_owned(),
        ..DatabaseConfig::default()
    };
    let registry = Arc::new(ExecutorRegistry::new());
    registry.initialize(DatabaseKind::Sqlite, &config).unwrap();
    (dir, AppState::new(registry, AlertsConfig::default()))
}

#[tokio::test]
async fn handlers_read_and_write_through_the_shared_executor() {
    let (_dir, state) = state_with_database();

    run_update(
        &state,
        "CREATE TABLE employees (id INTEGER PRIMARY KEY, name TEXT)",
        Params::Empty,
    )
    .await
    .unwrap();
    let affected = run_update(
        &state,
        "INSERT INTO employees (id, name) VALUES (?1, ?2), (?3, ?4)",
        Params::positional([
            Value::Integer(1),
            Value::from("ada"),
            Value::Integer(2),
            Value::from("grace"),
        ]),
    )
    .await
    .unwrap();
    assert_eq!(affected, 2);

    let rows = query_rows(
        &state,
        "SELECT name FROM employees WHERE id = :id",
        Params::named([("id", 2_i64)]),
    )
    .await
    .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("name"), Some(&Value::from("grace")));
}

#[tokio::test]
async fn failed_read_is_generic() {
    let (_dir, state) = state_with_database();

    let err = query_rows(&state, "SELECT * FROM payroll", Params::Empty)
        .await
        .unwrap_err();
    match err {
        ApiError::InternalServerError(message) => {
            assert_eq!(message, "Unable to execute query against the database");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn failed_write_is_an_error() {
    let (_dir, state) = state_with_database();

    let err = run_update(&state, "DELETE FROM payroll", Params::Empty)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::InternalServerError(_)));
}

#[tokio::test]
async fn queries_before_initialization_are_unavailable() {
    let state = AppState::new(Arc::new(ExecutorRegistry::new()), AlertsConfig::default());

    let err = query_rows(&state, "SELECT 1", Params::Empty)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::ServiceUnavailable(_)), "got: {err:?}");

    let err = run_update(&state, "DELETE FROM t", Params::Empty)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::ServiceUnavailable(_)), "got: {err:?}");
}
