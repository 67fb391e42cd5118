//! The database session: one pooled connection source per backend.

use crate::error::QueryError;
use crate::pool::{create_pool, DbPool, DbRuntimeSettings, PoolError};
use crate::value::{placeholder_name, Params, Row, Value};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::types::ToSql;
use rusqlite::Statement;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Backend kinds the layer knows about. Only [`DatabaseKind::Sqlite`] has a
/// session implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseKind {
    #[default]
    Sqlite,
    Postgres,
    Oracle,
}

impl DatabaseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatabaseKind::Sqlite => "sqlite",
            DatabaseKind::Postgres => "postgres",
            DatabaseKind::Oracle => "oracle",
        }
    }

    /// A single-row statement that touches no table, used for liveness probes.
    pub fn liveness_query(&self) -> &'static str {
        match self {
            DatabaseKind::Oracle => "SELECT 1 FROM DUAL",
            DatabaseKind::Sqlite | DatabaseKind::Postgres => "SELECT 1",
        }
    }
}

impl fmt::Display for DatabaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown [`DatabaseKind`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown database kind: {0}")]
pub struct ParseDatabaseKindError(pub String);

impl FromStr for DatabaseKind {
    type Err = ParseDatabaseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(DatabaseKind::Sqlite),
            "postgres" | "postgresql" => Ok(DatabaseKind::Postgres),
            "oracle" => Ok(DatabaseKind::Oracle),
            other => Err(ParseDatabaseKindError(other.to_string())),
        }
    }
}

/// Connection parameters for the backing store.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Which backend to connect to.
    #[serde(default)]
    pub kind: DatabaseKind,

    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,

    /// Maximum number of pooled connections.
    #[serde(default = "default_pool_max_size")]
    pub pool_max_size: u32,

    /// SQLite busy timeout, in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    /// Pool checkout timeout, in milliseconds.
    #[serde(default = "default_connection_timeout_ms")]
    pub connection_timeout_ms: u64,
}

fn default_db_path() -> String {
    "gatehouse.db".to_string()
}

fn default_pool_max_size() -> u32 {
    DbRuntimeSettings::default().pool_max_size
}

fn default_busy_timeout_ms() -> u64 {
    DbRuntimeSettings::default().busy_timeout_ms
}

fn default_connection_timeout_ms() -> u64 {
    DbRuntimeSettings::default().connection_timeout_ms
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            kind: DatabaseKind::default(),
            path: default_db_path(),
            pool_max_size: default_pool_max_size(),
            busy_timeout_ms: default_busy_timeout_ms(),
            connection_timeout_ms: default_connection_timeout_ms(),
        }
    }
}

impl DatabaseConfig {
    pub fn runtime_settings(&self) -> DbRuntimeSettings {
        DbRuntimeSettings {
            busy_timeout_ms: self.busy_timeout_ms,
            pool_max_size: self.pool_max_size,
            connection_timeout_ms: self.connection_timeout_ms,
        }
    }
}

/// A source of pooled connections to one backend.
///
/// Implementations classify their own failures into [`QueryError`] kinds and
/// must be safe to call from many threads at once.
pub trait DatabaseSession: Send + Sync {
    /// The backend this session talks to.
    fn kind(&self) -> DatabaseKind;

    /// Runs a read statement and returns every row in backend order.
    fn query(&self, statement: &str, params: &Params) -> Result<Vec<Row>, QueryError>;

    /// Runs a write statement and returns the number of affected rows.
    fn execute(&self, statement: &str, params: &Params) -> Result<usize, QueryError>;

    /// Lightweight connectivity check.
    fn health_check(&self) -> Result<bool, QueryError>;
}

type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// A [`DatabaseSession`] backed by an `r2d2` pool of SQLite connections.
pub struct SqliteSession {
    pool: DbPool,
    path: String,
}

impl SqliteSession {
    /// Opens the pool described by `config`.
    pub fn open(config: &DatabaseConfig) -> Result<Self, PoolError> {
        let pool = create_pool(&config.path, config.runtime_settings())?;
        tracing::info!(
            kind = %DatabaseKind::Sqlite,
            path = %config.path,
            pool_max_size = config.pool_max_size,
            log_level = %tracing::level_filters::LevelFilter::current(),
            "database session opened"
        );
        Ok(Self::from_pool(pool, &config.path))
    }

    /// Wraps an existing pool.
    pub fn from_pool(pool: DbPool, path: &str) -> Self {
        Self {
            pool,
            path: path.to_string(),
        }
    }

    fn checkout(&self) -> Result<PooledConnection, QueryError> {
        self.pool
            .get()
            .map_err(|e| QueryError::from_checkout(&self.path, &e))
    }
}

impl fmt::Debug for SqliteSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteSession")
            .field("path", &self.path)
            .field("max_size", &self.pool.max_size())
            .finish()
    }
}

impl DatabaseSession for SqliteSession {
    fn kind(&self) -> DatabaseKind {
        DatabaseKind::Sqlite
    }

    fn query(&self, statement: &str, params: &Params) -> Result<Vec<Row>, QueryError> {
        let conn = self.checkout()?;
        let to_err = |e: rusqlite::Error| QueryError::from_sqlite(statement, &e);

        let mut stmt = conn.prepare(statement).map_err(to_err)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        let mut rows = query_with(&mut stmt, params).map_err(to_err)?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().map_err(to_err)? {
            let mut values = Vec::with_capacity(columns.len());
            for (idx, name) in columns.iter().enumerate() {
                let value = row.get_ref(idx).map_err(to_err)?;
                values.push((name.clone(), Value::from_sql_ref(value)));
            }
            out.push(Row::new(values));
        }
        Ok(out)
    }

    fn execute(&self, statement: &str, params: &Params) -> Result<usize, QueryError> {
        let conn = self.checkout()?;
        let to_err = |e: rusqlite::Error| QueryError::from_sqlite(statement, &e);

        let mut stmt = conn.prepare(statement).map_err(to_err)?;
        execute_with(&mut stmt, params).map_err(to_err)
    }

    fn health_check(&self) -> Result<bool, QueryError> {
        let statement = self.kind().liveness_query();
        let conn = self.checkout()?;
        conn.query_row(statement, [], |row| row.get::<_, i64>(0))
            .map(|one| one == 1)
            .map_err(|e| QueryError::from_sqlite(statement, &e))
    }
}

fn query_with<'s>(
    stmt: &'s mut Statement<'_>,
    params: &Params,
) -> rusqlite::Result<rusqlite::Rows<'s>> {
    if params.is_empty() {
        return stmt.query([]);
    }
    match params {
        Params::Positional(values) => stmt.query(rusqlite::params_from_iter(values.iter())),
        Params::Named(values) => {
            let names: Vec<String> = values.iter().map(|(k, _)| placeholder_name(k)).collect();
            let bound = named_params(&names, values);
            stmt.query(bound.as_slice())
        }
        Params::Empty => stmt.query([]),
    }
}

fn execute_with(stmt: &mut Statement<'_>, params: &Params) -> rusqlite::Result<usize> {
    if params.is_empty() {
        return stmt.execute([]);
    }
    match params {
        Params::Positional(values) => stmt.execute(rusqlite::params_from_iter(values.iter())),
        Params::Named(values) => {
            let names: Vec<String> = values.iter().map(|(k, _)| placeholder_name(k)).collect();
            let bound = named_params(&names, values);
            stmt.execute(bound.as_slice())
        }
        Params::Empty => stmt.execute([]),
    }
}

fn named_params<'a>(
    names: &'a [String],
    values: &'a [(String, Value)],
) -> Vec<(&'a str, &'a dyn ToSql)> {
    names
        .iter()
        .zip(values)
        .map(|(name, (_, value))| (name.as_str(), value as &dyn ToSql))
        .collect()
}
