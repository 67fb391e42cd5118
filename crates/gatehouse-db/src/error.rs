//! Error types for the database access layer.

use crate::session::DatabaseKind;
use std::fmt;

/// Message returned to callers when a read query fails. Backend text is
/// never included.
pub const GENERIC_QUERY_FAILURE: &str = "Unable to execute query against the database";

/// Broad classification of a backend failure, assigned by the session when
/// the failure is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No connection could be checked out or opened.
    Connection,
    /// The statement, its bind parameters or its result columns were invalid.
    Statement,
    /// A constraint (unique, foreign key, not null, check) was violated.
    Constraint,
    /// Anything else the backend reported.
    Other,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Connection => "connection",
            ErrorKind::Statement => "statement",
            ErrorKind::Constraint => "constraint",
            ErrorKind::Other => "other",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized backend failure.
///
/// `context` carries the diagnostic context (offending statement, backend
/// error code); `message` is the human-readable description. Both are always
/// populated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} error: {message}")]
pub struct QueryError {
    pub kind: ErrorKind,
    pub context: String,
    pub message: String,
}

impl QueryError {
    pub fn new(kind: ErrorKind, context: impl Into<String>, message: impl Into<String>) -> Self {
        let context = context.into();
        let message = message.into();
        Self {
            kind,
            context: if context.is_empty() {
                "<no context>".to_string()
            } else {
                context
            },
            message: if message.is_empty() {
                "<no message>".to_string()
            } else {
                message
            },
        }
    }

    /// Builds an error from a rusqlite failure raised while running `statement`.
    pub(crate) fn from_sqlite(statement: &str, err: &rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(code, msg) => Self::new(
                classify(code.code),
                format!(
                    "statement: {statement}; code: {:?} ({})",
                    code.code, code.extended_code
                ),
                msg.clone().unwrap_or_else(|| code.to_string()),
            ),
            // Prepare-time syntax errors carry the failing offset.
            rusqlite::Error::SqlInputError {
                error, msg, offset, ..
            } => Self::new(
                classify(error.code),
                format!(
                    "statement: {statement}; code: {:?} ({}); offset: {offset}",
                    error.code, error.extended_code
                ),
                msg.clone(),
            ),
            rusqlite::Error::InvalidParameterName(_)
            | rusqlite::Error::InvalidParameterCount(_, _)
            | rusqlite::Error::InvalidColumnIndex(_)
            | rusqlite::Error::InvalidColumnName(_)
            | rusqlite::Error::InvalidColumnType(_, _, _)
            | rusqlite::Error::ExecuteReturnedResults => Self::new(
                ErrorKind::Statement,
                format!("statement: {statement}"),
                err.to_string(),
            ),
            other => Self::new(
                ErrorKind::Other,
                format!("statement: {statement}"),
                other.to_string(),
            ),
        }
    }

    /// Builds an error for a failed pool checkout.
    pub(crate) fn from_checkout(path: &str, err: &r2d2::Error) -> Self {
        Self::new(
            ErrorKind::Connection,
            format!("pool checkout: {path}"),
            err.to_string(),
        )
    }
}

fn classify(code: rusqlite::ffi::ErrorCode) -> ErrorKind {
    use rusqlite::ffi::ErrorCode;

    match code {
        ErrorCode::ConstraintViolation => ErrorKind::Constraint,
        ErrorCode::CannotOpen
        | ErrorCode::NotADatabase
        | ErrorCode::PermissionDenied
        | ErrorCode::DatabaseBusy
        | ErrorCode::DatabaseLocked
        | ErrorCode::SystemIoFailure => ErrorKind::Connection,
        _ => ErrorKind::Statement,
    }
}

/// The failure response produced for a read query.
///
/// Carries only the HTTP-class status and the generic message; the backend
/// error has already been logged by the executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{}", GENERIC_QUERY_FAILURE)]
pub struct QueryFailure;

impl QueryFailure {
    pub fn status(&self) -> u16 {
        500
    }

    pub fn message(&self) -> &'static str {
        GENERIC_QUERY_FAILURE
    }
}

/// A failed write statement.
///
/// Keeps the statement and the original backend error so callers can either
/// just log it or inspect the cause programmatically.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unable to execute update against the database")]
pub struct UpdateError {
    pub statement: String,
    #[source]
    pub source: QueryError,
}

impl UpdateError {
    /// Wraps a backend error raised by `statement`.
    pub fn wrap(statement: &str, source: QueryError) -> Self {
        Self {
            statement: statement.to_string(),
            source,
        }
    }

    /// The original backend error.
    pub fn backend(&self) -> &QueryError {
        &self.source
    }

    pub fn kind(&self) -> ErrorKind {
        self.source.kind
    }
}

/// Errors raised when obtaining the shared executor.
#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    /// No executor has been initialized yet.
    #[error("database executor has not been initialized")]
    Uninitialized,

    /// The requested backend kind has no session implementation.
    #[error("no executor available for database kind '{0}'")]
    UnsupportedBackend(DatabaseKind),

    /// The connection pool could not be created.
    #[error(transparent)]
    Pool(#[from] crate::pool::PoolError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn blank_fields_are_filled() {
        let err = QueryError::new(ErrorKind::Other, "", "");
        assert_eq!(err.context, "<no context>");
        assert_eq!(err.message, "<no message>");
    }

    #[test]
    fn syntax_errors_are_statement_errors() {
        let conn = Connection::open_in_memory().unwrap();
        let raw = conn.execute_batch("SELEKT 1").unwrap_err();
        let err = QueryError::from_sqlite("SELEKT 1", &raw);

        assert_eq!(err.kind, ErrorKind::Statement);
        assert!(err.context.contains("SELEKT 1"), "context: {}", err.context);
        assert_eq!(err.message, "near \"SELEKT\": syntax error");
    }

    #[test]
    fn unique_violations_are_constraint_errors() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (id INTEGER PRIMARY KEY); INSERT INTO t VALUES (1);")
            .unwrap();
        let raw = conn.execute("INSERT INTO t VALUES (1)", []).unwrap_err();
        let err = QueryError::from_sqlite("INSERT INTO t VALUES (1)", &raw);

        assert_eq!(err.kind, ErrorKind::Constraint);
        assert!(err.context.contains("ConstraintViolation"));
    }

    #[test]
    fn update_error_keeps_the_original() {
        let backend = QueryError::new(ErrorKind::Constraint, "ctx", "duplicate key");
        let err = UpdateError::wrap("INSERT INTO t VALUES (1)", backend.clone());

        assert_eq!(err.backend(), &backend);
        assert_eq!(err.kind(), ErrorKind::Constraint);
        let source = std::error::Error::source(&err).expect("source should be set");
        assert_eq!(source.to_string(), "constraint error: duplicate key");
    }

    #[test]
    fn query_failure_is_generic() {
        assert_eq!(QueryFailure.status(), 500);
        assert_eq!(QueryFailure.to_string(), GENERIC_QUERY_FAILURE);
    }
}
