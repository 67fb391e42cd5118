//! The query executor: the single path from request handlers to the session.

use crate::error::{QueryError, QueryFailure, UpdateError};
use crate::session::{DatabaseKind, DatabaseSession};
use crate::value::{Params, Row};
use std::fmt;

/// Runs statements through one exclusively owned [`DatabaseSession`] and
/// applies the layer's failure policy:
///
/// - read failures are logged and absorbed into a generic [`QueryFailure`];
/// - write failures are logged and returned wrapped in an [`UpdateError`]
///   so the caller can abort a larger unit of work.
pub struct QueryExecutor {
    session: Box<dyn DatabaseSession>,
}

impl QueryExecutor {
    pub fn new(session: Box<dyn DatabaseSession>) -> Self {
        Self { session }
    }

    /// The backend kind of the owned session.
    pub fn kind(&self) -> DatabaseKind {
        self.session.kind()
    }

    /// Runs a read statement.
    ///
    /// Returns the backend's rows in its native order. On any backend
    /// failure the error's context and message are logged and the caller
    /// receives only [`QueryFailure`].
    pub fn execute_query(&self, statement: &str, params: &Params) -> Result<Vec<Row>, QueryFailure> {
        self.fetch(statement, params).map_err(|err| {
            tracing::error!(
                kind = %err.kind,
                context = %err.context,
                message = %err.message,
                "query execution failed"
            );
            QueryFailure
        })
    }

    /// Runs an insert/update/delete statement and returns the affected row count.
    ///
    /// # Errors
    ///
    /// Returns [`UpdateError`] carrying the statement and the original
    /// backend error, after logging the error's context and message.
    pub fn execute_update(&self, statement: &str, params: &Params) -> Result<usize, UpdateError> {
        self.session.execute(statement, params).map_err(|err| {
            tracing::error!(
                kind = %err.kind,
                context = %err.context,
                message = %err.message,
                "update execution failed"
            );
            UpdateError::wrap(statement, err)
        })
    }

    /// Delegates to the session's own connectivity check, without retries.
    pub fn health_check(&self) -> Result<bool, QueryError> {
        self.session.health_check()
    }

    /// Runs a read statement without applying the failure policy.
    pub(crate) fn fetch(&self, statement: &str, params: &Params) -> Result<Vec<Row>, QueryError> {
        self.session.query(statement, params)
    }
}

impl fmt::Debug for QueryExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryExecutor")
            .field("kind", &self.kind())
            .finish_non_exhaustive()
    }
}
