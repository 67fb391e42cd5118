//! Holder for the one shared query executor.

use crate::error::AccessError;
use crate::executor::QueryExecutor;
use crate::session::{DatabaseConfig, DatabaseKind, SqliteSession};
use std::sync::{Arc, PoisonError, RwLock};

/// Owns the process's single [`QueryExecutor`].
///
/// Built once by the startup routine and handed to request handlers through
/// application state. Until [`ExecutorRegistry::initialize`] or
/// [`ExecutorRegistry::install`] succeeds, every lookup through
/// [`ExecutorRegistry::require`] fails with [`AccessError::Uninitialized`].
#[derive(Debug, Default)]
pub struct ExecutorRegistry {
    current: RwLock<Option<Arc<QueryExecutor>>>,
}

impl ExecutorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a session for `kind` and makes its executor the shared one.
    ///
    /// Calling this again replaces the held executor; it is meant for
    /// startup, not for request paths.
    ///
    /// # Errors
    ///
    /// - [`AccessError::UnsupportedBackend`] if `kind` has no session
    ///   implementation. The registry is left empty.
    /// - [`AccessError::Pool`] if the connection pool cannot be created. The
    ///   previously held executor, if any, is kept. An unreachable database
    ///   is not an error here; it fails each checkout instead.
    pub fn initialize(
        &self,
        kind: DatabaseKind,
        config: &DatabaseConfig,
    ) -> Result<Arc<QueryExecutor>, AccessError> {
        let session = match kind {
            DatabaseKind::Sqlite => SqliteSession::open(config)?,
            DatabaseKind::Postgres | DatabaseKind::Oracle => {
                tracing::warn!(kind = %kind, "no session implementation for database kind");
                self.clear();
                return Err(AccessError::UnsupportedBackend(kind));
            }
        };

        Ok(self.install(QueryExecutor::new(Box::new(session))))
    }

    /// Makes `executor` the shared executor and returns a handle to it.
    pub fn install(&self, executor: QueryExecutor) -> Arc<QueryExecutor> {
        let executor = Arc::new(executor);
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        if current.is_some() {
            tracing::warn!("replacing the shared query executor");
        }
        *current = Some(Arc::clone(&executor));
        executor
    }

    /// The shared executor, if one has been initialized.
    pub fn current(&self) -> Option<Arc<QueryExecutor>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The shared executor.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::Uninitialized`] if no executor is held.
    pub fn require(&self) -> Result<Arc<QueryExecutor>, AccessError> {
        self.current().ok_or(AccessError::Uninitialized)
    }

    fn clear(&self) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}
