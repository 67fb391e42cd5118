//! Database liveness probe.

use crate::error::{AccessError, QueryError};
use crate::registry::ExecutorRegistry;
use crate::value::Params;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

/// Outcome of one probe. Serializes as `{"status":"PASS"}` or
/// `{"status":"FAIL","error":"..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "UPPERCASE")]
pub enum HealthVerdict {
    Pass,
    Fail { error: String },
}

impl HealthVerdict {
    pub fn is_pass(&self) -> bool {
        matches!(self, HealthVerdict::Pass)
    }

    /// HTTP status a monitoring endpoint should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            HealthVerdict::Pass => 200,
            HealthVerdict::Fail { .. } => 500,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            HealthVerdict::Pass => None,
            HealthVerdict::Fail { error } => Some(error),
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum ProbeError {
    #[error(transparent)]
    Access(#[from] AccessError),

    #[error("liveness query failed: {0}")]
    Query(QueryError),

    #[error("liveness query returned no rows")]
    EmptyResult,
}

/// Answers "is the database reachable and responsive" for monitoring.
#[derive(Debug, Clone)]
pub struct HealthProber {
    registry: Arc<ExecutorRegistry>,
}

impl HealthProber {
    pub fn new(registry: Arc<ExecutorRegistry>) -> Self {
        Self { registry }
    }

    /// Runs the backend's liveness query through the shared executor.
    ///
    /// A non-empty result is a pass. Anything else (no executor, a backend
    /// error, an empty result) is a failure, logged once at error level with
    /// full detail before the verdict is returned.
    pub fn probe(&self) -> HealthVerdict {
        let started = Instant::now();
        match self.check() {
            Ok(()) => {
                tracing::debug!(
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "database health check passed"
                );
                HealthVerdict::Pass
            }
            Err(err) => {
                tracing::error!(
                    error = %err,
                    detail = ?err,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "database health check failed"
                );
                HealthVerdict::Fail {
                    error: err.to_string(),
                }
            }
        }
    }

    fn check(&self) -> Result<(), ProbeError> {
        let executor = self.registry.require()?;
        let rows = executor
            .fetch(executor.kind().liveness_query(), &Params::Empty)
            .map_err(ProbeError::Query)?;
        if rows.is_empty() {
            return Err(ProbeError::EmptyResult);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::executor::QueryExecutor;
    use crate::testing::{capture_logs, StubSession};
    use crate::value::{Row, Value};
    use std::time::Duration;
    use tracing::Level;

    fn one_row() -> Vec<Row> {
        vec![Row::new([("1".to_string(), Value::Integer(1))])]
    }

    fn prober_with(session: StubSession) -> HealthProber {
        let registry = Arc::new(ExecutorRegistry::new());
        registry.install(QueryExecutor::new(Box::new(session)));
        HealthProber::new(registry)
    }

    #[test]
    fn verdict_serializes_with_status_tag() {
        let pass = serde_json::to_value(HealthVerdict::Pass).unwrap();
        assert_eq!(pass, serde_json::json!({ "status": "PASS" }));

        let fail = serde_json::to_value(HealthVerdict::Fail {
            error: "boom".to_string(),
        })
        .unwrap();
        assert_eq!(fail, serde_json::json!({ "status": "FAIL", "error": "boom" }));
    }

    #[test]
    fn connected_backend_passes() {
        let verdict = prober_with(StubSession::rows(one_row())).probe();
        assert_eq!(verdict, HealthVerdict::Pass);
        assert_eq!(verdict.status_code(), 200);
    }

    #[test]
    fn slow_backend_still_passes() {
        let session = StubSession::rows(one_row()).delayed(Duration::from_millis(50));
        assert!(prober_with(session).probe().is_pass());
    }

    #[test]
    fn empty_result_fails() {
        let verdict = prober_with(StubSession::rows(vec![])).probe();
        assert_eq!(verdict.error(), Some("liveness query returned no rows"));
        assert_eq!(verdict.status_code(), 500);
    }

    #[test]
    fn refused_connection_fails_with_one_error_line() {
        let prober = prober_with(StubSession::failing(QueryError::new(
            ErrorKind::Connection,
            "pool checkout: gatehouse.db",
            "connection refused",
        )));

        for _ in 0..3 {
            let (verdict, logs) = capture_logs(|| prober.probe());
            let error = verdict.error().expect("probe should fail");
            assert!(error.contains("connection refused"), "error: {error}");
            assert!(!error.contains("pool checkout"), "context must not leak: {error}");

            let lines = logs.at(Level::ERROR);
            assert_eq!(lines.len(), 1, "exactly one error line per probe");
            assert!(lines[0].contains("connection refused"));
            assert!(lines[0].contains("pool checkout: gatehouse.db"));
        }
    }

    #[test]
    fn uninitialized_registry_fails_with_configuration_error() {
        let prober = HealthProber::new(Arc::new(ExecutorRegistry::new()));
        let verdict = prober.probe();
        assert_eq!(
            verdict.error(),
            Some("database executor has not been initialized")
        );
    }
}
