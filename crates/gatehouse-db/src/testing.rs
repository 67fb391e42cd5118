//! Test doubles: scripted sessions and a log-capturing subscriber.

use crate::error::QueryError;
use crate::session::{DatabaseKind, DatabaseSession};
use crate::value::{Params, Row};
use std::fmt::{self, Write as _};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

/// A session that answers every call from a script.
pub(crate) struct StubSession {
    outcome: Result<Vec<Row>, QueryError>,
    affected: usize,
    delay: Duration,
}

impl StubSession {
    pub(crate) fn rows(rows: Vec<Row>) -> Self {
        Self {
            outcome: Ok(rows),
            affected: 0,
            delay: Duration::ZERO,
        }
    }

    pub(crate) fn failing(err: QueryError) -> Self {
        Self {
            outcome: Err(err),
            affected: 0,
            delay: Duration::ZERO,
        }
    }

    pub(crate) fn affecting(mut self, affected: usize) -> Self {
        self.affected = affected;
        self
    }

    pub(crate) fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn respond<T>(&self, ok: impl FnOnce(&[Row]) -> T) -> Result<T, QueryError> {
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        match &self.outcome {
            Ok(rows) => Ok(ok(rows.as_slice())),
            Err(err) => Err(err.clone()),
        }
    }
}

impl DatabaseSession for StubSession {
    fn kind(&self) -> DatabaseKind {
        DatabaseKind::Sqlite
    }

    fn query(&self, _statement: &str, _params: &Params) -> Result<Vec<Row>, QueryError> {
        self.respond(<[Row]>::to_vec)
    }

    fn execute(&self, _statement: &str, _params: &Params) -> Result<usize, QueryError> {
        self.respond(|_| self.affected)
    }

    fn health_check(&self) -> Result<bool, QueryError> {
        self.respond(|_| true)
    }
}

/// Events recorded while a closure ran, rendered as `field=value` strings.
#[derive(Clone, Default)]
pub(crate) struct CapturedLogs(Arc<Mutex<Vec<(Level, String)>>>);

impl CapturedLogs {
    pub(crate) fn at(&self, level: Level) -> Vec<String> {
        self.0
            .lock()
            .unwrap()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, line)| line.clone())
            .collect()
    }
}

impl<S: Subscriber> Layer<S> for CapturedLogs {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut line = FieldWriter(String::new());
        event.record(&mut line);
        self.0
            .lock()
            .unwrap()
            .push((*event.metadata().level(), line.0));
    }
}

struct FieldWriter(String);

impl Visit for FieldWriter {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        let _ = write!(self.0, "{}={:?} ", field.name(), value);
    }
}

/// Runs `f` with a subscriber that records every event it emits.
pub(crate) fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, CapturedLogs) {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::registry().with(logs.clone());
    let out = tracing::subscriber::with_default(subscriber, f);
    (out, logs)
}
