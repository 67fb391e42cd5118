//! Database access and health-check layer for Gatehouse.
//!
//! Every query and update issued by a request handler goes through one
//! [`QueryExecutor`], which owns a pooled [`DatabaseSession`] and applies a
//! uniform failure policy. [`HealthProber`] builds a PASS/FAIL liveness
//! verdict on top of the same executor.
//!
//! # Design decisions
//!
//! - **Pooling is delegated**: the SQLite session is an `r2d2` pool of
//!   `rusqlite` connections. This crate never opens or closes connections per
//!   request.
//! - **Typed backend errors**: sessions classify failures into a
//!   [`QueryError`] (`kind`, `context`, `message`) when they happen, so the
//!   executor never inspects raw driver errors.
//! - **Reads absorb, writes propagate**: a failed read is logged and becomes
//!   the generic [`QueryFailure`]; a failed write is logged and returned as an
//!   [`UpdateError`] that still carries the original [`QueryError`].
//! - **Explicit ownership**: the shared executor lives in an
//!   [`ExecutorRegistry`] built by the service's startup routine and passed
//!   to handlers, rather than in a global.

mod error;
mod executor;
mod pool;
mod probe;
mod registry;
mod session;
mod value;

#[cfg(test)]
mod testing;

pub use error::{
    AccessError, ErrorKind, QueryError, QueryFailure, UpdateError, GENERIC_QUERY_FAILURE,
};
pub use executor::QueryExecutor;
pub use pool::{create_pool, DbPool, DbRuntimeSettings, PoolError};
pub use probe::{HealthProber, HealthVerdict};
pub use registry::ExecutorRegistry;
pub use session::{
    DatabaseConfig, DatabaseKind, DatabaseSession, ParseDatabaseKindError, SqliteSession,
};
pub use value::{Params, Row, Value};
