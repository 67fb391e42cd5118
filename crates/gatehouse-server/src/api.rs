//! Error mapping and database helpers shared by request handlers.

use crate::AppState;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use gatehouse_db::{AccessError, Params, QueryFailure, Row, UpdateError};
use thiserror::Error;

/// API error type mapping to HTTP status codes.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A dependency the route needs is not configured or not initialized.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    /// An upstream service (the alert webhook) failed.
    #[error("bad gateway: {0}")]
    BadGateway(String),
    #[error("internal server error: {0}")]
    InternalServerError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg),
            ApiError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(serde_json::json!({
            "message": message
        }));

        (status, body).into_response()
    }
}

impl From<QueryFailure> for ApiError {
    fn from(failure: QueryFailure) -> Self {
        ApiError::InternalServerError(failure.message().to_string())
    }
}

impl From<UpdateError> for ApiError {
    fn from(err: UpdateError) -> Self {
        // Already logged with full context by the executor.
        ApiError::InternalServerError(err.to_string())
    }
}

impl From<AccessError> for ApiError {
    fn from(err: AccessError) -> Self {
        match &err {
            AccessError::Pool(e) => {
                tracing::error!("database pool unavailable: {}", e);
                ApiError::ServiceUnavailable("database unavailable".to_string())
            }
            AccessError::Uninitialized | AccessError::UnsupportedBackend(_) => {
                ApiError::ServiceUnavailable(err.to_string())
            }
        }
    }
}

/// Runs a read statement through the shared executor on a blocking thread.
///
/// # Errors
///
/// - [`ApiError::ServiceUnavailable`] if no executor has been initialized.
/// - [`ApiError::InternalServerError`] with the generic query message if the
///   backend fails.
pub async fn query_rows(
    state: &AppState,
    statement: impl Into<String>,
    params: Params,
) -> Result<Vec<Row>, ApiError> {
    let executor = state.registry.require()?;
    let statement = statement.into();

    tokio::task::spawn_blocking(move || executor.execute_query(&statement, &params))
        .await
        .map_err(|e| ApiError::InternalServerError(format!("task join error: {}", e)))?
        .map_err(ApiError::from)
}

/// Runs a write statement through the shared executor on a blocking thread
/// and returns the number of affected rows.
///
/// # Errors
///
/// - [`ApiError::ServiceUnavailable`] if no executor has been initialized.
/// - [`ApiError::InternalServerError`] if the backend rejects the statement.
pub async fn run_update(
    state: &AppState,
    statement: impl Into<String>,
    params: Params,
) -> Result<usize, ApiError> {
    let executor = state.registry.require()?;
    let statement = statement.into();

    tokio::task::spawn_blocking(move || executor.execute_update(&statement, &params))
        .await
        .map_err(|e| ApiError::InternalServerError(format!("task join error: {}", e)))?
        .map_err(ApiError::from)
}
