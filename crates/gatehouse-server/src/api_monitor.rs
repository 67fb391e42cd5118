//! Monitoring handlers: database health and alert test notifications.

use crate::{api::ApiError, AppState};
use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use gatehouse_db::HealthVerdict;
use serde::{Deserialize, Serialize};
use std::sync::{atomic::Ordering, Arc};

/// Title of the alert posted when a health probe fails.
const HEALTH_ALERT_TITLE: &str = "Database health check failed";

/// Response body for a sent test notification.
#[derive(Debug, Serialize, Deserialize)]
pub struct NotificationResponse {
    pub alert: String,
    pub title: String,
    pub message: String,
    pub link: String,
}

/// Handler for `GET /monitor/health`.
///
/// Returns `200 {"status":"PASS"}` when the database answers the liveness
/// query, `500 {"status":"FAIL","error":...}` otherwise. When
/// `alerts.notify_on_failure` is enabled, a failure that follows a pass posts
/// one alert; repeated failures during the same outage do not.
pub async fn health_handler(Extension(state): Extension<Arc<AppState>>) -> Response {
    let prober = state.prober.clone();
    let verdict = tokio::task::spawn_blocking(move || prober.probe())
        .await
        .unwrap_or_else(|e| {
            tracing::error!("health check task join error: {}", e);
            HealthVerdict::Fail {
                error: format!("health check task failed: {}", e),
            }
        });

    let previously_passed = state
        .last_health_passed
        .swap(verdict.is_pass(), Ordering::SeqCst);
    if let HealthVerdict::Fail { error } = &verdict {
        if previously_passed {
            dispatch_failure_alert(&state, error);
        } else {
            tracing::debug!("health check still failing, no new alert");
        }
    }

    let status =
        StatusCode::from_u16(verdict.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(verdict)).into_response()
}

/// Posts a failure alert in the background. Delivery errors are logged and
/// never affect the health response.
fn dispatch_failure_alert(state: &AppState, error: &str) {
    if !state.alerts.notify_on_failure {
        return;
    }
    let Some(notifier) = state.notifier.clone() else {
        tracing::debug!("health check failed but no alert webhook is configured");
        return;
    };

    let error = error.to_string();
    let link = state.alerts.app_source.clone();
    tokio::spawn(async move {
        if let Err(e) = notifier
            .failure(HEALTH_ALERT_TITLE, &error, Some(&link))
            .await
        {
            tracing::warn!("failed to send health check alert: {}", e);
        }
    });
}

/// Handler for `GET /monitor/hello/{title}/{message}`.
///
/// Sends a success notification with the given title and message, linking to
/// `alerts.app_source`.
pub async fn hello_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path((title, message)): Path<(String, String)>,
) -> Result<Json<NotificationResponse>, ApiError> {
    let notifier = state.notifier.as_ref().ok_or_else(|| {
        ApiError::ServiceUnavailable("no alert webhook configured".to_string())
    })?;
    let link = state.alerts.app_source.clone();

    notifier
        .success(&title, &message, Some(&link))
        .await
        .map_err(|e| {
            tracing::warn!(title = %title, "test notification failed: {}", e);
            ApiError::BadGateway(format!("failed to send notification: {}", e))
        })?;

    Ok(Json(NotificationResponse {
        alert: "sent notification to slack".to_string(),
        title,
        message,
        link,
    }))
}
