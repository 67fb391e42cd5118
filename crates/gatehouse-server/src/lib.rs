//! Gatehouse server library logic.

pub mod api;
pub mod api_monitor;
pub mod config;

use axum::{routing::get, Extension, Router};
use config::AlertsConfig;
use gatehouse_db::{ExecutorRegistry, HealthProber};
use gatehouse_notify::SlackNotifier;
use std::sync::{atomic::AtomicBool, Arc};
use tower_http::trace::TraceLayer;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Holder of the shared query executor.
    pub registry: Arc<ExecutorRegistry>,
    /// Liveness prober over the same registry.
    pub prober: HealthProber,
    /// Alert webhook client, when a webhook is configured.
    pub notifier: Option<SlackNotifier>,
    /// Alert settings.
    pub alerts: AlertsConfig,
    /// Whether the previous health probe passed. Starts `true`.
    pub last_health_passed: Arc<AtomicBool>,
}

impl AppState {
    /// Builds request state around an already constructed registry.
    pub fn new(registry: Arc<ExecutorRegistry>, alerts: AlertsConfig) -> Self {
        let notifier = alerts
            .webhook_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .map(|url| SlackNotifier::new(url, alerts.username.clone()));
        if notifier.is_none() {
            tracing::info!("no alert webhook configured, notifications disabled");
        }

        Self {
            prober: HealthProber::new(Arc::clone(&registry)),
            registry,
            notifier,
            alerts,
            last_health_passed: Arc::new(AtomicBool::new(true)),
        }
    }
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/monitor/health", get(api_monitor::health_handler))
        .route(
            "/monitor/hello/{title}/{message}",
            get(api_monitor::hello_handler),
        )
        .layer(TraceLayer::new_for_http())
        .layer(Extension(Arc::new(state)))
}
