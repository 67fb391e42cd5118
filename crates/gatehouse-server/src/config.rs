//! Server configuration loading from file and environment variables.

use gatehouse_db::DatabaseConfig;
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use thiserror::Error;

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server network settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Database connection settings.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Alert webhook settings.
    #[serde(default)]
    pub alerts: AlertsConfig,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "gatehouse_db=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

/// Where and how alerts are posted.
#[derive(Debug, Clone, Deserialize)]
pub struct AlertsConfig {
    /// Incoming-webhook URL. Alerts are disabled when unset.
    #[serde(default)]
    pub webhook_url: Option<String>,

    /// Name the alerts are posted under.
    #[serde(default = "default_alert_username")]
    pub username: String,

    /// Link attached to every alert, usually the service's source or runbook.
    #[serde(default)]
    pub app_source: String,

    /// Post a failure alert whenever a health probe fails.
    #[serde(default)]
    pub notify_on_failure: bool,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_alert_username() -> String {
    "gatehouse".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            username: default_alert_username(),
            app_source: String::new(),
            notify_on_failure: false,
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `GATEHOUSE_HOST` overrides `server.host`
/// - `GATEHOUSE_PORT` overrides `server.port`
/// - `GATEHOUSE_DB_KIND` overrides `database.kind`
/// - `GATEHOUSE_DB_PATH` overrides `database.path`
/// - `GATEHOUSE_LOG_LEVEL` overrides `logging.level`
/// - `GATEHOUSE_LOG_JSON` overrides `logging.json` (set to "true" to enable)
/// - `GATEHOUSE_SLACK_WEBHOOK` overrides `alerts.webhook_url`
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

fn apply_env_overrides(config: &mut Config, var: impl Fn(&str) -> Option<String>) {
    if let Some(host) = var("GATEHOUSE_HOST") {
        if let Ok(parsed) = host.parse() {
            config.server.host = parsed;
        }
    }
    if let Some(port) = var("GATEHOUSE_PORT") {
        if let Ok(parsed) = port.parse() {
            config.server.port = parsed;
        }
    }
    if let Some(kind) = var("GATEHOUSE_DB_KIND") {
        match kind.parse() {
            Ok(parsed) => config.database.kind = parsed,
            Err(e) => tracing::warn!("ignoring GATEHOUSE_DB_KIND: {}", e),
        }
    }
    if let Some(db_path) = var("GATEHOUSE_DB_PATH") {
        config.database.path = db_path;
    }
    if let Some(level) = var("GATEHOUSE_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = var("GATEHOUSE_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
    if let Some(webhook) = var("GATEHOUSE_SLACK_WEBHOOK") {
        config.alerts.webhook_url = Some(webhook).filter(|w| !w.trim().is_empty());
    }
}
