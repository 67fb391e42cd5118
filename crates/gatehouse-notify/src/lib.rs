//! Outbound alerts for Gatehouse.
//!
//! A single-shot client for Slack-style incoming webhooks. The database
//! layer never calls this crate; the server dispatches an alert when a
//! health probe fails, and exposes a route that sends a test notification.

mod error;
mod slack;

pub use error::NotifyError;
pub use slack::{build_payload, AlertLevel, SlackNotifier};
