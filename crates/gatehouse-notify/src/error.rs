//! Error types for alert delivery.

/// Errors that can occur while posting an alert.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// The webhook could not be reached or the request could not be built.
    #[error("failed to reach webhook: {0}")]
    Transport(#[from] reqwest::Error),

    /// The webhook answered with a non-success status.
    #[error("webhook rejected notification with status {status}: {body}")]
    Rejected {
        /// HTTP status returned by the webhook.
        status: u16,
        /// Response body, as returned.
        body: String,
    },
}
