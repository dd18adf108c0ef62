//! Error types for the watchpost client

/// Errors that can occur in the watchpost client
#[derive(Debug, thiserror::Error)]
pub enum WatchpostError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// A read against the remote service failed
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// A request was rejected before anything was created
    #[error("Validation error: {0}")]
    Validation(String),

    /// The notification capability rejected a delivery
    #[error("Delivery error: {0}")]
    Delivery(String),

    /// The monitoring toggle round trip failed
    #[error("Remote error: {0}")]
    Remote(String),

    #[error("Dashboard error: {0}")]
    Dashboard(String),
}

/// Result type alias for watchpost operations
pub type Result<T> = std::result::Result<T, WatchpostError>;
