//! Notification sinks for new monitor-log entries

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A notification to be delivered
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub message: String,
    /// Identifies the log entry this notification is about
    pub correlation_id: String,
    /// Where the notified content can be opened
    pub link: Option<String>,
    pub priority: i8,
    pub sound: Option<String>,
}

/// Record of a delivery attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub correlation_id: String,
    pub title: String,
    pub message: String,
    pub notifier_type: String,
    pub success: bool,
    pub error: Option<String>,
    pub timestamp_epoch_ms: u64,
}

/// Trait for delivering notifications
#[async_trait]
pub trait Notifier: Send + Sync + std::fmt::Debug {
    /// Short sink name recorded in history, e.g. "pushover"
    fn type_name(&self) -> &str;

    /// Deliver a notification; `Err` means the capability rejected it
    async fn notify(&self, notification: &Notification) -> crate::Result<()>;
}

/// Emits notifications as structured log events
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn type_name(&self) -> &str {
        "log"
    }

    async fn notify(&self, notification: &Notification) -> crate::Result<()> {
        tracing::info!(
            correlation_id = %notification.correlation_id,
            title = %notification.title,
            "{}",
            notification.message
        );
        Ok(())
    }
}
