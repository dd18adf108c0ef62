//! Turns newly detected log entries into notifications

use std::sync::Arc;

use crate::config::NotificationConfig;
use crate::model::LogEntry;
use crate::notifier::{Notification, NotificationRecord, Notifier};
use crate::state::StateHandle;
use crate::WatchpostError;

/// Outcome of dispatching one delta
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub delivered: usize,
    pub failed: usize,
}

/// Sends one notification per new log entry to every configured sink
pub struct NotificationDispatcher {
    notifiers: Vec<Arc<dyn Notifier>>,
    settings: NotificationConfig,
    state: StateHandle,
}

impl std::fmt::Debug for NotificationDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationDispatcher")
            .field("notifiers", &self.notifiers)
            .finish()
    }
}

/// Build the user-facing payload for a log entry
pub fn build_notification(entry: &LogEntry, settings: &NotificationConfig) -> Notification {
    let channel = entry.channel_display();
    let video = entry.video_display();

    let title = settings
        .title_template
        .replace("{channel}", channel)
        .replace("{video}", video);

    let mut message = format!("{} published \"{}\"", channel, video);
    if !entry.comment_text.trim().is_empty() {
        message.push_str(&format!("\nQueued comment: {}", entry.comment_text));
    }

    Notification {
        title,
        message,
        correlation_id: entry.id.to_string(),
        link: Some(format!(
            "https://www.youtube.com/watch?v={}",
            entry.video_id
        )),
        priority: settings.priority,
        sound: settings.sound.clone(),
    }
}

impl NotificationDispatcher {
    pub fn new(
        notifiers: Vec<Arc<dyn Notifier>>,
        settings: NotificationConfig,
        state: StateHandle,
    ) -> Self {
        Self {
            notifiers,
            settings,
            state,
        }
    }

    /// Deliver the notification for one entry
    ///
    /// Every sink gets the same payload. Fails with `Delivery` if any sink
    /// rejected it.
    pub async fn notify(&self, entry: &LogEntry) -> crate::Result<()> {
        let notification = build_notification(entry, &self.settings);
        let mut failures = Vec::new();

        for notifier in &self.notifiers {
            tracing::debug!(
                "Dispatching {} to '{}': {}",
                notification.correlation_id,
                notifier.type_name(),
                notification.title
            );

            let result = notifier.notify(&notification).await;
            let record = NotificationRecord {
                correlation_id: notification.correlation_id.clone(),
                title: notification.title.clone(),
                message: notification.message.clone(),
                notifier_type: notifier.type_name().to_string(),
                success: result.is_ok(),
                error: result.as_ref().err().map(|e| e.to_string()),
                timestamp_epoch_ms: crate::current_epoch_ms(),
            };
            self.state.write().await.add_notification(record);

            if let Err(e) = result {
                failures.push(format!("{}: {}", notifier.type_name(), e));
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(WatchpostError::Delivery(failures.join("; ")))
        }
    }

    /// Notify every entry of a delta, in order
    ///
    /// A failed delivery is logged and skipped; it is not retried.
    pub async fn dispatch_all(&self, delta: &[LogEntry]) -> DispatchSummary {
        let mut summary = DispatchSummary::default();
        for entry in delta {
            match self.notify(entry).await {
                Ok(()) => summary.delivered += 1,
                Err(e) => {
                    tracing::warn!("Notification for log entry {} failed: {}", entry.id, e);
                    summary.failed += 1;
                }
            }
        }
        summary
    }
}
