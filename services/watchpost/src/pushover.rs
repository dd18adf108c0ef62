//! Pushover delivery for new-entry alerts

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::PushoverConfig;
use crate::io::HttpClient;
use crate::notifier::{Notification, Notifier};
use crate::WatchpostError;

const PUSHOVER_API_URL: &str = "https://api.pushover.net/1/messages.json";

/// Delivers alerts through the Pushover messages API
pub struct PushoverNotifier {
    config: PushoverConfig,
    http: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for PushoverNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PushoverNotifier")
            .field("default_title", &self.config.default_title)
            .finish()
    }
}

impl PushoverNotifier {
    pub fn new(config: &PushoverConfig, http: Arc<dyn HttpClient>) -> Self {
        tracing::debug!(
            "Created PushoverNotifier with title '{}'",
            config.default_title
        );
        Self {
            config: config.clone(),
            http,
        }
    }
}

#[async_trait]
impl Notifier for PushoverNotifier {
    fn type_name(&self) -> &str {
        "pushover"
    }

    async fn notify(&self, notification: &Notification) -> crate::Result<()> {
        let title: &str = if notification.title.is_empty() {
            &self.config.default_title
        } else {
            &notification.title
        };
        let priority = if notification.priority != 0 {
            notification.priority
        } else {
            self.config.default_priority
        };
        let sound = notification
            .sound
            .as_deref()
            .unwrap_or(&self.config.default_sound);

        let priority_str = priority.to_string();
        let mut params = vec![
            ("token", self.config.api_token.as_str()),
            ("user", self.config.user_key.as_str()),
            ("title", title),
            ("message", notification.message.as_str()),
            ("priority", priority_str.as_str()),
            ("sound", sound),
        ];
        if let Some(link) = notification.link.as_deref() {
            params.push(("url", link));
            params.push(("url_title", "Open video"));
        }

        tracing::debug!(
            "Sending Pushover notification {}: title='{}', priority={}",
            notification.correlation_id,
            title,
            priority
        );

        let response = self
            .http
            .post_form(PUSHOVER_API_URL, &params)
            .await
            .map_err(|e| WatchpostError::Delivery(format!("Pushover unreachable: {}", e)))?;

        if response.status != 200 {
            return Err(WatchpostError::Delivery(format!(
                "Pushover rejected alert {} with status {}: {}",
                notification.correlation_id, response.status, response.body
            )));
        }

        tracing::debug!("Pushover notification {} accepted", notification.correlation_id);
        Ok(())
    }
}
