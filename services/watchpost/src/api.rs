//! Client for the remote data service

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::filter::FilterQuery;
use crate::io::{HttpClient, HttpResponse};
use crate::model::{
    Channel, Comment, LogEntry, MonitorTarget, NewMonitorTarget, RecordId, ToggleState,
    ToggleStatus, Video,
};
use crate::WatchpostError;

/// Operations the engine and views need from the remote service
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait RemoteApi: Send + Sync {
    /// Monitor-log entries, in the order the remote returns them
    async fn fetch_monitor_logs(&self) -> crate::Result<Vec<LogEntry>>;

    async fn fetch_monitor_targets(&self) -> crate::Result<Vec<MonitorTarget>>;

    async fn add_monitor_target(&self, target: &NewMonitorTarget) -> crate::Result<MonitorTarget>;

    async fn remove_monitor_target(&self, id: &RecordId) -> crate::Result<()>;

    async fn fetch_toggle_state(&self) -> crate::Result<ToggleState>;

    /// Flip the remote monitoring state and return what the remote now reports
    async fn set_toggle_state(&self) -> crate::Result<ToggleState>;

    async fn fetch_channels(&self, query: &FilterQuery) -> crate::Result<Vec<Channel>>;

    async fn fetch_videos(&self, query: &FilterQuery) -> crate::Result<Vec<Video>>;

    async fn fetch_comments(&self, query: &FilterQuery) -> crate::Result<Vec<Comment>>;
}

/// Error body the remote sends on rejected requests
#[derive(Debug, Deserialize)]
struct ErrorDetail {
    detail: serde_json::Value,
}

/// [`RemoteApi`] over HTTP + JSON
pub struct HttpRemoteApi {
    base_url: String,
    http: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for HttpRemoteApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpRemoteApi")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl HttpRemoteApi {
    pub fn new(base_url: &str, http: Arc<dyn HttpClient>) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        tracing::debug!("Created HttpRemoteApi at {}", base_url);
        Self { base_url, http }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn filtered_url(&self, path: &str, query: &FilterQuery) -> crate::Result<String> {
        let mut url = reqwest::Url::parse(&self.url(path))
            .map_err(|e| WatchpostError::Config(format!("Invalid API URL: {}", e)))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query.params());
        }
        Ok(url.to_string())
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> crate::Result<T> {
        let response = self
            .http
            .get(url)
            .await
            .map_err(|e| WatchpostError::Fetch(e.to_string()))?;
        if !response.is_success() {
            return Err(WatchpostError::Fetch(format!(
                "GET {} returned status {}",
                url, response.status
            )));
        }
        serde_json::from_str(&response.body)
            .map_err(|e| WatchpostError::Fetch(format!("Failed to parse {}: {}", url, e)))
    }
}

/// Parse each row on its own so one malformed entry cannot hide the rest
fn parse_log_rows(rows: Vec<serde_json::Value>) -> Vec<LogEntry> {
    let total = rows.len();
    let entries: Vec<LogEntry> = rows
        .into_iter()
        .enumerate()
        .filter_map(|(index, row)| match serde_json::from_value(row) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("Skipping monitor log row {}: {}", index, e);
                None
            }
        })
        .collect();
    if entries.len() < total {
        tracing::warn!(
            "Parsed {} of {} monitor log rows",
            entries.len(),
            total
        );
    }
    entries
}

fn error_detail(response: &HttpResponse) -> String {
    match serde_json::from_str::<ErrorDetail>(&response.body) {
        Ok(ErrorDetail {
            detail: serde_json::Value::String(s),
        }) => s,
        Ok(ErrorDetail { detail }) => detail.to_string(),
        Err(_) => format!("status {}: {}", response.status, response.body),
    }
}

#[async_trait]
impl RemoteApi for HttpRemoteApi {
    async fn fetch_monitor_logs(&self) -> crate::Result<Vec<LogEntry>> {
        let rows: Vec<serde_json::Value> = self.get_json(&self.url("/monitor/logs")).await?;
        Ok(parse_log_rows(rows))
    }

    async fn fetch_monitor_targets(&self) -> crate::Result<Vec<MonitorTarget>> {
        self.get_json(&self.url("/monitor/channels")).await
    }

    async fn add_monitor_target(&self, target: &NewMonitorTarget) -> crate::Result<MonitorTarget> {
        target.validate()?;
        let url = self.url("/monitor/channels");
        let body = serde_json::to_string(target)?;
        let response = self.http.post_json(&url, &body).await?;

        match response.status {
            400 | 422 => Err(WatchpostError::Validation(error_detail(&response))),
            _ if response.is_success() => Ok(serde_json::from_str(&response.body)?),
            _ => Err(WatchpostError::Http(format!(
                "POST {} returned {}",
                url,
                error_detail(&response)
            ))),
        }
    }

    async fn remove_monitor_target(&self, id: &RecordId) -> crate::Result<()> {
        let url = self.url(&format!("/monitor/channels/{}", id));
        let response = self.http.delete(&url).await?;
        if !response.is_success() {
            return Err(WatchpostError::Http(format!(
                "DELETE {} returned {}",
                url,
                error_detail(&response)
            )));
        }
        Ok(())
    }

    async fn fetch_toggle_state(&self) -> crate::Result<ToggleState> {
        let status: ToggleStatus = self.get_json(&self.url("/monitor/status")).await?;
        Ok(status.into())
    }

    async fn set_toggle_state(&self) -> crate::Result<ToggleState> {
        let url = self.url("/monitor/toggle");
        let response = self
            .http
            .post_json(&url, "{}")
            .await
            .map_err(|e| WatchpostError::Remote(e.to_string()))?;
        if !response.is_success() {
            return Err(WatchpostError::Remote(format!(
                "POST {} returned {}",
                url,
                error_detail(&response)
            )));
        }
        let status: ToggleStatus = serde_json::from_str(&response.body)
            .map_err(|e| WatchpostError::Remote(format!("Unreadable toggle reply: {}", e)))?;
        Ok(status.into())
    }

    async fn fetch_channels(&self, query: &FilterQuery) -> crate::Result<Vec<Channel>> {
        let url = self.filtered_url("/channels", query)?;
        self.get_json(&url).await
    }

    async fn fetch_videos(&self, query: &FilterQuery) -> crate::Result<Vec<Video>> {
        let url = self.filtered_url("/videos", query)?;
        self.get_json(&url).await
    }

    async fn fetch_comments(&self, query: &FilterQuery) -> crate::Result<Vec<Comment>> {
        let url = self.filtered_url("/comments", query)?;
        self.get_json(&url).await
    }
}
