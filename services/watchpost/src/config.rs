//! Configuration types for the watchpost client

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::WatchpostError;

/// Everything watchpost reads from its JSON config file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub notification: NotificationConfig,
    #[serde(default = "default_notifiers")]
    pub notifiers: Vec<NotifierConfig>,
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            polling: PollingConfig::default(),
            notification: NotificationConfig::default(),
            notifiers: default_notifiers(),
            dashboard: DashboardConfig::default(),
        }
    }
}

/// Where the remote data service lives
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

/// Poll scheduler settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Re-arm delay between ticks
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Start watching as soon as the service is up
    #[serde(default = "default_true")]
    pub autostart: bool,
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            autostart: true,
        }
    }
}

/// How new-entry notifications are worded and flagged
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    #[serde(default = "default_title_template")]
    pub title_template: String,
    #[serde(default)]
    pub priority: i8,
    #[serde(default)]
    pub sound: Option<String>,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            title_template: default_title_template(),
            priority: 0,
            sound: None,
        }
    }
}

/// One notification sink, selected by its `type` tag
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NotifierConfig {
    #[serde(rename = "log")]
    Log,
    #[serde(rename = "pushover")]
    Pushover(PushoverConfig),
}

impl NotifierConfig {
    pub fn type_name(&self) -> &str {
        match self {
            NotifierConfig::Log => "log",
            NotifierConfig::Pushover(_) => "pushover",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushoverConfig {
    pub api_token: String,
    pub user_key: String,
    #[serde(default = "default_pushover_title")]
    pub default_title: String,
    #[serde(default)]
    pub default_priority: i8,
    #[serde(default = "default_pushover_sound")]
    pub default_sound: String,
}

/// Status dashboard settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_dashboard_port")]
    pub port: u16,
    #[serde(default = "default_history_size")]
    pub history_size: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: default_dashboard_port(),
            history_size: default_history_size(),
        }
    }
}

impl Config {
    /// Check values serde cannot express
    pub fn validate(&self) -> crate::Result<()> {
        if self.polling.poll_interval_ms == 0 {
            return Err(WatchpostError::Config(
                "polling.poll_interval_ms must be greater than zero".to_string(),
            ));
        }
        if reqwest::Url::parse(&self.api.base_url).is_err() {
            return Err(WatchpostError::Config(format!(
                "api.base_url '{}' is not a valid URL",
                self.api.base_url
            )));
        }
        Ok(())
    }

    /// Replace `$NAME` credentials with the value of environment variable `NAME`
    pub fn resolve_secrets(&mut self) -> crate::Result<()> {
        for notifier in &mut self.notifiers {
            if let NotifierConfig::Pushover(pushover) = notifier {
                resolve_secret(&mut pushover.api_token)?;
                resolve_secret(&mut pushover.user_key)?;
            }
        }
        Ok(())
    }
}

fn resolve_secret(value: &mut String) -> crate::Result<()> {
    if let Some(var) = value.strip_prefix('$').map(str::to_string) {
        *value = std::env::var(&var).map_err(|_| {
            WatchpostError::Config(format!("Environment variable {} is not set", var))
        })?;
    }
    Ok(())
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_poll_interval_ms() -> u64 {
    30_000
}

fn default_title_template() -> String {
    "New video from {channel}".to_string()
}

fn default_notifiers() -> Vec<NotifierConfig> {
    vec![NotifierConfig::Log]
}

fn default_pushover_title() -> String {
    "Watchpost".to_string()
}

fn default_pushover_sound() -> String {
    "pushover".to_string()
}

fn default_true() -> bool {
    true
}

fn default_dashboard_port() -> u16 {
    11120
}

fn default_history_size() -> usize {
    100
}

/// Read and parse a JSON config file
pub fn load_config(path: &Path) -> crate::Result<Config> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        WatchpostError::Config(format!("Cannot read config {}: {}", path.display(), e))
    })?;
    Ok(serde_json::from_str(&raw)?)
}
