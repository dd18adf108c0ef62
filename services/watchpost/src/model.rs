//! Records exchanged with the remote data service

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Opaque identifier of a remote record
///
/// The remote emits integer primary keys; string ids are accepted too.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Int(i64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Int(n) => write!(f, "{}", n),
            RecordId::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for RecordId {
    fn from(value: i64) -> Self {
        RecordId::Int(value)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        match value.parse::<i64>() {
            Ok(n) => RecordId::Int(n),
            Err(_) => RecordId::Text(value.to_string()),
        }
    }
}

/// Processing status of a monitor log entry, as reported by the remote
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogStatus {
    #[default]
    Pending,
    #[serde(alias = "success")]
    Posted,
    Failed,
}

impl fmt::Display for LogStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogStatus::Pending => write!(f, "pending"),
            LogStatus::Posted => write!(f, "posted"),
            LogStatus::Failed => write!(f, "failed"),
        }
    }
}

/// One monitor-log entry: new content observed on a tracked channel
///
/// Only `id` and `created_at` are required; the remote leaves the other
/// columns null when it has nothing to report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: RecordId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub channel_id: String,
    #[serde(default)]
    pub channel_name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub video_id: String,
    #[serde(default)]
    pub video_title: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub comment_text: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: LogStatus,
}

impl LogEntry {
    /// Channel name, falling back to the channel id
    pub fn channel_display(&self) -> &str {
        non_blank(self.channel_name.as_deref()).unwrap_or(&self.channel_id)
    }

    /// Video title, falling back to the video id
    pub fn video_display(&self) -> &str {
        non_blank(self.video_title.as_deref()).unwrap_or(&self.video_id)
    }
}

/// A tracked channel plus the comment to post when it publishes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorTarget {
    pub id: RecordId,
    pub channel_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub channel_type: Option<String>,
    #[serde(default)]
    pub ideology: Option<String>,
    #[serde(default)]
    pub comment_text: String,
    #[serde(default)]
    pub is_active: Option<i32>,
    #[serde(default, deserialize_with = "deserialize_optional_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Request body for creating a monitor target
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewMonitorTarget {
    pub channel_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ideology: Option<String>,
    pub comment_text: String,
}

impl NewMonitorTarget {
    /// Reject requests missing a channel id or comment text
    pub fn validate(&self) -> crate::Result<()> {
        if self.channel_id.trim().is_empty() {
            return Err(crate::WatchpostError::Validation(
                "channel_id is required".to_string(),
            ));
        }
        if self.comment_text.trim().is_empty() {
            return Err(crate::WatchpostError::Validation(
                "comment_text is required".to_string(),
            ));
        }
        Ok(())
    }
}

/// Whether the remote is actively producing monitor-log entries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleState {
    Active,
    Inactive,
}

impl ToggleState {
    pub fn is_active(self) -> bool {
        self == ToggleState::Active
    }
}

impl From<bool> for ToggleState {
    fn from(active: bool) -> Self {
        if active {
            ToggleState::Active
        } else {
            ToggleState::Inactive
        }
    }
}

impl fmt::Display for ToggleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToggleState::Active => write!(f, "active"),
            ToggleState::Inactive => write!(f, "inactive"),
        }
    }
}

/// Wire form of the monitoring status
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ToggleStatus {
    pub is_active: bool,
}

impl From<ToggleStatus> for ToggleState {
    fn from(status: ToggleStatus) -> Self {
        ToggleState::from(status.is_active)
    }
}

/// A scraped channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub channel_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub channel_type: Option<String>,
    #[serde(default)]
    pub ideology: Option<String>,
    #[serde(default)]
    pub subscriber_count: Option<i64>,
    #[serde(default)]
    pub total_videos: Option<i64>,
}

/// A scraped video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    pub video_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub channel_name: Option<String>,
    #[serde(default)]
    pub views: Option<i64>,
    #[serde(default)]
    pub likes: Option<i64>,
    #[serde(default)]
    pub total_comments: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_optional_timestamp")]
    pub published_at: Option<DateTime<Utc>>,
}

/// A scraped comment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub comment_id: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(default)]
    pub like_count: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_optional_timestamp")]
    pub published_at: Option<DateTime<Utc>>,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Parse RFC 3339, or the naive ISO-8601 form the remote emits (taken as UTC)
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> std::result::Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{}'", raw)))
}

fn deserialize_optional_timestamp<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) => parse_timestamp(&raw)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{}'", raw))),
        None => Ok(None),
    }
}
