//! Filter queries and the per-view fetch policy

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A filterable dimension of the channel, video and comment views
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterField {
    ChannelName,
    ChannelType,
    Ideology,
    VideoId,
}

/// Dimensions shared by every view
pub const CHANNEL_FIELDS: &[FilterField] = &[
    FilterField::ChannelName,
    FilterField::ChannelType,
    FilterField::Ideology,
];

impl FilterField {
    /// Query-string parameter name
    pub fn param(self) -> &'static str {
        match self {
            FilterField::ChannelName => "channel_name",
            FilterField::ChannelType => "channel_type",
            FilterField::Ideology => "ideology",
            FilterField::VideoId => "video_id",
        }
    }
}

impl fmt::Display for FilterField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.param())
    }
}

/// Current values of a view's filter dimensions
///
/// Blank values are never stored, so an absent key and an empty field are
/// the same thing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterQuery {
    values: BTreeMap<FilterField, String>,
}

impl FilterQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`FilterQuery::set`]
    pub fn with(mut self, field: FilterField, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    /// Set a dimension, returning true if its effective value changed
    pub fn set(&mut self, field: FilterField, value: impl Into<String>) -> bool {
        let value = value.into();
        let value = value.trim();
        if value.is_empty() {
            self.values.remove(&field).is_some()
        } else if self.get(field) == Some(value) {
            false
        } else {
            self.values.insert(field, value.to_string());
            true
        }
    }

    /// Clear a dimension, returning true if it held a value
    pub fn clear(&mut self, field: FilterField) -> bool {
        self.values.remove(&field).is_some()
    }

    pub fn get(&self, field: FilterField) -> Option<&str> {
        self.values.get(&field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// True if any of the given dimensions holds a value
    pub fn has_any(&self, fields: &[FilterField]) -> bool {
        fields.iter().any(|f| self.values.contains_key(f))
    }

    /// Canonical query-string pairs, in a stable order
    pub fn params(&self) -> Vec<(&'static str, &str)> {
        self.values
            .iter()
            .map(|(field, value)| (field.param(), value.as_str()))
            .collect()
    }
}

/// When a view is allowed to hit the remote
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPolicy {
    /// Fetch even with no filters set
    Always,
    /// Fetch only when at least one of these dimensions is set
    AnyOf(&'static [FilterField]),
    /// Fetch only when this dimension is set
    Requires(FilterField),
}

/// Channel list: unfiltered fetch by default
pub const CHANNEL_LIST_POLICY: FetchPolicy = FetchPolicy::Always;
/// Video list
pub const VIDEO_LIST_POLICY: FetchPolicy = FetchPolicy::AnyOf(CHANNEL_FIELDS);
/// Candidate videos offered by the comment view's picker
pub const COMMENT_SOURCE_POLICY: FetchPolicy = FetchPolicy::AnyOf(CHANNEL_FIELDS);
/// Comment list: needs a selected video
pub const COMMENT_LIST_POLICY: FetchPolicy = FetchPolicy::Requires(FilterField::VideoId);

/// Outcome of resolving a query against a policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Fetch(FilterQuery),
    Clear,
}

impl FetchPolicy {
    pub fn resolve(self, query: &FilterQuery) -> Resolution {
        let allowed = match self {
            FetchPolicy::Always => true,
            FetchPolicy::AnyOf(fields) => query.has_any(fields),
            FetchPolicy::Requires(field) => query.get(field).is_some(),
        };
        if allowed {
            Resolution::Fetch(query.clone())
        } else {
            Resolution::Clear
        }
    }
}
