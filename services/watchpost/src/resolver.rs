//! Cascading filter views over channels, videos and comments
//!
//! Each view owns its filter query and its last fetched collection. Setters
//! trigger re-resolution; a setter that does not change the effective query
//! does nothing.

use std::future::Future;
use std::sync::Arc;

use crate::api::RemoteApi;
use crate::filter::{
    FetchPolicy, FilterField, FilterQuery, Resolution, CHANNEL_LIST_POLICY, COMMENT_LIST_POLICY,
    COMMENT_SOURCE_POLICY, VIDEO_LIST_POLICY,
};
use crate::model::{Channel, Comment, Video};
use crate::WatchpostError;

pub struct FilterResolver {
    api: Arc<dyn RemoteApi>,
    channel_filters: FilterQuery,
    channels: Vec<Channel>,
    video_filters: FilterQuery,
    videos: Vec<Video>,
    comment_filters: FilterQuery,
    candidate_videos: Vec<Video>,
    comments: Vec<Comment>,
}

impl std::fmt::Debug for FilterResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterResolver")
            .field("channel_filters", &self.channel_filters)
            .field("video_filters", &self.video_filters)
            .field("comment_filters", &self.comment_filters)
            .finish()
    }
}

/// Apply `policy` to `query`, then either fetch into `items` or clear them.
/// On fetch failure `items` is left as it was.
async fn resolve_view<T, F, Fut>(
    view: &str,
    policy: FetchPolicy,
    query: &FilterQuery,
    items: &mut Vec<T>,
    fetch: F,
) -> crate::Result<()>
where
    F: FnOnce(FilterQuery) -> Fut,
    Fut: Future<Output = crate::Result<Vec<T>>>,
{
    match policy.resolve(query) {
        Resolution::Clear => {
            tracing::debug!("No {} filter set, clearing view", view);
            items.clear();
            Ok(())
        }
        Resolution::Fetch(query) => {
            tracing::debug!("Fetching {} with {:?}", view, query.params());
            match fetch(query).await {
                Ok(fetched) => {
                    tracing::debug!("Loaded {} {}", fetched.len(), view);
                    *items = fetched;
                    Ok(())
                }
                Err(e) => {
                    tracing::warn!("Failed to load {}: {}", view, e);
                    Err(match e {
                        WatchpostError::Fetch(msg) => WatchpostError::Fetch(msg),
                        other => WatchpostError::Fetch(other.to_string()),
                    })
                }
            }
        }
    }
}

fn reject_video_id(field: FilterField, view: &str) -> crate::Result<()> {
    if field == FilterField::VideoId {
        return Err(WatchpostError::Validation(format!(
            "{} is not a filter of the {} view",
            field, view
        )));
    }
    Ok(())
}

impl FilterResolver {
    pub fn new(api: Arc<dyn RemoteApi>) -> Self {
        Self {
            api,
            channel_filters: FilterQuery::new(),
            channels: Vec::new(),
            video_filters: FilterQuery::new(),
            videos: Vec::new(),
            comment_filters: FilterQuery::new(),
            candidate_videos: Vec::new(),
            comments: Vec::new(),
        }
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn videos(&self) -> &[Video] {
        &self.videos
    }

    /// Videos offered by the comment view's picker
    pub fn candidate_videos(&self) -> &[Video] {
        &self.candidate_videos
    }

    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    pub fn channel_filters(&self) -> &FilterQuery {
        &self.channel_filters
    }

    pub fn video_filters(&self) -> &FilterQuery {
        &self.video_filters
    }

    pub fn comment_filters(&self) -> &FilterQuery {
        &self.comment_filters
    }

    pub fn selected_video(&self) -> Option<&str> {
        self.comment_filters.get(FilterField::VideoId)
    }

    pub async fn resolve_channels(&mut self) -> crate::Result<()> {
        let api = Arc::clone(&self.api);
        resolve_view(
            "channels",
            CHANNEL_LIST_POLICY,
            &self.channel_filters,
            &mut self.channels,
            move |q| async move { api.fetch_channels(&q).await },
        )
        .await
    }

    pub async fn resolve_videos(&mut self) -> crate::Result<()> {
        let api = Arc::clone(&self.api);
        resolve_view(
            "videos",
            VIDEO_LIST_POLICY,
            &self.video_filters,
            &mut self.videos,
            move |q| async move { api.fetch_videos(&q).await },
        )
        .await
    }

    /// Refresh the comment view's video picker from its channel dimensions
    pub async fn resolve_comment_source(&mut self) -> crate::Result<()> {
        let api = Arc::clone(&self.api);
        let mut source = self.comment_filters.clone();
        source.clear(FilterField::VideoId);
        resolve_view(
            "candidate videos",
            COMMENT_SOURCE_POLICY,
            &source,
            &mut self.candidate_videos,
            move |q| async move { api.fetch_videos(&q).await },
        )
        .await
    }

    pub async fn resolve_comments(&mut self) -> crate::Result<()> {
        let api = Arc::clone(&self.api);
        resolve_view(
            "comments",
            COMMENT_LIST_POLICY,
            &self.comment_filters,
            &mut self.comments,
            move |q| async move { api.fetch_comments(&q).await },
        )
        .await
    }

    /// Load every view from its current filters
    pub async fn refresh(&mut self) -> crate::Result<()> {
        self.resolve_channels().await?;
        self.resolve_videos().await?;
        self.resolve_comment_source().await?;
        self.resolve_comments().await
    }

    /// Returns false without fetching if the value was already set
    pub async fn set_channel_filter(
        &mut self,
        field: FilterField,
        value: &str,
    ) -> crate::Result<bool> {
        reject_video_id(field, "channel")?;
        if !self.channel_filters.set(field, value) {
            return Ok(false);
        }
        self.resolve_channels().await?;
        Ok(true)
    }

    pub async fn set_video_filter(&mut self, field: FilterField, value: &str) -> crate::Result<bool> {
        reject_video_id(field, "video")?;
        if !self.video_filters.set(field, value) {
            return Ok(false);
        }
        self.resolve_videos().await?;
        Ok(true)
    }

    /// Change an upstream dimension of the comment view
    ///
    /// Any change invalidates the selected video and its comments before the
    /// picker is re-resolved.
    pub async fn set_comment_filter(
        &mut self,
        field: FilterField,
        value: &str,
    ) -> crate::Result<bool> {
        if field == FilterField::VideoId {
            return Err(WatchpostError::Validation(
                "select a video with select_comment_video".to_string(),
            ));
        }
        if !self.comment_filters.set(field, value) {
            return Ok(false);
        }
        if self.comment_filters.clear(FilterField::VideoId) {
            tracing::debug!("Upstream comment filter changed, video selection cleared");
        }
        self.comments.clear();
        self.resolve_comment_source().await?;
        Ok(true)
    }

    /// Pick the video whose comments are shown; blank deselects
    pub async fn select_comment_video(&mut self, video_id: &str) -> crate::Result<bool> {
        if !self.comment_filters.set(FilterField::VideoId, video_id) {
            return Ok(false);
        }
        self.resolve_comments().await?;
        Ok(true)
    }
}
