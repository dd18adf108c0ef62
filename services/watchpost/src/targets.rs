//! Monitor target registry: the tracked channels and their queued comments

use std::sync::Arc;

use crate::api::RemoteApi;
use crate::model::{MonitorTarget, NewMonitorTarget, RecordId};

/// Client-side cache of monitor targets
///
/// The remote owns the collection; [`TargetRegistry::refresh`] replaces the
/// cache wholesale.
pub struct TargetRegistry {
    api: Arc<dyn RemoteApi>,
    cache: Vec<MonitorTarget>,
}

impl std::fmt::Debug for TargetRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TargetRegistry")
            .field("targets", &self.cache.len())
            .finish()
    }
}

impl TargetRegistry {
    pub fn new(api: Arc<dyn RemoteApi>) -> Self {
        Self {
            api,
            cache: Vec::new(),
        }
    }

    pub fn targets(&self) -> &[MonitorTarget] {
        &self.cache
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Fetch the current targets from the remote
    pub async fn refresh(&mut self) -> crate::Result<&[MonitorTarget]> {
        self.cache = self.api.fetch_monitor_targets().await?;
        tracing::debug!("Loaded {} monitor targets", self.cache.len());
        Ok(&self.cache)
    }

    /// Create a target; nothing is sent if required fields are missing
    pub async fn add(&mut self, target: NewMonitorTarget) -> crate::Result<MonitorTarget> {
        target.validate()?;
        let created = self.api.add_monitor_target(&target).await?;
        tracing::info!(
            "Monitoring channel {} as target {}",
            created.channel_id,
            created.id
        );
        self.cache.push(created.clone());
        Ok(created)
    }

    pub async fn remove(&mut self, id: &RecordId) -> crate::Result<()> {
        self.api.remove_monitor_target(id).await?;
        self.cache.retain(|t| &t.id != id);
        tracing::info!("Removed monitor target {}", id);
        Ok(())
    }

    /// Case-insensitive substring match over name, channel id, type and ideology
    pub fn filter(&self, needle: &str) -> Vec<&MonitorTarget> {
        let needle = needle.trim().to_lowercase();
        if needle.is_empty() {
            return self.cache.iter().collect();
        }
        self.cache
            .iter()
            .filter(|t| {
                [
                    Some(t.name.as_str()),
                    Some(t.channel_id.as_str()),
                    t.channel_type.as_deref(),
                    t.ideology.as_deref(),
                ]
                .into_iter()
                .flatten()
                .any(|field| field.to_lowercase().contains(&needle))
            })
            .collect()
    }
}
