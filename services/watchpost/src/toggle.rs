//! Local mirror of the remote monitoring on/off switch

use std::sync::Arc;

use crate::api::RemoteApi;
use crate::model::ToggleState;
use crate::WatchpostError;

/// Cached copy of the remote toggle state
///
/// The cache only changes from a confirmed round trip; it is never flipped
/// locally.
pub struct MonitoringToggle {
    api: Arc<dyn RemoteApi>,
    cached: Option<ToggleState>,
}

impl std::fmt::Debug for MonitoringToggle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonitoringToggle")
            .field("cached", &self.cached)
            .finish()
    }
}

impl MonitoringToggle {
    pub fn new(api: Arc<dyn RemoteApi>) -> Self {
        Self { api, cached: None }
    }

    /// Last state confirmed by the remote, if any
    pub fn current(&self) -> Option<ToggleState> {
        self.cached
    }

    /// Query the remote for the authoritative state
    pub async fn refresh(&mut self) -> crate::Result<ToggleState> {
        let state = self.api.fetch_toggle_state().await?;
        tracing::debug!("Remote monitoring is {}", state);
        self.cached = Some(state);
        Ok(state)
    }

    /// Ask the remote to flip its state and adopt whatever it reports back
    pub async fn toggle(&mut self) -> crate::Result<ToggleState> {
        match self.api.set_toggle_state().await {
            Ok(state) => {
                tracing::info!("Remote monitoring is now {}", state);
                self.cached = Some(state);
                Ok(state)
            }
            Err(e) => {
                tracing::warn!("Toggle request failed: {}", e);
                Err(match e {
                    WatchpostError::Remote(msg) => WatchpostError::Remote(msg),
                    other => WatchpostError::Remote(other.to_string()),
                })
            }
        }
    }
}
