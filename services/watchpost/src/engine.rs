//! Engine: one fetch, compare, notify cycle over the monitor log

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::api::RemoteApi;
use crate::dispatcher::{DispatchSummary, NotificationDispatcher};
use crate::seen::SeenSetTracker;
use crate::state::StateHandle;

/// Consecutive fetch failures after which a louder warning is logged
const FETCH_ERROR_WARN_THRESHOLD: u32 = 5;

/// What a single tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The fetch succeeded and the delta was dispatched
    Completed {
        new_entries: usize,
        summary: DispatchSummary,
    },
    /// The fetch failed; the seen-set was left untouched
    FetchFailed,
    /// The scheduler went idle while the fetch was in flight
    Discarded,
}

/// Owns the seen-set and runs ticks against it
pub struct PollCycle {
    api: Arc<dyn RemoteApi>,
    tracker: Mutex<SeenSetTracker>,
    dispatcher: NotificationDispatcher,
    state: StateHandle,
}

impl std::fmt::Debug for PollCycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollCycle")
            .field("dispatcher", &self.dispatcher)
            .finish()
    }
}

impl PollCycle {
    pub fn new(
        api: Arc<dyn RemoteApi>,
        dispatcher: NotificationDispatcher,
        state: StateHandle,
    ) -> Self {
        Self {
            api,
            tracker: Mutex::new(SeenSetTracker::new()),
            dispatcher,
            state,
        }
    }

    /// Number of ids currently tracked
    pub async fn seen_count(&self) -> usize {
        self.tracker.lock().await.len()
    }

    /// Run one tick
    ///
    /// `cancel` belongs to the activation that started the tick. If it fired
    /// while the fetch was in flight the result is dropped.
    pub async fn run_tick(&self, cancel: &CancellationToken) -> TickOutcome {
        let fetched = self.api.fetch_monitor_logs().await;
        let now_ms = crate::current_epoch_ms();

        let entries = match fetched {
            Ok(entries) => entries,
            Err(e) => {
                let errors = self.state.write().await.record_fetch_failure(now_ms);
                if errors == FETCH_ERROR_WARN_THRESHOLD {
                    tracing::warn!("Monitor log fetch has failed {} times in a row", errors);
                }
                tracing::warn!("Failed to fetch monitor logs: {}", e);
                return TickOutcome::FetchFailed;
            }
        };

        if cancel.is_cancelled() {
            tracing::debug!(
                "Discarding {} fetched entries, watching stopped",
                entries.len()
            );
            self.state.write().await.record_discarded_tick();
            return TickOutcome::Discarded;
        }

        let mut tracker = self.tracker.lock().await;
        let seeding = !tracker.is_seeded();
        let delta = tracker.pending(&entries);

        tracing::debug!(
            "Fetched {} log entries, {} new{}",
            entries.len(),
            delta.len(),
            if seeding { " (seeding)" } else { "" }
        );

        let summary = self.dispatcher.dispatch_all(&delta).await;
        tracker.commit(&entries);

        self.state
            .write()
            .await
            .record_fetch_success(now_ms, tracker.len(), delta.len());

        if !delta.is_empty() {
            tracing::info!(
                "{} new log entries: {} notified, {} failed",
                delta.len(),
                summary.delivered,
                summary.failed
            );
        }

        TickOutcome::Completed {
            new_entries: delta.len(),
            summary,
        }
    }
}
