//! Shared state for poll statistics and notification history

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::notifier::NotificationRecord;
use crate::scheduler::SchedulerPhase;

/// Counters describing the poll loop
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PollStats {
    pub ticks_completed: u64,
    pub ticks_dropped: u64,
    pub ticks_discarded: u64,
    pub fetch_failures: u64,
    pub consecutive_fetch_errors: u32,
    pub last_poll_epoch_ms: u64,
    pub last_success_epoch_ms: Option<u64>,
    pub seen_count: usize,
    pub new_entries: u64,
    pub notifications_sent: u64,
    pub notifications_failed: u64,
}

/// Shared state written by the poll loop and read by the dashboard
#[derive(Debug)]
pub struct SharedState {
    pub phase: SchedulerPhase,
    pub poll_interval_ms: u64,
    pub stats: PollStats,
    pub history: VecDeque<NotificationRecord>,
    pub history_max_size: usize,
    pub started_at: Instant,
}

impl SharedState {
    pub fn new(poll_interval_ms: u64, history_max_size: usize) -> Self {
        Self {
            phase: SchedulerPhase::Idle,
            poll_interval_ms,
            stats: PollStats::default(),
            history: VecDeque::with_capacity(history_max_size),
            history_max_size,
            started_at: Instant::now(),
        }
    }

    /// Record a completed tick
    pub fn record_fetch_success(&mut self, now_ms: u64, seen_count: usize, new_entries: usize) {
        self.stats.ticks_completed += 1;
        self.stats.consecutive_fetch_errors = 0;
        self.stats.last_poll_epoch_ms = now_ms;
        self.stats.last_success_epoch_ms = Some(now_ms);
        self.stats.seen_count = seen_count;
        self.stats.new_entries += new_entries as u64;
    }

    /// Record a failed fetch, returning the consecutive error count
    pub fn record_fetch_failure(&mut self, now_ms: u64) -> u32 {
        self.stats.fetch_failures += 1;
        self.stats.consecutive_fetch_errors += 1;
        self.stats.last_poll_epoch_ms = now_ms;
        self.stats.consecutive_fetch_errors
    }

    /// A timer fired while a tick was still in flight
    pub fn record_dropped_tick(&mut self) {
        self.stats.ticks_dropped += 1;
    }

    /// A fetch resolved after the scheduler went idle
    pub fn record_discarded_tick(&mut self) {
        self.stats.ticks_discarded += 1;
    }

    /// Add a delivery attempt to history
    pub fn add_notification(&mut self, record: NotificationRecord) {
        if record.success {
            self.stats.notifications_sent += 1;
        } else {
            self.stats.notifications_failed += 1;
        }
        if self.history_max_size == 0 {
            return;
        }
        if self.history.len() >= self.history_max_size {
            self.history.pop_front();
        }
        self.history.push_back(record);
    }
}

/// Thread-safe shared state handle
pub type StateHandle = Arc<RwLock<SharedState>>;

pub fn new_state_handle(poll_interval_ms: u64, history_max_size: usize) -> StateHandle {
    Arc::new(RwLock::new(SharedState::new(
        poll_interval_ms,
        history_max_size,
    )))
}
