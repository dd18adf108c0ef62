//! Poll scheduler: runs the poll cycle on a fixed interval while watching

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::engine::PollCycle;
use crate::state::StateHandle;

/// Whether the monitoring view is being watched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerPhase {
    Idle,
    Active,
}

impl fmt::Display for SchedulerPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedulerPhase::Idle => write!(f, "idle"),
            SchedulerPhase::Active => write!(f, "active"),
        }
    }
}

/// Scheduler shared between the service and the dashboard
pub type SchedulerHandle = Arc<tokio::sync::Mutex<PollScheduler>>;

/// Single in-flight tick slot shared by every activation
#[derive(Default)]
struct TickSlot {
    busy: AtomicBool,
    freed: Notify,
}

impl TickSlot {
    fn try_claim(&self) -> bool {
        self.busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Resolve once no tick is in flight
    async fn wait_free(&self) {
        loop {
            let freed = self.freed.notified();
            tokio::pin!(freed);
            freed.as_mut().enable();
            if !self.is_busy() {
                return;
            }
            freed.await;
        }
    }
}

/// Frees the tick slot when a tick finishes, even by panic
struct InFlightGuard(Arc<TickSlot>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.busy.store(false, Ordering::SeqCst);
        self.0.freed.notify_waiters();
    }
}

struct Activation {
    cancel: CancellationToken,
    timer: JoinHandle<()>,
}

/// Drives [`PollCycle`] ticks between `start` and `stop`
///
/// At most one tick runs at a time; a timer firing while a tick is in
/// flight is dropped. The first tick of an activation instead waits for a
/// tick left over from the previous activation.
pub struct PollScheduler {
    cycle: Arc<PollCycle>,
    interval: Duration,
    state: StateHandle,
    shutdown: CancellationToken,
    slot: Arc<TickSlot>,
    activation: Option<Activation>,
}

impl fmt::Debug for PollScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PollScheduler")
            .field("interval", &self.interval)
            .field("phase", &self.phase())
            .finish()
    }
}

impl PollScheduler {
    pub fn new(
        cycle: Arc<PollCycle>,
        interval: Duration,
        state: StateHandle,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            cycle,
            interval,
            state,
            shutdown,
            slot: Arc::new(TickSlot::default()),
            activation: None,
        }
    }

    pub fn phase(&self) -> SchedulerPhase {
        match &self.activation {
            Some(activation) if !activation.cancel.is_cancelled() => SchedulerPhase::Active,
            _ => SchedulerPhase::Idle,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// True while a tick's fetch or dispatch is unresolved
    pub fn is_tick_in_flight(&self) -> bool {
        self.slot.is_busy()
    }

    /// Begin watching: tick now, then every interval. Returns false if
    /// already active.
    pub async fn start(&mut self) -> bool {
        if self.phase() == SchedulerPhase::Active {
            return false;
        }
        // An activation ended by the shutdown token still owns a timer task
        if let Some(stale) = self.activation.take() {
            if let Err(e) = stale.timer.await {
                tracing::warn!("Poll timer task ended abnormally: {}", e);
            }
        }

        let cancel = self.shutdown.child_token();
        let timer = tokio::spawn(timer_loop(
            Arc::clone(&self.cycle),
            self.interval,
            Arc::clone(&self.slot),
            Arc::clone(&self.state),
            cancel.clone(),
        ));
        self.activation = Some(Activation { cancel, timer });
        self.state.write().await.phase = SchedulerPhase::Active;

        tracing::info!("Watching monitor log every {:?}", self.interval);
        true
    }

    /// Stop watching. A tick already in flight finishes but its result is
    /// discarded. Returns false if already idle.
    pub async fn stop(&mut self) -> bool {
        let Some(activation) = self.activation.take() else {
            return false;
        };
        let was_active = !activation.cancel.is_cancelled();
        activation.cancel.cancel();
        if let Err(e) = activation.timer.await {
            tracing::warn!("Poll timer task ended abnormally: {}", e);
        }
        self.state.write().await.phase = SchedulerPhase::Idle;

        if was_active {
            tracing::info!("Stopped watching monitor log");
        }
        was_active
    }
}

async fn timer_loop(
    cycle: Arc<PollCycle>,
    interval: Duration,
    slot: Arc<TickSlot>,
    state: StateHandle,
    cancel: CancellationToken,
) {
    if slot.is_busy() {
        tracing::debug!("Waiting for the previous activation's tick to finish");
    }
    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            mark_idle(&state).await;
            return;
        }
        _ = slot.wait_free() => {}
    }

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        // The first tick completes immediately
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!("Poll timer cancelled");
                mark_idle(&state).await;
                break;
            }
            _ = ticker.tick() => {}
        }

        if !slot.try_claim() {
            tracing::debug!("Previous tick still in flight, dropping this one");
            state.write().await.record_dropped_tick();
            continue;
        }

        let guard = InFlightGuard(Arc::clone(&slot));
        let cycle = Arc::clone(&cycle);
        let tick_cancel = cancel.clone();
        tokio::spawn(async move {
            let _guard = guard;
            let outcome = cycle.run_tick(&tick_cancel).await;
            tracing::debug!("Tick finished: {:?}", outcome);
        });
    }
}

async fn mark_idle(state: &StateHandle) {
    state.write().await.phase = SchedulerPhase::Idle;
}
