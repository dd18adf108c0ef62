//! BDD step definitions for the poll scheduler feature

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use cucumber::{given, then, when};
use tokio::sync::Semaphore;

use watchpost::config::{Config, DashboardConfig, PollingConfig};
use watchpost::notifier::Notifier;
use watchpost::scheduler::{SchedulerHandle, SchedulerPhase};
use watchpost::WatchpostBuilder;

use crate::world::WatchpostWorld;

async fn wait_for<F, Fut>(what: &str, mut condition: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..400 {
        if condition().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("timed out waiting for {}", what);
}

pub fn scheduler(world: &mut WatchpostWorld) -> SchedulerHandle {
    if let Some(scheduler) = &world.scheduler {
        return Arc::clone(scheduler);
    }
    let config = Config {
        polling: PollingConfig {
            poll_interval_ms: world.poll_interval_ms.unwrap_or(30_000),
            autostart: false,
        },
        dashboard: DashboardConfig {
            enabled: false,
            ..DashboardConfig::default()
        },
        ..Config::default()
    };
    let watchpost = WatchpostBuilder::new(config)
        .with_remote_api(world.remote())
        .with_notifiers(vec![world.notifier() as Arc<dyn Notifier>])
        .build()
        .expect("watchpost should build");

    world.state = Some(watchpost.state());
    world.scheduler = Some(watchpost.scheduler());
    watchpost.scheduler()
}

async fn gate(world: &mut WatchpostWorld) -> Arc<Semaphore> {
    world
        .api()
        .fetch_gate
        .lock()
        .await
        .clone()
        .expect("fetches are not held open")
}

#[given(expr = "a poll interval of {int} ms")]
fn poll_interval(world: &mut WatchpostWorld, ms: u64) {
    world.poll_interval_ms = Some(ms);
}

#[given("monitor log fetches are held open")]
async fn fetches_held_open(world: &mut WatchpostWorld) {
    *world.api().fetch_gate.lock().await = Some(Arc::new(Semaphore::new(0)));
}

#[when("watching starts")]
async fn watching_starts(world: &mut WatchpostWorld) {
    let scheduler = scheduler(world);
    assert!(scheduler.lock().await.start().await, "already watching");
}

#[when("watching stops")]
async fn watching_stops(world: &mut WatchpostWorld) {
    let scheduler = scheduler(world);
    scheduler.lock().await.stop().await;
}

#[when(expr = "{int} held fetch(es) is/are released")]
async fn release_fetches(world: &mut WatchpostWorld, count: usize) {
    gate(world).await.add_permits(count);
}

#[when("all held fetches are released")]
async fn release_all(world: &mut WatchpostWorld) {
    gate(world).await.add_permits(1_000);
    let scheduler = scheduler(world);
    wait_for("the in-flight tick to finish", || {
        let scheduler = Arc::clone(&scheduler);
        async move { !scheduler.lock().await.is_tick_in_flight() }
    })
    .await;
}

#[when("the tick in flight finishes")]
async fn tick_finishes(world: &mut WatchpostWorld) {
    let scheduler = scheduler(world);
    wait_for("the in-flight tick to finish", || {
        let scheduler = Arc::clone(&scheduler);
        async move { !scheduler.lock().await.is_tick_in_flight() }
    })
    .await;
}

#[when(expr = "the monitor log has been fetched {int} time(s)")]
async fn fetched_times(world: &mut WatchpostWorld, count: usize) {
    let api = world.api();
    wait_for("monitor log fetches", || {
        let api = Arc::clone(&api);
        async move { api.log_fetches.load(Ordering::SeqCst) >= count }
    })
    .await;
}

#[when(expr = "{int} ms pass")]
async fn time_passes(_world: &mut WatchpostWorld, ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

#[then(expr = "the monitor log was fetched {int} time(s)")]
fn fetched_exactly(world: &mut WatchpostWorld, count: usize) {
    assert_eq!(world.api().log_fetches.load(Ordering::SeqCst), count);
}

#[then(expr = "at least {int} tick(s) was/were dropped")]
async fn ticks_dropped(world: &mut WatchpostWorld, count: u64) {
    let state = world.state.as_ref().expect("state not set");
    let dropped = state.read().await.stats.ticks_dropped;
    assert!(dropped >= count, "only {} tick(s) dropped", dropped);
}

#[then(expr = "{int} tick(s) was/were discarded")]
async fn ticks_discarded(world: &mut WatchpostWorld, count: u64) {
    let state = world.state.as_ref().expect("state not set");
    assert_eq!(state.read().await.stats.ticks_discarded, count);
}

#[then(expr = "{int} tick(s) completed")]
async fn ticks_completed(world: &mut WatchpostWorld, count: u64) {
    let state = world.state.as_ref().expect("state not set");
    assert_eq!(state.read().await.stats.ticks_completed, count);
}

#[then(expr = "the scheduler is {word}")]
async fn scheduler_phase(world: &mut WatchpostWorld, phase: String) {
    let expected = match phase.as_str() {
        "idle" => SchedulerPhase::Idle,
        "active" => SchedulerPhase::Active,
        other => panic!("unknown phase: {}", other),
    };
    let scheduler = scheduler(world);
    assert_eq!(scheduler.lock().await.phase(), expected);
    let state = world.state.as_ref().expect("state not set");
    assert_eq!(state.read().await.phase, expected);
}
