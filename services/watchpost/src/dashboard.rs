//! JSON dashboard: poll statistics, notification history, watch control

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;

use crate::scheduler::SchedulerHandle;
use crate::state::StateHandle;

/// Dashboard application state
#[derive(Clone)]
pub struct DashboardState {
    pub state: StateHandle,
    pub scheduler: SchedulerHandle,
}

/// Build the dashboard axum router
pub fn build_router(state: StateHandle, scheduler: SchedulerHandle) -> Router {
    let dashboard_state = DashboardState { state, scheduler };

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/status", get(status_handler))
        .route("/api/history", get(history_handler))
        .route("/api/watch/start", post(watch_start_handler))
        .route("/api/watch/stop", post(watch_stop_handler))
        .layer(CorsLayer::permissive())
        .with_state(dashboard_state)
}

async fn health_handler() -> impl IntoResponse {
    "OK"
}

async fn status_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    let state = dashboard.state.read().await;
    Json(serde_json::json!({
        "phase": state.phase,
        "poll_interval_ms": state.poll_interval_ms,
        "uptime_seconds": state.started_at.elapsed().as_secs(),
        "stats": state.stats,
    }))
}

async fn history_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    let state = dashboard.state.read().await;
    let history: Vec<_> = state.history.iter().cloned().collect();
    Json(history)
}

async fn watch_start_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    let mut scheduler = dashboard.scheduler.lock().await;
    let changed = scheduler.start().await;
    Json(serde_json::json!({
        "phase": scheduler.phase(),
        "changed": changed,
    }))
}

async fn watch_stop_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    let mut scheduler = dashboard.scheduler.lock().await;
    let changed = scheduler.stop().await;
    Json(serde_json::json!({
        "phase": scheduler.phase(),
        "changed": changed,
    }))
}
