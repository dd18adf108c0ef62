//! Watchpost - monitor-log watcher and notification client
//!
//! Polls the remote monitor log, notifies once per newly seen entry, and
//! exposes the remote's monitor targets, toggle and filtered views.

pub mod api;
pub mod config;
pub mod dashboard;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod filter;
pub mod io;
pub mod model;
pub mod notifier;
pub mod pushover;
pub mod resolver;
pub mod scheduler;
pub mod seen;
pub mod state;
pub mod targets;
pub mod toggle;

pub use config::{load_config, Config};
pub use error::{Result, WatchpostError};

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tokio_util::sync::CancellationToken;

use crate::api::{HttpRemoteApi, RemoteApi};
use crate::config::NotifierConfig;
use crate::dispatcher::NotificationDispatcher;
use crate::engine::PollCycle;
use crate::io::{HttpClient, ReqwestHttpClient};
use crate::notifier::{LogNotifier, Notifier};
use crate::pushover::PushoverNotifier;
use crate::scheduler::{PollScheduler, SchedulerHandle};
use crate::state::StateHandle;

pub(crate) fn current_epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Assembles a [`Watchpost`] from configuration, with optional injected
/// collaborators for tests
pub struct WatchpostBuilder {
    config: Config,
    http_client: Option<Arc<dyn HttpClient>>,
    remote_api: Option<Arc<dyn RemoteApi>>,
    notifiers: Option<Vec<Arc<dyn Notifier>>>,
    cancel: Option<CancellationToken>,
}

impl WatchpostBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            http_client: None,
            remote_api: None,
            notifiers: None,
            cancel: None,
        }
    }

    pub fn with_http_client(mut self, http: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(http);
        self
    }

    /// Bypass the HTTP client for remote calls entirely
    pub fn with_remote_api(mut self, api: Arc<dyn RemoteApi>) -> Self {
        self.remote_api = Some(api);
        self
    }

    /// Replace the notifiers built from config
    pub fn with_notifiers(mut self, notifiers: Vec<Arc<dyn Notifier>>) -> Self {
        self.notifiers = Some(notifiers);
        self
    }

    pub fn with_cancellation_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn build(self) -> Result<Watchpost> {
        self.config.validate()?;

        let http = self
            .http_client
            .unwrap_or_else(|| Arc::new(ReqwestHttpClient::default()));

        let api = self.remote_api.unwrap_or_else(|| {
            Arc::new(HttpRemoteApi::new(
                &self.config.api.base_url,
                Arc::clone(&http),
            ))
        });

        let notifiers = match self.notifiers {
            Some(notifiers) => notifiers,
            None => build_notifiers(&self.config.notifiers, &http),
        };

        let interval = self.config.polling.interval();
        let state = state::new_state_handle(
            self.config.polling.poll_interval_ms,
            self.config.dashboard.history_size,
        );
        let cancel = self.cancel.unwrap_or_default();

        let dispatcher = NotificationDispatcher::new(
            notifiers,
            self.config.notification.clone(),
            Arc::clone(&state),
        );
        let cycle = Arc::new(PollCycle::new(
            Arc::clone(&api),
            dispatcher,
            Arc::clone(&state),
        ));
        let scheduler = PollScheduler::new(cycle, interval, Arc::clone(&state), cancel.clone());

        tracing::debug!(
            "Built watchpost for {} with {} notifier config(s)",
            self.config.api.base_url,
            self.config.notifiers.len()
        );

        Ok(Watchpost {
            config: self.config,
            api,
            state,
            scheduler: Arc::new(tokio::sync::Mutex::new(scheduler)),
            cancel,
        })
    }
}

fn build_notifiers(
    configs: &[NotifierConfig],
    http: &Arc<dyn HttpClient>,
) -> Vec<Arc<dyn Notifier>> {
    configs
        .iter()
        .map(|config| -> Arc<dyn Notifier> {
            match config {
                NotifierConfig::Log => Arc::new(LogNotifier),
                NotifierConfig::Pushover(pushover) => {
                    Arc::new(PushoverNotifier::new(pushover, Arc::clone(http)))
                }
            }
        })
        .collect()
}

/// A built, not yet running watchpost service
pub struct Watchpost {
    config: Config,
    api: Arc<dyn RemoteApi>,
    state: StateHandle,
    scheduler: SchedulerHandle,
    cancel: CancellationToken,
}

impl Watchpost {
    pub fn api(&self) -> Arc<dyn RemoteApi> {
        Arc::clone(&self.api)
    }

    pub fn state(&self) -> StateHandle {
        Arc::clone(&self.state)
    }

    pub fn scheduler(&self) -> SchedulerHandle {
        Arc::clone(&self.scheduler)
    }

    /// Run until the cancellation token fires or ctrl-c is received
    pub async fn start(self) -> Result<()> {
        let cancel_for_signal = self.cancel.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    tracing::info!("Shutdown signal received");
                    cancel_for_signal.cancel();
                }
                Err(e) => tracing::error!("Failed to listen for ctrl-c: {}", e),
            }
        });

        if self.config.dashboard.enabled {
            let dashboard_port = self.config.dashboard.port;
            let router = dashboard::build_router(self.state(), self.scheduler());
            let cancel_for_dashboard = self.cancel.clone();

            tokio::spawn(async move {
                let addr = SocketAddr::from(([0, 0, 0, 0], dashboard_port));
                tracing::info!("Dashboard listening on http://{}", addr);

                let listener = match tokio::net::TcpListener::bind(addr).await {
                    Ok(l) => l,
                    Err(e) => {
                        let err = WatchpostError::Dashboard(format!(
                            "failed to bind port {}: {}",
                            dashboard_port, e
                        ));
                        tracing::error!("{}. Continuing without dashboard.", err);
                        return;
                    }
                };

                axum::serve(listener, router)
                    .with_graceful_shutdown(async move {
                        cancel_for_dashboard.cancelled().await;
                    })
                    .await
                    .ok();

                tracing::debug!("Dashboard stopped");
            });
        }

        if self.config.polling.autostart {
            self.scheduler.lock().await.start().await;
        } else {
            tracing::info!("Autostart disabled, waiting for /api/watch/start");
        }

        tracing::info!("Watchpost started");
        self.cancel.cancelled().await;

        self.scheduler.lock().await.stop().await;
        tracing::info!("Watchpost stopped");
        Ok(())
    }
}
