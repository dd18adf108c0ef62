//! BDD test world and shared test doubles for the watchpost client

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use cucumber::World;
use tokio::sync::{Mutex, RwLock, Semaphore};
use tokio_util::sync::CancellationToken;

use watchpost::api::RemoteApi;
use watchpost::engine::PollCycle;
use watchpost::filter::FilterQuery;
use watchpost::io::{HttpClient, HttpResponse};
use watchpost::model::{
    Channel, Comment, LogEntry, LogStatus, MonitorTarget, NewMonitorTarget, RecordId, ToggleState,
    Video,
};
use watchpost::notifier::{Notification, Notifier};
use watchpost::resolver::FilterResolver;
use watchpost::scheduler::SchedulerHandle;
use watchpost::state::StateHandle;
use watchpost::targets::TargetRegistry;
use watchpost::toggle::MonitoringToggle;
use watchpost::WatchpostError;

// --- Test doubles ---

/// In-memory stand-in for the remote data service
#[derive(Debug, Default)]
pub struct FakeRemoteApi {
    /// Successive monitor-log replies; the last one repeats
    pub log_script: Mutex<VecDeque<Result<Vec<LogEntry>, String>>>,
    pub log_fetches: AtomicUsize,
    /// When set, each log fetch waits for a permit
    pub fetch_gate: Mutex<Option<Arc<Semaphore>>>,

    pub targets: Mutex<Vec<MonitorTarget>>,
    pub create_requests: AtomicUsize,

    pub remote_active: AtomicBool,
    pub toggle_fails: AtomicBool,

    pub channels: Mutex<Vec<Channel>>,
    pub videos: Mutex<Vec<Video>>,
    pub comments: Mutex<Vec<Comment>>,
    /// Filtered requests in order: (collection, query)
    pub filtered_requests: Mutex<Vec<(&'static str, FilterQuery)>>,
}

impl FakeRemoteApi {
    pub async fn requests_for(&self, collection: &str) -> Vec<FilterQuery> {
        self.filtered_requests
            .lock()
            .await
            .iter()
            .filter(|(c, _)| *c == collection)
            .map(|(_, q)| q.clone())
            .collect()
    }
}

#[async_trait::async_trait]
impl RemoteApi for FakeRemoteApi {
    async fn fetch_monitor_logs(&self) -> watchpost::Result<Vec<LogEntry>> {
        self.log_fetches.fetch_add(1, Ordering::SeqCst);

        let gate = self.fetch_gate.lock().await.clone();
        if let Some(gate) = gate {
            gate.acquire()
                .await
                .map_err(|e| WatchpostError::Fetch(e.to_string()))?
                .forget();
        }

        let next = {
            let mut script = self.log_script.lock().await;
            if script.len() > 1 {
                script.pop_front()
            } else {
                script.front().cloned()
            }
        };
        match next {
            Some(Ok(entries)) => Ok(entries),
            Some(Err(msg)) => Err(WatchpostError::Fetch(msg)),
            None => Ok(Vec::new()),
        }
    }

    async fn fetch_monitor_targets(&self) -> watchpost::Result<Vec<MonitorTarget>> {
        Ok(self.targets.lock().await.clone())
    }

    async fn add_monitor_target(
        &self,
        target: &NewMonitorTarget,
    ) -> watchpost::Result<MonitorTarget> {
        self.create_requests.fetch_add(1, Ordering::SeqCst);
        let mut targets = self.targets.lock().await;
        let created = MonitorTarget {
            comment_text: target.comment_text.clone(),
            ..monitor_target(targets.len() as i64 + 100, &target.name, &target.channel_id)
        };
        targets.push(created.clone());
        Ok(created)
    }

    async fn remove_monitor_target(&self, id: &RecordId) -> watchpost::Result<()> {
        self.targets.lock().await.retain(|t| &t.id != id);
        Ok(())
    }

    async fn fetch_toggle_state(&self) -> watchpost::Result<ToggleState> {
        Ok(ToggleState::from(self.remote_active.load(Ordering::SeqCst)))
    }

    async fn set_toggle_state(&self) -> watchpost::Result<ToggleState> {
        if self.toggle_fails.load(Ordering::SeqCst) {
            return Err(WatchpostError::Remote(
                "toggle endpoint unavailable".to_string(),
            ));
        }
        let now_active = !self.remote_active.load(Ordering::SeqCst);
        self.remote_active.store(now_active, Ordering::SeqCst);
        Ok(ToggleState::from(now_active))
    }

    async fn fetch_channels(&self, query: &FilterQuery) -> watchpost::Result<Vec<Channel>> {
        self.filtered_requests
            .lock()
            .await
            .push(("channels", query.clone()));
        Ok(self.channels.lock().await.clone())
    }

    async fn fetch_videos(&self, query: &FilterQuery) -> watchpost::Result<Vec<Video>> {
        self.filtered_requests
            .lock()
            .await
            .push(("videos", query.clone()));
        Ok(self.videos.lock().await.clone())
    }

    async fn fetch_comments(&self, query: &FilterQuery) -> watchpost::Result<Vec<Comment>> {
        self.filtered_requests
            .lock()
            .await
            .push(("comments", query.clone()));
        Ok(self.comments.lock().await.clone())
    }
}

/// A notifier that records every notification and rejects chosen entries
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    pub reject_ids: RwLock<Vec<String>>,
    pub attempts: RwLock<Vec<Notification>>,
}

impl RecordingNotifier {
    pub async fn attempted_ids(&self) -> Vec<String> {
        self.attempts
            .read()
            .await
            .iter()
            .map(|n| n.correlation_id.clone())
            .collect()
    }
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    fn type_name(&self) -> &str {
        "recording"
    }

    async fn notify(&self, notification: &Notification) -> watchpost::Result<()> {
        self.attempts.write().await.push(notification.clone());
        if self
            .reject_ids
            .read()
            .await
            .contains(&notification.correlation_id)
        {
            return Err(WatchpostError::Delivery("rejected".to_string()));
        }
        Ok(())
    }
}

/// A recorded form POST
#[derive(Debug, Clone)]
pub struct RecordedPost {
    pub url: String,
    pub params: Vec<(String, String)>,
}

/// An HTTP client that records form posts and answers with a fixed status
#[derive(Debug)]
pub struct RecordingHttpClient {
    pub status: u16,
    pub posts: RwLock<Vec<RecordedPost>>,
}

impl RecordingHttpClient {
    pub fn responding(status: u16) -> Self {
        Self {
            status,
            posts: RwLock::new(Vec::new()),
        }
    }

    fn response(&self) -> HttpResponse {
        HttpResponse {
            status: self.status,
            body: r#"{"status":1}"#.to_string(),
        }
    }
}

#[async_trait::async_trait]
impl HttpClient for RecordingHttpClient {
    async fn get(&self, _url: &str) -> watchpost::Result<HttpResponse> {
        Ok(self.response())
    }

    async fn post_json(&self, _url: &str, _body: &str) -> watchpost::Result<HttpResponse> {
        Ok(self.response())
    }

    async fn post_form(
        &self,
        url: &str,
        params: &[(&str, &str)],
    ) -> watchpost::Result<HttpResponse> {
        self.posts.write().await.push(RecordedPost {
            url: url.to_string(),
            params: params
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        });
        Ok(self.response())
    }

    async fn delete(&self, _url: &str) -> watchpost::Result<HttpResponse> {
        Ok(self.response())
    }
}

// --- Fixtures ---

pub fn log_entry(id: i64) -> LogEntry {
    LogEntry {
        id: RecordId::Int(id),
        channel_id: format!("UC{}", id),
        channel_name: Some(format!("Channel {}", id)),
        video_id: format!("v{}", id),
        video_title: Some(format!("Video {}", id)),
        comment_text: "Nice video".to_string(),
        created_at: Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap(),
        status: LogStatus::Pending,
    }
}

pub fn monitor_target(id: i64, name: &str, channel_id: &str) -> MonitorTarget {
    MonitorTarget {
        id: RecordId::Int(id),
        channel_id: channel_id.to_string(),
        name: name.to_string(),
        channel_type: None,
        ideology: None,
        comment_text: "Great report".to_string(),
        is_active: Some(1),
        created_at: None,
    }
}

/// Parse "1,2,3" into log-entry ids
pub fn parse_ids(list: &str) -> Vec<i64> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse().unwrap_or_else(|_| panic!("bad id '{}'", s)))
        .collect()
}

// --- World ---

#[derive(Debug, Default, World)]
pub struct WatchpostWorld {
    pub api: Option<Arc<FakeRemoteApi>>,
    pub notifier: Option<Arc<RecordingNotifier>>,

    // Engine and scheduler
    pub poll_interval_ms: Option<u64>,
    pub state: Option<StateHandle>,
    pub cycle: Option<Arc<PollCycle>>,
    pub scheduler: Option<SchedulerHandle>,

    // Notification payloads
    pub entry: Option<LogEntry>,
    pub notification: Option<Notification>,
    pub pushover_http: Option<Arc<RecordingHttpClient>>,
    pub delivery_result: Option<watchpost::Result<()>>,

    // Views
    pub resolver: Option<FilterResolver>,
    pub toggle: Option<MonitoringToggle>,
    pub toggle_result: Option<watchpost::Result<ToggleState>>,
    pub registry: Option<TargetRegistry>,
    pub add_result: Option<watchpost::Result<MonitorTarget>>,

    // Dashboard
    pub dashboard_response: Option<serde_json::Value>,

    // Lifecycle
    pub cancel: Option<CancellationToken>,
    pub build_result: Option<watchpost::Result<()>>,
    pub start_succeeded: Option<bool>,
}

impl WatchpostWorld {
    pub fn api(&mut self) -> Arc<FakeRemoteApi> {
        self.api
            .get_or_insert_with(|| Arc::new(FakeRemoteApi::default()))
            .clone()
    }

    pub fn notifier(&mut self) -> Arc<RecordingNotifier> {
        self.notifier
            .get_or_insert_with(|| Arc::new(RecordingNotifier::default()))
            .clone()
    }

    pub fn remote(&mut self) -> Arc<dyn RemoteApi> {
        self.api() as Arc<dyn RemoteApi>
    }
}
