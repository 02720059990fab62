//! Platform stubs for integration tests

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::{Value, json};

use app_versioning::analytics::{AnalyticsEvent, AnalyticsExtras, AnalyticsSink};
use app_versioning::source::command::{ActionLauncher, LaunchError, LaunchTarget};
use app_versioning::version::error::{ProbeError, FetchError};
use app_versioning::version::registry::VersionService;
use app_versioning::version::staleness::{StalenessProbe, StoreUpdateInfo};

/// Service envelope around a versions document
pub fn envelope(document: Value) -> String {
    json!({
        "jsonrpc": "2.0",
        "result": {
            "ИмяФайла": "android_versions.json",
            "Данные": STANDARD.encode(document.to_string()),
        },
        "id": 1
    })
    .to_string()
}

/// Versions document with thresholds of one application
pub fn document(app_id: &str, critical: Option<&str>, recommended: Option<&str>) -> Value {
    let mut versions = serde_json::Map::new();
    let mut published = serde_json::Map::new();
    if let Some(critical) = critical {
        versions.insert(app_id.to_string(), json!(critical));
    }
    if let Some(recommended) = recommended {
        published.insert(app_id.to_string(), json!(recommended));
    }
    json!({ "versions": versions, "published_versions": published })
}

/// Answers with queued responses, then with the fallback
pub struct StubService {
    responses: Mutex<VecDeque<Result<String, FetchError>>>,
    fallback: Option<String>,
    calls: AtomicUsize,
}

impl StubService {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            fallback: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn always(body: String) -> Self {
        Self {
            fallback: Some(body),
            ..Self::new()
        }
    }

    pub fn then(self, response: Result<String, FetchError>) -> Self {
        self.responses.lock().unwrap().push_back(response);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VersionService for StubService {
    async fn request_versions_report(&self) -> Result<String, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(response) = self.responses.lock().unwrap().pop_front() {
            return response;
        }
        match &self.fallback {
            Some(body) => Ok(body.clone()),
            None => Err(FetchError::Status(500)),
        }
    }
}

pub struct StubProbe {
    pub info: StoreUpdateInfo,
}

impl StubProbe {
    pub fn stale(days: u32) -> Self {
        Self {
            info: StoreUpdateInfo {
                update_available: true,
                staleness_days: Some(days),
                available_version_code: Some(1),
            },
        }
    }
}

#[async_trait]
impl StalenessProbe for StubProbe {
    async fn request_update_info(&self) -> Result<StoreUpdateInfo, ProbeError> {
        Ok(self.info)
    }
}

#[derive(Default)]
pub struct RecordingAnalytics {
    events: Mutex<Vec<(AnalyticsEvent, Option<AnalyticsExtras>)>>,
}

impl RecordingAnalytics {
    pub fn events(&self) -> Vec<(AnalyticsEvent, Option<AnalyticsExtras>)> {
        self.events.lock().unwrap().clone()
    }
}

impl AnalyticsSink for RecordingAnalytics {
    fn send(&self, event: AnalyticsEvent, extras: Option<AnalyticsExtras>) {
        self.events.lock().unwrap().push((event, extras));
    }
}

/// Records launch attempts, failing for the listed store packages
#[derive(Default)]
pub struct RecordingLauncher {
    failing: HashSet<String>,
    attempts: Mutex<Vec<LaunchTarget>>,
}

impl RecordingLauncher {
    pub fn failing(packages: &[&str]) -> Self {
        Self {
            failing: packages.iter().map(|p| p.to_string()).collect(),
            attempts: Mutex::new(Vec::new()),
        }
    }

    pub fn attempts(&self) -> Vec<LaunchTarget> {
        self.attempts.lock().unwrap().clone()
    }
}

impl ActionLauncher for RecordingLauncher {
    fn launch(&self, target: &LaunchTarget) -> Result<(), LaunchError> {
        self.attempts.lock().unwrap().push(target.clone());
        let package = match target {
            LaunchTarget::Store { package, .. } | LaunchTarget::InstalledApp { package, .. } => {
                package.as_str()
            }
            LaunchTarget::WebPage { .. } => "browser",
        };
        if self.failing.contains(package) {
            return Err(LaunchError::NoHandler(package.to_string()));
        }
        Ok(())
    }
}
