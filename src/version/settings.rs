//! Static application configuration merged with the latest remote thresholds

use std::sync::{Arc, PoisonError, RwLock};

use crate::config::{UpdateBehavior, VersioningConfig};
use crate::source::update_source::UpdateSource;
use crate::version::types::{RemoteVersioningSettingResult, UpdateStatus, Version};

/// Suffix appended to application ids of debug builds
pub const APP_DEBUG_SUFFIX: &str = ".debug";

/// Holder of local [`VersioningConfig`] and remote thresholds.
///
/// `remote` has a single writer (the engine, after a cache load or a
/// successful fetch) and any number of readers.
pub struct SettingsHolder {
    config: VersioningConfig,
    clean_app_id: String,
    remote: RwLock<Arc<RemoteVersioningSettingResult>>,
}

impl SettingsHolder {
    pub fn new(config: VersioningConfig) -> Self {
        let clean_app_id = strip_debug_suffix(&config.app_id);
        Self {
            config,
            clean_app_id,
            remote: RwLock::new(Arc::new(RemoteVersioningSettingResult::empty())),
        }
    }

    pub fn config(&self) -> &VersioningConfig {
        &self.config
    }

    pub fn app_id(&self) -> &str {
        &self.config.app_id
    }

    /// Application id without the debug suffix
    pub fn clean_app_id(&self) -> &str {
        &self.clean_app_id
    }

    pub fn app_version(&self) -> &str {
        &self.config.app_version
    }

    pub fn behavior(&self) -> UpdateBehavior {
        self.config.behavior()
    }

    pub fn recommended_interval_days(&self) -> i64 {
        self.config.recommended_interval_days
    }

    pub fn update_sources(&self) -> &[UpdateSource] {
        &self.config.update_sources
    }

    pub fn remote(&self) -> Arc<RemoteVersioningSettingResult> {
        self.remote
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace remote thresholds wholesale
    pub fn update(&self, result: RemoteVersioningSettingResult) {
        *self.remote.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(result);
    }

    pub fn remote_version_for(&self, status: UpdateStatus) -> Option<Version> {
        let remote = self.remote();
        match status {
            UpdateStatus::Recommended => remote.recommended.clone(),
            UpdateStatus::Mandatory => remote.critical.clone(),
            UpdateStatus::Empty => None,
        }
    }
}

/// Remove every case-insensitive occurrence of the debug suffix
pub fn strip_debug_suffix(app_id: &str) -> String {
    let lower = app_id.to_ascii_lowercase();
    let mut clean = String::with_capacity(app_id.len());
    let mut rest = 0;
    for (start, _) in lower.match_indices(APP_DEBUG_SUFFIX) {
        clean.push_str(&app_id[rest..start]);
        rest = start + APP_DEBUG_SUFFIX.len();
    }
    clean.push_str(&app_id[rest..]);
    clean
}
