use serde::Deserialize;
use std::path::PathBuf;

use crate::source::update_source::UpdateSource;

// =============================================================================
// Time-related constants
// =============================================================================

/// Default interval between remote thresholds refreshes in milliseconds (1 day)
pub const DEFAULT_REFRESH_INTERVAL_MS: i64 = 24 * 60 * 60 * 1000;

/// Delay before re-evaluating compatibility after a debug override changes
pub const DEFAULT_DEBUG_APPLY_DELAY_MS: u64 = 5_000;

/// Number of retries for non-connectivity fetch failures
pub const DEFAULT_FETCH_MAX_RETRIES: u32 = 2;

/// Delay between retries of non-connectivity fetch failures
pub const DEFAULT_FETCH_RETRY_DELAY_MS: u64 = 4_000;

/// Number of times a fetch may wait for connectivity to come back
pub const DEFAULT_MAX_CONNECTIVITY_WAITS: u32 = 2;

/// Upper bound of a single wait for connectivity (5 minutes)
pub const DEFAULT_CONNECTIVITY_TIMEOUT_MS: u64 = 5 * 60 * 1000;

/// Days to wait before recommending a store update
pub const DEFAULT_RECOMMENDED_INTERVAL_DAYS: i64 = 3;

/// Minutes to postpone a recommendation while debug mode is on
pub const DEBUG_RECOMMENDED_INTERVAL_MINUTES: i64 = 3;

/// Staleness days required in debug builds before recommending a store update
pub const DEBUG_RECOMMENDED_INTERVAL_DAYS: i64 = 0;

/// Default endpoint of the versions service
pub const DEFAULT_SERVICE_URL: &str = "https://online.sbis.ru/service/";

/// Report requested from the versions service
pub const DEFAULT_REPORT_NAME: &str = "android-communicator";

/// Named capabilities carried by the `updateBehavior` bitmask.
///
/// Bit mapping: remote critical = 1, remote recommended = 2,
/// store recommended = 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateBehavior {
    /// Mandatory thresholds come from the versions service
    pub remote_critical: bool,
    /// Recommended thresholds come from the versions service
    pub remote_recommended: bool,
    /// Recommendation is driven by platform store staleness
    pub store_recommended: bool,
}

impl UpdateBehavior {
    pub const REMOTE_CRITICAL: u32 = 0b001;
    pub const REMOTE_RECOMMENDED: u32 = 0b010;
    pub const STORE_RECOMMENDED: u32 = 0b100;
    pub const ALL: u32 = Self::REMOTE_CRITICAL | Self::REMOTE_RECOMMENDED | Self::STORE_RECOMMENDED;

    pub fn from_bits(bitmask: u32) -> Self {
        let uses = |flag: u32| bitmask & flag == flag;
        Self {
            remote_critical: uses(Self::REMOTE_CRITICAL),
            remote_recommended: uses(Self::REMOTE_RECOMMENDED),
            store_recommended: uses(Self::STORE_RECOMMENDED),
        }
    }

    /// Either remote capability is enabled
    pub fn uses_remote_service(&self) -> bool {
        self.remote_critical || self.remote_recommended
    }
}

/// Versioning configuration of the host application
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct VersioningConfig {
    /// Application identity, possibly with a `.debug` suffix
    pub app_id: String,
    /// Installed application version
    pub app_version: String,
    /// Capability bitmask, see [`UpdateBehavior`]
    pub update_behavior: u32,
    pub recommended_interval_days: i64,
    /// Update sources the application allows
    pub update_sources: Vec<UpdateSource>,
    /// Remote thresholds refresh interval in milliseconds
    pub refresh_interval_ms: i64,
    pub debug_apply_delay_ms: u64,
    pub retry: RetryConfig,
    pub service: ServiceConfig,
    /// Debug build of the host application
    pub debug_build: bool,
    /// Web portal is opened in an embedded viewer instead of a browser
    pub embedded_web_viewer: bool,
    pub log_format: LogFormat,
}

impl VersioningConfig {
    pub fn behavior(&self) -> UpdateBehavior {
        UpdateBehavior::from_bits(self.update_behavior)
    }
}

impl Default for VersioningConfig {
    fn default() -> Self {
        Self {
            app_id: String::new(),
            app_version: String::new(),
            update_behavior: UpdateBehavior::ALL,
            recommended_interval_days: DEFAULT_RECOMMENDED_INTERVAL_DAYS,
            update_sources: UpdateSource::ALL.to_vec(),
            refresh_interval_ms: DEFAULT_REFRESH_INTERVAL_MS,
            debug_apply_delay_ms: DEFAULT_DEBUG_APPLY_DELAY_MS,
            retry: RetryConfig::default(),
            service: ServiceConfig::default(),
            debug_build: false,
            embedded_web_viewer: false,
            log_format: LogFormat::default(),
        }
    }
}

/// Retry budget of the remote thresholds fetch
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct RetryConfig {
    pub max_retries: u32,
    pub delay_ms: u64,
    pub max_connectivity_waits: u32,
    pub connectivity_timeout_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_FETCH_MAX_RETRIES,
            delay_ms: DEFAULT_FETCH_RETRY_DELAY_MS,
            max_connectivity_waits: DEFAULT_MAX_CONNECTIVITY_WAITS,
            connectivity_timeout_ms: DEFAULT_CONNECTIVITY_TIMEOUT_MS,
        }
    }
}

/// Versions service endpoint configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ServiceConfig {
    pub base_url: String,
    pub report_name: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SERVICE_URL.to_string(),
            report_name: DEFAULT_REPORT_NAME.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Returns the path to the data directory for app-versioning.
/// Uses $XDG_DATA_HOME/app-versioning if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/app-versioning,
/// or ./app-versioning if neither is available.
pub fn data_dir() -> PathBuf {
    data_dir_with_env(std::env::var("XDG_DATA_HOME").ok(), dirs::home_dir())
}

/// Returns the path to the preferences database file.
pub fn db_path() -> PathBuf {
    data_dir().join("preferences.db")
}

/// Returns the path to the log file.
pub fn log_path() -> PathBuf {
    data_dir().join("app-versioning.log")
}

fn data_dir_with_env(xdg_data_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let data_dir = xdg_data_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));

    data_dir.join("app-versioning")
}
