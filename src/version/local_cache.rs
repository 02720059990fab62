//! Thresholds and scheduling timestamps persisted across restarts

use std::sync::{Arc, LazyLock};

use chrono::Duration;
use tracing::{debug, info};

use crate::config::DEBUG_RECOMMENDED_INTERVAL_MINUTES;
use crate::version::cache::{Preferences, current_timestamp_ms};
use crate::version::debug_state::DebugState;
use crate::version::settings::SettingsHolder;
use crate::version::types::{RemoteVersioningSettingResult, Version};

const CRITICAL_KEY: &str = "critical";
const RECOMMENDED_KEY: &str = "recommended";

/// Last successful thresholds refresh, epoch millis
const LAST_TIME_REMOTE_VERSIONS_UPDATE: &str = "versioning.version_last_time_versions_update";
/// Session in which the recommendation was postponed until the next start
const LAST_SESSION_ID_KEY: &str = "versioning.version_dismiss_session_id";
/// Earliest time the recommendation may be shown again, epoch millis
const NEXT_TIME_FOR_RECOMMENDATION_KEY: &str = "versioning.next_recommendation_time";
/// Recommendation is postponed until the session id changes
const IS_UPDATE_ON_NEXT_SESSION_KEY: &str = "versioning.recommendation_on_next_session";

/// Identifier of the current process run
static SESSION_ID: LazyLock<String> =
    LazyLock::new(|| format!("{}-{}", std::process::id(), current_timestamp_ms()));

/// Preference key of a persisted threshold, `version_<key>_key`
pub fn compose_preference_key(key: &str) -> String {
    format!("version_{}_key", key)
}

pub struct LocalCache {
    prefs: Preferences,
    settings: Arc<SettingsHolder>,
    debug_state: Arc<DebugState>,
    session_id: String,
}

impl LocalCache {
    /// Create the cache and push any persisted thresholds into `settings`
    pub fn new(
        prefs: Preferences,
        settings: Arc<SettingsHolder>,
        debug_state: Arc<DebugState>,
    ) -> Self {
        Self::with_session_id(prefs, settings, debug_state, SESSION_ID.clone())
    }

    pub fn with_session_id(
        prefs: Preferences,
        settings: Arc<SettingsHolder>,
        debug_state: Arc<DebugState>,
        session_id: String,
    ) -> Self {
        let cache = Self {
            prefs,
            settings,
            debug_state,
            session_id,
        };
        let remote = cache.load();
        if !remote.is_empty() {
            debug!("Loaded cached thresholds {:?}", remote);
            cache.settings.update(remote);
        }
        cache
    }

    /// True when the remote thresholds were never fetched or the refresh
    /// interval has passed since the last successful fetch.
    pub fn is_remote_settings_expired(&self) -> bool {
        let Some(last_update) = self
            .prefs
            .get_i64(LAST_TIME_REMOTE_VERSIONS_UPDATE)
            .filter(|last| *last != 0)
        else {
            return true;
        };
        let next_update = last_update.saturating_add(self.settings.config().refresh_interval_ms);
        next_update < current_timestamp_ms()
    }

    /// Persist thresholds and mark now as the last successful refresh
    pub fn save_dictionary(&self, result: &RemoteVersioningSettingResult) {
        self.save(result);
        self.prefs.put_i64(LAST_TIME_REMOTE_VERSIONS_UPDATE, current_timestamp_ms());
        info!("Saved remote thresholds {:?}", result);
    }

    /// True if the recommended update may be offered again
    pub fn is_recommendation_expired(&self) -> bool {
        if self.prefs.get_bool(IS_UPDATE_ON_NEXT_SESSION_KEY) {
            return self.prefs.get_string(LAST_SESSION_ID_KEY).as_deref()
                != Some(self.session_id.as_str());
        }
        match self.prefs.get_i64(NEXT_TIME_FOR_RECOMMENDATION_KEY) {
            Some(next_time) => next_time < current_timestamp_ms(),
            None => true,
        }
    }

    /// Postpone the recommendation either for a fixed interval (postponed by
    /// the user) or until the next application start.
    pub fn postpone_update_recommendation(&self, postponed_by_button: bool) {
        if postponed_by_button {
            let interval = if self.debug_state.is_mode_on() {
                Duration::minutes(DEBUG_RECOMMENDED_INTERVAL_MINUTES)
            } else {
                Duration::days(self.settings.recommended_interval_days().max(0))
            };
            let next_time = current_timestamp_ms().saturating_add(interval.num_milliseconds());
            self.prefs.put_i64(NEXT_TIME_FOR_RECOMMENDATION_KEY, next_time);
        } else {
            self.prefs.put_string(LAST_SESSION_ID_KEY, &self.session_id);
        }
        self.prefs.put_bool(IS_UPDATE_ON_NEXT_SESSION_KEY, !postponed_by_button);
    }

    fn load(&self) -> RemoteVersioningSettingResult {
        let read = |key: &str| {
            self.prefs
                .get_string(&compose_preference_key(key))
                .map(Version::new)
        };
        RemoteVersioningSettingResult::new(read(CRITICAL_KEY), read(RECOMMENDED_KEY))
    }

    fn save(&self, result: &RemoteVersioningSettingResult) {
        for (key, version) in [
            (CRITICAL_KEY, &result.critical),
            (RECOMMENDED_KEY, &result.recommended),
        ] {
            let pref_key = compose_preference_key(key);
            match version {
                Some(version) => self.prefs.put_string(&pref_key, version.as_str()),
                None => self.prefs.remove(&[pref_key.as_str()]),
            }
        }
    }
}
