//! Developer overrides of the installed version and of the status under test

use std::sync::{Arc, Mutex, PoisonError};

use tracing::info;

use crate::version::cache::Preferences;
use crate::version::settings::SettingsHolder;
use crate::version::types::{UpdateStatus, Version};

const LAST_APP_VERSION_KEY: &str = "versioning.last_app_version";
const VERSION_LOCAL_DEBUG_KEY: &str = "VERSION_LOCAL_DEBUG_KEY";
const DEBUG_UPDATE_STATUS_KEY: &str = "DEBUG_UPDATE_TYPE_KEY";
const RESET_LOCAL_DEBUG_KEY: &str = "RESET_LOCAL_DEBUG_KEY";

/// Persisted debug override with a self-healing mandatory lock.
///
/// Forcing a mandatory update on a test device would block every following
/// start. [`DebugState::reset_debug_lock`] therefore works in two phases: the
/// first mandatory decision arms a persisted lock, the next one (usually on
/// the following cold start) removes the override together with the lock.
/// The removed version is parked as a one-shot value so exactly one more
/// [`DebugState::debug_version`] read still sees it.
pub struct DebugState {
    prefs: Preferences,
    settings: Arc<SettingsHolder>,
    stale_override: Mutex<Option<Version>>,
}

impl DebugState {
    pub fn new(prefs: Preferences, settings: Arc<SettingsHolder>) -> Self {
        let state = Self {
            prefs,
            settings,
            stale_override: Mutex::new(None),
        };
        state.clear_invalid_debug_versions();
        state
    }

    /// Debug mode is on while the effective debug version differs from the
    /// installed one. Does not consume the one-shot value.
    pub fn is_mode_on(&self) -> bool {
        self.peek_debug_version().as_str() != self.settings.app_version()
    }

    /// Version used while debugging, the installed version by default.
    ///
    /// Returns (and clears) the version removed by the last lock reset if
    /// there is one.
    pub fn debug_version(&self) -> Version {
        if let Some(stale) = self.lock_stale().take() {
            return stale;
        }
        self.stored_debug_version()
    }

    /// Status under test, [`UpdateStatus::Recommended`] by default
    pub fn update_debug_status(&self) -> UpdateStatus {
        self.prefs
            .get_i64(DEBUG_UPDATE_STATUS_KEY)
            .map(UpdateStatus::from_id)
            .unwrap_or(UpdateStatus::Recommended)
    }

    pub fn set_debug_version(&self, version: &str) {
        self.prefs.put_string(VERSION_LOCAL_DEBUG_KEY, version);
    }

    pub fn set_update_debug_status(&self, status: UpdateStatus) {
        self.prefs.put_i64(DEBUG_UPDATE_STATUS_KEY, status.id());
    }

    /// Arm the mandatory lock, or consume it if it was armed before.
    ///
    /// No-op unless the status under test is mandatory and a specified debug
    /// version below the installed one is stored.
    pub fn reset_debug_lock(&self) {
        if self.update_debug_status() != UpdateStatus::Mandatory {
            return;
        }
        if !self.prefs.contains(VERSION_LOCAL_DEBUG_KEY) {
            return;
        }
        let debug_version = self.stored_debug_version();
        if debug_version.is_unspecified() || debug_version >= self.real_version() {
            return;
        }

        if self.prefs.get_bool(RESET_LOCAL_DEBUG_KEY) {
            self.prefs.remove(&[VERSION_LOCAL_DEBUG_KEY, RESET_LOCAL_DEBUG_KEY]);
            info!("Mandatory debug lock consumed, override {} removed", debug_version);
            *self.lock_stale() = Some(debug_version);
        } else {
            self.prefs.put_bool(RESET_LOCAL_DEBUG_KEY, true);
            info!("Mandatory debug lock armed for override {}", debug_version);
        }
    }

    /// Drop every debug override
    pub fn clear(&self) {
        self.prefs.remove(&[
            VERSION_LOCAL_DEBUG_KEY,
            DEBUG_UPDATE_STATUS_KEY,
            RESET_LOCAL_DEBUG_KEY,
        ]);
        self.lock_stale().take();
    }

    /// Remember the installed version; drop the override once it changes.
    fn clear_invalid_debug_versions(&self) {
        let app_version = self.settings.app_version();
        match self.prefs.get_string(LAST_APP_VERSION_KEY) {
            Some(last) if last == app_version => {}
            Some(last) => {
                info!(
                    "Installed version changed from {} to {}, dropping debug override",
                    last, app_version
                );
                self.prefs.remove(&[VERSION_LOCAL_DEBUG_KEY]);
                self.prefs.put_string(LAST_APP_VERSION_KEY, app_version);
            }
            None => self.prefs.put_string(LAST_APP_VERSION_KEY, app_version),
        }
    }

    /// Effective debug version without consuming the one-shot value
    pub fn peek_debug_version(&self) -> Version {
        match self.lock_stale().as_ref() {
            Some(stale) => stale.clone(),
            None => self.stored_debug_version(),
        }
    }

    fn stored_debug_version(&self) -> Version {
        let app_version = self.settings.app_version();
        Version::new(
            self.prefs
                .get_string(VERSION_LOCAL_DEBUG_KEY)
                .unwrap_or_else(|| app_version.to_string()),
        )
    }

    fn real_version(&self) -> Version {
        Version::new(self.settings.app_version())
    }

    fn lock_stale(&self) -> std::sync::MutexGuard<'_, Option<Version>> {
        self.stale_override
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
