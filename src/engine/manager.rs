//! Compatibility engine deciding the update status of the installed build

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::{AbortHandle, JoinHandle};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info};

use crate::analytics::{AnalyticsEvent, AnalyticsExtras, AnalyticsSink};
use crate::config::VersioningConfig;
use crate::engine::debug_tool::VersioningDebugTool;
use crate::engine::publisher::{StatusPublisher, StatusSubscription};
use crate::source::command::ActionLauncher;
use crate::source::detector::{PackageInspector, UpdateSourceResolver};
use crate::source::factory::UpdateCommandBuilder;
use crate::version::cache::{PreferenceStore, Preferences};
use crate::version::debug_state::DebugState;
use crate::version::fetcher::{RemoteVersionFetcher, RetryPolicy};
use crate::version::local_cache::LocalCache;
use crate::version::network::NetworkMonitor;
use crate::version::registry::VersionService;
use crate::version::settings::SettingsHolder;
use crate::version::staleness::{StalenessChecker, StalenessProbe};
use crate::version::types::{UpdateStatus, Version};

/// Platform collaborators the engine talks to
pub struct PlatformServices {
    pub service: Arc<dyn VersionService>,
    pub network: Arc<dyn NetworkMonitor>,
    pub probe: Arc<dyn StalenessProbe>,
    pub inspector: Arc<dyn PackageInspector>,
    pub analytics: Arc<dyn AnalyticsSink>,
}

/// Everything a [`VersionManager`] is built from
pub struct VersionManagerDeps {
    pub settings: Arc<SettingsHolder>,
    pub debug_state: Arc<DebugState>,
    pub local_cache: Arc<LocalCache>,
    pub fetcher: Arc<RemoteVersionFetcher>,
    pub staleness: Arc<StalenessChecker>,
    pub commands: Arc<UpdateCommandBuilder>,
    pub analytics: Arc<dyn AnalyticsSink>,
}

impl VersionManagerDeps {
    /// Wire the default collaborators over a preference store
    pub fn assemble(
        config: VersioningConfig,
        store: Arc<dyn PreferenceStore>,
        platform: PlatformServices,
    ) -> Self {
        let prefs = Preferences::new(store);
        let settings = Arc::new(SettingsHolder::new(config));
        let debug_state = Arc::new(DebugState::new(prefs.clone(), settings.clone()));
        let local_cache = Arc::new(LocalCache::new(
            prefs,
            settings.clone(),
            debug_state.clone(),
        ));
        let fetcher = Arc::new(RemoteVersionFetcher::new(
            platform.service,
            platform.network,
            settings.clean_app_id(),
            RetryPolicy::from(&settings.config().retry),
        ));
        let staleness = Arc::new(StalenessChecker::new(platform.probe, settings.clone()));
        let resolver =
            UpdateSourceResolver::new(platform.inspector, settings.update_sources().to_vec());
        let commands = Arc::new(UpdateCommandBuilder::new(settings.clone(), resolver));

        Self {
            settings,
            debug_state,
            local_cache,
            fetcher,
            staleness,
            commands,
            analytics: platform.analytics,
        }
    }
}

/// State shared with background tasks
struct Engine {
    settings: Arc<SettingsHolder>,
    debug_state: Arc<DebugState>,
    local_cache: Arc<LocalCache>,
    fetcher: Arc<RemoteVersionFetcher>,
    staleness: Arc<StalenessChecker>,
    app_version: Version,
    publisher: StatusPublisher,
    outdated_on_store: AtomicBool,
    pass_lock: Mutex<()>,
}

impl Engine {
    /// Mandatory first, then store staleness or recommended. A pass never
    /// lowers the status back to [`UpdateStatus::Empty`].
    fn check_compatibility(&self) {
        let _pass = self.pass_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let status = if self.incompatible_by(UpdateStatus::Mandatory) {
            self.debug_state.reset_debug_lock();
            UpdateStatus::Mandatory
        } else if self.outdated_on_store.load(Ordering::Acquire)
            || self.incompatible_by(UpdateStatus::Recommended)
        {
            UpdateStatus::Recommended
        } else {
            debug!("Compatibility pass left status {}", self.publisher.current());
            return;
        };

        if self.publisher.publish(status) {
            info!("Update status changed to {}", status);
        }
    }

    fn incompatible_by(&self, status: UpdateStatus) -> bool {
        let debug_mode = self.debug_state.is_mode_on();
        if debug_mode && self.debug_state.update_debug_status() != status {
            return false;
        }

        let installed = if debug_mode {
            self.debug_state.debug_version()
        } else {
            self.app_version.clone()
        };
        if installed.is_unspecified() {
            return false;
        }

        match self.settings.remote_version_for(status) {
            Some(remote) if !remote.is_unspecified() => installed < remote,
            _ => false,
        }
    }

    async fn refresh_remote_settings(&self) {
        if !self.settings.behavior().uses_remote_service() {
            return;
        }
        if self.fetcher.is_in_flight() || !self.local_cache.is_remote_settings_expired() {
            debug!("Remote thresholds are fresh or being fetched");
            return;
        }

        let Some(result) = self.fetcher.fetch().await else {
            return;
        };
        self.settings.update(result.clone());
        self.local_cache.save_dictionary(&result);
        self.check_compatibility();
    }

    async fn check_store_staleness(&self) {
        if !self.settings.behavior().store_recommended {
            return;
        }
        let outdated = self.staleness.is_outdated().await;
        self.outdated_on_store.store(outdated, Ordering::Release);
        if outdated {
            self.check_compatibility();
        }
    }
}

/// Single source of truth for the update status of the installed build.
///
/// Background work runs on one supervised task scope that
/// [`VersionManager::shutdown`] cancels wholesale. The runtime is captured
/// at construction; every other method may be called from any thread.
pub struct VersionManager {
    engine: Arc<Engine>,
    local_cache: Arc<LocalCache>,
    commands: Arc<UpdateCommandBuilder>,
    analytics: Arc<dyn AnalyticsSink>,
    registered: AtomicBool,
    runtime: Handle,
    tracker: TaskTracker,
    cancel: CancellationToken,
    pending_recompute: Mutex<Option<AbortHandle>>,
}

impl VersionManager {
    /// Must be called within a tokio runtime
    pub fn new(deps: VersionManagerDeps) -> Self {
        Self::with_runtime(deps, Handle::current())
    }

    pub fn with_runtime(deps: VersionManagerDeps, runtime: Handle) -> Self {
        let cancel = CancellationToken::new();
        let app_version = Version::new(deps.settings.app_version());
        let engine = Arc::new(Engine {
            settings: deps.settings,
            debug_state: deps.debug_state,
            local_cache: deps.local_cache.clone(),
            fetcher: deps.fetcher,
            staleness: deps.staleness,
            app_version,
            publisher: StatusPublisher::new(runtime.clone(), cancel.clone()),
            outdated_on_store: AtomicBool::new(false),
            pass_lock: Mutex::new(()),
        });
        Self {
            engine,
            local_cache: deps.local_cache,
            commands: deps.commands,
            analytics: deps.analytics,
            registered: AtomicBool::new(false),
            runtime,
            tracker: TaskTracker::new(),
            cancel,
            pending_recompute: Mutex::new(None),
        }
    }

    /// Start the check: local pass, remote refresh, store staleness, in
    /// this order. Only the first call has an effect.
    pub fn init(&self) {
        if self.registered.swap(true, Ordering::AcqRel) {
            return;
        }
        info!(
            "Versioning started for {} {}",
            self.engine.settings.app_id(),
            self.engine.settings.app_version()
        );
        let engine = self.engine.clone();
        self.spawn(async move {
            engine.check_compatibility();
            engine.refresh_remote_settings().await;
            engine.check_store_staleness().await;
        });
    }

    pub fn status(&self) -> UpdateStatus {
        self.engine.publisher.current()
    }

    pub fn is_application_critical_incompatibility(&self) -> bool {
        self.status() == UpdateStatus::Mandatory
    }

    /// Whether the forced update screen should be opened. With
    /// `if_obsolete` unset the screen is always wanted.
    pub fn forced_update_required(&self, if_obsolete: bool) -> bool {
        !if_obsolete || self.is_application_critical_incompatibility()
    }

    /// Whether the installed (or debug) version is below the threshold of
    /// `status`. Reading the debug version consumes a pending one-shot value.
    pub fn incompatible_by(&self, status: UpdateStatus) -> bool {
        self.engine.incompatible_by(status)
    }

    pub fn subscribe<F, C>(&self, filter: F, callback: C) -> StatusSubscription
    where
        F: Fn(UpdateStatus) -> bool + Send + 'static,
        C: FnMut(UpdateStatus) + Send + 'static,
    {
        self.engine.publisher.subscribe(filter, callback)
    }

    pub fn settings(&self) -> &Arc<SettingsHolder> {
        &self.engine.settings
    }

    pub fn commands(&self) -> &Arc<UpdateCommandBuilder> {
        &self.commands
    }

    /// Claim the right to show the recommendation screen.
    ///
    /// Returns false while the recommendation is postponed or a screen is
    /// already showing. On success the recommendation is postponed until
    /// the next session; the caller shows the screen at its next idle point.
    pub fn take_recommendation_slot(&self, already_showing: bool) -> bool {
        if already_showing || !self.local_cache.is_recommendation_expired() {
            return false;
        }
        self.local_cache.postpone_update_recommendation(false);
        self.analytics.send(AnalyticsEvent::ShowRecommendedScreen, None);
        true
    }

    pub fn postpone_recommendation(&self, postponed_by_button: bool) {
        self.local_cache.postpone_update_recommendation(postponed_by_button);
    }

    pub fn report_critical_screen_shown(&self) {
        self.analytics.send(AnalyticsEvent::ShowCriticalScreen, None);
    }

    /// Open the best update source for an update of kind `status`.
    /// Returns the identifier of the opened source.
    pub fn accept_update(
        &self,
        status: UpdateStatus,
        launcher: &dyn ActionLauncher,
    ) -> Option<String> {
        let (command, has_google_play) = self.commands.create();
        let market = command.run(launcher);
        let event = if status == UpdateStatus::Mandatory {
            AnalyticsEvent::ClickCriticalUpdate
        } else {
            AnalyticsEvent::ClickRecommendedUpdate
        };
        self.analytics.send(
            event,
            Some(AnalyticsExtras::new(market.clone(), has_google_play)),
        );
        market
    }

    /// Wait until background work spawned so far has finished
    pub async fn settle(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }

    /// Cancel every background task
    pub fn shutdown(&self) {
        debug!("Versioning shutdown");
        self.cancel.cancel();
        self.tracker.close();
    }

    fn spawn<F>(&self, task: F) -> JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let cancel = self.cancel.clone();
        self.tracker.spawn_on(
            async move {
                tokio::select! {
                    _ = cancel.cancelled() => debug!("Versioning task cancelled"),
                    _ = task => {}
                }
            },
            &self.runtime,
        )
    }

    /// Re-run the compatibility pass after the debug apply delay. A newer
    /// request replaces a pending one.
    fn schedule_recompute(&self) {
        let delay = Duration::from_millis(self.engine.settings.config().debug_apply_delay_ms);
        let engine = self.engine.clone();
        let handle = self.spawn(async move {
            sleep(delay).await;
            engine.check_compatibility();
        });
        let previous = self
            .pending_recompute
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(handle.abort_handle());
        if let Some(previous) = previous {
            previous.abort();
        }
    }
}

impl VersioningDebugTool for VersionManager {
    fn real_version(&self) -> String {
        self.engine.settings.app_version().to_string()
    }

    fn debug_version(&self) -> String {
        self.engine
            .debug_state
            .peek_debug_version()
            .as_str()
            .to_string()
    }

    fn debug_status(&self) -> UpdateStatus {
        self.engine.debug_state.update_debug_status()
    }

    fn apply_debug_version(&self, version: &str) {
        self.engine.debug_state.set_debug_version(version);
        self.schedule_recompute();
    }

    fn apply_update_status(&self, status: UpdateStatus) {
        self.engine.debug_state.set_update_debug_status(status);
        self.schedule_recompute();
    }
}

impl Drop for VersionManager {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
