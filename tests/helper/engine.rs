//! Engine wiring over an on-disk preferences database

use std::path::PathBuf;
use std::sync::Arc;

use tempfile::TempDir;

use app_versioning::analytics::{AnalyticsSink, TracingAnalytics};
use app_versioning::config::{UpdateBehavior, VersioningConfig};
use app_versioning::engine::{PlatformServices, VersionManager, VersionManagerDeps};
use app_versioning::source::detector::StaticPackageInspector;
use app_versioning::version::cache::{Preferences, SqliteStore};
use app_versioning::version::network::{NetworkMonitor, WatchNetworkMonitor};
use app_versioning::version::registry::VersionService;
use app_versioning::version::staleness::{NoStoreProbe, StalenessProbe};

pub const APP_ID: &str = "ru.tensor.sbis.droid";

pub fn config(app_version: &str) -> VersioningConfig {
    VersioningConfig {
        app_id: APP_ID.to_string(),
        app_version: app_version.to_string(),
        update_behavior: UpdateBehavior::REMOTE_CRITICAL | UpdateBehavior::REMOTE_RECOMMENDED,
        ..Default::default()
    }
}

/// Platform collaborators; defaults are online, without a store and
/// without installed packages
pub struct Platform {
    pub service: Arc<dyn VersionService>,
    pub network: Arc<dyn NetworkMonitor>,
    pub probe: Arc<dyn StalenessProbe>,
    pub installed: Vec<String>,
    pub analytics: Arc<dyn AnalyticsSink>,
}

impl Platform {
    pub fn new(service: Arc<dyn VersionService>) -> Self {
        Self {
            service,
            network: Arc::new(WatchNetworkMonitor::new(true)),
            probe: Arc::new(NoStoreProbe),
            installed: Vec::new(),
            analytics: Arc::new(TracingAnalytics),
        }
    }
}

/// Keeps the database alive across simulated process restarts
pub struct EngineHarness {
    dir: TempDir,
}

impl EngineHarness {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn db_path(&self) -> PathBuf {
        self.dir.path().join("preferences.db")
    }

    pub fn preferences(&self) -> Preferences {
        Preferences::new(Arc::new(SqliteStore::open(&self.db_path()).unwrap()))
    }

    /// Build a manager as a fresh process start would
    pub fn start(&self, config: VersioningConfig, platform: Platform) -> VersionManager {
        let store = Arc::new(SqliteStore::open(&self.db_path()).unwrap());
        VersionManager::new(VersionManagerDeps::assemble(
            config,
            store,
            PlatformServices {
                service: platform.service,
                network: platform.network,
                probe: platform.probe,
                inspector: Arc::new(StaticPackageInspector::new(platform.installed, None)),
                analytics: platform.analytics,
            },
        ))
    }
}
