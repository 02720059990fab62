//! Platform store staleness check

use std::sync::Arc;

#[cfg(test)]
use mockall::automock;
use tracing::{debug, warn};

use crate::config::DEBUG_RECOMMENDED_INTERVAL_DAYS;
use crate::version::error::ProbeError;
use crate::version::settings::SettingsHolder;

/// What the platform store knows about the installed build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StoreUpdateInfo {
    pub update_available: bool,
    /// Days since the store first offered a newer build
    pub staleness_days: Option<u32>,
    pub available_version_code: Option<i64>,
}

#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait StalenessProbe: Send + Sync {
    async fn request_update_info(&self) -> Result<StoreUpdateInfo, ProbeError>;
}

/// Probe of a device without a platform store
pub struct NoStoreProbe;

#[async_trait::async_trait]
impl StalenessProbe for NoStoreProbe {
    async fn request_update_info(&self) -> Result<StoreUpdateInfo, ProbeError> {
        Ok(StoreUpdateInfo::default())
    }
}

/// Stale iff an update is available for at least `days`
pub fn is_stale_by_policy(info: &StoreUpdateInfo, days: i64) -> bool {
    let staleness = info.staleness_days.map(i64::from).unwrap_or(-1);
    info.update_available && staleness >= days
}

/// Applies the staleness policy of the host application to a probe
pub struct StalenessChecker {
    probe: Arc<dyn StalenessProbe>,
    settings: Arc<SettingsHolder>,
}

impl StalenessChecker {
    pub fn new(probe: Arc<dyn StalenessProbe>, settings: Arc<SettingsHolder>) -> Self {
        Self { probe, settings }
    }

    /// Days an update must be available before it is recommended
    pub fn days_for_update(&self) -> i64 {
        if self.settings.config().debug_build {
            DEBUG_RECOMMENDED_INTERVAL_DAYS
        } else {
            self.settings.recommended_interval_days()
        }
    }

    /// True if the store offers an update old enough to recommend it.
    /// Probe failures count as not stale.
    pub async fn is_outdated(&self) -> bool {
        let info = match self.probe.request_update_info().await {
            Ok(info) => info,
            Err(e) => {
                warn!("Store update info is unavailable: {}", e);
                return false;
            }
        };
        let days = self.days_for_update();
        let stale = is_stale_by_policy(&info, days);
        debug!(
            "Store update info {:?}, days for update = {}, stale = {}",
            info, days, stale
        );
        stale
    }
}
