//! Remote thresholds fetch with connectivity-aware retries

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use crate::config::RetryConfig;
use crate::version::document::{VersionMapper, decode_document};
use crate::version::error::FetchError;
use crate::version::network::NetworkMonitor;
use crate::version::registry::VersionService;
use crate::version::types::RemoteVersioningSettingResult;

/// Retry budget of a single fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after failures unrelated to connectivity
    pub max_retries: u32,
    pub delay: Duration,
    /// Waits for connectivity, not counted against `max_retries`
    pub max_connectivity_waits: u32,
    pub connectivity_timeout: Duration,
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            delay: Duration::from_millis(config.delay_ms),
            max_connectivity_waits: config.max_connectivity_waits,
            connectivity_timeout: Duration::from_millis(config.connectivity_timeout_ms),
        }
    }
}

/// Resets the in-flight flag when the fetch completes or is cancelled
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct RemoteVersionFetcher {
    service: Arc<dyn VersionService>,
    network: Arc<dyn NetworkMonitor>,
    mapper: VersionMapper,
    policy: RetryPolicy,
    in_flight: AtomicBool,
}

impl RemoteVersionFetcher {
    pub fn new(
        service: Arc<dyn VersionService>,
        network: Arc<dyn NetworkMonitor>,
        clean_app_id: &str,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            service,
            network,
            mapper: VersionMapper::new(clean_app_id),
            policy,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Fetch the thresholds of the current application.
    ///
    /// Returns `None` when another fetch is already running, or when the
    /// retry budget is exhausted. Failures are logged here and never
    /// surface to the caller.
    pub async fn fetch(&self) -> Option<RemoteVersioningSettingResult> {
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            info!("Skipping thresholds fetch: another fetch is in flight");
            return None;
        };

        let mut retries = 0;
        let mut connectivity_waits = 0;
        loop {
            let error = match self.attempt().await {
                Ok(result) => {
                    debug!("Fetched thresholds {:?}", result);
                    return Some(result);
                }
                Err(e) => e,
            };

            if error.is_connectivity() || !self.network.is_connected() {
                if connectivity_waits >= self.policy.max_connectivity_waits {
                    warn!(
                        "Giving up thresholds fetch after {} connectivity waits: {}",
                        connectivity_waits, error
                    );
                    return None;
                }
                connectivity_waits += 1;
                debug!("Waiting for connectivity after: {}", error);
                if timeout(
                    self.policy.connectivity_timeout,
                    self.network.wait_for_connection(),
                )
                .await
                .is_err()
                {
                    warn!(
                        "Connectivity did not return within {:?}: {}",
                        self.policy.connectivity_timeout, error
                    );
                    return None;
                }
                continue;
            }

            if retries >= self.policy.max_retries {
                warn!("Giving up thresholds fetch after {} retries: {}", retries, error);
                return None;
            }
            retries += 1;
            debug!("Retrying thresholds fetch in {:?} on: {}", self.policy.delay, error);
            sleep(self.policy.delay).await;
        }
    }

    async fn attempt(&self) -> Result<RemoteVersioningSettingResult, FetchError> {
        let body = self.service.request_versions_report().await?;
        let document = decode_document(&body)?;
        Ok(self.mapper.map(&document))
    }
}
