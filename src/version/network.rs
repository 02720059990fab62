//! Connectivity signal consumed by the remote fetch

#[cfg(test)]
use mockall::automock;
use tokio::sync::watch;
use tracing::debug;

/// Reports whether the device is online and lets a caller wait until it is
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait NetworkMonitor: Send + Sync {
    fn is_connected(&self) -> bool;

    /// Resolves once connectivity is available. Callers bound the wait.
    async fn wait_for_connection(&self);
}

/// [`NetworkMonitor`] driven by an externally pushed connectivity flag
pub struct WatchNetworkMonitor {
    sender: watch::Sender<bool>,
}

impl WatchNetworkMonitor {
    pub fn new(connected: bool) -> Self {
        let (sender, _) = watch::channel(connected);
        Self { sender }
    }

    pub fn set_connected(&self, connected: bool) {
        self.sender.send_if_modified(|current| {
            if *current == connected {
                return false;
            }
            debug!("Connectivity changed: connected={}", connected);
            *current = connected;
            true
        });
    }
}

impl Default for WatchNetworkMonitor {
    fn default() -> Self {
        Self::new(true)
    }
}

#[async_trait::async_trait]
impl NetworkMonitor for WatchNetworkMonitor {
    fn is_connected(&self) -> bool {
        *self.sender.borrow()
    }

    async fn wait_for_connection(&self) {
        let mut receiver = self.sender.subscribe();
        // sender lives as long as self, so the channel cannot close here
        let _ = receiver.wait_for(|connected| *connected).await;
    }
}
