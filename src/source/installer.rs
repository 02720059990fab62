//! Redirects QR authorisation links to the application they belong to
//!
//! Any application of the family may receive a link addressed to another
//! one. The link is handed to the target application if it is installed,
//! otherwise the user is routed to an update source to install it.

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::analytics::{AnalyticsEvent, AnalyticsSink};
use crate::source::command::{ActionLauncher, LaunchTarget};
use crate::source::deeplink::DeepLinkConverter;
use crate::source::factory::UpdateCommandBuilder;
use crate::version::settings::{SettingsHolder, strip_debug_suffix};

/// Result of handling an incoming link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    /// Not a QR link, or addressed to the current application
    NotHandled,
    /// Reopened from history; the host should drop the link
    Discarded,
    /// Target application opened or its installation started
    Redirected,
    Failed,
}

pub struct InstallerManager {
    settings: Arc<SettingsHolder>,
    converter: DeepLinkConverter,
    builder: Arc<UpdateCommandBuilder>,
    launcher: Arc<dyn ActionLauncher>,
    analytics: Arc<dyn AnalyticsSink>,
}

impl InstallerManager {
    pub fn new(
        settings: Arc<SettingsHolder>,
        builder: Arc<UpdateCommandBuilder>,
        launcher: Arc<dyn ActionLauncher>,
        analytics: Arc<dyn AnalyticsSink>,
    ) -> Self {
        let converter = DeepLinkConverter::new(settings.config().debug_build);
        Self {
            settings,
            converter,
            builder,
            launcher,
            analytics,
        }
    }

    pub fn handle_installation_link(&self, url: &str, launched_from_history: bool) -> LinkOutcome {
        let Some(target_package) = self.converter.parse(url) else {
            return LinkOutcome::NotHandled;
        };
        let target_app_id = strip_debug_suffix(&target_package);
        if self.is_current_app(&target_package, &target_app_id) {
            return LinkOutcome::NotHandled;
        }
        if launched_from_history {
            debug!("Discarding link to {} reopened from history", target_package);
            return LinkOutcome::Discarded;
        }
        if self.open_or_install_app(&target_app_id, &target_package, Some(url)) {
            LinkOutcome::Redirected
        } else {
            LinkOutcome::Failed
        }
    }

    /// Open the application, or route the user to install it
    pub fn open_or_install(&self, target_package: &str) -> bool {
        let target_app_id = strip_debug_suffix(target_package);
        if self.is_current_app(target_package, &target_app_id) {
            return false;
        }
        self.open_or_install_app(&target_app_id, target_package, None)
    }

    pub fn is_app_installed(&self, target_package: &str) -> bool {
        self.builder.resolver().inspector().is_installed(target_package)
    }

    fn open_or_install_app(
        &self,
        target_app_id: &str,
        target_package: &str,
        link: Option<&str>,
    ) -> bool {
        if self.is_app_installed(target_package) {
            let target = LaunchTarget::InstalledApp {
                package: target_package.to_string(),
                data: link.map(str::to_string),
            };
            return match self.launcher.launch(&target) {
                Ok(()) => {
                    info!("Opened installed application {}", target_package);
                    self.analytics.send(AnalyticsEvent::GoInstalledApp, None);
                    true
                }
                Err(e) => {
                    error!("Failed to open {}: {}", target_package, e);
                    false
                }
            };
        }

        let market = self
            .builder
            .create_for(target_app_id)
            .run(self.launcher.as_ref());
        match market {
            Some(market) => {
                info!("Installing {} from {}", target_app_id, market);
                self.analytics.send(AnalyticsEvent::GoInstallApp, None);
                true
            }
            None => false,
        }
    }

    fn is_current_app(&self, target_package: &str, target_app_id: &str) -> bool {
        let current = self.settings.app_id();
        current == target_package || current == target_app_id
    }
}
