//! Usage events of the versioning flow

#[cfg(test)]
use mockall::automock;
use tracing::info;

/// Extra key carrying the update source that was opened
pub const UPDATE_MARKET_KEY: &str = "versioning_update_market";
/// Extra key telling whether Google Play was among the update sources
pub const GOOGLE_PLAY_AVAILABLE_KEY: &str = "versioning_gp_available";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalyticsEvent {
    ShowCriticalScreen,
    ShowRecommendedScreen,
    ClickCriticalUpdate,
    ClickRecommendedUpdate,
    /// Another application is being installed from a QR link
    GoInstallApp,
    /// Another installed application is opened from a QR link
    GoInstalledApp,
}

impl AnalyticsEvent {
    pub fn key(&self) -> &'static str {
        match self {
            AnalyticsEvent::ShowCriticalScreen => "versioning_show_critical",
            AnalyticsEvent::ShowRecommendedScreen => "versioning_show_recommended",
            AnalyticsEvent::ClickCriticalUpdate => "versioning_click_critical",
            AnalyticsEvent::ClickRecommendedUpdate => "versioning_click_recommended",
            AnalyticsEvent::GoInstallApp => "versioning_install_app",
            AnalyticsEvent::GoInstalledApp => "versioning_installed_app",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AnalyticsExtras {
    pub update_market: Option<String>,
    pub google_play_available: bool,
}

impl AnalyticsExtras {
    pub fn new(update_market: Option<String>, google_play_available: bool) -> Self {
        Self {
            update_market,
            google_play_available,
        }
    }

    /// Key/value pairs in the shape analytics backends expect
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            (
                UPDATE_MARKET_KEY,
                self.update_market.clone().unwrap_or_default(),
            ),
            (
                GOOGLE_PLAY_AVAILABLE_KEY,
                self.google_play_available.to_string(),
            ),
        ]
    }
}

#[cfg_attr(test, automock)]
pub trait AnalyticsSink: Send + Sync {
    fn send(&self, event: AnalyticsEvent, extras: Option<AnalyticsExtras>);
}

/// Sink writing events to the log
#[derive(Debug, Default)]
pub struct TracingAnalytics;

impl AnalyticsSink for TracingAnalytics {
    fn send(&self, event: AnalyticsEvent, extras: Option<AnalyticsExtras>) {
        match extras {
            Some(extras) => {
                info!(event = event.key(), extras = ?extras.to_pairs(), "Analytics event")
            }
            None => info!(event = event.key(), "Analytics event"),
        }
    }
}
