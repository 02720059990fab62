mod helper;

use std::sync::Arc;

use rstest::rstest;

use app_versioning::analytics::{AnalyticsEvent, AnalyticsExtras};
use app_versioning::config::VersioningConfig;
use app_versioning::source::command::LaunchTarget;
use app_versioning::source::detector::{StaticPackageInspector, UpdateSourceResolver};
use app_versioning::source::factory::UpdateCommandBuilder;
use app_versioning::source::installer::{InstallerManager, LinkOutcome};
use app_versioning::source::update_source::UpdateSource;
use app_versioning::version::settings::SettingsHolder;
use app_versioning::version::types::UpdateStatus;

use helper::engine::{APP_ID, EngineHarness, Platform, config};
use helper::platform::{RecordingAnalytics, RecordingLauncher, StubService};

const GOOGLE_PLAY: &str = "com.android.vending";
const RU_STORE: &str = "ru.vk.store";
const APP_GALLERY: &str = "com.huawei.appmarket";
const FAMILY_MARKET: &str = "ru.tensor.sbis.appmarket";

fn builder(
    config: VersioningConfig,
    installed: &[&str],
    installer: Option<&str>,
) -> UpdateCommandBuilder {
    let settings = Arc::new(SettingsHolder::new(config));
    let resolver = UpdateSourceResolver::new(
        Arc::new(StaticPackageInspector::new(
            installed.iter().copied(),
            installer.map(str::to_string),
        )),
        settings.update_sources().to_vec(),
    );
    UpdateCommandBuilder::new(settings, resolver)
}

#[rstest]
#[case(&[], None, vec![UpdateSource::WebPortal])]
#[case(
    &[RU_STORE, GOOGLE_PLAY, FAMILY_MARKET],
    None,
    vec![
        UpdateSource::FamilyMarket,
        UpdateSource::GooglePlay,
        UpdateSource::RuStore,
        UpdateSource::WebPortal,
    ]
)]
#[case(
    &[RU_STORE, GOOGLE_PLAY, APP_GALLERY],
    Some(RU_STORE),
    vec![
        UpdateSource::RuStore,
        UpdateSource::GooglePlay,
        UpdateSource::AppGallery,
        UpdateSource::WebPortal,
    ]
)]
#[case(
    &[GOOGLE_PLAY],
    Some(RU_STORE),
    vec![UpdateSource::GooglePlay, UpdateSource::WebPortal]
)]
#[case(
    &[GOOGLE_PLAY],
    Some("com.example.sideload"),
    vec![UpdateSource::GooglePlay, UpdateSource::WebPortal]
)]
fn sources_are_ordered_unique_and_end_with_portal(
    #[case] installed: &[&str],
    #[case] installer: Option<&str>,
    #[case] expected: Vec<UpdateSource>,
) {
    let (command, has_google_play) = builder(config("23.1"), installed, installer).create();
    let sources: Vec<UpdateSource> = command.actions().iter().map(|a| a.source).collect();

    assert_eq!(sources, expected);
    assert_eq!(has_google_play, expected.contains(&UpdateSource::GooglePlay));
}

#[test]
fn allow_list_limits_stores_but_keeps_portal() {
    let mut config = config("23.1");
    config.update_sources = vec![UpdateSource::RuStore];

    let (command, has_google_play) =
        builder(config, &[GOOGLE_PLAY, RU_STORE], Some(GOOGLE_PLAY)).create();
    let sources: Vec<UpdateSource> = command.actions().iter().map(|a| a.source).collect();

    assert_eq!(sources, vec![UpdateSource::RuStore, UpdateSource::WebPortal]);
    assert!(!has_google_play);
}

#[test]
fn command_stops_after_first_successful_launch() {
    let (command, _) = builder(config("23.1"), &[GOOGLE_PLAY, RU_STORE], None).create();
    let launcher = RecordingLauncher::failing(&[GOOGLE_PLAY]);

    let market = command.run(&launcher);

    assert_eq!(market.as_deref(), Some("ru_store"));
    assert_eq!(
        launcher.attempts(),
        vec![
            LaunchTarget::Store {
                package: GOOGLE_PLAY.to_string(),
                uri: format!("market://details?id={APP_ID}"),
            },
            LaunchTarget::Store {
                package: RU_STORE.to_string(),
                uri: format!("market://details?id={APP_ID}"),
            },
        ]
    );
}

#[test]
fn command_falls_back_to_portal_when_stores_fail() {
    let mut config = config("23.1");
    config.embedded_web_viewer = true;
    let (command, _) = builder(config, &[GOOGLE_PLAY], None).create();
    let launcher = RecordingLauncher::failing(&[GOOGLE_PLAY]);

    let market = command.run(&launcher);

    assert_eq!(market.as_deref(), Some("web_portal"));
    assert_eq!(
        launcher.attempts().last(),
        Some(&LaunchTarget::WebPage {
            url: "https://sbis.ru/apps#sbis".to_string(),
            embedded: true,
        })
    );
}

#[test]
fn debug_build_targets_clean_application_id() {
    let mut config = config("23.1");
    config.app_id = format!("{APP_ID}.debug");
    let (command, _) = builder(config, &[GOOGLE_PLAY], None).create();

    assert_eq!(
        command.actions()[0].target,
        LaunchTarget::Store {
            package: GOOGLE_PLAY.to_string(),
            uri: format!("market://details?id={APP_ID}"),
        }
    );
}

#[tokio::test]
async fn accept_update_reports_market_and_google_play_availability() {
    let harness = EngineHarness::new();
    let analytics = Arc::new(RecordingAnalytics::default());
    let mut platform = Platform::new(Arc::new(StubService::new()));
    platform.installed = vec![GOOGLE_PLAY.to_string(), APP_GALLERY.to_string()];
    platform.analytics = analytics.clone();
    let manager = harness.start(config("23.1"), platform);

    let launcher = RecordingLauncher::failing(&[GOOGLE_PLAY]);
    let market = manager.accept_update(UpdateStatus::Recommended, &launcher);

    assert_eq!(market.as_deref(), Some("app_gallery"));
    assert_eq!(
        analytics.events(),
        vec![(
            AnalyticsEvent::ClickRecommendedUpdate,
            Some(AnalyticsExtras::new(Some("app_gallery".to_string()), true)),
        )]
    );
}

#[tokio::test]
async fn accept_update_reports_missing_market_when_nothing_opens() {
    let harness = EngineHarness::new();
    let analytics = Arc::new(RecordingAnalytics::default());
    let mut platform = Platform::new(Arc::new(StubService::new()));
    platform.analytics = analytics.clone();
    let manager = harness.start(config("23.1"), platform);

    let launcher = RecordingLauncher::failing(&["browser"]);
    let market = manager.accept_update(UpdateStatus::Mandatory, &launcher);

    assert_eq!(market, None);
    assert_eq!(
        analytics.events(),
        vec![(
            AnalyticsEvent::ClickCriticalUpdate,
            Some(AnalyticsExtras::new(None, false)),
        )]
    );
}

fn installer_manager(
    installed: &[&str],
    launcher: Arc<RecordingLauncher>,
    analytics: Arc<RecordingAnalytics>,
) -> InstallerManager {
    let config = config("23.1");
    let settings = Arc::new(SettingsHolder::new(config.clone()));
    InstallerManager::new(
        settings,
        Arc::new(builder(config, installed, None)),
        launcher,
        analytics,
    )
}

#[test]
fn installation_link_opens_installed_target_application() {
    let launcher = Arc::new(RecordingLauncher::default());
    let analytics = Arc::new(RecordingAnalytics::default());
    let manager = installer_manager(
        &["ru.tensor.sbis.courier.saby", GOOGLE_PLAY],
        launcher.clone(),
        analytics.clone(),
    );
    let link = "https://online.sbis.ru/auth/qrcode/sbisCourier/?token=abc";

    assert_eq!(manager.handle_installation_link(link, false), LinkOutcome::Redirected);
    assert_eq!(
        launcher.attempts(),
        vec![LaunchTarget::InstalledApp {
            package: "ru.tensor.sbis.courier.saby".to_string(),
            data: Some(link.to_string()),
        }]
    );
    assert_eq!(analytics.events(), vec![(AnalyticsEvent::GoInstalledApp, None)]);
}

#[test]
fn installation_link_routes_missing_application_to_store() {
    let launcher = Arc::new(RecordingLauncher::default());
    let analytics = Arc::new(RecordingAnalytics::default());
    let manager = installer_manager(&[GOOGLE_PLAY], launcher.clone(), analytics.clone());

    let outcome = manager.handle_installation_link(
        "https://online.sbis.ru/auth/qrcode/sbisRetail/?token=abc",
        false,
    );

    assert_eq!(outcome, LinkOutcome::Redirected);
    assert_eq!(
        launcher.attempts(),
        vec![LaunchTarget::Store {
            package: GOOGLE_PLAY.to_string(),
            uri: "market://details?id=ru.tensor.sbis.retail".to_string(),
        }]
    );
    assert_eq!(analytics.events(), vec![(AnalyticsEvent::GoInstallApp, None)]);
}

#[rstest]
#[case("https://online.sbis.ru/page/news", false, LinkOutcome::NotHandled)]
#[case("https://online.sbis.ru/auth/qrcode/sbisRetail/", false, LinkOutcome::NotHandled)]
#[case("https://online.sbis.ru/auth/qrcode/sbisRetail/?token=abc", true, LinkOutcome::Discarded)]
fn installation_links_that_are_not_redirected(
    #[case] url: &str,
    #[case] from_history: bool,
    #[case] expected: LinkOutcome,
) {
    let launcher = Arc::new(RecordingLauncher::default());
    let analytics = Arc::new(RecordingAnalytics::default());
    let manager = installer_manager(&[GOOGLE_PLAY], launcher.clone(), analytics.clone());

    assert_eq!(manager.handle_installation_link(url, from_history), expected);
    assert!(launcher.attempts().is_empty());
    assert!(analytics.events().is_empty());
}
