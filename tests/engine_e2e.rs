mod helper;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use app_versioning::engine::VersioningDebugTool;
use app_versioning::config::UpdateBehavior;
use app_versioning::version::debug_state::DebugState;
use app_versioning::version::error::{ConnectivityKind, FetchError};
use app_versioning::version::network::WatchNetworkMonitor;
use app_versioning::version::settings::SettingsHolder;
use app_versioning::version::types::{UpdateStatus, Version};

use helper::engine::{APP_ID, EngineHarness, Platform, config};
use helper::platform::{StubProbe, StubService, document, envelope};

async fn next(receiver: &mut mpsc::UnboundedReceiver<UpdateStatus>) -> UpdateStatus {
    tokio::time::timeout(Duration::from_secs(5), receiver.recv())
        .await
        .expect("status not delivered")
        .expect("subscription closed")
}

#[tokio::test]
async fn init_fetches_thresholds_and_escalates_to_mandatory() {
    let harness = EngineHarness::new();
    let service = Arc::new(StubService::always(envelope(document(
        APP_ID,
        Some("21.0"),
        Some("22.0"),
    ))));

    let manager = harness.start(config("20.0"), Platform::new(service.clone()));
    assert!(!manager.is_application_critical_incompatibility());
    manager.init();
    manager.settle().await;

    assert_eq!(manager.status(), UpdateStatus::Mandatory);
    assert_eq!(service.calls(), 1);
    assert_eq!(
        manager.settings().remote().critical,
        Some(Version::new("21.0"))
    );
}

#[tokio::test]
async fn restart_uses_cached_thresholds_without_fetching() {
    let harness = EngineHarness::new();
    let first = harness.start(
        config("20.0"),
        Platform::new(Arc::new(StubService::always(envelope(document(
            APP_ID,
            Some("21.0"),
            None,
        ))))),
    );
    first.init();
    first.settle().await;
    drop(first);

    let service = Arc::new(StubService::new());
    let manager = harness.start(config("20.0"), Platform::new(service.clone()));

    // thresholds are available before init completes
    assert!(manager.incompatible_by(UpdateStatus::Mandatory));
    manager.init();
    manager.settle().await;

    assert!(manager.is_application_critical_incompatibility());
    assert_eq!(service.calls(), 0);
}

#[tokio::test]
async fn init_is_idempotent() {
    let harness = EngineHarness::new();
    let service = Arc::new(StubService::always(envelope(document(APP_ID, None, None))));
    let manager = harness.start(config("20.0"), Platform::new(service.clone()));

    manager.init();
    manager.init();
    manager.settle().await;
    manager.init();
    manager.settle().await;

    assert_eq!(service.calls(), 1);
    assert_eq!(manager.status(), UpdateStatus::Empty);
}

#[tokio::test]
async fn observers_see_each_transition_once_in_order() {
    let harness = EngineHarness::new();
    // cached threshold without a refresh timestamp: usable, but expired
    harness
        .preferences()
        .put_string("version_recommended_key", "21.0");
    let service = Arc::new(StubService::always(envelope(document(
        APP_ID,
        Some("21.0"),
        Some("21.0"),
    ))));
    let manager = harness.start(config("20.0"), Platform::new(service));

    let (all_sender, mut all) = mpsc::unbounded_channel();
    let _all = manager.subscribe(
        |status| status != UpdateStatus::Empty,
        move |status| {
            let _ = all_sender.send(status);
        },
    );
    let (mandatory_sender, mut mandatory) = mpsc::unbounded_channel();
    let _mandatory = manager.subscribe(
        |status| status == UpdateStatus::Mandatory,
        move |status| {
            let _ = mandatory_sender.send(status);
        },
    );

    manager.init();
    manager.settle().await;

    assert_eq!(next(&mut all).await, UpdateStatus::Recommended);
    assert_eq!(next(&mut all).await, UpdateStatus::Mandatory);
    assert_eq!(next(&mut mandatory).await, UpdateStatus::Mandatory);
    tokio::task::yield_now().await;
    assert!(all.try_recv().is_err());
    assert!(mandatory.try_recv().is_err());
}

#[tokio::test]
async fn late_subscriber_receives_current_status() {
    let harness = EngineHarness::new();
    let service = Arc::new(StubService::always(envelope(document(
        APP_ID,
        Some("21.0"),
        None,
    ))));
    let manager = harness.start(config("20.0"), Platform::new(service));
    manager.init();
    manager.settle().await;

    let (sender, mut received) = mpsc::unbounded_channel();
    let subscription = manager.subscribe(
        |status| status == UpdateStatus::Mandatory,
        move |status| {
            let _ = sender.send(status);
        },
    );

    assert_eq!(next(&mut received).await, UpdateStatus::Mandatory);
    subscription.unsubscribe();
}

#[tokio::test]
async fn connectivity_failures_do_not_consume_retry_budget() {
    let harness = EngineHarness::new();
    let service = Arc::new(
        StubService::always(envelope(document(APP_ID, Some("21.0"), None)))
            .then(Err(FetchError::Connectivity(ConnectivityKind::NoInternet)))
            .then(Err(FetchError::Connectivity(ConnectivityKind::ConnectionLimit))),
    );
    let mut config = config("20.0");
    config.retry.max_retries = 0;

    let manager = harness.start(config, Platform::new(service.clone()));
    manager.init();
    manager.settle().await;

    assert_eq!(service.calls(), 3);
    assert_eq!(manager.status(), UpdateStatus::Mandatory);
}

#[tokio::test]
async fn fetch_waits_for_connectivity_to_return() {
    let harness = EngineHarness::new();
    let service = Arc::new(
        StubService::always(envelope(document(APP_ID, None, Some("21.0"))))
            .then(Err(FetchError::Connectivity(ConnectivityKind::NoInternet))),
    );
    let network = Arc::new(WatchNetworkMonitor::new(false));
    let mut platform = Platform::new(service.clone());
    platform.network = network.clone();

    let manager = harness.start(config("20.0"), platform);
    manager.init();
    while service.calls() == 0 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(manager.status(), UpdateStatus::Empty);

    network.set_connected(true);
    manager.settle().await;

    assert_eq!(service.calls(), 2);
    assert_eq!(manager.status(), UpdateStatus::Recommended);
}

#[tokio::test(start_paused = true)]
async fn fetch_failure_keeps_last_known_thresholds() {
    let harness = EngineHarness::new();
    harness
        .preferences()
        .put_string("version_critical_key", "21.0");
    let service = Arc::new(StubService::new());

    let manager = harness.start(config("20.0"), Platform::new(service.clone()));
    manager.init();
    manager.settle().await;

    assert_eq!(service.calls(), 3);
    assert_eq!(manager.status(), UpdateStatus::Mandatory);
    assert_eq!(
        manager.settings().remote().critical,
        Some(Version::new("21.0"))
    );
}

#[tokio::test]
async fn stale_store_build_is_recommended_without_thresholds() {
    let harness = EngineHarness::new();
    let service = Arc::new(StubService::always(envelope(document(APP_ID, None, None))));
    let mut platform = Platform::new(service);
    platform.probe = Arc::new(StubProbe::stale(5));
    let mut config = config("23.1");
    config.update_behavior = UpdateBehavior::ALL;

    let manager = harness.start(config, platform);
    manager.init();
    manager.settle().await;

    assert_eq!(manager.status(), UpdateStatus::Recommended);
}

#[tokio::test]
async fn store_staleness_below_interval_is_ignored() {
    let harness = EngineHarness::new();
    let mut platform = Platform::new(Arc::new(StubService::new()));
    platform.probe = Arc::new(StubProbe::stale(1));
    let mut config = config("23.1");
    config.update_behavior = UpdateBehavior::STORE_RECOMMENDED;

    let manager = harness.start(config, platform);
    manager.init();
    manager.settle().await;

    assert_eq!(manager.status(), UpdateStatus::Empty);
}

#[tokio::test]
async fn mandatory_debug_lock_self_heals_on_second_start() {
    let harness = EngineHarness::new();
    harness
        .preferences()
        .put_string("version_critical_key", "21.0");
    let mut config = config("23.1");
    config.update_behavior = 0;
    {
        let debug_state = DebugState::new(
            harness.preferences(),
            Arc::new(SettingsHolder::new(config.clone())),
        );
        debug_state.set_debug_version("20.0");
        debug_state.set_update_debug_status(UpdateStatus::Mandatory);
    }

    // first start shows the mandatory screen and arms the lock
    let first = harness.start(config.clone(), Platform::new(Arc::new(StubService::new())));
    first.init();
    first.settle().await;
    assert_eq!(first.status(), UpdateStatus::Mandatory);
    assert_eq!(first.debug_version(), "20.0");
    drop(first);

    // second start shows it once more and clears the override
    let second = harness.start(config.clone(), Platform::new(Arc::new(StubService::new())));
    second.init();
    second.settle().await;
    assert_eq!(second.status(), UpdateStatus::Mandatory);
    assert!(second.incompatible_by(UpdateStatus::Mandatory));
    assert!(!second.incompatible_by(UpdateStatus::Mandatory));
    assert_eq!(second.debug_version(), "23.1");
    drop(second);

    let third = harness.start(config, Platform::new(Arc::new(StubService::new())));
    third.init();
    third.settle().await;
    assert_eq!(third.status(), UpdateStatus::Empty);
}

#[tokio::test(start_paused = true)]
async fn debug_settings_apply_after_delay() {
    let harness = EngineHarness::new();
    harness
        .preferences()
        .put_string("version_recommended_key", "24.0");
    let mut config = config("23.1");
    config.update_behavior = 0;
    let manager = harness.start(config, Platform::new(Arc::new(StubService::new())));
    manager.init();
    manager.settle().await;
    assert_eq!(manager.status(), UpdateStatus::Recommended);

    manager.apply_debug_settings("20.0", UpdateStatus::Mandatory);
    assert_eq!(manager.debug_status(), UpdateStatus::Mandatory);
    assert_eq!(manager.status(), UpdateStatus::Recommended);

    tokio::time::sleep(Duration::from_millis(4_000)).await;
    assert_eq!(manager.status(), UpdateStatus::Recommended);

    manager.settle().await;
    // no mandatory threshold: debug mode isolates the mandatory check
    assert_eq!(manager.status(), UpdateStatus::Recommended);
    assert_eq!(manager.debug_version(), "20.0");
    assert_eq!(manager.real_version(), "23.1");
}
