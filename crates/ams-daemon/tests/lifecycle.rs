//! End-to-end lifecycle tests over a real Unix socket.
//!
//! Assembles the same stack the binary wires up (manager, headless
//! launcher/runtime, IPC server) on a temporary socket and drives it with
//! the client proxy.

use std::sync::Arc;
use std::time::Duration;

use ams_core::bundle::{DenyList, StaticBundleRegistry};
use ams_core::client::{AmsClient, ClientError, DiscoveryConfig};
use ams_core::config::AmsConfig;
use ams_core::error::ErrorCode;
use ams_core::service::AbilityService;
use ams_core::want::{ElementName, Want};
use ams_daemon::launcher::HeadlessLauncher;
use ams_daemon::runtime::HeadlessRuntimeFactory;
use ams_daemon::server::IpcServer;
use tempfile::TempDir;

struct TestDaemon {
    // Keeps the socket directory alive for the test's duration.
    _dir: TempDir,
    discovery: DiscoveryConfig,
}

fn spawn_daemon() -> TestDaemon {
    let dir = tempfile::tempdir().expect("create temp dir");
    let socket_path = dir.path().join("ams.sock");

    let config = AmsConfig {
        socket_path: socket_path.clone(),
        ..AmsConfig::default()
    };
    let registry = StaticBundleRegistry::new()
        .with_bundle("com.example.music", "/apps/music")
        .with_bundle("com.example.video", "/apps/video")
        .with_bundle("com.example.blocked", "/apps/blocked");

    let (service, manager) = AbilityService::new(
        config,
        Arc::new(registry),
        Arc::new(DenyList::new(vec!["com.example.blocked".into()])),
        Box::new(HeadlessLauncher::new()),
        Arc::new(HeadlessRuntimeFactory),
    );
    tokio::spawn(service.run());

    let server = IpcServer::bind(&socket_path, manager).expect("bind socket");
    tokio::spawn(server.run());

    TestDaemon {
        _dir: dir,
        discovery: DiscoveryConfig {
            socket_path,
            retries: 20,
            retry_interval: Duration::from_millis(25),
        },
    }
}

/// Lifecycle completions flow through background tasks, so foreground
/// changes are observed by polling the authoritative query.
async fn wait_for_top(client: &mut AmsClient, bundle_name: &str) -> ElementName {
    for _ in 0..100 {
        if let Some(element) = client.get_top_ability().await.expect("get top") {
            if element.bundle_name == bundle_name {
                return element;
            }
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("'{bundle_name}' never became the top ability");
}

fn want_for(bundle: &str) -> Want {
    Want::new(ElementName::new(bundle, "Main"))
}

#[tokio::test]
async fn test_launcher_is_top_at_boot() {
    let daemon = spawn_daemon();
    let mut client = AmsClient::connect(&daemon.discovery).await.unwrap();

    let top = wait_for_top(&mut client, ams_core::config::DEFAULT_LAUNCHER_BUNDLE).await;
    assert!(top.ability_name.is_empty());
}

#[tokio::test]
async fn test_start_and_force_stop_round_trip() {
    let daemon = spawn_daemon();
    let mut client = AmsClient::connect(&daemon.discovery).await.unwrap();

    client.start_ability(&want_for("com.example.music")).await.unwrap();
    wait_for_top(&mut client, "com.example.music").await;

    client.force_stop_bundle("com.example.music").await.unwrap();
    wait_for_top(&mut client, ams_core::config::DEFAULT_LAUNCHER_BUNDLE).await;
}

#[tokio::test]
async fn test_app_replacement_over_the_wire() {
    let daemon = spawn_daemon();
    let mut client = AmsClient::connect(&daemon.discovery).await.unwrap();

    client.start_ability(&want_for("com.example.music")).await.unwrap();
    wait_for_top(&mut client, "com.example.music").await;

    client.start_ability(&want_for("com.example.video")).await.unwrap();
    wait_for_top(&mut client, "com.example.video").await;
}

#[tokio::test]
async fn test_home_press_backgrounds_the_app() {
    let daemon = spawn_daemon();
    let mut client = AmsClient::connect(&daemon.discovery).await.unwrap();

    client.start_ability(&want_for("com.example.music")).await.unwrap();
    wait_for_top(&mut client, "com.example.music").await;

    client
        .start_ability(&want_for(ams_core::config::DEFAULT_LAUNCHER_BUNDLE))
        .await
        .unwrap();
    wait_for_top(&mut client, ams_core::config::DEFAULT_LAUNCHER_BUNDLE).await;

    // Resuming brings the same app back without a fresh launch.
    client.start_ability(&want_for("com.example.music")).await.unwrap();
    wait_for_top(&mut client, "com.example.music").await;
}

#[tokio::test]
async fn test_rejections_carry_wire_statuses() {
    let daemon = spawn_daemon();
    let mut client = AmsClient::connect(&daemon.discovery).await.unwrap();
    wait_for_top(&mut client, ams_core::config::DEFAULT_LAUNCHER_BUNDLE).await;

    let err = client
        .start_ability(&want_for("com.example.blocked"))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Rejected { .. }));
    assert_eq!(err.code(), Some(ErrorCode::ParamCheck));

    let err = client.start_ability(&Want::default()).await.unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::ParamNull));

    let err = client.terminate_ability(42).await.unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::ParamCheck));

    let err = client.force_stop_bundle("com.example.video").await.unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::ParamCheck));
}

#[tokio::test]
async fn test_connection_survives_multiple_requests() {
    let daemon = spawn_daemon();
    let mut client = AmsClient::connect(&daemon.discovery).await.unwrap();

    for _ in 0..3 {
        client.start_ability(&want_for("com.example.music")).await.unwrap();
        wait_for_top(&mut client, "com.example.music").await;
        client.force_stop_bundle("com.example.music").await.unwrap();
        wait_for_top(&mut client, ams_core::config::DEFAULT_LAUNCHER_BUNDLE).await;
    }
}
