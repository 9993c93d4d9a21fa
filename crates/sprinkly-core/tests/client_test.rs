#![allow(clippy::unwrap_used)]
// End-to-end tests for `Client` against a wiremock device.

use std::time::Duration;

use serde_json::json;
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sprinkly_core::{Client, ClientConfig, ConnectionState, CoreError, DevicePassword, FirmwareVersion};

const PW_HASH: &str = "a6d82bced638de3def1e9bbb4983225c";

// ── Helpers ─────────────────────────────────────────────────────────

fn config(server: &MockServer) -> ClientConfig {
    let mut config = ClientConfig::new(
        Url::parse(&server.uri()).unwrap(),
        DevicePassword::from_plain("opendoor"),
    );
    config.polling_interval = Duration::ZERO;
    config
}

async fn mount_read(server: &MockServer, endpoint: &str, body: serde_json::Value, calls: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/{endpoint}")))
        .and(query_param("pw", PW_HASH))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(calls)
        .mount(server)
        .await;
}

/// Two boards, station 2 running. `jc` is expected `jc_calls` times.
async fn mount_device(server: &MockServer, jc_calls: u64) {
    let now = chrono::Utc::now().timestamp();
    mount_read(server, "jo", json!({ "fwv": 219, "tz": 48, "result": 1 }), 1).await;
    mount_read(
        server,
        "jc",
        json!({
            "devt": now,
            "nbrd": 2,
            "en": 1,
            "rd": 0,
            "sbits": [0b10, 0],
            "ps": [[0, 0, 0], [99, 300, now]],
        }),
        jc_calls,
    )
    .await;
    let names: Vec<String> = (1..=16).map(|i| format!("Zone {i}")).collect();
    mount_read(server, "jn", json!({ "snames": names, "stn_dis": [0, 0] }), 1).await;
}

// ── Tests ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_connect_fetches_each_endpoint_once() {
    let server = MockServer::start().await;
    mount_device(&server, 1).await;

    let client = Client::new(config(&server)).unwrap();
    let firmware = client.connect().await.unwrap();

    assert_eq!(firmware, FirmwareVersion::V2_1_9);
    assert_eq!(*client.connection_state().borrow(), ConnectionState::Connected);

    let snapshot = client.snapshot();
    assert_eq!(snapshot.stations.len(), 16);
    assert!(snapshot.enabled);
    assert!(snapshot.any_station_active);
    assert_eq!(snapshot.stations[1].name.as_deref(), Some("Zone 2"));
    assert!(snapshot.stations[1].in_use);
    assert!(snapshot.stations[1].remaining_seconds > 0);

    client.disconnect().await;
    // `expect(1)` on every mock is verified when the server drops.
}

#[tokio::test]
async fn test_manual_run_round_trip() {
    let server = MockServer::start().await;
    // Connect, then the fresh in-use check before the run.
    mount_device(&server, 2).await;
    Mock::given(method("GET"))
        .and(path("/cm"))
        .and(query_param("pw", PW_HASH))
        .and(query_param("sid", "4"))
        .and(query_param("en", "1"))
        .and(query_param("t", "600"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": 1 })))
        .expect(1)
        .mount(&server)
        .await;

    let client = Client::new(config(&server)).unwrap();
    client.connect().await.unwrap();

    let zone = client.controller().station_by_name("Zone 5").unwrap();
    assert!(!zone.is_in_use());
    zone.start(600).await.unwrap();

    assert!(zone.is_in_use());
    assert!(zone.remaining_watering_seconds() > 590);
}

#[tokio::test]
async fn test_rejected_password_fails_connect() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/jo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": 2 })))
        .mount(&server)
        .await;

    let client = Client::new(config(&server)).unwrap();
    let err = client.connect().await.unwrap_err();

    assert!(matches!(err, CoreError::InvalidRequest { .. }));
    assert_eq!(*client.connection_state().borrow(), ConnectionState::Failed);
}

#[tokio::test]
async fn test_device_rejection_surfaces_result_code() {
    let server = MockServer::start().await;
    mount_device(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/cv"))
        .and(query_param("rd", "24"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": 48 })))
        .expect(1)
        .mount(&server)
        .await;

    let client = Client::new(config(&server)).unwrap();
    client.connect().await.unwrap();
    let err = client.controller().set_rain_delay(24).await.unwrap_err();

    assert!(matches!(
        err,
        CoreError::InvalidRequest {
            code: sprinkly_api::ResultCode::NotPermitted
        }
    ));
    assert!(!client.controller().is_rain_delay_active());
}
