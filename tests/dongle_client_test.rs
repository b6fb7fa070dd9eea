use heliodash::config::DongleConfig;
use heliodash::dongle::{DongleClient, DongleTransport, HttpDongleTransport};
use heliodash::error::HelioError;
use heliodash::protocol::DongleStatus;
use mockito::{Matcher, Server};
use std::time::Duration;

fn realtime_body(soc: u16) -> String {
    let mut regs = vec![0u16; 150];
    regs[14] = 640;
    regs[103] = soc;
    serde_json::json!({ "sn": "SXA1B2C3", "ver": "3.008.10", "type": 14, "Data": regs })
        .to_string()
}

#[tokio::test]
async fn posts_read_realtime_data_with_serial() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/")
        .match_header("content-type", "application/x-www-form-urlencoded")
        .match_body(Matcher::Exact(
            "optType=ReadRealTimeData&pwd=SXA1B2C3".to_string(),
        ))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(realtime_body(72))
        .create_async()
        .await;

    let config = DongleConfig {
        url: server.url(),
        serial: String::new(),
        timeout_ms: 2_000,
    };
    let client = DongleClient::from_config(&config, "SXA1B2C3").unwrap();
    let snap = client.fetch_snapshot().await.unwrap();

    assert_eq!(snap.soc, 72);
    assert_eq!(snap.pv1_power, 640);
    assert_eq!(snap.serial, "SXA1B2C3");
    assert_eq!(snap.status, DongleStatus::Ok);
    mock.assert_async().await;
}

#[tokio::test]
async fn http_failure_maps_to_minus_two() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/")
        .with_status(500)
        .create_async()
        .await;

    let transport = HttpDongleTransport::new(&server.url(), Duration::from_secs(2)).unwrap();
    let err = transport.read_realtime_data("SX").await.unwrap_err();

    assert!(matches!(err, HelioError::Http { status: 500 }));
    assert_eq!(err.status_code(), -2);
    assert_eq!(DongleStatus::from_error(&err), DongleStatus::HttpError);
    mock.assert_async().await;
}

#[tokio::test]
async fn garbage_body_maps_to_minus_three() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/")
        .with_status(200)
        .with_body("<html>login</html>")
        .create_async()
        .await;

    let transport = HttpDongleTransport::new(&server.url(), Duration::from_secs(2)).unwrap();
    let client = DongleClient::new(Box::new(transport), "SX");
    let err = client.fetch_snapshot().await.unwrap_err();

    assert!(matches!(err, HelioError::Protocol { .. }));
    assert_eq!(DongleStatus::from_error(&err).status_text(), "JSON error");
}

#[tokio::test]
async fn unreachable_dongle_maps_to_minus_one() {
    // nothing listens on port 1
    let transport =
        HttpDongleTransport::new("http://127.0.0.1:1", Duration::from_millis(500)).unwrap();
    let err = transport.read_realtime_data("SX").await.unwrap_err();
    assert_eq!(err.status_code(), -1);
}
