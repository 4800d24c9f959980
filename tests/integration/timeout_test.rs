// Integration tests for upstream timeout handling

use super::test_harness::{client, start_mock_upstream, MockResponse, ProxyTestHarness};
use image_proxy::config::Config;
use reqwest::StatusCode;
use std::time::{Duration, Instant};

#[tokio::test]
async fn test_slow_upstream_times_out_with_bad_request() {
    // Upstream answers after 5 seconds; proxy gives up after 1
    let addr = start_mock_upstream(
        MockResponse::ok("image/png", b"late".to_vec()).delayed(Duration::from_secs(5)),
    )
    .await;

    let mut config = Config::default();
    config.server.timeout = 1;
    let proxy = ProxyTestHarness::start_with(config).await;

    let started = Instant::now();
    let response = client()
        .get(proxy.url(&format!("url=http://{}/slow.png", addr)))
        .send()
        .await
        .unwrap();
    let elapsed = started.elapsed();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(
        elapsed < Duration::from_secs(4),
        "request should fail near the 1s timeout, took {:?}",
        elapsed
    );
    assert!(response.text().await.unwrap().starts_with("download failed"));
}

#[tokio::test]
async fn test_slow_upstream_within_timeout_succeeds() {
    let body = super::test_harness::solid_image(8, 8, [1, 2, 3, 255], image::ImageFormat::Png);
    let addr = start_mock_upstream(
        MockResponse::ok("image/png", body).delayed(Duration::from_millis(200)),
    )
    .await;

    let mut config = Config::default();
    config.server.timeout = 5;
    let proxy = ProxyTestHarness::start_with(config).await;

    let response = client()
        .get(proxy.url(&format!("url=http://{}/slow.png", addr)))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
