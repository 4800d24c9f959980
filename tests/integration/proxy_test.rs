// End-to-end tests: HTTP client → proxy → mock upstream → processed image

use super::test_harness::{client, solid_image, start_mock_upstream, MockResponse, ProxyTestHarness};
use image::{GenericImageView, ImageFormat};
use image_proxy::config::Config;
use image_proxy::image_optimizer::OutputPolicy;
use reqwest::StatusCode;

async fn upstream_image(content_type: &'static str, body: Vec<u8>) -> String {
    let addr = start_mock_upstream(MockResponse::ok(content_type, body)).await;
    format!("http://{}/image", addr)
}

#[tokio::test]
async fn test_png_is_resized_onto_requested_canvas() {
    let proxy = ProxyTestHarness::start().await;
    let source = upstream_image(
        "image/png",
        solid_image(300, 300, [255, 0, 0, 255], ImageFormat::Png),
    )
    .await;

    let response = client()
        .get(proxy.url(&format!("url={}&w=100&h=50", source)))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "image/png");
    let content_length: usize = response.headers()["content-length"]
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    let body = response.bytes().await.unwrap();
    assert_eq!(content_length, body.len());

    let img = image::load_from_memory(&body).unwrap();
    assert_eq!(img.dimensions(), (100, 50));
    // Pillarboxed: source fills the middle, background at the edges
    let rgba = img.to_rgba8();
    let center = rgba.get_pixel(50, 25).0;
    assert!(center[0] > 240 && center[1] < 15 && center[2] < 15, "center: {:?}", center);
    assert_eq!(rgba.get_pixel(0, 25).0, [255, 255, 255, 255]);
}

#[tokio::test]
async fn test_jpeg_policy_converts_png() {
    let mut config = Config::default();
    config.image.output = OutputPolicy::Jpeg;
    let proxy = ProxyTestHarness::start_with(config).await;
    let source = upstream_image(
        "image/png",
        solid_image(300, 300, [0, 0, 255, 255], ImageFormat::Png),
    )
    .await;

    let response = client()
        .get(proxy.url(&format!("url={}&w=100&h=50", source)))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "image/jpg");
    let body = response.bytes().await.unwrap();
    assert_eq!(image::guess_format(&body).unwrap(), ImageFormat::Jpeg);
    assert_eq!(image::load_from_memory(&body).unwrap().dimensions(), (100, 50));
}

#[tokio::test]
async fn test_no_size_keeps_dimensions_and_format() {
    let proxy = ProxyTestHarness::start().await;
    let source = upstream_image(
        "image/jpeg",
        solid_image(40, 30, [0, 255, 0, 255], ImageFormat::Jpeg),
    )
    .await;

    let response = client()
        .get(proxy.url(&format!("url={}", source)))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "image/jpg");
    let body = response.bytes().await.unwrap();
    assert_eq!(image::load_from_memory(&body).unwrap().dimensions(), (40, 30));
}

#[tokio::test]
async fn test_gif_is_mirrored() {
    let proxy = ProxyTestHarness::start().await;
    let source = upstream_image(
        "image/gif",
        solid_image(20, 20, [0, 255, 0, 255], ImageFormat::Gif),
    )
    .await;

    let response = client()
        .get(proxy.url(&format!("url={}&w=10&h=10", source)))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "image/gif");
    let body = response.bytes().await.unwrap();
    assert_eq!(image::guess_format(&body).unwrap(), ImageFormat::Gif);
    assert_eq!(image::load_from_memory(&body).unwrap().dimensions(), (10, 10));
}

#[tokio::test]
async fn test_non_numeric_width_means_no_resize() {
    let proxy = ProxyTestHarness::start().await;
    let source = upstream_image(
        "image/png",
        solid_image(64, 48, [255, 0, 0, 255], ImageFormat::Png),
    )
    .await;

    let response = client()
        .get(proxy.url(&format!("url={}&w=abc&h=20", source)))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.bytes().await.unwrap();
    assert_eq!(image::load_from_memory(&body).unwrap().dimensions(), (64, 48));
}

#[tokio::test]
async fn test_missing_source_is_bad_request() {
    let proxy = ProxyTestHarness::start().await;

    let response = client().get(proxy.url("w=10&h=10")).send().await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.headers()["content-type"],
        "text/plain; charset=utf-8"
    );
    let body = response.text().await.unwrap();
    assert!(body.contains("missing source url parameter"), "body: {}", body);
}

#[tokio::test]
async fn test_relative_source_is_bad_request() {
    let proxy = ProxyTestHarness::start().await;

    let response = client()
        .get(proxy.url("url=/images/cat.png"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.text().await.unwrap(), "absolute url is required\n");
}

#[tokio::test]
async fn test_unparsable_source_is_bad_request() {
    let proxy = ProxyTestHarness::start().await;

    let response = client()
        .get(proxy.url("url=http%3A%2F%2F%5B%3A%3A1"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(response.text().await.unwrap().starts_with("cannot parse url"));
}

#[tokio::test]
async fn test_negative_width_is_bad_request() {
    let proxy = ProxyTestHarness::start().await;

    let response = client()
        .get(proxy.url("url=http://127.0.0.1:1/a.png&w=-5&h=10"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_remote_404_is_passed_through() {
    let proxy = ProxyTestHarness::start().await;
    let addr = start_mock_upstream(MockResponse::status("404 Not Found")).await;

    let response = client()
        .get(proxy.url(&format!("url=http://{}/missing.png", addr)))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        response.text().await.unwrap(),
        "download failed: 404 Not Found\n"
    );
}

#[tokio::test]
async fn test_remote_500_is_passed_through() {
    let proxy = ProxyTestHarness::start().await;
    let addr = start_mock_upstream(MockResponse::status("500 Internal Server Error")).await;

    let response = client()
        .get(proxy.url(&format!("url=http://{}/broken.png", addr)))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_connection_refused_is_bad_request() {
    let proxy = ProxyTestHarness::start().await;
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let response = client()
        .get(proxy.url(&format!("url=http://{}/a.png", addr)))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(response.text().await.unwrap().starts_with("download failed"));
}

#[tokio::test]
async fn test_garbage_body_is_server_error() {
    let proxy = ProxyTestHarness::start().await;
    let source = upstream_image("image/png", b"definitely not an image".to_vec()).await;

    let response = client()
        .get(proxy.url(&format!("url={}", source)))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_webp_is_unsupported_when_mirroring() {
    use image::codecs::webp::WebPEncoder;
    use image::ImageEncoder as _;

    let img = image::RgbaImage::from_pixel(8, 8, image::Rgba([10, 20, 30, 255]));
    let mut webp = Vec::new();
    WebPEncoder::new_lossless(&mut webp)
        .write_image(img.as_raw(), 8, 8, image::ColorType::Rgba8)
        .unwrap();

    let proxy = ProxyTestHarness::start().await;
    let source = upstream_image("image/webp", webp).await;

    let response = client()
        .get(proxy.url(&format!("url={}", source)))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.text().await.unwrap().contains("unsupported format: webp"));
}

#[tokio::test]
async fn test_custom_param_names() {
    let mut config = Config::default();
    config.params.source = "src".to_string();
    config.params.width = "width".to_string();
    config.params.height = "height".to_string();
    let proxy = ProxyTestHarness::start_with(config).await;
    let source = upstream_image(
        "image/png",
        solid_image(50, 50, [255, 0, 0, 255], ImageFormat::Png),
    )
    .await;

    let response = client()
        .get(proxy.url(&format!("src={}&width=20&height=20", source)))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.bytes().await.unwrap();
    assert_eq!(image::load_from_memory(&body).unwrap().dimensions(), (20, 20));
}

#[tokio::test]
async fn test_any_method_and_path_is_handled() {
    let proxy = ProxyTestHarness::start().await;
    let source = upstream_image(
        "image/png",
        solid_image(10, 10, [255, 0, 0, 255], ImageFormat::Png),
    )
    .await;

    let response = client()
        .post(format!("{}/some/path?url={}", proxy.base_url, source))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "image/png");
}
