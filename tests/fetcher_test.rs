//! Image fetcher behavior against a stub HTTP server

use roomviz_orchestrator::fetch::{FetcherConfig, ImageFetcher};
use roomviz_orchestrator::orchestrator::request::ImageSource;
use std::io::Cursor;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn png_fixture() -> Vec<u8> {
    let img = image::DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(
        4,
        4,
        image::Rgba([10, 20, 30, 255]),
    ));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}

fn quick_config() -> FetcherConfig {
    FetcherConfig {
        max_retries: 2,
        base_delay: Duration::from_millis(10),
        ..Default::default()
    }
}

#[tokio::test]
async fn remote_fetch_retries_then_succeeds() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/room.png"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/room.png"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(png_fixture(), "image/png"))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = ImageFetcher::new(quick_config()).unwrap();
    let source = ImageSource::from(format!("{}/room.png", server.uri()));

    let image = fetcher.fetch(&source).await.unwrap();
    assert_eq!(image.mime, "image/png");
    assert!(!image.bytes.is_empty());
}

#[tokio::test]
async fn exhausted_fetch_retries_propagate_the_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing.png"))
        .respond_with(ResponseTemplate::new(404))
        .expect(3) // initial attempt + 2 retries
        .mount(&server)
        .await;

    let fetcher = ImageFetcher::new(quick_config()).unwrap();
    let source = ImageSource::from(format!("{}/missing.png", server.uri()));

    assert!(fetcher.fetch(&source).await.is_err());
}

#[tokio::test]
async fn second_fetch_is_served_from_cache() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/room.png"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(png_fixture(), "image/png"))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = ImageFetcher::new(quick_config()).unwrap();
    let source = ImageSource::from(format!("{}/room.png", server.uri()));

    let first = fetcher.fetch(&source).await.unwrap();
    let second = fetcher.fetch(&source).await.unwrap();
    assert_eq!(first.bytes, second.bytes);
    assert_eq!(fetcher.cached_entries(), 1);
}

#[tokio::test]
async fn mime_falls_back_to_magic_bytes() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/opaque"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(png_fixture(), "application/octet-stream"),
        )
        .mount(&server)
        .await;

    let fetcher = ImageFetcher::new(quick_config()).unwrap();
    let source = ImageSource::from(format!("{}/opaque", server.uri()));

    let image = fetcher.fetch(&source).await.unwrap();
    assert_eq!(image.mime, "image/png");
}

#[tokio::test]
async fn local_path_fetch_reads_and_sniffs() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("room.png");
    std::fs::write(&file, png_fixture()).unwrap();

    let fetcher = ImageFetcher::new(quick_config()).unwrap();
    let source = ImageSource::from(file.to_string_lossy().to_string());

    let image = fetcher.fetch(&source).await.unwrap();
    assert_eq!(image.mime, "image/png");
    assert_eq!(image.bytes, png_fixture());
}
