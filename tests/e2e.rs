//! End-to-end tests for the loopcast HLS manifest gateway.
//!
//! Binds a real `TcpListener`, spawns `axum::serve`, and exercises the
//! spec's concrete scenarios through `reqwest` against a `wiremock` stand-in
//! for the upstream origin.

use loopcast::config::Config;
use loopcast::server::build_router;
use std::net::SocketAddr;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MASTER: &str = "#EXTM3U\n#EXT-X-STREAM-INF:BANDWIDTH=5000000,CODECS=\"avc1.4d401f\"\nhigh.m3u8\n#EXT-X-STREAM-INF:BANDWIDTH=2500000\nlow.m3u8\n";

fn media_playlist(segments: usize, duration: f64) -> String {
    let mut body = String::from("#EXTM3U\n#EXT-X-VERSION:3\n#EXT-X-TARGETDURATION:10\n");
    for i in 0..segments {
        body.push_str(&format!("#EXTINF:{duration},\nseg{i}.ts\n"));
    }
    body
}

async fn start_server(origin: &MockServer) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind test server");
    let addr = listener.local_addr().unwrap();

    let config = Config {
        port: 0,
        base_url: format!("http://{addr}"),
        is_dev: true,
        tls_enabled: false,
        tls_cert_path: None,
        tls_key_path: None,
        tls_key_passphrase: None,
        fetch_timeout_ms: 5_000,
        default_stream: origin.uri(),
    };

    let app = build_router(config).await;
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    addr
}

#[tokio::test]
async fn health_check() {
    let origin = MockServer::start().await;
    let addr = start_server(&origin).await;
    let client = reqwest::Client::new();

    let resp = client
        .get(format!("http://{addr}/health"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn vod_passthrough_scenario() {
    // Scenario 1: 3 segments, no duration -> passthrough with VOD finalization.
    let origin = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/master.m3u8"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "#EXTM3U\n#EXT-X-STREAM-INF:BANDWIDTH=1000000\nmedia.m3u8\n",
        ))
        .mount(&origin)
        .await;
    Mock::given(method("GET"))
        .and(path("/media.m3u8"))
        .respond_with(ResponseTemplate::new(200).set_body_string(media_playlist(3, 10.0)))
        .mount(&origin)
        .await;

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let config = Config {
        port: 0,
        base_url: format!("http://{addr}"),
        is_dev: true,
        tls_enabled: false,
        tls_cert_path: None,
        tls_key_path: None,
        tls_key_passphrase: None,
        fetch_timeout_ms: 5_000,
        default_stream: format!("{}/master.m3u8", origin.uri()),
    };
    let app = build_router(config).await;
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = reqwest::Client::new();
    let resp = client
        .get(format!("http://{addr}/vod.m3u8?variant=0"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.headers().get("content-type").unwrap(),
        "application/vnd.apple.mpegurl"
    );
    let body = resp.text().await.unwrap();
    assert!(body.contains("#EXT-X-TARGETDURATION:10"));
    assert!(body.contains("#EXT-X-PLAYLIST-TYPE:VOD"));
    assert!(body.contains("#EXT-X-ENDLIST"));
    assert!(!body.contains("#EXT-X-DISCONTINUITY"));
}

#[tokio::test]
async fn vod_loop_and_extend_scenario() {
    // Scenario 2: 2 segments (20s), duration=35 -> 4 segments, one
    // discontinuity.
    let origin = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/master.m3u8"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "#EXTM3U\n#EXT-X-STREAM-INF:BANDWIDTH=1000000\nmedia.m3u8\n",
        ))
        .mount(&origin)
        .await;
    Mock::given(method("GET"))
        .and(path("/media.m3u8"))
        .respond_with(ResponseTemplate::new(200).set_body_string(media_playlist(2, 10.0)))
        .mount(&origin)
        .await;

    let addr = start_with_default_stream(&format!("{}/master.m3u8", origin.uri())).await;
    let client = reqwest::Client::new();
    let resp = client
        .get(format!("http://{addr}/vod.m3u8?variant=0&duration=35"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let body = resp.text().await.unwrap();
    assert_eq!(body.matches("#EXTINF").count(), 4);
    assert_eq!(body.matches("#EXT-X-DISCONTINUITY").count(), 1);
    assert!(body.contains("#EXT-X-ENDLIST"));
}

#[tokio::test]
async fn live_initial_window_scenario() {
    // Scenario 3: 4 segments, start=now -> 3-segment window, seq 0/0.
    let origin = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/master.m3u8"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "#EXTM3U\n#EXT-X-STREAM-INF:BANDWIDTH=1000000\nmedia.m3u8\n",
        ))
        .mount(&origin)
        .await;
    Mock::given(method("GET"))
        .and(path("/media.m3u8"))
        .respond_with(ResponseTemplate::new(200).set_body_string(media_playlist(4, 10.0)))
        .mount(&origin)
        .await;

    let addr = start_with_default_stream(&format!("{}/master.m3u8", origin.uri())).await;
    let client = reqwest::Client::new();
    let resp = client
        .get(format!("http://{addr}/live.m3u8?variant=0"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let body = resp.text().await.unwrap();
    assert_eq!(body.matches("#EXTINF").count(), 3);
    assert!(body.contains("#EXT-X-MEDIA-SEQUENCE:0"));
    assert!(body.contains("#EXT-X-DISCONTINUITY-SEQUENCE:0"));
    assert!(!body.contains("#EXT-X-ENDLIST"));
}

#[tokio::test]
async fn master_rewrite_scenario() {
    // Scenario 8: master with two variants, request with no `variant` ->
    // rewritten self-referential URLs carrying variant=0/variant=1.
    let origin = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/master.m3u8"))
        .respond_with(ResponseTemplate::new(200).set_body_string(MASTER))
        .mount(&origin)
        .await;

    let addr = start_with_default_stream(&format!("{}/master.m3u8", origin.uri())).await;
    let client = reqwest::Client::new();
    let resp = client
        .get(format!("http://{addr}/live.m3u8"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let body = resp.text().await.unwrap();
    assert!(body.contains("/live.m3u8?variant=0"));
    assert!(body.contains("/live.m3u8?variant=1"));
    assert!(body.contains("BANDWIDTH=5000000"));
    assert!(body.contains("BANDWIDTH=2500000"));
}

#[tokio::test]
async fn unknown_variant_is_a_server_error() {
    let origin = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/master.m3u8"))
        .respond_with(ResponseTemplate::new(200).set_body_string(MASTER))
        .mount(&origin)
        .await;

    let addr = start_with_default_stream(&format!("{}/master.m3u8", origin.uri())).await;
    let client = reqwest::Client::new();
    let resp = client
        .get(format!("http://{addr}/vod.m3u8?variant=7"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 500);
}

async fn start_with_default_stream(default_stream: &str) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let config = Config {
        port: 0,
        base_url: format!("http://{addr}"),
        is_dev: true,
        tls_enabled: false,
        tls_cert_path: None,
        tls_key_path: None,
        tls_key_passphrase: None,
        fetch_timeout_ms: 5_000,
        default_stream: default_stream.to_string(),
    };
    let app = build_router(config).await;
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}
