//! End-to-end tests for the HLS relay
//!
//! Starts a real Axum server on a random port and walks the same path a
//! player takes: master playlist, then a variant playlist, then its segments,
//! all through the relay. Provider, decrypt service and CDN are one wiremock
//! server.

use hls_relay::config::{Config, UpstreamConfig};
use hls_relay::server::build_router;
use m3u8_rs::Playlist;
use serde_json::json;
use std::net::SocketAddr;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Test server helpers ───────────────────────────────────────────────────────

async fn start_server(upstream: &MockServer) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test server");
    let addr = listener.local_addr().unwrap();

    let config = Config {
        port: addr.port(),
        is_dev: true,
        public_base_url: None,
        upstream: UpstreamConfig {
            base_url: upstream.uri(),
            sources: vec!["primary".to_string()],
            decrypt_url: format!("{}/dec", upstream.uri()),
            ..Default::default()
        },
    };

    let app = build_router(config).expect("router");

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    addr
}

/// Provider listing + decrypt answer with two variants on the mock CDN.
async fn mount_catalog(upstream: &MockServer) {
    let cdn = upstream.uri();

    Mock::given(method("GET"))
        .and(path("/primary/sources-with-title"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ENCRYPTED"))
        .mount(upstream)
        .await;

    Mock::given(method("POST"))
        .and(path("/dec"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": {
                "sources": [
                    { "url": format!("{cdn}/hls/720/index.m3u8"), "quality": "720p" },
                    { "url": format!("{cdn}/hls/1080/index.m3u8"), "quality": "1080p" }
                ],
                "subtitles": []
            }
        })))
        .mount(upstream)
        .await;

    Mock::given(method("GET"))
        .and(path("/hls/1080/index.m3u8"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            "#EXTM3U\n#EXT-X-VERSION:3\n#EXT-X-TARGETDURATION:6\n\
             #EXTINF:6.0,\nseg-0.ts\n#EXTINF:6.0,\nseg-1.ts\n#EXT-X-ENDLIST\n",
            "application/vnd.apple.mpegurl",
        ))
        .mount(upstream)
        .await;

    for (name, fill) in [("seg-0.ts", 0x47u8), ("seg-1.ts", 0x48u8)] {
        Mock::given(method("GET"))
            .and(path(format!("/hls/1080/{name}")))
            .and(header("referer", format!("{cdn}/").as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_raw(vec![fill; 376], "video/mp2t"))
            .mount(upstream)
            .await;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn health_check() {
    let upstream = MockServer::start().await;
    let addr = start_server(&upstream).await;

    let resp = reqwest::get(format!("http://{addr}/health")).await.unwrap();
    assert_eq!(resp.status(), 200);
    assert!(resp.headers().contains_key("x-hls-relay-version"));

    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn master_to_segment_pipeline() {
    let upstream = MockServer::start().await;
    mount_catalog(&upstream).await;
    let addr = start_server(&upstream).await;

    // Master playlist
    let master = reqwest::get(format!(
        "http://{addr}/api/master.m3u8?tmdbId=27205&title=Inception&year=2010&type=movie"
    ))
    .await
    .unwrap();
    assert_eq!(master.status(), 200);
    let master_body = master.text().await.unwrap();

    let variants = match m3u8_rs::parse_playlist_res(master_body.as_bytes()) {
        Ok(Playlist::MasterPlaylist(pl)) => pl.variants,
        other => panic!("expected master playlist, got {other:?}"),
    };
    assert_eq!(variants.len(), 2);
    assert_eq!(variants[0].bandwidth, 5_000_000);
    assert_eq!(variants[1].bandwidth, 2_800_000);
    assert!(
        variants[0]
            .uri
            .starts_with(&format!("http://{addr}/proxy?url="))
    );
    assert!(variants[0].uri.ends_with("&type=m3u8"));

    // Variant playlist, rewritten by the relay
    let media = reqwest::get(&variants[0].uri).await.unwrap();
    assert_eq!(media.status(), 200);
    assert_eq!(
        media.headers()["content-type"],
        "application/vnd.apple.mpegurl"
    );
    let media_body = media.text().await.unwrap();

    let segments = match m3u8_rs::parse_playlist_res(media_body.as_bytes()) {
        Ok(Playlist::MediaPlaylist(pl)) => pl.segments,
        other => panic!("expected media playlist, got {other:?}"),
    };
    assert_eq!(segments.len(), 2);

    // Segments, relayed byte for byte
    for (segment, fill) in segments.iter().zip([0x47u8, 0x48u8]) {
        assert!(segment.uri.starts_with("/proxy?url="), "{}", segment.uri);
        let resp = reqwest::get(format!("http://{addr}{}", segment.uri))
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()["content-type"], "video/mp2t");
        assert_eq!(resp.headers()["access-control-allow-origin"], "*");

        let bytes = resp.bytes().await.unwrap();
        assert_eq!(bytes.len(), 376);
        assert!(bytes.iter().all(|b| *b == fill));
    }
}

#[tokio::test]
async fn streams_endpoint_over_the_wire() {
    let upstream = MockServer::start().await;
    mount_catalog(&upstream).await;
    let addr = start_server(&upstream).await;

    let json: serde_json::Value = reqwest::get(format!(
        "http://{addr}/api/streams?tmdbId=27205&title=Inception&type=movie"
    ))
    .await
    .unwrap()
    .json()
    .await
    .unwrap();

    let qualities: Vec<u64> = json["streams"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["quality"].as_u64().unwrap())
        .collect();
    assert_eq!(qualities, vec![1080, 720]);
    assert!(json["tracks"].as_array().unwrap().is_empty());
}
