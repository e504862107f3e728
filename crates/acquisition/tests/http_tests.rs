//! Tests for HTTP raster acquisition against an in-process server.
//!
//! Covers:
//! - API key placement by host
//! - Provider error bodies surfacing unchanged
//! - Transport failures
//! - Fetch + decode through `acquire_raster`

use std::collections::HashMap;

use acquisition::{acquire_raster, ApiKey, FetchConfig, HttpRasterSource, RasterSource};
use axum::extract::Query;
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use solar_common::SolarError;
use test_utils::fixtures;

const NOT_FOUND_BODY: &str =
    r#"{"error":{"code":404,"message":"Requested entity was not found.","status":"NOT_FOUND"}}"#;

// ============================================================================
// Helper functions
// ============================================================================

/// Start a server on an ephemeral port and return its base URL.
async fn spawn_server() -> String {
    let app = Router::new()
        .route(
            "/echo",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                params.get("key").cloned().unwrap_or_else(|| "<none>".to_string())
            }),
        )
        .route("/mask.tif", get(|| async { fixtures::mask_tiff(8, 8) }))
        .route("/missing", get(|| async { (StatusCode::NOT_FOUND, NOT_FOUND_BODY) }))
        .route(
            "/forbidden",
            get(|| async { (StatusCode::FORBIDDEN, "API key not valid") }),
        )
        .route("/garbage", get(|| async { "definitely not a tiff" }));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn source(provider_host: &str) -> HttpRasterSource {
    let config = FetchConfig {
        provider_host: provider_host.to_string(),
        ..Default::default()
    };
    HttpRasterSource::new(Some(ApiKey::new("secret")), config).unwrap()
}

// ============================================================================
// Credential placement
// ============================================================================

#[tokio::test]
async fn test_key_sent_to_provider_host() {
    let base = spawn_server().await;
    let body = source("127.0.0.1").fetch(&format!("{}/echo", base)).await.unwrap();
    assert_eq!(&body[..], b"secret");
}

#[tokio::test]
async fn test_key_withheld_from_other_hosts() {
    let base = spawn_server().await;
    let body = source("solar.googleapis.com")
        .fetch(&format!("{}/echo", base))
        .await
        .unwrap();
    assert_eq!(&body[..], b"<none>");
}

// ============================================================================
// Error responses
// ============================================================================

#[tokio::test]
async fn test_not_found_keeps_body() {
    let base = spawn_server().await;
    let url = format!("{}/missing", base);
    let err = source("127.0.0.1").fetch(&url).await.unwrap_err();

    match err {
        SolarError::Fetch {
            url: failed,
            status,
            payload,
        } => {
            assert_eq!(failed, url);
            assert_eq!(status, Some(404));
            assert_eq!(payload, NOT_FOUND_BODY);
        }
        other => panic!("expected Fetch error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_error_status_passes_through() {
    let base = spawn_server().await;
    let err = source("127.0.0.1")
        .fetch(&format!("{}/forbidden", base))
        .await
        .unwrap_err();

    assert_eq!(err.http_status_code(), 403);
    assert!(err.to_string().contains("API key not valid"));
    // The reported URL is the one requested, without the credential
    assert!(!err.to_string().contains("secret"));
}

#[tokio::test]
async fn test_transport_failure() {
    // Bind and drop to get a port nothing listens on
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = source("127.0.0.1")
        .fetch(&format!("http://{}/mask.tif", addr))
        .await
        .unwrap_err();

    assert!(matches!(err, SolarError::Fetch { status: None, .. }), "got {:?}", err);
    assert!(!err.to_string().contains("secret"));
}

#[tokio::test]
async fn test_truncated_error_body_keeps_status() {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    // Promise a longer body than is sent, then hang up
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = [0u8; 1024];
        let _ = socket.read(&mut request).await;
        socket
            .write_all(b"HTTP/1.1 503 Service Unavailable\r\ncontent-length: 100\r\n\r\nbackend")
            .await
            .unwrap();
        socket.shutdown().await.unwrap();
    });

    let err = source("127.0.0.1")
        .fetch(&format!("http://{}/mask.tif", addr))
        .await
        .unwrap_err();

    match &err {
        SolarError::Fetch { status, payload, .. } => {
            assert_eq!(*status, Some(503));
            assert!(payload.contains("failed to read error body"), "payload {:?}", payload);
        }
        other => panic!("expected Fetch error, got {:?}", other),
    }
    assert!(!err.to_string().contains("secret"));
}

// ============================================================================
// Acquisition
// ============================================================================

#[tokio::test]
async fn test_acquire_raster_decodes_geotiff() {
    let base = spawn_server().await;
    let raster = acquire_raster(&source("127.0.0.1"), &format!("{}/mask.tif", base))
        .await
        .unwrap();

    assert_eq!((raster.width(), raster.height()), (8, 8));
    assert_eq!(raster.band_count(), 1);
    assert!(raster.bounds().north > raster.bounds().south);
}

#[tokio::test]
async fn test_acquire_raster_rejects_non_tiff() {
    let base = spawn_server().await;
    let err = acquire_raster(&source("127.0.0.1"), &format!("{}/garbage", base))
        .await
        .unwrap_err();
    assert!(matches!(err, SolarError::Decode(_)));
}
