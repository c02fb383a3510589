// Peer client tests against a live node
use actix_web::{web, App, HttpServer};
use bytes::Bytes;

use blobvault::app_state::AppState;
use blobvault::client::PeerClient;
use blobvault::config::{AppConfig, PeerConfig, StorageConfig};
use blobvault::error::StoreError;
use blobvault::http;

/// Start a node on an ephemeral port and return its base URL
fn start_node() -> (String, actix_web::dev::ServerHandle) {
    let config = AppConfig {
        storage: StorageConfig {
            buckets: vec!["media".to_string()],
            protected_buckets: vec!["archive".to_string()],
        },
        ..AppConfig::default()
    };
    let state = web::Data::new(AppState::from_config(config));

    let server =
        HttpServer::new(move || App::new().app_data(state.clone()).configure(http::configure))
            .workers(1)
            .bind(("127.0.0.1", 0))
            .unwrap();
    let addr = server.addrs()[0];
    let server = server.run();
    let handle = server.handle();
    actix_web::rt::spawn(server);
    (format!("http://{}", addr), handle)
}

fn peer(url: &str) -> PeerClient {
    PeerClient::new(url, &PeerConfig { timeout_secs: 5 }).unwrap()
}

fn not_found(key: &str) -> StoreError {
    StoreError::KeyNotFound { bucket: "media".to_string(), key: key.to_string() }
}

#[actix_web::test]
async fn test_peer_round_trip_with_ranges() {
    let (url, handle) = start_node();
    let client = peer(&url);

    let put = client
        .put_object("media", "song.mp3", Bytes::from_static(b"0123456789"), Some("audio/mpeg"))
        .await
        .unwrap();
    assert_eq!(put.size, 10);

    let whole = client.get_object("media", "song.mp3", None).await.unwrap();
    assert_eq!(whole, Bytes::from_static(b"0123456789"));

    let part = client.get_object("media", "song.mp3", Some("bytes=-3")).await.unwrap();
    assert_eq!(part, Bytes::from_static(b"789"));

    let meta = client.object_meta("media", "song.mp3").await.unwrap();
    assert_eq!(meta.content_type.as_deref(), Some("audio/mpeg"));

    let appended = client
        .append_object("media", "song.mp3", Bytes::from_static(b"AB"), None)
        .await
        .unwrap();
    assert_eq!(appended.size, 12);
    let tail = client.get_object("media", "song.mp3", Some("bytes=9-")).await.unwrap();
    assert_eq!(tail, Bytes::from_static(b"9AB"));

    let bucket = client.get_bucket("media").await.unwrap();
    assert_eq!(bucket.objects, vec!["song.mp3".to_string()]);

    let deleted = client.delete_object("media", "song.mp3").await.unwrap();
    assert_eq!(deleted.size, 12);

    handle.stop(true).await;
}

#[actix_web::test]
async fn test_head_reports_object_length_on_the_wire() {
    let (url, handle) = start_node();
    let client = peer(&url);
    client
        .put_object("media", "clip", Bytes::from(vec![1u8; 1000]), None)
        .await
        .unwrap();

    let resp = reqwest::Client::new()
        .head(format!("{}/objects/media/clip", url))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    assert_eq!(resp.headers().get(reqwest::header::CONTENT_LENGTH).unwrap(), "1000");
    assert_eq!(resp.headers().get(reqwest::header::ACCEPT_RANGES).unwrap(), "bytes");

    handle.stop(true).await;
}

#[actix_web::test]
async fn test_keys_with_reserved_characters() {
    let (url, handle) = start_node();
    let client = peer(&url);

    let odd = "a?b#c d";
    client
        .put_object("media", "a", Bytes::from_static(b"plain"), None)
        .await
        .unwrap();
    let put = client
        .put_object("media", odd, Bytes::from_static(b"odd"), None)
        .await
        .unwrap();
    assert_eq!(put.key, odd);

    assert_eq!(client.get_object("media", odd, None).await.unwrap(), Bytes::from_static(b"odd"));
    assert_eq!(client.get_object("media", "a", None).await.unwrap(), Bytes::from_static(b"plain"));
    assert_eq!(client.object_meta("media", odd).await.unwrap().key, odd);

    let keys = client.get_bucket("media").await.unwrap().objects;
    assert_eq!(keys, vec!["a".to_string(), odd.to_string()]);

    handle.stop(true).await;
}

#[actix_web::test]
async fn test_peer_errors_are_typed() {
    let (url, handle) = start_node();
    let client = peer(&url);

    assert_eq!(
        client.get_object("nowhere", "k", None).await,
        Err(StoreError::BucketNotFound { bucket: "nowhere".to_string() })
    );
    assert_eq!(client.object_meta("media", "ghost").await, Err(not_found("ghost")));
    assert_eq!(
        client.get_object("media", "ghost", Some("bytes=0-1")).await,
        Err(not_found("ghost"))
    );
    assert_eq!(
        client.append_object("media", "ghost", Bytes::from_static(b"x"), None).await,
        Err(not_found("ghost"))
    );

    client
        .put_object("media", "clip", Bytes::from_static(b"abc"), None)
        .await
        .unwrap();
    assert_eq!(
        client.get_object("media", "clip", Some("bytes=-")).await,
        Err(StoreError::InvalidRangeRequest { header: "bytes=-".to_string() })
    );
    assert_eq!(
        client.get_object("media", "clip", Some("bytes=10-")).await,
        Err(StoreError::InvalidRangeRequest { header: "bytes */3".to_string() })
    );

    client
        .put_object("archive", "keep", Bytes::from_static(b"x"), None)
        .await
        .unwrap();
    assert_eq!(
        client.delete_object("archive", "keep").await,
        Err(StoreError::LimitedDeleteAccess {
            bucket: "archive".to_string(),
            key: "keep".to_string()
        })
    );

    assert!(client.bucket_exists("media").await.unwrap());
    assert!(!client.bucket_exists("nowhere").await.unwrap());

    handle.stop(true).await;
}
