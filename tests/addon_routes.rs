//! Addon protocol routes served from a pre-populated catalog

use axum::{
    Router,
    body::Body,
    http::{HeaderName, HeaderValue, Method, Request, StatusCode},
};
use axum_test::TestServer;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use iptv_catalog::cache::CatalogCache;
use iptv_catalog::models::{CatalogEntry, Channel, StreamEntry};
use iptv_catalog::services::CatalogService;
use iptv_catalog::web::{AppState, Manifest, WebServer};

fn entry(id: &str, country: &str, categories: &[&str], referrer: Option<&str>) -> CatalogEntry {
    let channel = Channel {
        id: id.to_string(),
        name: format!("{id} TV"),
        categories: categories.iter().map(|c| c.to_string()).collect(),
        languages: vec![],
        country: Some(country.to_string()),
        logo: Some(format!("http://logos/{id}.png")),
    };
    let stream = StreamEntry {
        channel: Some(id.to_string()),
        url: format!("http://streams/{id}.m3u8"),
        user_agent: None,
        http_referrer: referrer.map(str::to_string),
    };
    CatalogEntry::from_channel(&channel, &stream)
}

async fn app_state(entries: Vec<CatalogEntry>, completed: bool) -> AppState {
    let cache = Arc::new(CatalogCache::default());
    if completed {
        cache.commit_catalog(entries).await;
        cache.mark_cycle_complete();
    }
    AppState {
        catalog: CatalogService::new(cache.clone(), Duration::from_millis(50)),
        cache,
        manifest: Arc::new(Manifest::for_countries(&["GR".to_string(), "GB".to_string()])),
    }
}

async fn test_app() -> Router {
    let state = app_state(
        vec![
            entry("ert1", "GR", &["general"], None),
            entry("skai", "GR", &["news"], Some("https://www.skai.gr/")),
            entry("bbc", "GB", &["news"], None),
        ],
        true,
    )
    .await;
    WebServer::create_router(state)
}

fn ids(body: &Value, key: &str) -> Vec<String> {
    body[key]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["id"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_manifest() {
    let server = TestServer::new(test_app().await).unwrap();

    let response = server.get("/manifest.json").await;
    response.assert_status_ok();
    let body: Value = response.json();

    assert_eq!(body["id"], "org.iptv");
    assert_eq!(body["name"], "IPTV Addon");
    assert_eq!(body["types"][0], "tv");
    assert_eq!(body["catalogs"][0]["id"], "iptv-channels-GR");
    assert_eq!(body["catalogs"][1]["id"], "iptv-channels-GB");
    assert_eq!(body["idPrefixes"][0], "iptv-");
}

#[tokio::test]
async fn test_catalog_by_country() {
    let server = TestServer::new(test_app().await).unwrap();

    let body: Value = server.get("/catalog/tv/iptv-channels-GR.json").await.json();
    assert_eq!(ids(&body, "metas"), vec!["iptv-ert1", "iptv-skai"]);
    assert_eq!(body["metas"][0]["posterShape"], "square");
    assert_eq!(body["metas"][0]["genres"][1], "GR");

    let body: Value = server.get("/catalog/tv/iptv-channels-GB.json").await.json();
    assert_eq!(ids(&body, "metas"), vec!["iptv-bbc"]);
}

#[tokio::test]
async fn test_catalog_with_genre_extra() {
    let server = TestServer::new(test_app().await).unwrap();

    let body: Value = server
        .get("/catalog/tv/iptv-channels-GR/genre=news.json")
        .await
        .json();
    assert_eq!(ids(&body, "metas"), vec!["iptv-skai"]);

    let body: Value = server
        .get("/catalog/tv/iptv-channels-GR/genre=news&genre=general.json")
        .await
        .json();
    assert_eq!(ids(&body, "metas"), vec!["iptv-ert1", "iptv-skai"]);

    let body: Value = server
        .get("/catalog/tv/iptv-channels-GR/genre=sports.json")
        .await
        .json();
    assert!(ids(&body, "metas").is_empty());
}

#[tokio::test]
async fn test_catalog_ignores_foreign_requests() {
    let server = TestServer::new(test_app().await).unwrap();

    let body: Value = server.get("/catalog/movie/iptv-channels-GR.json").await.json();
    assert!(ids(&body, "metas").is_empty());

    let body: Value = server.get("/catalog/tv/top.json").await.json();
    assert!(ids(&body, "metas").is_empty());
}

#[tokio::test]
async fn test_meta() {
    let server = TestServer::new(test_app().await).unwrap();

    let body: Value = server.get("/meta/tv/iptv-bbc.json").await.json();
    assert_eq!(body["meta"]["id"], "iptv-bbc");
    assert_eq!(body["meta"]["name"], "bbc TV");
    assert_eq!(body["meta"]["streamInfo"]["title"], "Live Stream");

    let body: Value = server.get("/meta/tv/iptv-unknown.json").await.json();
    assert_eq!(body["meta"], serde_json::json!({}));

    let body: Value = server.get("/meta/movie/iptv-bbc.json").await.json();
    assert_eq!(body["meta"], serde_json::json!({}));
}

#[tokio::test]
async fn test_stream() {
    let server = TestServer::new(test_app().await).unwrap();

    let body: Value = server.get("/stream/tv/iptv-skai.json").await.json();
    let streams = body["streams"].as_array().unwrap();
    assert_eq!(streams.len(), 1);
    assert_eq!(streams[0]["url"], "http://streams/skai.m3u8");
    assert_eq!(streams[0]["title"], "Live Stream");
    assert_eq!(streams[0]["httpReferrer"], "https://www.skai.gr/");

    let body: Value = server.get("/stream/tv/iptv-unknown.json").await.json();
    assert!(body["streams"].as_array().unwrap().is_empty());

    let body: Value = server.get("/stream/tv/bbc.json").await.json();
    assert!(body["streams"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_cors_headers() {
    let server = TestServer::new(test_app().await).unwrap();

    let response = server
        .get("/manifest.json")
        .add_header(
            HeaderName::from_static("origin"),
            HeaderValue::from_static("https://web.stremio.com"),
        )
        .await;
    assert_eq!(
        response.header("access-control-allow-origin"),
        HeaderValue::from_static("*")
    );

    let preflight = server
        .method(Method::OPTIONS, "/catalog/tv/iptv-channels-GR.json")
        .add_header(
            HeaderName::from_static("origin"),
            HeaderValue::from_static("https://web.stremio.com"),
        )
        .add_header(
            HeaderName::from_static("access-control-request-method"),
            HeaderValue::from_static("GET"),
        )
        .await;
    preflight.assert_status_ok();
    let methods = preflight.header("access-control-allow-methods");
    let methods = methods.to_str().unwrap();
    assert!(methods.contains("GET"));
    assert!(methods.contains("OPTIONS"));
    assert_eq!(
        preflight
            .header("access-control-allow-headers")
            .to_str()
            .unwrap()
            .to_ascii_lowercase(),
        "content-type"
    );
}

#[tokio::test]
async fn test_cold_start_answers_empty_after_bounded_wait() {
    let state = app_state(vec![entry("bbc", "GB", &["news"], None)], false).await;
    let server = TestServer::new(WebServer::create_router(state)).unwrap();

    let body: Value = server.get("/catalog/tv/iptv-channels-GB.json").await.json();
    assert!(ids(&body, "metas").is_empty());
}

// Helper function to send requests to the app
async fn send_request(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    (status, serde_json::from_slice(&body_bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn test_health_reports_cache_stats() {
    let app = test_app().await;

    let (status, body) = send_request(&app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["cache"]["catalog_entries"], 3);
    assert_eq!(body["cache"]["completed_cycles"], 1);
    assert_eq!(body["cache"]["verdicts"], 0);
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = test_app().await;
    let (status, _) = send_request(&app, "/addon/unknown").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
