//! HTTP handlers for the addon protocol
//!
//! Resource paths end in `.json` and axum captures whole segments, so the
//! suffix is stripped here rather than in the route.

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde::Serialize;
use serde_json::json;
use tracing::debug;

use super::AppState;
use super::manifest::CATALOG_PREFIX;
use crate::cache::CacheStats;
use crate::models::{CATALOG_ID_PREFIX, CONTENT_TYPE_TV, CatalogEntry, StreamInfo};

#[derive(Debug, Serialize)]
pub struct CatalogResponse {
    pub metas: Vec<CatalogEntry>,
}

#[derive(Debug, Serialize)]
pub struct StreamsResponse {
    pub streams: Vec<StreamInfo>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub cache: CacheStats,
}

pub async fn manifest(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.manifest.as_ref().clone())
}

pub async fn catalog(
    State(state): State<AppState>,
    Path((content_type, id)): Path<(String, String)>,
) -> Json<CatalogResponse> {
    list_catalog(&state, &content_type, strip_json(&id), &[]).await
}

pub async fn catalog_with_extra(
    State(state): State<AppState>,
    Path((content_type, id, extra)): Path<(String, String, String)>,
) -> Json<CatalogResponse> {
    let genres = parse_genres(strip_json(&extra));
    list_catalog(&state, &content_type, &id, &genres).await
}

pub async fn meta(
    State(state): State<AppState>,
    Path((content_type, id)): Path<(String, String)>,
) -> impl IntoResponse {
    let id = strip_json(&id);
    let meta = if is_tv_entry(&content_type, id) {
        state.catalog.get_meta(id).await
    } else {
        None
    };

    match meta {
        Some(entry) => Json(json!({ "meta": entry })),
        None => Json(json!({ "meta": {} })),
    }
}

pub async fn stream(
    State(state): State<AppState>,
    Path((content_type, id)): Path<(String, String)>,
) -> Json<StreamsResponse> {
    let id = strip_json(&id);
    let streams = if is_tv_entry(&content_type, id) {
        state.catalog.get_stream(id).await.into_iter().collect()
    } else {
        Vec::new()
    };

    Json(StreamsResponse { streams })
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        cache: state.cache.stats().await,
    })
}

async fn list_catalog(
    state: &AppState,
    content_type: &str,
    catalog_id: &str,
    genres: &[String],
) -> Json<CatalogResponse> {
    let metas = match catalog_id.strip_prefix(CATALOG_PREFIX) {
        Some(country) if content_type == CONTENT_TYPE_TV => {
            state.catalog.list_catalog(country, genres).await
        }
        _ => {
            debug!("Ignoring catalog request for {}/{}", content_type, catalog_id);
            Vec::new()
        }
    };

    Json(CatalogResponse { metas })
}

fn is_tv_entry(content_type: &str, id: &str) -> bool {
    content_type == CONTENT_TYPE_TV && id.starts_with(CATALOG_ID_PREFIX)
}

fn strip_json(segment: &str) -> &str {
    segment.strip_suffix(".json").unwrap_or(segment)
}

/// Collect every `genre` value from a form-encoded extra segment
fn parse_genres(extra: &str) -> Vec<String> {
    url::form_urlencoded::parse(extra.as_bytes())
        .filter(|(key, value)| key == "genre" && !value.is_empty())
        .map(|(_, value)| value.into_owned())
        .collect()
}
