//! HTTP handlers.

use crate::error::ApiError;
use crate::server::AppState;
use axum::{
    extract::{Query, State},
    http::Uri,
    response::{IntoResponse, Response},
    Extension, Json,
};
use jfeed_core::{EntitySummary, JfeedError};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

/// Health check endpoint.
pub async fn handle_health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

/// Assembled home page sections.
pub async fn handle_home(State(state): State<Arc<AppState>>) -> Response {
    let feed = state.api.home_feed().await;
    Json(feed.as_ref()).into_response()
}

#[derive(Debug, Deserialize)]
pub struct ResolveParams {
    path: Option<String>,
}

/// Redirect decision for an arbitrary path, for renderers running their own middleware.
pub async fn handle_resolve(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ResolveParams>,
) -> Result<Response, ApiError> {
    let raw = params.path.unwrap_or_default();
    if !raw.starts_with('/') {
        return Err(JfeedError::InvalidPath {
            path: raw,
            message: "expected an absolute path".into(),
        }
        .into());
    }

    let (path, query) = match raw.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (raw.as_str(), None),
    };
    let decision = state.api.resolve(path, query).await;
    Ok(Json(decision).into_response())
}

pub async fn handle_cache_stats(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let swept = state.api.sweep_caches();
    Json(json!({
        "lookups": state.api.cache_stats(),
        "swept": swept,
        "breaker": state.api.breaker_stats(),
    }))
}

pub async fn handle_cache_clear(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.api.clear_caches();
    Json(json!({"status": "ok"}))
}

/// Page context for any path the redirect middleware let through.
pub async fn handle_page(uri: Uri, entity: Option<Extension<EntitySummary>>) -> impl IntoResponse {
    let entity = entity.map(|Extension(entity)| entity);
    debug!("Serving page context for {}", uri.path());
    Json(json!({
        "path": uri.path(),
        "entity": entity,
    }))
}
