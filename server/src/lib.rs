use anyhow::Result;
use axum::{extract::{Path, Query, State}, http::StatusCode, routing::get, Json, Router};
use query_core::{DocId, Hit, IndexPaths, QueryEngine};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

const DEFAULT_PAGE: usize = 1;
const DEFAULT_PER_PAGE: usize = 10;

#[derive(Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    // kept as text so a malformed value falls back to the default instead of rejecting the request
    pub page: Option<String>,
    pub per_page: Option<String>,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub page: usize,
    pub per_page: usize,
    pub total_results: usize,
    pub elapsed_ms: f64,
    pub results: Vec<Hit>,
}

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<QueryEngine>,
}

/// Opens the index at `index_dir` with default settings and builds the HTTP app around it.
pub fn build_app(index_dir: String) -> Result<Router> {
    let engine = QueryEngine::open(&IndexPaths::new(&index_dir))?;
    Ok(router(Arc::new(engine)))
}

pub fn router(engine: Arc<QueryEngine>) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/doc/:doc_id", get(doc_handler))
        .with_state(AppState { engine })
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
}

// CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
fn cors_layer() -> CorsLayer {
    let permissive = || CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);
    match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val.split(',').filter_map(|s| s.trim().parse().ok()).collect();
            if origins.is_empty() {
                permissive()
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => permissive(),
    }
}

fn positive_or(raw: Option<&str>, default: usize) -> usize {
    raw.and_then(|s| s.trim().parse::<usize>().ok()).filter(|v| *v > 0).unwrap_or(default)
}

pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, (StatusCode, String)> {
    if params.q.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Missing query parameter 'q'".into()));
    }
    let page = positive_or(params.page.as_deref(), DEFAULT_PAGE);
    let per_page = positive_or(params.per_page.as_deref(), DEFAULT_PER_PAGE);

    let start = Instant::now();
    // first touch of a partition reads from disk, keep it off the async workers
    let engine = state.engine.clone();
    let query = params.q.clone();
    let outcome = tokio::task::spawn_blocking(move || engine.evaluate(&query))
        .await
        .map_err(|err| (StatusCode::INTERNAL_SERVER_ERROR, format!("search task failed: {err}")))?;
    let hits = outcome.map_err(|err| (StatusCode::BAD_REQUEST, err.to_string()))?;
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

    let total_results = hits.len();
    let offset = (page - 1).saturating_mul(per_page);
    let results: Vec<Hit> = hits.into_iter().skip(offset).take(per_page).collect();
    tracing::debug!(query = %params.q, total_results, elapsed_ms, "search served");

    Ok(Json(SearchResponse { query: params.q, page, per_page, total_results, elapsed_ms, results }))
}

pub async fn doc_handler(
    State(state): State<AppState>,
    Path(doc_id): Path<DocId>,
) -> (StatusCode, Json<serde_json::Value>) {
    match state.engine.documents().get(doc_id) {
        Some(entry) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "doc_id": doc_id,
                "url": entry.url,
                "title": entry.title,
                "description": entry.description,
            })),
        ),
        None => (StatusCode::NOT_FOUND, Json(serde_json::json!({ "error": "not found" }))),
    }
}
