use anyhow::Result;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use coursematch_core::persist::open_snapshot;
use coursematch_core::{CatalogItem, Preferences, Ranking, Snapshot, SnapshotStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Deserialize)]
pub struct RecommendParams {
    #[serde(default)]
    pub q: String,
    #[serde(default = "default_k")]
    pub k: i64,
}
fn default_k() -> i64 { 5 }

#[derive(Serialize)]
pub struct RecommendResponse {
    pub query: String,
    pub version: u64,
    pub took_s: f64,
    pub matched: usize,
    pub results: Vec<RecommendHit>,
}

#[derive(Serialize)]
pub struct RecommendHit {
    pub id: String,
    pub title: String,
    pub subject: String,
    pub level: String,
    pub price: f64,
    pub subscriber_count: u64,
    pub num_lectures: Option<u32>,
    pub content_duration: Option<f32>,
    pub score: f32,
}

#[derive(Serialize)]
pub struct CatalogVersion {
    pub version: u64,
    pub fingerprint: String,
    pub num_items: usize,
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<SnapshotStore>,
    pub admin_token: Option<String>,
}

type ApiError = (StatusCode, String);

const ADMIN_HEADER: &str = "X-ADMIN-TOKEN";

pub fn build_app(source: String) -> Result<Router> {
    let snapshot = open_snapshot(&source)?;
    let admin_token = std::env::var("ADMIN_TOKEN").ok();
    Ok(build_router(Arc::new(SnapshotStore::new(snapshot)), admin_token))
}

pub fn build_router(store: Arc<SnapshotStore>, admin_token: Option<String>) -> Router {
    let cors = cors_layer(std::env::var("CORS_ALLOW_ORIGIN").ok().as_deref());
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/recommend", get(recommend_handler).post(preferences_handler))
        .route("/catalog", post(catalog_handler))
        .route("/catalog/version", get(version_handler))
        .with_state(AppState { store, admin_token })
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Origins parsed from a comma-separated list. Unparseable entries are dropped.
fn allowed_origins(list: &str) -> Vec<HeaderValue> {
    list.split(',').map(str::trim).filter(|s| !s.is_empty()).filter_map(|s| s.parse().ok()).collect()
}

/// Any origin unless `allow` names at least one valid origin.
fn cors_layer(allow: Option<&str>) -> CorsLayer {
    let base = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    match allow.map(allowed_origins) {
        Some(origins) if !origins.is_empty() => base.allow_origin(AllowOrigin::list(origins)),
        _ => base.allow_origin(Any),
    }
}

impl From<&Snapshot> for CatalogVersion {
    fn from(snapshot: &Snapshot) -> Self {
        Self {
            version: snapshot.version(),
            fingerprint: snapshot.fingerprint().to_string(),
            num_items: snapshot.catalog().len(),
        }
    }
}

fn respond(query: String, snapshot: &Snapshot, ranking: Ranking<'_>, start: std::time::Instant) -> RecommendResponse {
    let matched = ranking.matched();
    let results = ranking
        .iter()
        .map(|e| RecommendHit {
            id: e.item.id.clone(),
            title: e.item.title.clone(),
            subject: e.item.subject.clone(),
            level: e.item.level.to_string(),
            price: e.item.price,
            subscriber_count: e.item.subscriber_count,
            num_lectures: e.item.num_lectures,
            content_duration: e.item.content_duration,
            score: e.score,
        })
        .collect();
    RecommendResponse { query, version: snapshot.version(), took_s: start.elapsed().as_secs_f64(), matched, results }
}

fn run_query(state: &AppState, query: String, k: i64) -> Result<Json<RecommendResponse>, ApiError> {
    let start = std::time::Instant::now();
    let snapshot = state.store.current();
    let ranking = snapshot.rank(&query, k).map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
    if ranking.matched() == 0 {
        tracing::debug!(%query, "no course shares a term with the query");
    }
    Ok(Json(respond(query, &snapshot, ranking, start)))
}

pub async fn recommend_handler(
    State(state): State<AppState>,
    Query(params): Query<RecommendParams>,
) -> Result<Json<RecommendResponse>, ApiError> {
    run_query(&state, params.q, params.k)
}

pub async fn preferences_handler(
    State(state): State<AppState>,
    Query(params): Query<RecommendParams>,
    Json(prefs): Json<Preferences>,
) -> Result<Json<RecommendResponse>, ApiError> {
    prefs.validate().map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
    run_query(&state, prefs.to_query(), params.k)
}

pub async fn version_handler(State(state): State<AppState>) -> Json<CatalogVersion> {
    Json(CatalogVersion::from(state.store.current().as_ref()))
}

async fn catalog_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(items): Json<Vec<CatalogItem>>,
) -> Result<Json<CatalogVersion>, ApiError> {
    authorize(&state, &headers)?;
    for item in &items {
        item.validate().map_err(|e| (StatusCode::BAD_REQUEST, format!("{}: {e}", item.id)))?;
    }
    let store = Arc::clone(&state.store);
    let snapshot = tokio::task::spawn_blocking(move || store.publish(items))
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
    tracing::info!(version = snapshot.version(), items = snapshot.catalog().len(), "catalog published");
    Ok(Json(CatalogVersion::from(snapshot.as_ref())))
}

/// Catalog writes need `X-ADMIN-TOKEN` to match the configured token; with no token configured they are refused.
fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let provided = headers.get(ADMIN_HEADER).and_then(|v| v.to_str().ok());
    match (state.admin_token.as_deref(), provided) {
        (None, _) => Err((StatusCode::UNAUTHORIZED, "catalog updates are disabled: ADMIN_TOKEN not set".into())),
        (Some(required), Some(given)) if given == required => Ok(()),
        (Some(_), Some(_)) => Err((StatusCode::UNAUTHORIZED, "invalid admin token".into())),
        (Some(_), None) => Err((StatusCode::UNAUTHORIZED, format!("missing {ADMIN_HEADER} header"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origins_skip_blank_and_invalid_entries() {
        let origins = allowed_origins("https://a.example, ,bad\u{7f}origin,https://b.example");
        assert_eq!(origins, vec![HeaderValue::from_static("https://a.example"), HeaderValue::from_static("https://b.example")]);
        assert!(allowed_origins(" , ").is_empty());
    }
}
