//! JSON HTTP API.
//!
//! Read endpoints expose the catalog; admin endpoints run the same
//! [`AdminActions`] as the CLI.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (returns version) |
//! | `GET`  | `/api/videos` | Browse videos (`search`, `category`, `limit`) |
//! | `GET`  | `/api/videos/{youtube_id}` | One video |
//! | `GET`  | `/api/home` | Videos grouped into category rows |
//! | `GET`  | `/api/collections` | All collections |
//! | `GET`  | `/api/collections/{slug}` | Videos in one collection |
//! | `GET`  | `/api/sources` | Configured sources |
//! | `GET`  | `/api/stats` | Catalog statistics |
//! | `POST` | `/api/admin/sources` | Add a source |
//! | `POST` | `/api/admin/sources/{id}/delete` | Remove a source |
//! | `POST` | `/api/admin/sync` | Sync one or all sources |
//! | `POST` | `/api/admin/keys` | Save API keys |
//!
//! # Authentication
//!
//! When `[server].admin_password` is set, `/api/admin/*` requires
//! `Authorization: Bearer <password>`.
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "A valid source ID is required." } }
//! ```
//!
//! Error codes: `bad_request` (400), `unauthorized` (401), `not_found` (404),
//! `internal` (500).

use axum::{
    extract::{Path, Query, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

use crate::admin::{ActionOutcome, AddSourceForm, AdminActions, SaveKeysForm};
use crate::catalog::CatalogStore;
use crate::config::Config;
use crate::db;
use crate::migrate;
use crate::models::{CategoryGroup, Collection, Source, Video, VideoFilter};
use crate::stats::{self, CatalogStats};

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub pool: SqlitePool,
}

impl AppState {
    fn catalog(&self) -> CatalogStore {
        CatalogStore::new(self.pool.clone())
    }
}

/// Start the server on `[server].bind` and run until the process exits.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let pool = db::connect(config).await?;
    migrate::apply(&pool).await?;

    if config.server.admin_password.is_none() {
        warn!("no [server].admin_password set; admin endpoints are unauthenticated");
    }

    let bind_addr = config.server.bind.clone();
    let app = router(AppState {
        config: Arc::new(config.clone()),
        pool,
    });

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(addr = %bind_addr, "HTTP server listening");
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the full router. Exposed so tests can serve it on an ephemeral port.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let admin = Router::new()
        .route("/api/admin/sources", post(handle_add_source))
        .route("/api/admin/sources/{id}/delete", post(handle_delete_source))
        .route("/api/admin/sync", post(handle_sync))
        .route("/api/admin/keys", post(handle_save_keys))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_admin,
        ));

    Router::new()
        .route("/health", get(handle_health))
        .route("/api/videos", get(handle_list_videos))
        .route("/api/videos/{youtube_id}", get(handle_get_video))
        .route("/api/home", get(handle_home))
        .route("/api/collections", get(handle_list_collections))
        .route("/api/collections/{slug}", get(handle_collection_videos))
        .route("/api/sources", get(handle_list_sources))
        .route("/api/stats", get(handle_stats))
        .merge(admin)
        .layer(cors)
        .with_state(state)
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

pub struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        error!(error = %format!("{:#}", err), "request failed");
        AppError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: "internal",
            message: err.to_string(),
        }
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request",
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found",
        message: message.into(),
    }
}

fn unauthorized() -> AppError {
    AppError {
        status: StatusCode::UNAUTHORIZED,
        code: "unauthorized",
        message: "admin password required".to_string(),
    }
}

/// Turn an outcome with user-facing errors into a 4xx; pass clean ones through.
fn outcome_response(outcome: ActionOutcome) -> Result<Json<ActionOutcome>, AppError> {
    if outcome.is_ok() {
        return Ok(Json(outcome));
    }
    let message = outcome.errors.join(" ");
    if outcome.not_found {
        Err(not_found(message))
    } else {
        Err(bad_request(message))
    }
}

// ============ Auth ============

async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if let Some(expected) = state.config.server.admin_password.as_deref() {
        let provided = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .unwrap_or("");
        if !constant_time_eq(provided.as_bytes(), expected.as_bytes()) {
            return Err(unauthorized());
        }
    }
    Ok(next.run(request).await)
}

/// Compare without short-circuiting on the first differing byte.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

// ============ Read endpoints ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[derive(Serialize)]
struct VideoList {
    videos: Vec<Video>,
}

async fn handle_list_videos(
    State(state): State<AppState>,
    Query(filter): Query<VideoFilter>,
) -> Result<Json<VideoList>, AppError> {
    let videos = state.catalog().fetch_videos(&filter).await?;
    Ok(Json(VideoList { videos }))
}

async fn handle_get_video(
    State(state): State<AppState>,
    Path(youtube_id): Path<String>,
) -> Result<Json<Video>, AppError> {
    state
        .catalog()
        .find_video(&youtube_id)
        .await?
        .map(Json)
        .ok_or_else(|| not_found(format!("video not found: {}", youtube_id)))
}

const LATEST_ROW_SIZE: i64 = 12;

#[derive(Serialize)]
struct HomeResponse {
    hero: Option<Video>,
    latest: Vec<Video>,
    groups: Vec<CategoryGroup>,
}

async fn handle_home(State(state): State<AppState>) -> Result<Json<HomeResponse>, AppError> {
    let catalog = state.catalog();
    let groups = catalog.homepage().await?;
    let latest = catalog.recent_videos(LATEST_ROW_SIZE).await?;
    let hero = latest.first().cloned();
    Ok(Json(HomeResponse {
        hero,
        latest,
        groups,
    }))
}

#[derive(Serialize)]
struct CollectionList {
    collections: Vec<Collection>,
}

async fn handle_list_collections(
    State(state): State<AppState>,
) -> Result<Json<CollectionList>, AppError> {
    let collections = state.catalog().collections().await?;
    Ok(Json(CollectionList { collections }))
}

#[derive(Serialize)]
struct CollectionVideos {
    collection: Collection,
    videos: Vec<Video>,
}

async fn handle_collection_videos(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<CollectionVideos>, AppError> {
    let catalog = state.catalog();
    let collection = catalog
        .find_collection(&slug)
        .await?
        .ok_or_else(|| not_found(format!("collection not found: {}", slug)))?;
    let videos = catalog.collection_videos(&slug).await?;
    Ok(Json(CollectionVideos { collection, videos }))
}

#[derive(Serialize)]
struct SourceList {
    sources: Vec<Source>,
}

async fn handle_list_sources(State(state): State<AppState>) -> Result<Json<SourceList>, AppError> {
    let sources = state.catalog().all_sources().await?;
    Ok(Json(SourceList { sources }))
}

async fn handle_stats(State(state): State<AppState>) -> Result<Json<CatalogStats>, AppError> {
    Ok(Json(stats::collect_stats(&state.pool).await?))
}

// ============ Admin endpoints ============

async fn handle_add_source(
    State(state): State<AppState>,
    Json(form): Json<AddSourceForm>,
) -> Result<Json<ActionOutcome>, AppError> {
    let outcome = AdminActions::new(&state.pool, &state.config)
        .add_source(form)
        .await?;
    outcome_response(outcome)
}

async fn handle_delete_source(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ActionOutcome>, AppError> {
    let outcome = AdminActions::new(&state.pool, &state.config)
        .delete_source(id)
        .await?;
    outcome_response(outcome)
}

#[derive(Debug, Default, Deserialize)]
struct SyncRequest {
    #[serde(default)]
    source_id: Option<i64>,
    #[serde(default)]
    limit: Option<i64>,
}

async fn handle_sync(
    State(state): State<AppState>,
    Json(request): Json<SyncRequest>,
) -> Result<Json<ActionOutcome>, AppError> {
    let outcome = AdminActions::new(&state.pool, &state.config)
        .sync_sources(request.source_id, request.limit)
        .await?;
    outcome_response(outcome)
}

async fn handle_save_keys(
    State(state): State<AppState>,
    Json(form): Json<SaveKeysForm>,
) -> Result<Json<ActionOutcome>, AppError> {
    let outcome = AdminActions::new(&state.pool, &state.config)
        .save_keys(form)
        .await?;
    outcome_response(outcome)
}
