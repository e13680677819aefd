//! HTTP API for project management.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`    | `/health` | Health check (returns version) |
//! | `POST`   | `/api/project/create-project` | Create a project end to end |
//! | `GET`    | `/api/project/projects` | List active projects |
//! | `GET`    | `/api/project/search?q=&limit=` | Search active projects |
//! | `GET`    | `/api/project/stats` | Registry statistics |
//! | `DELETE` | `/api/project/projects/{slug}` | Delete a project (moves it to backups) |
//!
//! # Error Contract
//!
//! ```json
//! { "success": false, "error": { "code": "conflict", "message": "..." } }
//! ```
//!
//! Error codes: `bad_request` (400), `forbidden` (403), `not_found` (404),
//! `timeout` (408), `conflict` (409), `internal` (500).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so the documentation site
//! can call the API from the browser.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use crate::config::Config;
use crate::db;
use crate::lifecycle::{CreateProjectRequest, LifecycleError, ProjectLifecycle};
use crate::migrate::migrate_pool;
use crate::models::{Project, ProjectStats};

#[derive(Clone)]
struct AppState {
    lifecycle: Arc<ProjectLifecycle>,
}

/// Starts the HTTP server on `[server].bind`. Runs until the process exits.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let pool = db::connect(config).await?;
    migrate_pool(&pool).await?;

    let lifecycle = Arc::new(ProjectLifecycle::new(Arc::new(config.clone()), pool));
    let app = router(lifecycle);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(bind = %bind_addr, "server listening");
    println!("DocuPilot API listening on http://{}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}

/// The application router, without binding a socket.
pub fn router(lifecycle: Arc<ProjectLifecycle>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/api/project/create-project", post(handle_create))
        .route("/api/project/projects", get(handle_list))
        .route("/api/project/search", get(handle_search))
        .route("/api/project/projects/{slug}", delete(handle_delete))
        .route("/api/project/stats", get(handle_stats))
        .fallback(handle_not_found)
        .layer(cors)
        .with_state(AppState { lifecycle })
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl AppError {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            success: false,
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<LifecycleError> for AppError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::InvalidRequest(m) => {
                AppError::new(StatusCode::BAD_REQUEST, "bad_request", m)
            }
            LifecycleError::Forbidden(m) => AppError::new(StatusCode::FORBIDDEN, "forbidden", m),
            LifecycleError::NotFound(m) => AppError::new(StatusCode::NOT_FOUND, "not_found", m),
            LifecycleError::Timeout(m) => {
                AppError::new(StatusCode::REQUEST_TIMEOUT, "timeout", m)
            }
            LifecycleError::Conflict(m) => AppError::new(StatusCode::CONFLICT, "conflict", m),
            LifecycleError::ScriptFailed { message, .. } => {
                AppError::new(StatusCode::INTERNAL_SERVER_ERROR, "internal", message)
            }
            LifecycleError::Internal(e) => {
                error!(error = %e, "request failed");
                AppError::new(StatusCode::INTERNAL_SERVER_ERROR, "internal", e.to_string())
            }
        }
    }
}

async fn handle_not_found() -> AppError {
    AppError::new(StatusCode::NOT_FOUND, "not_found", "Route not found")
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    service: String,
    version: String,
    timestamp: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: "docupilot".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

// ============ POST /api/project/create-project ============

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateBody {
    #[serde(default)]
    project_title: String,
    #[serde(default)]
    repository_url: String,
    branch_name: Option<String>,
    description: Option<String>,
    creator: Option<String>,
}

#[derive(Serialize)]
struct CreateResponse {
    success: bool,
    message: String,
    data: Project,
    output: String,
    warnings: Vec<String>,
}

async fn handle_create(
    State(state): State<AppState>,
    body: Result<Json<CreateBody>, JsonRejection>,
) -> Result<Json<CreateResponse>, AppError> {
    let Json(body) =
        body.map_err(|e| AppError::new(StatusCode::BAD_REQUEST, "bad_request", e.body_text()))?;
    let outcome = state
        .lifecycle
        .create_project(CreateProjectRequest {
            title: body.project_title,
            repository_url: body.repository_url,
            branch_name: body.branch_name,
            description: body.description,
            creator: body.creator,
        })
        .await?;

    let message = if outcome.warnings.is_empty() {
        "Project created successfully".to_string()
    } else {
        "Project created with warnings".to_string()
    };

    Ok(Json(CreateResponse {
        success: true,
        message,
        data: outcome.project,
        output: outcome.script_output,
        warnings: outcome.warnings,
    }))
}

// ============ GET /api/project/projects ============

#[derive(Serialize)]
struct ListResponse {
    success: bool,
    projects: Vec<Project>,
}

async fn handle_list(State(state): State<AppState>) -> Result<Json<ListResponse>, AppError> {
    let projects = state.lifecycle.list_projects().await?;
    Ok(Json(ListResponse {
        success: true,
        projects,
    }))
}

// ============ GET /api/project/search ============

#[derive(Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: String,
    limit: Option<i64>,
}

async fn handle_search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<ListResponse>, AppError> {
    let projects = state
        .lifecycle
        .search_projects(&params.q, params.limit.unwrap_or(20))
        .await?;
    Ok(Json(ListResponse {
        success: true,
        projects,
    }))
}

// ============ GET /api/project/stats ============

#[derive(Serialize)]
struct StatsResponse {
    success: bool,
    stats: ProjectStats,
}

async fn handle_stats(State(state): State<AppState>) -> Result<Json<StatsResponse>, AppError> {
    let stats = state.lifecycle.statistics().await?;
    Ok(Json(StatsResponse {
        success: true,
        stats,
    }))
}

// ============ DELETE /api/project/projects/{slug} ============

#[derive(Serialize)]
struct DeleteResponse {
    success: bool,
    message: String,
    backup: String,
    warnings: Vec<String>,
}

async fn handle_delete(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<DeleteResponse>, AppError> {
    let outcome = state.lifecycle.delete_project(&slug).await?;
    Ok(Json(DeleteResponse {
        success: true,
        message: "Project deleted successfully".to_string(),
        backup: outcome.backup.display().to_string(),
        warnings: outcome.warnings,
    }))
}
