//! Velocity HTTP REST API
//!
//! Axum server backing the dashboard widgets and skill management.
//!
//! Architecture: each endpoint has a thin axum handler that delegates to an
//! inner function. The inner functions are directly testable without axum
//! dispatch machinery.
//!
//! Endpoints:
//! - GET    /                                 — liveness message
//! - GET    /health                           — store health
//! - GET    /version                          — server version info
//! - GET    /api/lvi                          — current-week LVI card
//! - GET    /api/lvi-trend                    — weekly snapshots + trend
//! - GET    /api/knowledge-graph              — nodes, links, suggestions
//! - GET    /api/skill-confidence             — radar points
//! - POST   /api/skills/add-skill             — create a skill
//! - POST   /api/skills/update-skill-status   — mark learned / not learned
//! - DELETE /api/skills/delete-skill/:skill_id
//! - POST   /api/graph-rag/generate-skills        — replace the graph for a domain
//! - POST   /api/graph-rag/generate-learning-path — ordered path to a target skill
//! - POST   /api/graph-rag/enrich-skill           — study resources for a skill
//! - GET    /api/graph-rag/status                 — skill advisor readiness
//!
//! Request bodies that fail to parse get a 400 with the `ApiResponse`
//! envelope, like every other failure.

use std::sync::Arc;

use anyhow::Result;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use velocity_core::api::{
    AddSkillRequest, EnrichSkillRequest, GeneratePathRequest, GenerateSkillsRequest, UpdateSkillStatusRequest,
    PROTOCOL,
};
use velocity_core::store::Stores;
use velocity_core::{ApiResponse, VelocityConfig, VelocityError, VelocityRequest};

/// Shared state for all HTTP handlers
#[derive(Clone)]
pub struct HttpState {
    pub stores: Stores,
    pub config: VelocityConfig,
}

/// Build the Axum router with all endpoints
pub fn build_router(state: Arc<HttpState>) -> Router {
    let cors = cors_layer(&state.config.http.allowed_origins);

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/version", get(version_handler))
        .route("/api/lvi", get(lvi_handler))
        .route("/api/lvi-trend", get(lvi_trend_handler))
        .route("/api/knowledge-graph", get(knowledge_graph_handler))
        .route("/api/skill-confidence", get(skill_confidence_handler))
        .route("/api/skills/add-skill", post(add_skill_handler))
        .route("/api/skills/update-skill-status", post(update_skill_status_handler))
        .route("/api/skills/delete-skill/:skill_id", delete(delete_skill_handler))
        .route("/api/graph-rag/generate-skills", post(generate_skills_handler))
        .route("/api/graph-rag/generate-learning-path", post(learning_path_handler))
        .route("/api/graph-rag/enrich-skill", post(enrich_skill_handler))
        .route("/api/graph-rag/status", get(graph_rag_status_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server on the configured address.
/// Gracefully shuts down when the broadcast shutdown signal fires.
pub async fn start_http_server(
    stores: Stores,
    config: VelocityConfig,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<()> {
    let addr = format!("{}:{}", config.http.host, config.http.port);
    let state = Arc::new(HttpState { stores, config });

    let app = build_router(state);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Velocity HTTP API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
            tracing::info!("HTTP server shutting down...");
        })
        .await?;

    Ok(())
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let allow_origin = if allowed_origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|origin| match origin.parse::<HeaderValue>() {
                Ok(v) => Some(v),
                Err(e) => {
                    tracing::warn!(origin = %origin, error = %e, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
}

// ============================================================================
// Inner (directly testable) business logic functions
// ============================================================================

pub fn root_inner() -> serde_json::Value {
    serde_json::json!({ "message": "Velocity API is running" })
}

/// Inner version — returns version info (pure, no IO).
pub fn version_inner() -> serde_json::Value {
    serde_json::json!({
        "version": env!("CARGO_PKG_VERSION"),
        "protocol": PROTOCOL,
    })
}

/// Inner health check — checks both stores and returns (status_code, json_body).
pub async fn health_inner(stores: &Stores) -> (StatusCode, serde_json::Value) {
    let (graph, activity) = match (stores.graph(), stores.activity()) {
        (Ok(g), Ok(a)) => (g, a),
        _ => {
            return (
                StatusCode::OK,
                serde_json::json!({
                    "status": "not_configured",
                    "version": env!("CARGO_PKG_VERSION"),
                    "database": null,
                }),
            );
        }
    };

    let checked = match graph.graph_health().await {
        Ok(v) => activity.activity_health().await.map(|_| v),
        Err(e) => Err(e),
    };

    match checked {
        Ok(database) => (
            StatusCode::OK,
            serde_json::json!({
                "status": "healthy",
                "version": env!("CARGO_PKG_VERSION"),
                "database": database,
            }),
        ),
        Err(e) => {
            tracing::error!(error = %e, "Store health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                serde_json::json!({
                    "status": "unhealthy",
                    "version": env!("CARGO_PKG_VERSION"),
                    "database": null,
                    "error": e.to_string(),
                }),
            )
        }
    }
}

/// Inner dispatch — routes a typed request and wraps the outcome in the
/// `ApiResponse` envelope with a status code.
pub async fn dispatch_inner(
    stores: &Stores,
    config: &VelocityConfig,
    request: VelocityRequest,
) -> (StatusCode, ApiResponse<serde_json::Value>) {
    let widget = request.widget();
    let is_read = request.is_read();
    let failure_data = request.failure_data();

    match crate::router::handle_request(request, stores, config).await {
        Ok(data) => (StatusCode::OK, ApiResponse::ok(data)),
        Err(e) => {
            let status = status_for(&e);
            match e.downcast_ref::<VelocityError>() {
                Some(VelocityError::NotConfigured(_)) => {
                    tracing::warn!(widget, "Request rejected: {}", e)
                }
                Some(err) if err.is_query_failure() => {
                    tracing::error!(widget, error = %err, "Store query failed")
                }
                _ if status.is_server_error() => {
                    tracing::error!(widget, error = %e, "Request failed")
                }
                _ => tracing::debug!(widget, error = %e, "Request refused"),
            }
            (status, ApiResponse::failure(failure_data, failure_message(widget, is_read, &e)))
        }
    }
}

// ============================================================================
// Axum handler wrappers (thin — delegate to inner functions)
// ============================================================================

pub async fn root_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(root_inner()))
}

pub async fn health_handler(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    let (status, body) = health_inner(&state.stores).await;
    (status, Json(body))
}

pub async fn version_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(version_inner()))
}

async fn respond(state: &HttpState, request: VelocityRequest) -> (StatusCode, Json<ApiResponse<serde_json::Value>>) {
    let (status, body) = dispatch_inner(&state.stores, &state.config, request).await;
    (status, Json(body))
}

pub async fn lvi_handler(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    respond(&state, VelocityRequest::Lvi).await
}

pub async fn lvi_trend_handler(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    respond(&state, VelocityRequest::LviTrend).await
}

pub async fn knowledge_graph_handler(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    respond(&state, VelocityRequest::KnowledgeGraph).await
}

pub async fn skill_confidence_handler(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    respond(&state, VelocityRequest::SkillConfidence).await
}

/// Dispatch a JSON body, or answer 400 in the envelope when it does not parse.
async fn respond_json<T>(
    state: &HttpState,
    body: Result<Json<T>, JsonRejection>,
    request: impl FnOnce(T) -> VelocityRequest,
) -> (StatusCode, Json<ApiResponse<serde_json::Value>>) {
    match body {
        Ok(Json(req)) => respond(state, request(req)).await,
        Err(rejection) => {
            let err = VelocityError::InvalidRequest(rejection.body_text());
            tracing::debug!(error = %err, "Rejected request body");
            (StatusCode::BAD_REQUEST, Json(ApiResponse::err(err.to_string())))
        }
    }
}

pub async fn add_skill_handler(
    State(state): State<Arc<HttpState>>,
    body: Result<Json<AddSkillRequest>, JsonRejection>,
) -> impl IntoResponse {
    respond_json(&state, body, VelocityRequest::AddSkill).await
}

pub async fn update_skill_status_handler(
    State(state): State<Arc<HttpState>>,
    body: Result<Json<UpdateSkillStatusRequest>, JsonRejection>,
) -> impl IntoResponse {
    respond_json(&state, body, VelocityRequest::UpdateSkillStatus).await
}

pub async fn delete_skill_handler(
    State(state): State<Arc<HttpState>>,
    Path(skill_id): Path<String>,
) -> impl IntoResponse {
    respond(&state, VelocityRequest::DeleteSkill { skill_id }).await
}

pub async fn generate_skills_handler(
    State(state): State<Arc<HttpState>>,
    body: Result<Json<GenerateSkillsRequest>, JsonRejection>,
) -> impl IntoResponse {
    respond_json(&state, body, VelocityRequest::GenerateSkills).await
}

pub async fn learning_path_handler(
    State(state): State<Arc<HttpState>>,
    body: Result<Json<GeneratePathRequest>, JsonRejection>,
) -> impl IntoResponse {
    respond_json(&state, body, VelocityRequest::GenerateLearningPath).await
}

pub async fn enrich_skill_handler(
    State(state): State<Arc<HttpState>>,
    body: Result<Json<EnrichSkillRequest>, JsonRejection>,
) -> impl IntoResponse {
    respond_json(&state, body, VelocityRequest::EnrichSkill).await
}

pub async fn graph_rag_status_handler(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    respond(&state, VelocityRequest::GraphRagStatus).await
}

// ============================================================================
// Helpers
// ============================================================================

/// HTTP status for a failed request.
pub fn status_for(err: &anyhow::Error) -> StatusCode {
    match err.downcast_ref::<VelocityError>() {
        Some(VelocityError::NotFound(_)) => StatusCode::NOT_FOUND,
        Some(VelocityError::Conflict(_)) => StatusCode::CONFLICT,
        Some(VelocityError::InvalidRequest(_)) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Caller-facing error text. Configuration and caller errors pass through
/// verbatim; everything else is prefixed with the failed operation.
pub fn failure_message(widget: &str, is_read: bool, err: &anyhow::Error) -> String {
    match err.downcast_ref::<VelocityError>() {
        Some(
            VelocityError::NotConfigured(_)
            | VelocityError::NotFound(_)
            | VelocityError::Conflict(_)
            | VelocityError::InvalidRequest(_),
        ) => err.to_string(),
        _ if is_read => format!("Failed to fetch {}: {}", widget, err),
        _ => format!("Failed to {}: {}", widget, err),
    }
}

// ============================================================================
// Unit Tests — call inner functions directly
// ============================================================================
