//! HTTP integration tests for the Velocity REST API
//!
//! Most tests drive the full axum router with `oneshot` against the in-memory
//! demo store. The Postgres tests need `DATABASE_URL` pointing at a database
//! loaded with `sql/schema.sql` and skip otherwise.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::Utc;
use serde_json::{json, Value};
use tower::ServiceExt;
use velocity_core::store::{MemoryStore, PgStore, Stores};
use velocity_core::VelocityConfig;
use velocity_server::http::{build_router, HttpState};

fn demo_state() -> Arc<HttpState> {
    Arc::new(HttpState {
        stores: Stores::shared(Arc::new(MemoryStore::demo(Utc::now()))),
        config: VelocityConfig::default(),
    })
}

fn unconfigured_state() -> Arc<HttpState> {
    Arc::new(HttpState {
        stores: Stores::unconfigured(),
        config: VelocityConfig::default(),
    })
}

/// Postgres-backed state — returns None if the DB is unavailable
async fn pg_state() -> Option<Arc<HttpState>> {
    let url = std::env::var("DATABASE_URL").ok()?;
    let pool = sqlx::PgPool::connect(&url).await.ok()?;
    let mut config = VelocityConfig::default();
    config.service.user_id = "http-integration-user".to_string();
    Some(Arc::new(HttpState {
        stores: Stores::shared(Arc::new(PgStore::new(pool))),
        config,
    }))
}

async fn send(state: Arc<HttpState>, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    send_raw(state, method, uri, body.map(|b| b.to_string())).await
}

async fn send_raw(state: Arc<HttpState>, method: &str, uri: &str, body: Option<String>) -> (StatusCode, Value) {
    let app = build_router(state);

    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
        Some(b) => builder
            .header("content-type", "application/json")
            .body(Body::from(b))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

// ===========================================================================
// TEST 1: GET / — liveness message
// ===========================================================================
#[tokio::test]
async fn test_root_endpoint() {
    let (status, body) = send(demo_state(), "GET", "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Velocity API is running");
}

// ===========================================================================
// TEST 2: GET /version — returns version and protocol
// ===========================================================================
#[tokio::test]
async fn test_version_endpoint_integration() {
    let (status, body) = send(demo_state(), "GET", "/version", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["version"].is_string());
    assert_eq!(body["protocol"], "velocity/1");
}

// ===========================================================================
// TEST 3: GET /api/lvi — LVIData inside the envelope
// ===========================================================================
#[tokio::test]
async fn test_lvi_endpoint() {
    let (status, body) = send(demo_state(), "GET", "/api/lvi", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(body["error"].is_null());

    let data = &body["data"];
    let score = data["score"].as_i64().unwrap();
    assert!((0..=100).contains(&score));
    assert!(data["conceptsMastered"].as_u64().unwrap() > 0);
    assert_eq!(data["scalingFactor"], 10);
    assert_eq!(data["weekStart"].as_str().unwrap().len(), 10);
    assert_eq!(data["weekEnd"].as_str().unwrap().len(), 10);
}

// ===========================================================================
// TEST 4: GET /api/lvi-trend — chronological snapshots, accelerating
// ===========================================================================
#[tokio::test]
async fn test_lvi_trend_endpoint() {
    let (status, body) = send(demo_state(), "GET", "/api/lvi-trend", None).await;
    assert_eq!(status, StatusCode::OK);

    let data = &body["data"];
    assert_eq!(data["trend"], "accelerating");
    assert!(data["percentChange"].as_f64().unwrap() > 0.0);

    let snapshots = data["snapshots"].as_array().unwrap();
    assert_eq!(snapshots.len(), 12);
    assert_eq!(snapshots[0]["score"], 52);
    assert_eq!(snapshots[11]["score"], 81);
    assert!(snapshots[0]["weekNumber"].is_number());
    assert!(snapshots[0]["createdAt"].is_string());
}

// ===========================================================================
// TEST 5: GET /api/knowledge-graph — nodes, links, suggestions
// ===========================================================================
#[tokio::test]
async fn test_knowledge_graph_endpoint() {
    let (status, body) = send(demo_state(), "GET", "/api/knowledge-graph", None).await;
    assert_eq!(status, StatusCode::OK);

    let data = &body["data"];
    assert_eq!(data["nodes"].as_array().unwrap().len(), 49);
    assert_eq!(data["links"].as_array().unwrap().len(), 80);

    let link = &data["links"][0];
    assert!(link["source"].is_string());
    assert!(link["type"] == "PREREQUISITE_OF" || link["type"] == "RELATES_TO");

    let suggestions = data["suggestedNextSkills"].as_array().unwrap();
    assert!(suggestions.len() <= 5);
    let scores: Vec<i64> = suggestions
        .iter()
        .map(|s| s["readinessScore"].as_i64().unwrap())
        .collect();
    assert!(scores.windows(2).all(|w| w[0] >= w[1]));
}

// ===========================================================================
// TEST 6: GET /api/skill-confidence — top six radar points
// ===========================================================================
#[tokio::test]
async fn test_skill_confidence_endpoint() {
    let (status, body) = send(demo_state(), "GET", "/api/skill-confidence", None).await;
    assert_eq!(status, StatusCode::OK);

    let points = body["data"].as_array().unwrap();
    assert_eq!(points.len(), 6);
    assert_eq!(points[0], json!({"skill": "HTML5", "confidence": 95, "fullMark": 100}));
}

// ===========================================================================
// TEST 7: unconfigured stores — every data endpoint fails with 500
// ===========================================================================
#[tokio::test]
async fn test_not_configured_endpoints() {
    let (status, body) = send(unconfigured_state(), "GET", "/api/lvi", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Activity store not configured");
    assert!(body["data"].is_null());

    let (status, body) = send(unconfigured_state(), "GET", "/api/knowledge-graph", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Graph store not configured");
    assert_eq!(body["data"]["nodes"], json!([]));
    assert_eq!(body["data"]["links"], json!([]));

    let (status, body) = send(unconfigured_state(), "GET", "/api/skill-confidence", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["data"], json!([]));

    let (status, body) = send(unconfigured_state(), "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "not_configured");
}

// ===========================================================================
// TEST 8: skill management round trip through the router
// ===========================================================================
#[tokio::test]
async fn test_skill_management_flow() {
    let state = demo_state();

    let (status, body) = send(
        state.clone(),
        "POST",
        "/api/skills/add-skill",
        Some(json!({
            "skill_name": "Rust",
            "category": "backend",
            "learned": true,
            "confidence": 99,
            "prerequisites": ["Python"],
            "related": ["WebSockets"]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "add-skill failed: {:?}", body);
    assert_eq!(body["data"]["skill_id"], "rust");
    assert_eq!(body["data"]["relationships_created"], json!({"relates_to": 1, "prerequisites": 1}));

    // new learned skill outranks HTML5 on the radar
    let (_, radar) = send(state.clone(), "GET", "/api/skill-confidence", None).await;
    assert_eq!(radar["data"][0]["skill"], "Rust");

    let (status, body) = send(
        state.clone(),
        "POST",
        "/api/skills/add-skill",
        Some(json!({"skill_name": "Rust", "learned": false})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Skill 'Rust' already exists");

    let (status, body) = send(
        state.clone(),
        "POST",
        "/api/skills/update-skill-status",
        Some(json!({"skill_id": "rust", "learned": false})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["message"], "Skill marked as not learned");

    let (status, body) = send(state.clone(), "DELETE", "/api/skills/delete-skill/rust", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["message"], "Skill deleted successfully");

    let (status, body) = send(state, "DELETE", "/api/skills/delete-skill/rust", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Skill 'rust' not found");
}

// ===========================================================================
// TEST 9: unparseable bodies get a 400 inside the envelope
// ===========================================================================
#[tokio::test]
async fn test_invalid_bodies_are_bad_requests() {
    let state = demo_state();

    let (status, body) = send(
        state.clone(),
        "POST",
        "/api/skills/add-skill",
        Some(json!({"learned": true})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["data"].is_null());
    let error = body["error"].as_str().unwrap_or_default();
    assert!(error.starts_with("Invalid request: "), "unexpected error: {}", error);
    assert!(error.contains("skill_name"), "unexpected error: {}", error);

    let (status, body) = send_raw(
        state.clone(),
        "POST",
        "/api/skills/update-skill-status",
        Some("{\"skill_id\": \"svelte\", ".to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"].is_string());

    let (status, body) = send(
        state,
        "POST",
        "/api/graph-rag/generate-learning-path",
        Some(json!({"target": "nextjs"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

// ===========================================================================
// TEST 10: a name already in the graph conflicts even under another id
// ===========================================================================
#[tokio::test]
async fn test_add_existing_name_conflicts() {
    let state = demo_state();

    let (status, body) = send(
        state.clone(),
        "POST",
        "/api/skills/add-skill",
        Some(json!({"skill_name": "Google Cloud", "category": "devops"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Skill 'Google Cloud' already exists");

    let (_, graph) = send(state, "GET", "/api/knowledge-graph", None).await;
    let nodes = graph["data"]["nodes"].as_array().cloned().unwrap_or_default();
    assert_eq!(nodes.len(), 49);
    assert_eq!(nodes.iter().filter(|n| n["name"] == "Google Cloud").count(), 1);
}

// ===========================================================================
// TEST 11: GraphRAG status, learning path and enrichment (offline advisor)
// ===========================================================================
#[tokio::test]
async fn test_graph_rag_reads() {
    let state = demo_state();

    let (status, body) = send(state.clone(), "GET", "/api/graph-rag/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["llm_configured"], false);
    assert_eq!(body["data"]["graph_store_configured"], true);
    assert_eq!(body["data"]["ready"], false);

    let (status, body) = send(
        state.clone(),
        "POST",
        "/api/graph-rag/generate-learning-path",
        Some(json!({"target_skill_id": "nextjs", "user_id": "user-2"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "learning path failed: {:?}", body);
    assert_eq!(body["data"]["skills"], json!(["html", "css", "javascript", "react", "nextjs"]));
    assert_eq!(body["data"]["path_id"], "path-to-nextjs");

    let (status, body) = send(
        state.clone(),
        "POST",
        "/api/graph-rag/generate-learning-path",
        Some(json!({"target_skill_id": "cobol"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Skill 'cobol' not found");

    let (status, body) = send(
        state,
        "POST",
        "/api/graph-rag/enrich-skill",
        Some(json!({"skill_id": "docker"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Docker");
    assert!(body["data"]["resources"].is_array());
}

// ===========================================================================
// TEST 12: generate-skills replaces the graph with the starter set offline
// ===========================================================================
#[tokio::test]
async fn test_graph_rag_generate_skills() {
    let state = demo_state();

    let (status, body) = send(
        state.clone(),
        "POST",
        "/api/graph-rag/generate-skills",
        Some(json!({"domain": "Web Development", "num_skills": 10})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "generate-skills failed: {:?}", body);
    assert_eq!(body["data"]["status"], "completed");
    assert_eq!(body["data"]["skills_count"], 2);
    assert_eq!(body["data"]["relationships_count"], 1);

    let (_, graph) = send(state, "GET", "/api/knowledge-graph", None).await;
    assert_eq!(graph["data"]["nodes"].as_array().map(Vec::len), Some(2));
    assert_eq!(graph["data"]["links"].as_array().map(Vec::len), Some(1));
}

// ===========================================================================
// TEST 13: Postgres — health and an empty user's dashboard
// ===========================================================================
#[tokio::test]
async fn test_postgres_dashboard() {
    let state = match pg_state().await {
        Some(s) => s,
        None => {
            eprintln!("Skipping test_postgres_dashboard: DB unavailable");
            return;
        }
    };

    let (status, body) = send(state.clone(), "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = send(state.clone(), "GET", "/api/lvi-trend", None).await;
    assert_eq!(status, StatusCode::OK, "lvi-trend failed: {:?}", body);
    assert!(body["data"]["snapshots"].is_array());

    let (status, body) = send(state, "GET", "/api/knowledge-graph", None).await;
    assert_eq!(status, StatusCode::OK, "knowledge-graph failed: {:?}", body);
    assert!(body["data"]["nodes"].is_array());
}
