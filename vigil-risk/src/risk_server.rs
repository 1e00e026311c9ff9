//! Risk Server — HTTP surface for the risk fusion engine.
//!
//! Endpoints:
//!   POST /analyze_suicide_risk   — analyze one text + optional history
//!   POST /update_knowledge_base  — append documents, atomic index rebuild
//!                                  (mounted only when retrieval is enabled)
//!   GET  /health                 — liveness + readiness flags
//!   GET  /stats                  — engine counters snapshot
//!   GET  /alerts                 — recent high-risk alerts
//!   GET  /                       — service banner
//!
//! All responses are JSON. CORS is permissive for local development.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::knowledge::KnowledgeDocument;
use crate::risk_engine::RiskEngine;
use crate::types::AnalysisRequest;

// ── Server State ─────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<RiskEngine>,
}

// ── Request / Response DTOs ──────────────────────────────────────────────────

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub classifier_loaded: bool,
    pub knowledge_base_size: usize,
    pub passages_indexed: usize,
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct UpdateKnowledgeResponse {
    pub message: String,
}

#[derive(Deserialize)]
pub struct UpdateKnowledgeRequest(pub Vec<KnowledgeDocument>);

// ── Router Construction ──────────────────────────────────────────────────────

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut router = Router::new()
        .route("/", get(handle_root))
        .route("/analyze_suicide_risk", post(handle_analyze))
        .route("/health", get(handle_health))
        .route("/stats", get(handle_stats))
        .route("/alerts", get(handle_alerts));

    // The knowledge-base admin route only exists where an index does.
    if state.engine.knowledge_store().is_some() {
        router = router.route("/update_knowledge_base", post(handle_update_knowledge));
    }

    router.layer(cors).with_state(state)
}

/// Server configuration.
pub struct ServerConfig {
    pub addr: SocketAddr,
}

/// Start the risk server. Long-running future — call from `#[tokio::main]`.
pub async fn serve(engine: Arc<RiskEngine>, config: ServerConfig) -> std::io::Result<()> {
    let retrieval = engine.knowledge_store().is_some();
    let state = AppState { engine };
    let app = build_router(state);

    info!(addr = %config.addr, retrieval, "Risk server starting");
    info!("  POST /analyze_suicide_risk   — analyze text for crisis risk");
    if retrieval {
        info!("  POST /update_knowledge_base  — append documents, rebuild index");
    }
    info!("  GET  /health                 — health check");
    info!("  GET  /stats                  — engine statistics");
    info!("  GET  /alerts                 — recent high-risk alerts");

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

// ── Handlers ─────────────────────────────────────────────────────────────────

async fn handle_analyze(
    State(state): State<AppState>,
    Json(request): Json<AnalysisRequest>,
) -> impl IntoResponse {
    if request.text.trim().is_empty() {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorResponse { error: "Field 'text' must be a non-empty string".into() }),
        )
            .into_response();
    }

    let assessment = state.engine.analyze(&request);
    (StatusCode::OK, Json(assessment)).into_response()
}

async fn handle_update_knowledge(
    State(state): State<AppState>,
    Json(request): Json<UpdateKnowledgeRequest>,
) -> impl IntoResponse {
    let Some(store) = state.engine.knowledge_store() else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse { error: "Knowledge retrieval is not enabled".into() }),
        )
            .into_response();
    };

    let added = store.add_documents(request.0);
    (
        StatusCode::OK,
        Json(UpdateKnowledgeResponse {
            message: format!("Knowledge base updated with {} new documents", added),
        }),
    )
        .into_response()
}

async fn handle_health(State(state): State<AppState>) -> impl IntoResponse {
    let (documents, passages) = match state.engine.knowledge_store() {
        Some(store) => (store.document_count(), store.passage_count()),
        None => (0, 0),
    };
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy",
            classifier_loaded: state.engine.classifier_loaded(),
            knowledge_base_size: documents,
            passages_indexed: passages,
            version: env!("CARGO_PKG_VERSION"),
        }),
    )
}

async fn handle_stats(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.engine.stats()))
}

async fn handle_alerts(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.engine.alerts()))
}

async fn handle_root() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "message": "Vigil crisis-risk triage API. Use /analyze_suicide_risk for analysis."
        })),
    )
}
