//! HTTP API server for integration with other systems.
//!
//! Exposes the ask/ingest/search flows as REST endpoints. Query outcomes
//! map onto status codes: answers and empty retrievals are 200, a bad
//! reference is 400, a missing transcript 404, and anything else 500.

use crate::cli::Output;
use crate::config::Settings;
use crate::error::HearsayError;
use crate::orchestrator::Orchestrator;
use crate::qa::QueryOutcome;
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Shared application state.
struct AppState {
    orchestrator: Orchestrator,
}

/// Run the HTTP API server.
pub async fn run_serve(host: &str, port: u16, settings: Settings) -> anyhow::Result<()> {
    let orchestrator = Orchestrator::new(settings)?;

    let state = Arc::new(AppState { orchestrator });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(health))
        .route("/query", post(query))
        .route("/ingest", post(ingest))
        .route("/search", post(search))
        .route("/sources", get(list_sources))
        .layer(cors)
        .with_state(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Hearsay API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Query", "POST /query");
    Output::kv("Ingest", "POST /ingest");
    Output::kv("Search", "POST /search");
    Output::kv("Sources", "GET  /sources");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct QueryRequest {
    /// Video URL or 11-character id
    video: String,
    question: String,
}

#[derive(Serialize)]
struct QueryResponse {
    outcome: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

#[derive(Deserialize)]
struct IngestRequest {
    video: String,
}

#[derive(Serialize)]
struct IngestResponse {
    source_id: String,
    chunks: usize,
    skipped: bool,
}

#[derive(Deserialize)]
struct SearchRequest {
    query: String,
    #[serde(default)]
    top_k: Option<usize>,
}

#[derive(Serialize)]
struct SearchResponse {
    results: Vec<SearchResult>,
}

#[derive(Serialize)]
struct SearchResult {
    source_id: String,
    text: String,
    start_seconds: f64,
    end_seconds: f64,
    timestamp: String,
    similarity: f32,
}

#[derive(Serialize)]
struct SourcesResponse {
    sources: Vec<SourceInfo>,
    total: usize,
}

#[derive(Serialize)]
struct SourceInfo {
    source_id: String,
    records: u32,
    duration_seconds: f64,
    indexed_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Map a query outcome onto a status code and response body.
fn query_response(outcome: QueryOutcome) -> (StatusCode, Json<QueryResponse>) {
    let status = match &outcome {
        QueryOutcome::Answer(_) | QueryOutcome::NothingFound => StatusCode::OK,
        QueryOutcome::InvalidReference => StatusCode::BAD_REQUEST,
        QueryOutcome::NoTranscript => StatusCode::NOT_FOUND,
        QueryOutcome::Failed => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let kind = outcome.kind().to_string();
    let body = match outcome {
        QueryOutcome::Answer(answer) => QueryResponse {
            outcome: kind,
            answer: Some(answer),
            detail: None,
        },
        other => QueryResponse {
            outcome: kind,
            answer: None,
            detail: Some(other.user_message().to_string()),
        },
    };

    (status, Json(body))
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn query(
    State(state): State<Arc<AppState>>,
    Json(req): Json<QueryRequest>,
) -> impl IntoResponse {
    let outcome = state.orchestrator.answer(&req.video, &req.question).await;
    query_response(outcome)
}

async fn ingest(
    State(state): State<Arc<AppState>>,
    Json(req): Json<IngestRequest>,
) -> impl IntoResponse {
    match state.orchestrator.ingest(&req.video).await {
        Ok(report) => Json(IngestResponse {
            source_id: report.source_id,
            chunks: report.chunks_ingested,
            skipped: report.skipped,
        })
        .into_response(),
        Err(e) => {
            let status = match &e {
                HearsayError::InvalidReference(_) => StatusCode::BAD_REQUEST,
                HearsayError::NoTranscript(_) | HearsayError::CaptionSource(_) => {
                    StatusCode::NOT_FOUND
                }
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (status, Json(ErrorResponse { error: e.to_string() })).into_response()
        }
    }
}

async fn search(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SearchRequest>,
) -> impl IntoResponse {
    let limit = req
        .top_k
        .unwrap_or(state.orchestrator.settings().retriever.top_k as usize);

    match state.orchestrator.search(&req.query, limit).await {
        Ok(hits) => Json(SearchResponse {
            results: hits
                .into_iter()
                .map(|hit| {
                    let timestamp = hit.record.format_timestamp();
                    SearchResult {
                        source_id: hit.record.source_id,
                        text: hit.record.text,
                        start_seconds: hit.record.start,
                        end_seconds: hit.record.end,
                        timestamp,
                        similarity: hit.similarity,
                    }
                })
                .collect(),
        })
        .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse { error: e.to_string() }),
        )
            .into_response(),
    }
}

async fn list_sources(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.orchestrator.list_sources().await {
        Ok(sources) => Json(SourcesResponse {
            total: sources.len(),
            sources: sources
                .into_iter()
                .map(|s| SourceInfo {
                    source_id: s.source_id,
                    records: s.record_count,
                    duration_seconds: s.duration_seconds,
                    indexed_at: s.indexed_at,
                })
                .collect(),
        })
        .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse { error: e.to_string() }),
        )
            .into_response(),
    }
}
