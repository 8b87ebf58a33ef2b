use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::multipart::MultipartRejection,
    extract::rejection::QueryRejection,
    extract::{DefaultBodyLimit, Multipart, Query, State},
    http::Method,
    routing::{delete, get, post},
    Json, Router,
};
use chrono::Utc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::{RagError, Result};
use crate::indexer::walker::is_pdf;
use crate::models::{AnswerResponse, ContextResponse, IngestReport, QueryParams, ResetResponse};
use crate::rag::RAGEngine;

const MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

pub fn router(engine: Arc<RAGEngine>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/upload-pdf", post(upload_pdf_handler))
        .route("/reset-pdf-embeddings", delete(reset_handler))
        .route("/query-agent", get(query_agent_handler))
        .route("/get-rag", get(get_rag_handler))
        .route("/api/health", get(health_check))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(engine)
}

async fn upload_pdf_handler(
    State(engine): State<Arc<RAGEngine>>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<IngestReport>> {
    let mut multipart = multipart
        .map_err(|e| RagError::InvalidRequest(format!("Malformed upload: {}", e.body_text())))?;
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| RagError::InvalidRequest(format!("Malformed multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| RagError::InvalidRequest(format!("Failed to read upload: {}", e)))?;
        upload = Some((filename, data));
        break;
    }

    let (filename, data) =
        upload.ok_or_else(|| RagError::InvalidRequest("No file part in the request".to_string()))?;
    if filename.is_empty() {
        return Err(RagError::InvalidRequest("No selected file".to_string()));
    }
    if !is_pdf(Path::new(&filename)) {
        return Err(RagError::InvalidRequest(
            "Invalid file type. Only PDF is allowed".to_string(),
        ));
    }

    let report = engine.ingest(&data, &filename).await?;
    Ok(Json(report))
}

async fn reset_handler(State(engine): State<Arc<RAGEngine>>) -> Result<Json<ResetResponse>> {
    engine.reset().await?;
    Ok(Json(ResetResponse {
        success: "deleted all the embedding collection successfully".to_string(),
    }))
}

fn require_query(
    params: std::result::Result<Query<QueryParams>, QueryRejection>,
) -> Result<String> {
    let Query(params) = params
        .map_err(|e| RagError::InvalidRequest(format!("Bad query string: {}", e.body_text())))?;
    let query = params.query.trim();
    if query.is_empty() {
        return Err(RagError::InvalidRequest("query must not be empty".to_string()));
    }
    Ok(query.to_string())
}

async fn query_agent_handler(
    State(engine): State<Arc<RAGEngine>>,
    params: std::result::Result<Query<QueryParams>, QueryRejection>,
) -> Result<Json<AnswerResponse>> {
    let answer = engine.answer(&require_query(params)?).await?;
    Ok(Json(AnswerResponse { answer }))
}

async fn get_rag_handler(
    State(engine): State<Arc<RAGEngine>>,
    params: std::result::Result<Query<QueryParams>, QueryRejection>,
) -> Result<Json<ContextResponse>> {
    let context = engine.retrieve_context(&require_query(params)?).await?;
    Ok(Json(ContextResponse { context }))
}

async fn health_check(State(engine): State<Arc<RAGEngine>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
        "store": engine.store_backend(),
    }))
}
