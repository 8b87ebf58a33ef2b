use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

/// Failures surfaced by the ingestion, retrieval and generation pipelines.
#[derive(Error, Debug)]
pub enum RagError {
    #[error("No text extracted from document '{0}'")]
    EmptyDocument(String),

    #[error("Text extraction failed: {0}")]
    TextExtraction(String),

    #[error("Embedding service error: {0}")]
    EmbeddingService(String),

    #[error("Generation service error: {0}")]
    GenerationService(String),

    #[error("Vector store error: {0}")]
    Storage(String),

    #[error("Duplicate chunk id '{0}'")]
    DuplicateId(String),

    #[error("Embedding dimension mismatch: collection uses {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, RagError>;

impl RagError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RagError::EmptyDocument(_) | RagError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            RagError::DuplicateId(_) => StatusCode::CONFLICT,
            RagError::EmbeddingService(_) | RagError::GenerationService(_) => {
                StatusCode::BAD_GATEWAY
            }
            RagError::TextExtraction(_)
            | RagError::Storage(_)
            | RagError::DimensionMismatch { .. }
            | RagError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<config::ConfigError> for RagError {
    fn from(e: config::ConfigError) -> Self {
        RagError::Config(e.to_string())
    }
}

impl IntoResponse for RagError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("{}", self);
        } else {
            tracing::warn!("{}", self);
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}
