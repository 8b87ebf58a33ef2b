use serde::{Deserialize, Serialize};

/// A stored fragment of a document together with its embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub text: String,
    pub embedding: Vec<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_document: Option<String>,
}

impl Chunk {
    pub fn new(
        text: impl Into<String>,
        embedding: Vec<f32>,
        source_document: Option<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            text: text.into(),
            embedding,
            source_document,
        }
    }
}

/// A nearest-neighbour hit. Lower distance means more relevant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    pub chunk: Chunk,
    pub distance: f32,
}

/// Names a collection that is known to exist in the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectionHandle {
    name: String,
}

impl CollectionHandle {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    pub chunks_indexed: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueryParams {
    pub query: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerResponse {
    pub answer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextResponse {
    pub context: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetResponse {
    pub success: String,
}
