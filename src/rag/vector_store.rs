use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use qdrant_client::qdrant::{
    point_id::PointIdOptions, CreateCollectionBuilder, DeleteCollectionBuilder, Distance,
    PointStruct, ScoredPoint, SearchPointsBuilder, UpsertPointsBuilder, VectorParamsBuilder,
};
use qdrant_client::Qdrant;
use serde_json::{Map as JsonMap, Value as JsonValue};
use tokio::sync::RwLock;

use crate::error::{RagError, Result};
use crate::models::{Chunk, CollectionHandle, QueryResult};

/// Named collections of chunks searchable by cosine distance.
///
/// Every operation taking a handle treats the collection as existing; a
/// backend that lost it recreates it rather than reporting absence.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Creates the collection if needed. Idempotent.
    async fn ensure_collection(&self, name: &str) -> Result<CollectionHandle>;

    async fn add(&self, handle: &CollectionHandle, chunk: Chunk) -> Result<()>;

    /// Up to `k` nearest chunks, nearest first. Empty collection gives an empty vec.
    async fn query(
        &self,
        handle: &CollectionHandle,
        vector: &[f32],
        k: usize,
    ) -> Result<Vec<QueryResult>>;

    /// Drops every chunk but keeps the collection.
    async fn clear(&self, handle: &CollectionHandle) -> Result<()>;

    fn backend_name(&self) -> &'static str;
}

/// `1 - cosine similarity`, clamped to `[0, 2]`. Zero vectors sit at distance 1.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    (1.0 - dot / (norm_a * norm_b)).clamp(0.0, 2.0)
}

#[derive(Debug, Default)]
struct MemoryCollection {
    dimensions: Option<usize>,
    chunks: HashMap<String, Chunk>,
}

/// Exact linear-scan store kept in process memory.
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    collections: RwLock<HashMap<String, MemoryCollection>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self, handle: &CollectionHandle) -> usize {
        self.collections
            .read()
            .await
            .get(handle.name())
            .map(|c| c.chunks.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn ensure_collection(&self, name: &str) -> Result<CollectionHandle> {
        let mut collections = self.collections.write().await;
        collections.entry(name.to_string()).or_default();
        Ok(CollectionHandle::new(name))
    }

    async fn add(&self, handle: &CollectionHandle, chunk: Chunk) -> Result<()> {
        let mut collections = self.collections.write().await;
        let collection = collections.entry(handle.name().to_string()).or_default();

        let actual = chunk.embedding.len();
        match collection.dimensions {
            Some(expected) if expected != actual => {
                return Err(RagError::DimensionMismatch { expected, actual });
            }
            _ => {}
        }
        if collection.chunks.contains_key(&chunk.id) {
            return Err(RagError::DuplicateId(chunk.id));
        }

        collection.dimensions = Some(actual);
        collection.chunks.insert(chunk.id.clone(), chunk);
        Ok(())
    }

    async fn query(
        &self,
        handle: &CollectionHandle,
        vector: &[f32],
        k: usize,
    ) -> Result<Vec<QueryResult>> {
        let collections = self.collections.read().await;
        let Some(collection) = collections.get(handle.name()) else {
            return Ok(Vec::new());
        };
        if let Some(expected) = collection.dimensions {
            if expected != vector.len() {
                return Err(RagError::DimensionMismatch {
                    expected,
                    actual: vector.len(),
                });
            }
        }

        let mut results: Vec<QueryResult> = collection
            .chunks
            .values()
            .map(|chunk| QueryResult {
                distance: cosine_distance(&chunk.embedding, vector),
                chunk: chunk.clone(),
            })
            .collect();

        results.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.chunk.id.cmp(&b.chunk.id))
        });
        results.truncate(k);
        Ok(results)
    }

    async fn clear(&self, handle: &CollectionHandle) -> Result<()> {
        let mut collections = self.collections.write().await;
        collections.insert(handle.name().to_string(), MemoryCollection::default());
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

fn storage_error(e: impl std::fmt::Display) -> RagError {
    RagError::Storage(e.to_string())
}

/// Converts a cosine-scored Qdrant hit into a distance-ranked result.
///
/// Points without a `text` payload are skipped.
fn scored_point_to_result(point: ScoredPoint) -> Option<QueryResult> {
    let Some(text) = point.payload.get("text").and_then(|v| v.as_str()) else {
        tracing::warn!("Skipping Qdrant point without text payload");
        return None;
    };
    let id = match point.id.and_then(|id| id.point_id_options) {
        Some(PointIdOptions::Uuid(uuid)) => uuid,
        Some(PointIdOptions::Num(num)) => num.to_string(),
        None => String::new(),
    };
    let source_document = point
        .payload
        .get("source_document")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string());

    Some(QueryResult {
        chunk: Chunk {
            id,
            text: text.to_string(),
            embedding: Vec::new(),
            source_document,
        },
        distance: (1.0 - point.score).clamp(0.0, 2.0),
    })
}

/// Qdrant-backed store. Collections use the cosine metric and a fixed vector size.
///
/// Qdrant upserts by id, so an id collision overwrites instead of raising
/// `DuplicateId`; UUID v4 ids make that unreachable in practice. Hits are
/// returned without their embedding.
pub struct QdrantVectorStore {
    client: Qdrant,
    dimensions: usize,
}

impl QdrantVectorStore {
    pub fn new(url: &str, dimensions: usize) -> Result<Self> {
        tracing::info!("Building Qdrant client for URL: {}", url);
        let client = Qdrant::from_url(url).build().map_err(|e| {
            tracing::error!("Qdrant client build failed: {:?}", e);
            storage_error(format!("Qdrant client build failed: {}", e))
        })?;
        Ok(Self { client, dimensions })
    }

    async fn create_collection(&self, name: &str) -> Result<()> {
        self.client
            .create_collection(
                CreateCollectionBuilder::new(name).vectors_config(VectorParamsBuilder::new(
                    self.dimensions as u64,
                    Distance::Cosine,
                )),
            )
            .await
            .map_err(storage_error)?;
        Ok(())
    }
}

#[async_trait]
impl VectorStore for QdrantVectorStore {
    async fn ensure_collection(&self, name: &str) -> Result<CollectionHandle> {
        if !self.client.collection_exists(name).await.map_err(storage_error)? {
            tracing::info!("Creating Qdrant collection {}", name);
            self.create_collection(name).await?;
        }
        Ok(CollectionHandle::new(name))
    }

    async fn add(&self, handle: &CollectionHandle, chunk: Chunk) -> Result<()> {
        if chunk.embedding.len() != self.dimensions {
            return Err(RagError::DimensionMismatch {
                expected: self.dimensions,
                actual: chunk.embedding.len(),
            });
        }

        let mut payload_map = JsonMap::new();
        payload_map.insert("text".to_string(), JsonValue::String(chunk.text));
        if let Some(source) = chunk.source_document {
            payload_map.insert("source_document".to_string(), JsonValue::String(source));
        }
        let point = PointStruct::new(chunk.id, chunk.embedding, payload_map);

        self.client
            .upsert_points(UpsertPointsBuilder::new(handle.name(), vec![point]).wait(true))
            .await
            .map_err(storage_error)?;
        Ok(())
    }

    async fn query(
        &self,
        handle: &CollectionHandle,
        vector: &[f32],
        k: usize,
    ) -> Result<Vec<QueryResult>> {
        if k == 0 {
            return Ok(Vec::new());
        }
        if vector.len() != self.dimensions {
            return Err(RagError::DimensionMismatch {
                expected: self.dimensions,
                actual: vector.len(),
            });
        }

        let search_result = self
            .client
            .search_points(
                SearchPointsBuilder::new(handle.name(), vector.to_vec(), k as u64)
                    .with_payload(true),
            )
            .await
            .map_err(storage_error)?;

        let results = search_result
            .result
            .into_iter()
            .filter_map(scored_point_to_result)
            .collect();
        Ok(results)
    }

    async fn clear(&self, handle: &CollectionHandle) -> Result<()> {
        if self.client.collection_exists(handle.name()).await.map_err(storage_error)? {
            self.client
                .delete_collection(DeleteCollectionBuilder::new(handle.name()))
                .await
                .map_err(storage_error)?;
        }
        self.create_collection(handle.name()).await
    }

    fn backend_name(&self) -> &'static str {
        "qdrant"
    }
}
