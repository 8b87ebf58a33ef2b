use std::sync::Arc;

use crate::error::Result;
use crate::models::{CollectionHandle, QueryResult};

use super::embeddings::Embedder;
use super::vector_store::VectorStore;

pub const CONTEXT_SEPARATOR: &str = "\n\n";

/// Embeds a query, looks up its nearest chunks and keeps the relevant ones.
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    handle: CollectionHandle,
    k: usize,
    distance_threshold: f32,
}

impl Retriever {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        handle: CollectionHandle,
        k: usize,
        distance_threshold: f32,
    ) -> Self {
        Self {
            embedder,
            store,
            handle,
            k,
            distance_threshold,
        }
    }

    /// Context string using the configured `k` and threshold.
    pub async fn retrieve(&self, query: &str) -> Result<String> {
        self.retrieve_with(query, self.k, self.distance_threshold).await
    }

    /// Surviving chunk texts joined by a blank line, nearest first.
    ///
    /// Returns an empty string when nothing is close enough.
    pub async fn retrieve_with(
        &self,
        query: &str,
        k: usize,
        distance_threshold: f32,
    ) -> Result<String> {
        let results = self.retrieve_results(query, k, distance_threshold).await?;
        let texts: Vec<&str> = results.iter().map(|r| r.chunk.text.as_str()).collect();
        Ok(texts.join(CONTEXT_SEPARATOR))
    }

    /// Nearest results with `distance < distance_threshold`, ascending by distance.
    pub async fn retrieve_results(
        &self,
        query: &str,
        k: usize,
        distance_threshold: f32,
    ) -> Result<Vec<QueryResult>> {
        let query_vector = self.embedder.embed(query).await?;
        let results = self.store.query(&self.handle, &query_vector, k).await?;
        let fetched = results.len();

        let relevant: Vec<QueryResult> = results
            .into_iter()
            .filter(|r| r.distance < distance_threshold)
            .collect();

        tracing::info!(
            "Retrieved {} of {} chunks under distance {}",
            relevant.len(),
            fetched,
            distance_threshold
        );
        Ok(relevant)
    }
}
