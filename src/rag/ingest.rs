use std::sync::Arc;

use crate::error::{RagError, Result};
use crate::indexer::chunker::split;
use crate::indexer::extractor::TextExtractor;
use crate::models::{Chunk, CollectionHandle, IngestReport};

use super::embeddings::Embedder;
use super::vector_store::VectorStore;

/// Extract → split → embed → store, one chunk at a time.
///
/// The first failing chunk aborts the document; chunks stored before it stay.
pub struct IngestionPipeline {
    extractor: Arc<dyn TextExtractor>,
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    handle: CollectionHandle,
    chunk_max_size: usize,
}

impl IngestionPipeline {
    pub fn new(
        extractor: Arc<dyn TextExtractor>,
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        handle: CollectionHandle,
        chunk_max_size: usize,
    ) -> Self {
        Self {
            extractor,
            embedder,
            store,
            handle,
            chunk_max_size,
        }
    }

    pub async fn ingest(&self, document_bytes: &[u8], source_name: &str) -> Result<IngestReport> {
        let text = self.extractor.extract(document_bytes)?;
        self.ingest_text(&text, source_name).await
    }

    pub async fn ingest_text(&self, text: &str, source_name: &str) -> Result<IngestReport> {
        if text.trim().is_empty() {
            return Err(RagError::EmptyDocument(source_name.to_string()));
        }

        let fragments = split(text, self.chunk_max_size);
        tracing::info!("Indexing {} chunks from {}", fragments.len(), source_name);

        let mut chunks_indexed = 0usize;
        for fragment in fragments {
            let embedding = self.embedder.embed(&fragment).await.map_err(|e| {
                tracing::warn!(
                    "Embedding chunk {} of {} failed: {}",
                    chunks_indexed,
                    source_name,
                    e
                );
                e
            })?;
            let chunk = Chunk::new(fragment, embedding, Some(source_name.to_string()));
            self.store.add(&self.handle, chunk).await?;
            chunks_indexed += 1;
        }

        tracing::info!("Indexed {}: {} chunks", source_name, chunks_indexed);
        Ok(IngestReport { chunks_indexed })
    }
}
