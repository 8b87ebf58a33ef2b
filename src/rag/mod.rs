pub mod embeddings;
pub mod generator;
pub mod ingest;
pub mod retriever;
pub mod vector_store;

use std::sync::Arc;
use std::time::Duration;

use crate::config::{PipelineConfig, Settings, StoreBackend};
use crate::error::Result;
use crate::indexer::extractor::{PdfTextExtractor, TextExtractor};
use crate::models::{CollectionHandle, IngestReport};
use self::embeddings::{Embedder, OllamaEmbedder};
use self::generator::{Generator, OllamaGenerator};
use self::ingest::IngestionPipeline;
use self::retriever::Retriever;
use self::vector_store::{InMemoryVectorStore, QdrantVectorStore, VectorStore};

/// Wires the pipelines around one shared store and collection.
pub struct RAGEngine {
    store: Arc<dyn VectorStore>,
    handle: CollectionHandle,
    ingestion: IngestionPipeline,
    retriever: Retriever,
    generator: Arc<dyn Generator>,
}

impl RAGEngine {
    pub async fn new(
        config: &PipelineConfig,
        collection_name: &str,
        extractor: Arc<dyn TextExtractor>,
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        generator: Arc<dyn Generator>,
    ) -> Result<Self> {
        config.validate()?;
        let handle = store.ensure_collection(collection_name).await?;

        let ingestion = IngestionPipeline::new(
            extractor,
            embedder.clone(),
            store.clone(),
            handle.clone(),
            config.chunk_max_size,
        );
        let retriever = Retriever::new(
            embedder,
            store.clone(),
            handle.clone(),
            config.k,
            config.distance_threshold,
        );

        Ok(Self {
            store,
            handle,
            ingestion,
            retriever,
            generator,
        })
    }

    /// Builds the Ollama clients and the configured store backend.
    pub async fn from_settings(settings: &Settings) -> Result<Self> {
        let timeout = Duration::from_secs(settings.ollama.timeout_secs);
        let embedder = OllamaEmbedder::new(
            settings.ollama.base_url.clone(),
            settings.pipeline.embed_model.clone(),
            timeout,
        )?;
        let generator = OllamaGenerator::new(
            settings.ollama.base_url.clone(),
            settings.pipeline.gen_model.clone(),
            timeout,
        )?;
        tracing::info!(
            "Ollama at {}, embedding model {}, generation model {}",
            settings.ollama.base_url,
            embedder.model_name(),
            generator.model_name()
        );

        let store: Arc<dyn VectorStore> = match settings.store.backend {
            StoreBackend::Memory => Arc::new(InMemoryVectorStore::new()),
            StoreBackend::Qdrant => Arc::new(QdrantVectorStore::new(
                &settings.store.qdrant_url,
                settings.store.dimensions,
            )?),
        };
        tracing::info!(
            "Using {} vector store, collection {}",
            store.backend_name(),
            settings.store.collection
        );

        Self::new(
            &settings.pipeline,
            &settings.store.collection,
            Arc::new(PdfTextExtractor),
            Arc::new(embedder),
            store,
            Arc::new(generator),
        )
        .await
    }

    pub fn store_backend(&self) -> &'static str {
        self.store.backend_name()
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    pub async fn ingest(&self, document_bytes: &[u8], source_name: &str) -> Result<IngestReport> {
        self.ingestion.ingest(document_bytes, source_name).await
    }

    pub async fn reset(&self) -> Result<()> {
        self.store.clear(&self.handle).await?;
        tracing::info!("Cleared collection {}", self.handle.name());
        Ok(())
    }

    pub async fn retrieve_context(&self, query: &str) -> Result<String> {
        self.retriever.retrieve(query).await
    }

    pub async fn answer(&self, query: &str) -> Result<String> {
        let context = self.retrieve_context(query).await?;
        if context.is_empty() {
            tracing::info!("No relevant context found; answering from the bare question");
        }
        self.generator.generate(query, &context).await
    }
}
