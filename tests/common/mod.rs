#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;

use pdf_rag::config::PipelineConfig;
use pdf_rag::indexer::extractor::PlainTextExtractor;
use pdf_rag::rag::embeddings::Embedder;
use pdf_rag::rag::generator::Generator;
use pdf_rag::rag::vector_store::InMemoryVectorStore;
use pdf_rag::{RAGEngine, RagError, Result};

pub const COLLECTION: &str = "pdf_embeddings";

/// Letter-frequency vectors: texts sharing letters land close together.
pub struct LetterEmbedder;

pub fn letter_vector(text: &str) -> Vec<f32> {
    let mut vector = vec![0.0; 26];
    for c in text.chars().filter(|c| c.is_ascii_alphabetic()) {
        vector[(c.to_ascii_lowercase() as u8 - b'a') as usize] += 1.0;
    }
    vector
}

#[async_trait]
impl Embedder for LetterEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(letter_vector(text))
    }

    fn model_name(&self) -> &str {
        "letters"
    }
}

/// Succeeds for the first `remaining` calls, then fails.
pub struct FlakyEmbedder {
    pub remaining: Mutex<usize>,
}

#[async_trait]
impl Embedder for FlakyEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut remaining = self.remaining.lock().unwrap();
        if *remaining == 0 {
            return Err(RagError::EmbeddingService("Ollama error: 500".to_string()));
        }
        *remaining -= 1;
        Ok(letter_vector(text))
    }

    fn model_name(&self) -> &str {
        "flaky"
    }
}

/// Echoes the question and records every context it was given.
#[derive(Default)]
pub struct RecordingGenerator {
    pub contexts: Mutex<Vec<String>>,
}

#[async_trait]
impl Generator for RecordingGenerator {
    async fn generate(&self, query: &str, context: &str) -> Result<String> {
        self.contexts.lock().unwrap().push(context.to_string());
        Ok(format!("answer to: {}", query))
    }
}

pub struct TestEngine {
    pub engine: RAGEngine,
    pub store: Arc<InMemoryVectorStore>,
    pub generator: Arc<RecordingGenerator>,
}

pub async fn engine_with(config: PipelineConfig, embedder: Arc<dyn Embedder>) -> TestEngine {
    let store = Arc::new(InMemoryVectorStore::new());
    let generator = Arc::new(RecordingGenerator::default());
    let engine = RAGEngine::new(
        &config,
        COLLECTION,
        Arc::new(PlainTextExtractor),
        embedder,
        store.clone(),
        generator.clone(),
    )
    .await
    .unwrap();
    TestEngine {
        engine,
        store,
        generator,
    }
}

pub async fn letter_engine(chunk_max_size: usize, distance_threshold: f32) -> TestEngine {
    let config = PipelineConfig {
        chunk_max_size,
        distance_threshold,
        ..PipelineConfig::default()
    };
    engine_with(config, Arc::new(LetterEmbedder)).await
}

/// Serves `app` on an ephemeral local port and returns its base URL.
pub async fn spawn_stub(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}
