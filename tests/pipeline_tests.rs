mod common;

use std::sync::{Arc, Mutex};

use pdf_rag::config::PipelineConfig;
use pdf_rag::models::CollectionHandle;
use pdf_rag::RagError;

use common::{engine_with, letter_engine, FlakyEmbedder, COLLECTION};

fn handle() -> CollectionHandle {
    CollectionHandle::new(COLLECTION)
}

#[tokio::test]
async fn test_ingest_splits_and_stores_each_chunk() {
    let t = letter_engine(4, 0.5).await;

    let report = t.engine.ingest(b"AAAA BBBB", "letters.pdf").await.unwrap();

    assert_eq!(report.chunks_indexed, 2);
    assert_eq!(t.store.len(&handle()).await, 2);
}

#[tokio::test]
async fn test_blank_document_is_rejected_and_nothing_stored() {
    let t = letter_engine(4, 0.5).await;

    let err = t.engine.ingest(b"  \n\t  ", "scan.pdf").await.unwrap_err();

    assert!(matches!(err, RagError::EmptyDocument(ref name) if name == "scan.pdf"));
    assert_eq!(t.store.len(&handle()).await, 0);
}

#[tokio::test]
async fn test_empty_collection_gives_empty_context_and_still_answers() {
    let t = letter_engine(100, 0.5).await;

    assert_eq!(t.engine.retrieve_context("what is in here?").await.unwrap(), "");

    let answer = t.engine.answer("what is in here?").await.unwrap();
    assert!(!answer.is_empty());
    assert_eq!(*t.generator.contexts.lock().unwrap(), vec![String::new()]);
}

#[tokio::test]
async fn test_zero_threshold_filters_everything() {
    let t = letter_engine(4, 0.0).await;
    t.engine.ingest(b"AAAA BBBB", "letters.pdf").await.unwrap();

    // an exact match still has distance 0, which is not below 0
    assert_eq!(t.engine.retrieve_context("AAAA").await.unwrap(), "");
}

#[tokio::test]
async fn test_context_keeps_only_relevant_chunks() {
    let t = letter_engine(4, 0.5).await;
    t.engine.ingest(b"AAAA BBBB", "letters.pdf").await.unwrap();

    assert_eq!(t.engine.retrieve_context("aaa").await.unwrap(), "AAAA");
}

#[tokio::test]
async fn test_context_joins_nearest_first() {
    let t = letter_engine(4, 0.5).await;
    t.engine.ingest(b"AAAB ABBB CCCC", "letters.pdf").await.unwrap();

    let context = t.engine.retrieve_context("AAAAB").await.unwrap();
    assert_eq!(context, "AAAB\n\nABBB");
}

#[tokio::test]
async fn test_retrieve_respects_k() {
    let t = letter_engine(4, 2.5).await;
    t.engine.ingest(b"AAAA AAAB AABB ABBB", "letters.pdf").await.unwrap();

    let results = t
        .engine
        .retriever()
        .retrieve_results("AAAA", 2, 2.5)
        .await
        .unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].chunk.text, "AAAA");
    assert!(results[0].distance < 1e-5);
    assert_eq!(results[0].chunk.source_document.as_deref(), Some("letters.pdf"));
}

#[tokio::test]
async fn test_answer_receives_retrieved_context() {
    let t = letter_engine(4, 0.5).await;
    t.engine.ingest(b"AAAA BBBB", "letters.pdf").await.unwrap();

    let answer = t.engine.answer("BBB").await.unwrap();

    assert_eq!(answer, "answer to: BBB");
    assert_eq!(*t.generator.contexts.lock().unwrap(), vec!["BBBB".to_string()]);
}

#[tokio::test]
async fn test_reset_twice_leaves_collection_empty() {
    let t = letter_engine(4, 2.5).await;
    t.engine.ingest(b"AAAA BBBB", "letters.pdf").await.unwrap();

    t.engine.reset().await.unwrap();
    assert_eq!(t.store.len(&handle()).await, 0);
    assert_eq!(t.engine.retrieve_context("AAAA").await.unwrap(), "");

    t.engine.reset().await.unwrap();
    assert_eq!(t.store.len(&handle()).await, 0);
}

#[tokio::test]
async fn test_embedding_failure_aborts_ingestion() {
    let config = PipelineConfig {
        chunk_max_size: 4,
        ..PipelineConfig::default()
    };
    let embedder = Arc::new(FlakyEmbedder {
        remaining: Mutex::new(1),
    });
    let t = engine_with(config, embedder).await;

    let err = t.engine.ingest(b"AAAA BBBB CCCC", "letters.pdf").await.unwrap_err();

    assert!(matches!(err, RagError::EmbeddingService(_)));
    assert_eq!(t.store.len(&handle()).await, 1);
}

#[tokio::test]
async fn test_query_embedding_failure_propagates() {
    let config = PipelineConfig::default();
    let embedder = Arc::new(FlakyEmbedder {
        remaining: Mutex::new(0),
    });
    let t = engine_with(config, embedder).await;

    let err = t.engine.answer("anything").await.unwrap_err();
    assert!(matches!(err, RagError::EmbeddingService(_)));
    assert!(t.generator.contexts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_invalid_config_is_rejected() {
    let store = Arc::new(pdf_rag::rag::vector_store::InMemoryVectorStore::new());
    let config = PipelineConfig {
        k: 0,
        ..PipelineConfig::default()
    };
    let result = pdf_rag::RAGEngine::new(
        &config,
        COLLECTION,
        Arc::new(pdf_rag::indexer::extractor::PlainTextExtractor),
        Arc::new(common::LetterEmbedder),
        store,
        Arc::new(common::RecordingGenerator::default()),
    )
    .await;
    assert!(matches!(result, Err(RagError::Config(_))));
}
