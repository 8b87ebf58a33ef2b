//! PDF retrieval-augmented generation: ingest PDFs into a vector store, then
//! answer questions from the most relevant fragments.

pub mod config;
pub mod error;
pub mod indexer;
pub mod models;
pub mod rag;
pub mod server;

pub use error::{RagError, Result};
pub use rag::RAGEngine;
