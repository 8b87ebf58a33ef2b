use std::path::Path;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

const DEFAULT_CONFIG_FILE: &str = "rag.toml";
const ENV_PREFIX: &str = "RAG";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    pub server: ServerConfig,
    pub ollama: OllamaConfig,
    pub pipeline: PipelineConfig,
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:5000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    pub base_url: String,
    /// Transport timeout applied to every embedding and generation call.
    pub timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            timeout_secs: 120,
        }
    }
}

/// Tunables shared by ingestion and retrieval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Maximum fragment length in characters.
    pub chunk_max_size: usize,
    /// Number of nearest neighbours fetched per query.
    pub k: usize,
    /// Cosine distance cutoff; results at or above it are dropped.
    pub distance_threshold: f32,
    pub embed_model: String,
    pub gen_model: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chunk_max_size: 1000,
            k: 3,
            distance_threshold: 0.5,
            embed_model: "nomic-embed-text".to_string(),
            gen_model: "qwen2.5-coder:latest".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    Qdrant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub collection: String,
    pub qdrant_url: String,
    /// Vector size the Qdrant collection is created with.
    pub dimensions: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            collection: "pdf_embeddings".to_string(),
            qdrant_url: "http://localhost:6334".to_string(),
            dimensions: 768,
        }
    }
}

impl Settings {
    /// Defaults, then `rag.toml` (or `$RAG_CONFIG`), then `RAG__*` environment variables.
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();
        let path = std::env::var("RAG_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::build(Some(Path::new(&path)), true)
    }

    /// Defaults overlaid with a single file; the environment is ignored.
    pub fn load_from(path: &Path) -> Result<Self> {
        Self::build(Some(path), false)
    }

    fn build(path: Option<&Path>, with_env: bool) -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Settings::default())?);

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(false));
        }
        if with_env {
            builder = builder.add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            );
        }

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        self.pipeline.validate()?;
        if self.store.collection.trim().is_empty() {
            return Err(RagError::Config("store.collection must not be empty".to_string()));
        }
        if self.store.backend == StoreBackend::Qdrant && self.store.dimensions == 0 {
            return Err(RagError::Config(
                "store.dimensions must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.chunk_max_size == 0 {
            return Err(RagError::Config(
                "pipeline.chunk_max_size must be greater than zero".to_string(),
            ));
        }
        if self.k == 0 {
            return Err(RagError::Config("pipeline.k must be greater than zero".to_string()));
        }
        if !(self.distance_threshold >= 0.0) {
            return Err(RagError::Config(format!(
                "pipeline.distance_threshold must be non-negative, got {}",
                self.distance_threshold
            )));
        }
        if self.embed_model.trim().is_empty() || self.gen_model.trim().is_empty() {
            return Err(RagError::Config("model names must not be empty".to_string()));
        }
        Ok(())
    }
}
