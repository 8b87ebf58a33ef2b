use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use pdf_rag::config::{Settings, StoreBackend};
use pdf_rag::indexer::walker::walk_pdfs;
use pdf_rag::rag::RAGEngine;

#[derive(Parser, Debug)]
#[command(name = "pdf-rag-ingest")]
#[command(about = "Ingest a directory of PDFs into the Qdrant-backed RAG collection")]
struct Args {
    /// Directory to recursively scan for PDFs
    #[arg(short, long)]
    dir: PathBuf,

    /// Qdrant server URL
    #[arg(long, env = "QDRANT_URL")]
    qdrant_url: Option<String>,

    /// Collection name
    #[arg(long)]
    collection: Option<String>,

    /// Maximum chunk size in characters
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Ollama base URL
    #[arg(long, env = "OLLAMA_URL")]
    ollama_url: Option<String>,

    /// Embedding model name
    #[arg(long)]
    embed_model: Option<String>,

    /// Settings file to load instead of rag.toml; RAG__ environment overrides are skipped
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Clear the collection before ingesting
    #[arg(long)]
    reset: bool,
}

impl Args {
    fn settings(&self) -> pdf_rag::Result<Settings> {
        let mut settings = match self.config {
            Some(ref path) => Settings::load_from(path)?,
            None => Settings::load()?,
        };
        self.apply(&mut settings);
        settings.validate()?;
        Ok(settings)
    }

    fn apply(&self, settings: &mut Settings) {
        settings.store.backend = StoreBackend::Qdrant;
        if let Some(ref url) = self.qdrant_url {
            settings.store.qdrant_url = url.clone();
        }
        if let Some(ref collection) = self.collection {
            settings.store.collection = collection.clone();
        }
        if let Some(size) = self.chunk_size {
            settings.pipeline.chunk_max_size = size;
        }
        if let Some(ref url) = self.ollama_url {
            settings.ollama.base_url = url.clone();
        }
        if let Some(ref model) = self.embed_model {
            settings.pipeline.embed_model = model.clone();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();
    if !args.dir.exists() {
        anyhow::bail!("Directory does not exist: {}", args.dir.display());
    }

    let settings = args.settings()?;

    println!("Connecting to Qdrant at {}...", settings.store.qdrant_url);
    let engine = RAGEngine::from_settings(&settings).await?;

    if args.reset {
        engine.reset().await?;
        println!("Cleared collection {}", settings.store.collection);
    }

    println!("Scanning directory: {}", args.dir.display());
    let files = walk_pdfs(&args.dir);
    println!("Found {} PDF files", files.len());

    if files.is_empty() {
        println!("No PDF files found. Exiting.");
        return Ok(());
    }

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
            )?
            .progress_chars("#>-"),
    );

    let mut success_count = 0usize;
    let mut total_chunks = 0usize;
    let mut failed_files: Vec<(PathBuf, String)> = Vec::new();

    for path in &files {
        pb.set_message(format!("{}", path.file_name().unwrap_or_default().to_string_lossy()));

        match ingest_file(&engine, path).await {
            Ok(chunks) => {
                success_count += 1;
                total_chunks += chunks;
            }
            Err(e) => {
                tracing::warn!("Failed to ingest {}: {}", path.display(), e);
                failed_files.push((path.clone(), e.to_string()));
            }
        }

        pb.inc(1);
    }

    pb.finish_with_message("done");

    println!("\nIngestion complete!");
    println!("  Files ingested: {}/{}", success_count, files.len());
    println!("  Files failed:   {}", failed_files.len());
    println!("  Total chunks:   {}", total_chunks);
    println!("  Collection:     {}", settings.store.collection);

    if !failed_files.is_empty() {
        println!("\nFailed files:");
        for (path, err) in &failed_files {
            println!("  {}: {}", path.display(), err);
        }
    }

    Ok(())
}

async fn ingest_file(engine: &RAGEngine, path: &Path) -> Result<usize> {
    let bytes = std::fs::read(path)?;
    let source_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());
    let report = engine.ingest(&bytes, &source_name).await?;
    Ok(report.chunks_indexed)
}
