use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use pdf_rag::config::Settings;
use pdf_rag::rag::RAGEngine;
use pdf_rag::server;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = Settings::load()?;
    tracing::info!("Connecting to Ollama: {}", settings.ollama.base_url);
    tracing::info!(
        "Models: embed={}, generate={}",
        settings.pipeline.embed_model,
        settings.pipeline.gen_model
    );

    let engine = Arc::new(RAGEngine::from_settings(&settings).await?);
    let app = server::router(engine);

    let listener = tokio::net::TcpListener::bind(&settings.server.bind_addr).await?;
    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
