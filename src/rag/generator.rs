use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Produces an answer for `query` conditioned on retrieved `context`.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, query: &str, context: &str) -> Result<String>;
}

/// The single prompt template fed to the completion model.
pub fn build_prompt(query: &str, context: &str) -> String {
    format!(
        "You are a helpful assistant. Use the following context to answer the question.\n\n\
         Context:\n{}\n\n\
         Question:\n{}\n\n\
         Answer:",
        context, query
    )
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: Option<String>,
}

/// Single-shot completion through Ollama's `/api/generate` endpoint.
pub struct OllamaGenerator {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaGenerator {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RagError::Config(format!("Failed to build HTTP client: {}", e)))?;
        let base_url: String = base_url.into();

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.into(),
        })
    }

    pub fn model_name(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl Generator for OllamaGenerator {
    async fn generate(&self, query: &str, context: &str) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);
        let prompt = build_prompt(query, context);
        let request = GenerateRequest {
            model: &self.model,
            prompt: &prompt,
            stream: false,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| RagError::GenerationService(format!("request to {} failed: {}", url, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RagError::GenerationService(format!(
                "Ollama error: {}, {}",
                status, body
            )));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| RagError::GenerationService(format!("malformed response: {}", e)))?;

        parsed.response.ok_or_else(|| {
            RagError::GenerationService("response is missing the answer field".to_string())
        })
    }
}
