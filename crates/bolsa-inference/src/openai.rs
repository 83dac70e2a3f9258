//! OpenAI-compatible embedding backend.
//!
//! Speaks the `/v1/embeddings` wire format, so it also works against any
//! API-compatible provider by pointing `EMBEDDING_API_URL` elsewhere.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use pgvector::Vector;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use bolsa_core::{EmbeddingBackend, EmbeddingSettings, Error, Result};

/// Request timeout for embedding calls.
const REQUEST_TIMEOUT_SECS: u64 = 20;

/// Embedding backend over an OpenAI-compatible HTTP API.
pub struct OpenAiBackend {
    client: Client,
    api_url: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl OpenAiBackend {
    /// Create a backend from embedding settings.
    pub fn new(settings: &EmbeddingSettings) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            api_url: settings.api_url.clone(),
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
        }
    }
}

#[async_trait]
impl EmbeddingBackend for OpenAiBackend {
    async fn embed(&self, text: &str) -> Result<Vector> {
        let start = Instant::now();

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&EmbeddingsRequest {
                model: &self.model,
                input: text,
            })
            .send()
            .await
            .map_err(|e| Error::Embedding(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                subsystem = "inference",
                component = "openai",
                status = %status,
                "Embedding request rejected"
            );
            return Err(Error::Embedding(format!(
                "backend returned {}: {}",
                status, body
            )));
        }

        let parsed: EmbeddingsResponse = response
            .json()
            .await
            .map_err(|e| Error::Embedding(format!("invalid response: {}", e)))?;

        let embedding = parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| Error::Embedding("backend returned no embeddings".to_string()))?;

        debug!(
            subsystem = "inference",
            component = "openai",
            op = "embed",
            model = %self.model,
            input_len = text.len(),
            dimension = embedding.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Embedding generated"
        );

        Ok(Vector::from(embedding))
    }

    fn model_name(&self) -> String {
        self.model.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> EmbeddingSettings {
        EmbeddingSettings {
            api_url: "https://api.openai.com/v1/embeddings".to_string(),
            api_key: "test-key".to_string(),
            model: "text-embedding-ada-002".to_string(),
        }
    }

    #[test]
    fn test_model_name() {
        let backend = OpenAiBackend::new(&settings());
        assert_eq!(backend.model_name(), "text-embedding-ada-002");
    }

    #[test]
    fn test_request_serializes_model_and_input() {
        let req = EmbeddingsRequest {
            model: "text-embedding-ada-002",
            input: "hola",
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["model"], "text-embedding-ada-002");
        assert_eq!(json["input"], "hola");
    }

    #[test]
    fn test_response_parses_first_embedding() {
        let json = r#"{"data": [{"embedding": [0.1, 0.2, 0.3]}]}"#;
        let parsed: EmbeddingsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.data[0].embedding.len(), 3);
    }
}
