//! # bolsa-inference
//!
//! Embedding backend abstraction for the bolsa recruiting backend.
//!
//! This crate provides:
//! - An OpenAI-compatible HTTP implementation of
//!   [`bolsa_core::EmbeddingBackend`]
//! - A deterministic mock backend for tests
//!
//! # Example
//!
//! ```rust,no_run
//! use bolsa_core::{AppConfig, EmbeddingBackend};
//! use bolsa_inference::OpenAiBackend;
//!
//! # async fn demo(config: AppConfig) -> bolsa_core::Result<()> {
//! let backend = OpenAiBackend::new(&config.embedding);
//! let vector = backend.embed("CV text").await?;
//! # Ok(())
//! # }
//! ```

pub mod mock;
pub mod openai;

// Re-export core types
pub use bolsa_core::{EmbeddingBackend, EmbeddingSettings};

pub use mock::MockEmbeddingBackend;
pub use openai::OpenAiBackend;

/// Compose the text a job posting is embedded from.
pub fn job_embedding_text(title: &str, description: &str, requirements: &str) -> String {
    format!("{}\n{}\n{}", title, description, requirements)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_embedding_text_joins_fields() {
        let text = job_embedding_text("Título", "Descripción", "Requisitos");
        assert_eq!(text, "Título\nDescripción\nRequisitos");
    }
}
