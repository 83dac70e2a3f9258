//! Mock embedding backend for deterministic testing.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use pgvector::Vector;

use bolsa_core::{EmbeddingBackend, Error, Result};

/// Deterministic embedding backend: hashes the input text into a unit
/// vector so equal texts embed identically and different texts (almost
/// always) differ. No network access.
pub struct MockEmbeddingBackend {
    dimension: usize,
    fail: bool,
    calls: Arc<AtomicUsize>,
}

impl MockEmbeddingBackend {
    /// Create a mock backend with the given dimension.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            fail: false,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Make every embed call fail, for error-path tests.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Number of embed calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn hash_text(text: &str) -> u64 {
        // FNV-1a; stable across runs, unlike the std hasher.
        let mut hash: u64 = 0xcbf29ce484222325;
        for byte in text.as_bytes() {
            hash ^= u64::from(*byte);
            hash = hash.wrapping_mul(0x100000001b3);
        }
        hash
    }
}

#[async_trait]
impl EmbeddingBackend for MockEmbeddingBackend {
    async fn embed(&self, text: &str) -> Result<Vector> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Error::Embedding("mock backend configured to fail".to_string()));
        }

        let mut state = Self::hash_text(text);
        let mut values = Vec::with_capacity(self.dimension);
        for _ in 0..self.dimension {
            // xorshift keeps the sequence deterministic per input text
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            values.push(((state % 2000) as f32 / 1000.0) - 1.0);
        }

        let norm: f32 = values.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut values {
                *v /= norm;
            }
        }

        Ok(Vector::from(values))
    }

    fn model_name(&self) -> String {
        "mock-embedding".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_is_deterministic() {
        let backend = MockEmbeddingBackend::new(16);
        let a = backend.embed("hola").await.unwrap();
        let b = backend.embed("hola").await.unwrap();
        assert_eq!(a.as_slice(), b.as_slice());
    }

    #[tokio::test]
    async fn test_mock_differs_by_input() {
        let backend = MockEmbeddingBackend::new(16);
        let a = backend.embed("hola").await.unwrap();
        let b = backend.embed("chau").await.unwrap();
        assert_ne!(a.as_slice(), b.as_slice());
    }

    #[tokio::test]
    async fn test_mock_dimension_and_unit_norm() {
        let backend = MockEmbeddingBackend::new(32);
        let v = backend.embed("texto").await.unwrap();
        assert_eq!(v.as_slice().len(), 32);
        let norm: f32 = v.as_slice().iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_mock_failing() {
        let backend = MockEmbeddingBackend::new(8).failing();
        assert!(backend.embed("texto").await.is_err());
        assert_eq!(backend.call_count(), 1);
    }
}
