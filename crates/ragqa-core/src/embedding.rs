//! Embedding provider trait

use async_trait::async_trait;

use crate::Result;

/// Fixed-length vector representation of a piece of text
pub type EmbeddingVector = Vec<f32>;

/// Trait for embedding endpoints
///
/// Implementations make one outbound call per request and never retry; a
/// response without a usable vector is reported as
/// [`Error::EmbeddingUnavailable`](crate::Error::EmbeddingUnavailable).
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a non-empty question
    async fn embed(&self, text: &str) -> Result<EmbeddingVector>;
}
