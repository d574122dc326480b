//! Context retriever trait and search configuration

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{DocumentContext, Result};

/// Index queried when none is configured
pub const DEFAULT_INDEX_NAME: &str = "rag-index";

/// Configuration for a similarity search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    pub top_k: usize,
    /// Also send the raw question for keyword matching
    pub hybrid: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            hybrid: true,
        }
    }
}

/// Trait for document indexes
///
/// Zero hits is a valid, empty [`DocumentContext`]. Transport or index errors
/// are [`Error::RetrievalFailed`](crate::Error::RetrievalFailed) and must not
/// be turned into an empty context.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Return the top-ranked snippets for a question, most relevant first
    async fn retrieve(
        &self,
        question: &str,
        embedding: &[f32],
        index_name: &str,
    ) -> Result<DocumentContext>;
}
