//! Core traits and types for RAGQA
//!
//! This crate defines the data model shared by the answer pipeline and the
//! evaluation harness, and the capability-facing interfaces for embedding
//! endpoints, document indexes, generation endpoints, quality judges and
//! report publishers. Every network-bound capability is a trait so the
//! pipeline logic can be tested against deterministic stubs.

pub mod embedding;
pub mod error;
pub mod flow;
pub mod judge;
pub mod llm;
pub mod report;
pub mod retrieval;
pub mod types;

pub use embedding::{EmbeddingProvider, EmbeddingVector};
pub use error::{Error, ErrorKind, Result};
pub use flow::{Flow, FlowInput, FlowOutput};
pub use judge::Judge;
pub use llm::{ChatMessage, GenerationConfig, GenerationResult, LLMProvider, Role};
pub use report::{EvaluationReport, EvaluatorScores, ReportPublisher};
pub use retrieval::{DEFAULT_INDEX_NAME, Retriever, SearchConfig};
pub use types::*;
