//! Retrieval-augmented answer pipeline for RAGQA
//!
//! This crate provides the prompt template, the answer generator and the
//! pipeline orchestrator that sequences embedding, retrieval and generation.

mod generator;
mod pipeline;
mod prompt;


pub use generator::{AnswerGenerator, MAX_ANSWER_TOKENS};
pub use pipeline::{AnswerPipeline, EmptyResultPolicy};
pub use prompt::{PromptTemplate, format_documents};

// Re-export core types for convenience
pub use ragqa_core::{
    DocumentContext, EmbeddingProvider, Error, Flow, LLMProvider, ResponseRecord, Result,
    Retriever, Snippet,
};
