//! Azure adapters for RAGQA
//!
//! This crate provides the Azure OpenAI implementation of the
//! `EmbeddingProvider` and `LLMProvider` traits, an Azure AI Search
//! `Retriever`, and a `ReportPublisher` for Azure AI projects.

mod client;
mod config;
mod project;
mod search;


pub use client::AzureOpenAIClient;
pub use config::{
    AzureOpenAIConfig, DEFAULT_OPENAI_API_VERSION, DEFAULT_SEARCH_API_VERSION, ProjectConfig,
    SearchServiceConfig,
};
pub use project::AzureAiProjectPublisher;
pub use search::AzureSearchRetriever;

// Re-export core types for convenience
pub use ragqa_core::{
    EmbeddingProvider, Error, LLMProvider, ReportPublisher, Result, Retriever,
};
