//! Error types for the question answering and evaluation pipeline

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for the question answering and evaluation pipeline
#[derive(Error, Debug)]
pub enum Error {
    #[error("Embedding unavailable: {0}")]
    EmbeddingUnavailable(String),

    #[error("Retrieval failed: {0}")]
    RetrievalFailed(String),

    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    #[error("Missing output columns: {}", .0.join(", "))]
    MissingOutputColumns(Vec<String>),

    #[error("Reporting unavailable: {0}")]
    ReportingUnavailable(String),

    #[error("Judge error: {0}")]
    Judge(String),

    #[error("Evaluation error: {0}")]
    Evaluation(String),

    #[error("Batch error: {0}")]
    Batch(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Timeout error: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(String),
}

/// Copyable tag for an [`Error`], used where the error itself has to be recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    EmbeddingUnavailable,
    RetrievalFailed,
    GenerationFailed,
    MissingOutputColumns,
    ReportingUnavailable,
    Judge,
    Evaluation,
    Batch,
    Configuration,
    Authentication,
    Network,
    Serialization,
    InvalidInput,
    Timeout,
    Io,
    Other,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::EmbeddingUnavailable(_) => ErrorKind::EmbeddingUnavailable,
            Error::RetrievalFailed(_) => ErrorKind::RetrievalFailed,
            Error::GenerationFailed(_) => ErrorKind::GenerationFailed,
            Error::MissingOutputColumns(_) => ErrorKind::MissingOutputColumns,
            Error::ReportingUnavailable(_) => ErrorKind::ReportingUnavailable,
            Error::Judge(_) => ErrorKind::Judge,
            Error::Evaluation(_) => ErrorKind::Evaluation,
            Error::Batch(_) => ErrorKind::Batch,
            Error::Configuration(_) => ErrorKind::Configuration,
            Error::Authentication(_) => ErrorKind::Authentication,
            Error::Network(_) => ErrorKind::Network,
            Error::Serialization(_) => ErrorKind::Serialization,
            Error::InvalidInput(_) => ErrorKind::InvalidInput,
            Error::Timeout(_) => ErrorKind::Timeout,
            Error::Io(_) => ErrorKind::Io,
            Error::Other(_) => ErrorKind::Other,
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Other(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
