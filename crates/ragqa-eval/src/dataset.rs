//! JSON Lines input and output
//!
//! Dataset rows need at least a `question`; `chat_history` defaults to empty.
//! The intermediate response file carries exactly `question`, `chat_history`,
//! `answer` and `context` per line.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use tokio::fs;
use tracing::debug;

use ragqa_core::{Error, EvaluationRecord, FlowInput, ResponseRecord, Result};

/// Parse JSON Lines text, skipping blank lines
pub fn parse_jsonl<T: DeserializeOwned>(content: &str) -> Result<Vec<T>> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line)
                .map_err(|e| Error::Serialization(format!("line {}: {}", i + 1, e)))
        })
        .collect()
}

/// Serialise one value per line
pub fn to_jsonl<T: Serialize>(items: &[T]) -> Result<String> {
    let mut out = String::new();
    for item in items {
        out.push_str(&serde_json::to_string(item)?);
        out.push('\n');
    }
    Ok(out)
}

async fn read_jsonl<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let content = fs::read_to_string(path).await?;
    parse_jsonl(&content)
        .map_err(|e| Error::Serialization(format!("{}: {}", path.display(), e)))
}

/// Load the question dataset
pub async fn read_dataset(path: impl AsRef<Path>) -> Result<Vec<FlowInput>> {
    let path = path.as_ref();
    let rows: Vec<FlowInput> = read_jsonl(path).await?;
    debug!(path = %path.display(), rows = rows.len(), "dataset loaded");
    Ok(rows)
}

/// Write the intermediate response file
pub async fn write_responses(path: impl AsRef<Path>, records: &[ResponseRecord]) -> Result<()> {
    let path = path.as_ref();
    fs::write(path, to_jsonl(records)?).await?;
    debug!(path = %path.display(), rows = records.len(), "responses written");
    Ok(())
}

/// Load a response file as evaluation input
pub async fn read_evaluation_records(path: impl AsRef<Path>) -> Result<Vec<EvaluationRecord>> {
    read_jsonl(path.as_ref()).await
}
