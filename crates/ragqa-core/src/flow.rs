//! Flow trait: the unit the batch runner drives

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{ChatHistory, Result};

/// Named outputs produced by one flow invocation
pub type FlowOutput = serde_json::Map<String, serde_json::Value>;

/// One dataset row as seen by a flow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowInput {
    pub question: String,
    #[serde(default)]
    pub chat_history: ChatHistory,
}

impl FlowInput {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            chat_history: Vec::new(),
        }
    }
}

#[async_trait]
pub trait Flow: Send + Sync {
    /// Run the flow once for a single input row
    async fn invoke(&self, input: &FlowInput) -> Result<FlowOutput>;
}
