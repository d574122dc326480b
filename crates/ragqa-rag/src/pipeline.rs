//! Answer pipeline: embed, retrieve, generate
//!
//! Each request walks Validate → Embed → Retrieve → Generate → Finalize and
//! stops at the first unrecovered failure. No step retries; retry policy
//! belongs to the endpoint adapters.

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};

use ragqa_core::{
    ChatHistory, DEFAULT_INDEX_NAME, DocumentContext, EmbeddingProvider, Error, Flow, FlowInput,
    FlowOutput, LLMProvider, ResponseRecord, Result, Retriever, is_blank_question,
};

use crate::generator::AnswerGenerator;

/// What to do with an empty context or an empty answer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EmptyResultPolicy {
    /// Substitute the fallback snippet for zero hits; warn on an empty answer
    #[default]
    Tolerant,
    /// Zero hits is `RetrievalFailed`; an empty answer is `GenerationFailed`
    Strict,
}

/// Turns one question into a grounded answer plus the evidence it used
pub struct AnswerPipeline<E: EmbeddingProvider, R: Retriever, L: LLMProvider> {
    embedder: E,
    retriever: R,
    generator: AnswerGenerator<L>,
    index_name: String,
    policy: EmptyResultPolicy,
}

impl<E: EmbeddingProvider, R: Retriever, L: LLMProvider> std::fmt::Debug
    for AnswerPipeline<E, R, L>
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnswerPipeline")
            .field("index_name", &self.index_name)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl<E: EmbeddingProvider, R: Retriever, L: LLMProvider> AnswerPipeline<E, R, L> {
    pub fn new(embedder: E, retriever: R, generator: AnswerGenerator<L>) -> Self {
        Self {
            embedder,
            retriever,
            generator,
            index_name: DEFAULT_INDEX_NAME.to_string(),
            policy: EmptyResultPolicy::default(),
        }
    }

    pub fn with_index(mut self, index_name: impl Into<String>) -> Self {
        self.index_name = index_name.into();
        self
    }

    pub fn with_policy(mut self, policy: EmptyResultPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> EmptyResultPolicy {
        self.policy
    }

    /// Answer one question
    pub async fn respond(&self, question: &str, chat_history: ChatHistory) -> Result<ResponseRecord> {
        info!(question = %question, "answering question");

        if is_blank_question(question) {
            debug!("blank question, skipping endpoints");
            return Ok(ResponseRecord::no_question(question, chat_history));
        }

        let embedding = self
            .embedder
            .embed(question)
            .await
            .map_err(|e| match e {
                Error::EmbeddingUnavailable(_) => e,
                other => Error::EmbeddingUnavailable(other.to_string()),
            })?;
        if embedding.is_empty() {
            return Err(Error::EmbeddingUnavailable("embedding is empty".to_string()));
        }
        debug!(dimensions = embedding.len(), "question embedded");

        let mut context = self
            .retriever
            .retrieve(question, &embedding, &self.index_name)
            .await
            .map_err(|e| match e {
                Error::RetrievalFailed(_) => e,
                other => Error::RetrievalFailed(other.to_string()),
            })?;

        if context.is_empty() {
            match self.policy {
                EmptyResultPolicy::Tolerant => {
                    warn!(index = %self.index_name, "no context retrieved, using fallback snippet");
                    context = DocumentContext::fallback();
                }
                EmptyResultPolicy::Strict => {
                    return Err(Error::RetrievalFailed(format!(
                        "no relevant context in index '{}'",
                        self.index_name
                    )));
                }
            }
        }
        debug!(snippets = context.len(), "context retrieved");

        let answer = self.generator.generate(question, &context).await?;

        if answer.trim().is_empty() {
            match self.policy {
                EmptyResultPolicy::Tolerant => warn!("generated answer is empty"),
                EmptyResultPolicy::Strict => {
                    return Err(Error::GenerationFailed("generated answer is empty".to_string()));
                }
            }
        } else {
            debug!(chars = answer.len(), "answer generated");
        }

        Ok(ResponseRecord {
            question: question.to_string(),
            chat_history,
            answer,
            context,
        })
    }
}

#[async_trait]
impl<E, R, L> Flow for AnswerPipeline<E, R, L>
where
    E: EmbeddingProvider,
    R: Retriever,
    L: LLMProvider,
{
    async fn invoke(&self, input: &FlowInput) -> Result<FlowOutput> {
        let record = self
            .respond(&input.question, input.chat_history.clone())
            .await?;

        let mut output = FlowOutput::new();
        output.insert("answer".to_string(), Value::String(record.answer));
        output.insert("context".to_string(), serde_json::to_value(&record.context)?);
        Ok(output)
    }
}
