//! Answer generation from a question and its retrieved context

use tracing::debug;

use ragqa_core::{DocumentContext, Error, GenerationConfig, LLMProvider, Result};

use crate::prompt::PromptTemplate;

/// Maximum answer length in tokens
pub const MAX_ANSWER_TOKENS: u32 = 512;

/// Composes the chat prompt and calls the generation endpoint
pub struct AnswerGenerator<L: LLMProvider> {
    llm: L,
    template: PromptTemplate,
    config: GenerationConfig,
}

impl<L: LLMProvider> AnswerGenerator<L> {
    /// Create a generator with the built-in template and a 512-token budget
    pub fn new(llm: L) -> Self {
        Self {
            llm,
            template: PromptTemplate::default(),
            config: GenerationConfig {
                max_tokens: MAX_ANSWER_TOKENS,
                ..Default::default()
            },
        }
    }

    pub fn with_template(mut self, template: PromptTemplate) -> Self {
        self.template = template;
        self
    }

    pub fn model_id(&self) -> &str {
        self.llm.model_id()
    }

    /// Generate an answer; the text may be empty
    pub async fn generate(&self, question: &str, context: &DocumentContext) -> Result<String> {
        let messages = self.template.render(question, context);
        debug!(
            model = %self.llm.model_id(),
            snippets = context.len(),
            "generating answer"
        );

        let result = self
            .llm
            .complete(&messages, &self.config)
            .await
            .map_err(|e| match e {
                Error::GenerationFailed(_) => e,
                other => Error::GenerationFailed(other.to_string()),
            })?;

        Ok(result.text)
    }
}
