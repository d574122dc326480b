//! Prompt-based quality judges
//!
//! Each judge asks a chat model to rate one record on a 1-5 scale. The four
//! default judges differ only in their [`JudgeKind`], which selects the
//! rubric and the parts of the record shown to the model.

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock};

use ragqa_core::{
    ChatMessage, Error, EvaluationRecord, GenerationConfig, Judge, LLMProvider, Result,
};

static RATING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([1-5](?:\.\d+)?)\b").expect("rating pattern is valid"));

/// Judges keyed by display name
pub type JudgeSet = BTreeMap<String, Arc<dyn Judge>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JudgeKind {
    Fluency,
    Groundedness,
    Relevance,
    Coherence,
}

impl JudgeKind {
    pub const ALL: [JudgeKind; 4] = [
        JudgeKind::Fluency,
        JudgeKind::Groundedness,
        JudgeKind::Relevance,
        JudgeKind::Coherence,
    ];

    /// Display name, used as the report key
    pub fn name(&self) -> &'static str {
        match self {
            JudgeKind::Fluency => "Fluency",
            JudgeKind::Groundedness => "Groundedness",
            JudgeKind::Relevance => "Relevance",
            JudgeKind::Coherence => "Coherence",
        }
    }

    pub fn metric(&self) -> &'static str {
        match self {
            JudgeKind::Fluency => "gpt_fluency",
            JudgeKind::Groundedness => "gpt_groundedness",
            JudgeKind::Relevance => "gpt_relevance",
            JudgeKind::Coherence => "gpt_coherence",
        }
    }

    fn rubric(&self) -> &'static str {
        match self {
            JudgeKind::Fluency => {
                "Fluency measures the quality of individual sentences in the ANSWER: grammar, \
                 word choice and whether they read naturally. 1 means the answer is \
                 unreadable; 5 means every sentence is well-written."
            }
            JudgeKind::Groundedness => {
                "Groundedness measures whether every claim in the ANSWER is supported by the \
                 CONTEXT. 1 means the answer contradicts or ignores the context; 5 means \
                 everything it says can be verified in the context."
            }
            JudgeKind::Relevance => {
                "Relevance measures how well the ANSWER addresses the QUESTION using the key \
                 information in the CONTEXT. 1 means the answer is off-topic; 5 means it \
                 answers the question completely."
            }
            JudgeKind::Coherence => {
                "Coherence measures how well the sentences of the ANSWER fit together and \
                 sound natural as a whole. 1 means the answer has no logical flow; 5 means it \
                 reads as one well-organised response."
            }
        }
    }

    fn uses_context(&self) -> bool {
        matches!(self, JudgeKind::Groundedness | JudgeKind::Relevance)
    }

    /// Messages asking the judge model to rate one record
    pub fn prompt(&self, record: &EvaluationRecord) -> Vec<ChatMessage> {
        let system = format!(
            "You are an evaluator of answers produced by a question answering system.\n\
             {}\n\
             Reply with a single integer rating from 1 to 5 and nothing else.",
            self.rubric()
        );

        let mut user = format!("QUESTION:\n{}\n\nANSWER:\n{}", record.question, record.answer);
        if self.uses_context() {
            user.push_str(&format!("\n\nCONTEXT:\n{}", record.context.joined()));
        }
        user.push_str("\n\nRATING:");

        vec![ChatMessage::system(system), ChatMessage::user(user)]
    }
}

/// First rating between 1 and 5 found in a judge reply
pub fn parse_rating(text: &str) -> Option<f64> {
    RATING
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .map(|rating| rating.clamp(1.0, 5.0))
}

/// A judge backed by a chat model
pub struct PromptJudge<L: LLMProvider> {
    kind: JudgeKind,
    llm: Arc<L>,
    config: GenerationConfig,
}

impl<L: LLMProvider> PromptJudge<L> {
    pub fn new(kind: JudgeKind, llm: Arc<L>) -> Self {
        Self {
            kind,
            llm,
            config: GenerationConfig {
                max_tokens: 8,
                temperature: Some(0.0),
                ..Default::default()
            },
        }
    }

    pub fn kind(&self) -> JudgeKind {
        self.kind
    }
}

#[async_trait]
impl<L: LLMProvider> Judge for PromptJudge<L> {
    fn metric(&self) -> &str {
        self.kind.metric()
    }

    async fn score(&self, record: &EvaluationRecord) -> Result<f64> {
        let messages = self.kind.prompt(record);
        let result = self.llm.complete(&messages, &self.config).await.map_err(|e| {
            Error::Judge(format!("{} judge call failed: {}", self.kind.name(), e))
        })?;

        parse_rating(&result.text).ok_or_else(|| {
            Error::Judge(format!(
                "{} judge returned no rating: {:?}",
                self.kind.name(),
                result.text
            ))
        })
    }
}

/// Fluency, groundedness, relevance and coherence judges sharing one model
pub fn default_judges<L: LLMProvider + 'static>(llm: Arc<L>) -> JudgeSet {
    JudgeKind::ALL
        .into_iter()
        .map(|kind| {
            let judge: Arc<dyn Judge> = Arc::new(PromptJudge::new(kind, llm.clone()));
            (kind.name().to_string(), judge)
        })
        .collect()
}
