//! Common types used across the answer pipeline and evaluation harness

use serde::{Deserialize, Serialize};

/// Answer returned for an empty or whitespace-only question
pub const NO_QUESTION_ANSWER: &str = "No question provided.";

/// Sentinel snippet substituted when retrieval finds no evidence
pub const FALLBACK_CONTEXT: &str = "No relevant context found.";

/// Prior conversation turns. Passed through untouched; the shape is whatever the caller supplied.
pub type ChatHistory = Vec<serde_json::Value>;

/// Whether a question should short-circuit the pipeline
pub fn is_blank_question(question: &str) -> bool {
    question.trim().is_empty()
}

/// A single piece of retrieved evidence
///
/// Serialises as a bare string when it carries no score or source, so a
/// fallback context is written as `["No relevant context found."]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "SnippetRepr", into = "SnippetRepr")]
pub struct Snippet {
    pub content: String,
    pub score: Option<f64>,
    pub source: Option<String>,
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum SnippetRepr {
    Text(String),
    Detailed {
        content: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        score: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        source: Option<String>,
    },
}

impl From<SnippetRepr> for Snippet {
    fn from(repr: SnippetRepr) -> Self {
        match repr {
            SnippetRepr::Text(content) => Snippet::text(content),
            SnippetRepr::Detailed { content, score, source } => Snippet { content, score, source },
        }
    }
}

impl From<Snippet> for SnippetRepr {
    fn from(snippet: Snippet) -> Self {
        if snippet.score.is_none() && snippet.source.is_none() {
            SnippetRepr::Text(snippet.content)
        } else {
            SnippetRepr::Detailed {
                content: snippet.content,
                score: snippet.score,
                source: snippet.source,
            }
        }
    }
}

impl Snippet {
    /// Snippet with text only
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            score: None,
            source: None,
        }
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Ranked evidence for one question, most relevant first
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentContext(Vec<Snippet>);

impl DocumentContext {
    pub fn new(snippets: Vec<Snippet>) -> Self {
        Self(snippets)
    }

    /// The one-snippet context used when retrieval comes back empty
    pub fn fallback() -> Self {
        Self(vec![Snippet::text(FALLBACK_CONTEXT)])
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Snippet> {
        self.0.iter()
    }

    pub fn snippets(&self) -> &[Snippet] {
        &self.0
    }

    pub fn into_snippets(self) -> Vec<Snippet> {
        self.0
    }

    /// Snippet texts joined by blank lines, for judges that take context as one string
    pub fn joined(&self) -> String {
        self.0
            .iter()
            .map(|s| s.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

impl From<Vec<Snippet>> for DocumentContext {
    fn from(snippets: Vec<Snippet>) -> Self {
        Self(snippets)
    }
}

impl<'a> IntoIterator for &'a DocumentContext {
    type Item = &'a Snippet;
    type IntoIter = std::slice::Iter<'a, Snippet>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Output of one pipeline invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseRecord {
    pub question: String,
    #[serde(default)]
    pub chat_history: ChatHistory,
    pub answer: String,
    pub context: DocumentContext,
}

impl ResponseRecord {
    /// The record returned for a blank question
    pub fn no_question(question: impl Into<String>, chat_history: ChatHistory) -> Self {
        Self {
            question: question.into(),
            chat_history,
            answer: NO_QUESTION_ANSWER.to_string(),
            context: DocumentContext::default(),
        }
    }
}

/// One row of evaluation input
///
/// Field names are fixed regardless of how the producing flow named its outputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub question: String,
    #[serde(default)]
    pub chat_history: ChatHistory,
    pub answer: String,
    #[serde(default)]
    pub context: DocumentContext,
}

impl From<ResponseRecord> for EvaluationRecord {
    fn from(record: ResponseRecord) -> Self {
        Self {
            question: record.question,
            chat_history: record.chat_history,
            answer: record.answer,
            context: record.context,
        }
    }
}
