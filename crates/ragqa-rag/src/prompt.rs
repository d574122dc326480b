//! Chat prompt template
//!
//! The template has a system part and a user part. Both may reference
//! `{{question}}` and `{{documents}}`. Templates can also be loaded from a
//! prompty-style file: optional front matter between `---` lines, followed by
//! `system:` and `user:` sections.

use regex::{Captures, Regex};
use std::path::Path;
use std::sync::LazyLock;

use ragqa_core::{ChatMessage, DocumentContext, Error, Result};

const DEFAULT_SYSTEM: &str = "\
You are an AI assistant that answers questions using only the documentation provided below.
Keep answers short and factual. If the documentation does not contain the answer, say that
you do not know instead of guessing.

# Documentation
{{documents}}";

const DEFAULT_USER: &str = "{{question}}";

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{(question|documents)\}\}").expect("placeholder pattern is valid")
});

/// System and user message templates for answer generation
#[derive(Debug, Clone, PartialEq)]
pub struct PromptTemplate {
    system: String,
    user: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self {
            system: DEFAULT_SYSTEM.to_string(),
            user: DEFAULT_USER.to_string(),
        }
    }
}

impl PromptTemplate {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
        }
    }

    /// Load a prompty-style template file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content).map_err(|e| match e {
            Error::InvalidInput(msg) => Error::InvalidInput(format!("{}: {}", path.display(), msg)),
            other => other,
        })
    }

    /// Parse template text with `system:` and `user:` sections
    pub fn parse(content: &str) -> Result<Self> {
        let body = strip_front_matter(content);

        let mut section = Section::Preamble;
        let mut system: Vec<&str> = Vec::new();
        let mut user: Vec<&str> = Vec::new();

        for line in body.lines() {
            match line.trim().to_ascii_lowercase().as_str() {
                "system:" => section = Section::System,
                "user:" => section = Section::User,
                _ => match section {
                    Section::Preamble => {}
                    Section::System => system.push(line),
                    Section::User => user.push(line),
                },
            }
        }

        let user = user.join("\n").trim().to_string();
        if user.is_empty() {
            return Err(Error::InvalidInput("template has no user section".to_string()));
        }
        let system = system.join("\n").trim().to_string();

        Ok(Self { system, user })
    }

    /// Render the chat messages for one question
    pub fn render(&self, question: &str, context: &DocumentContext) -> Vec<ChatMessage> {
        let documents = format_documents(context);
        // One pass, so placeholder text inside the question or a snippet stays literal
        let fill = |template: &str| {
            PLACEHOLDER
                .replace_all(template, |caps: &Captures| match &caps[1] {
                    "question" => question.to_string(),
                    _ => documents.clone(),
                })
                .into_owned()
        };

        let mut messages = Vec::with_capacity(2);
        if !self.system.is_empty() {
            messages.push(ChatMessage::system(fill(&self.system)));
        }
        messages.push(ChatMessage::user(fill(&self.user)));
        messages
    }
}

enum Section {
    Preamble,
    System,
    User,
}

fn strip_front_matter(content: &str) -> &str {
    let trimmed = content.trim_start();
    let Some(rest) = trimmed.strip_prefix("---") else {
        return content;
    };

    match rest.find("\n---") {
        Some(end) => {
            let after = &rest[end + 4..];
            after.strip_prefix('\n').unwrap_or(after)
        }
        None => content,
    }
}

/// Serialise snippets one block each, with source and score when known
pub fn format_documents(context: &DocumentContext) -> String {
    context
        .iter()
        .enumerate()
        .map(|(i, snippet)| {
            let mut header = format!("[{}]", i + 1);
            if let Some(source) = &snippet.source {
                header.push_str(&format!(" source: {}", source));
            }
            if let Some(score) = snippet.score {
                header.push_str(&format!(" (score {:.2})", score));
            }
            format!("{}\n{}", header, snippet.content)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
