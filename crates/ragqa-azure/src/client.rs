//! Azure OpenAI client implementation

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;
use url::Url;

use ragqa_core::{
    ChatMessage, EmbeddingProvider, EmbeddingVector, Error, GenerationConfig, GenerationResult,
    LLMProvider, Result,
};

use crate::config::AzureOpenAIConfig;

/// Azure OpenAI client serving both the embedding and the chat deployments
pub struct AzureOpenAIClient {
    config: AzureOpenAIConfig,
    client: Client,
    deployment: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct EmbeddingRequest<'a> {
    pub input: &'a str,
    pub model: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EmbeddingData {
    #[serde(default)]
    pub embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EmbeddingResponse {
    #[serde(default)]
    pub data: Vec<EmbeddingData>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest<'a> {
    pub messages: &'a [ChatMessage],
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    pub stop: &'a [String],
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponseMessage {
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatChoice {
    pub message: Option<ChatResponseMessage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatUsage {
    pub total_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
    pub usage: Option<ChatUsage>,
}

impl AzureOpenAIClient {
    /// Create a new client; generation goes to the chat deployment
    pub fn new(config: AzureOpenAIConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        let deployment = config.chat_deployment.clone();

        Ok(Self {
            config,
            client,
            deployment,
        })
    }

    /// Create a new client from environment variables
    pub fn from_env() -> Result<Self> {
        let config = AzureOpenAIConfig::from_env()?;
        Self::new(config)
    }

    /// Send generation requests to another deployment of the same resource
    pub fn with_deployment(mut self, deployment: impl Into<String>) -> Self {
        self.deployment = deployment.into();
        self
    }

    /// Client for the judge deployment
    pub fn for_evaluation(config: AzureOpenAIConfig) -> Result<Self> {
        let deployment = config.evaluation_deployment.clone();
        Ok(Self::new(config)?.with_deployment(deployment))
    }

    pub(crate) fn deployment_url(&self, deployment: &str, operation: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.config.endpoint)
            .map_err(|e| Error::Configuration(format!("Invalid Azure OpenAI endpoint: {}", e)))?;

        url.path_segments_mut()
            .map_err(|_| Error::Configuration("Azure OpenAI endpoint cannot be a base URL".to_string()))?
            .pop_if_empty()
            .extend(["openai", "deployments", deployment])
            .extend(operation);

        url.query_pairs_mut()
            .append_pair("api-version", &self.config.api_version);

        Ok(url)
    }

    pub(crate) fn embedding_request<'a>(&'a self, text: &'a str) -> EmbeddingRequest<'a> {
        EmbeddingRequest {
            input: text,
            model: &self.config.embedding_model,
        }
    }

    async fn post_json<B, R>(&self, url: Url, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self
            .client
            .post(url)
            .header("api-key", &self.config.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::Authentication(format!(
                    "Azure OpenAI rejected credentials ({}): {}",
                    status, error_text
                )),
                _ => Error::Network(format!(
                    "Azure OpenAI request failed with status {}: {}",
                    status, error_text
                )),
            });
        }

        response
            .json()
            .await
            .map_err(|e| Error::Serialization(e.to_string()))
    }

    async fn perform_completion(
        &self,
        messages: &[ChatMessage],
        config: &GenerationConfig,
    ) -> Result<GenerationResult> {
        let url = self.deployment_url(&self.deployment, &["chat", "completions"])?;
        let body = ChatRequest {
            messages,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            top_p: config.top_p,
            stop: &config.stop_sequences,
        };

        let response: ChatResponse = self.post_json(url, &body).await?;
        parse_chat_response(response, &self.deployment)
    }
}

pub(crate) fn parse_embedding_response(response: EmbeddingResponse) -> Result<EmbeddingVector> {
    response
        .data
        .into_iter()
        .next()
        .map(|data| data.embedding)
        .filter(|embedding| !embedding.is_empty())
        .ok_or_else(|| Error::EmbeddingUnavailable("endpoint returned no embedding".to_string()))
}

pub(crate) fn parse_chat_response(response: ChatResponse, model_id: &str) -> Result<GenerationResult> {
    let text = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .ok_or_else(|| Error::GenerationFailed("response contained no message content".to_string()))?;

    Ok(GenerationResult {
        text,
        model_id: model_id.to_string(),
        tokens_used: response.usage.and_then(|usage| usage.total_tokens),
    })
}

#[async_trait]
impl EmbeddingProvider for AzureOpenAIClient {
    async fn embed(&self, text: &str) -> Result<EmbeddingVector> {
        let url = self.deployment_url(&self.config.embedding_deployment, &["embeddings"])?;
        debug!(deployment = %self.config.embedding_deployment, "requesting embedding");

        let response: EmbeddingResponse = self
            .post_json(url, &self.embedding_request(text))
            .await
            .map_err(|e| match e {
                Error::Configuration(_) => e,
                other => Error::EmbeddingUnavailable(other.to_string()),
            })?;

        parse_embedding_response(response)
    }
}

#[async_trait]
impl LLMProvider for AzureOpenAIClient {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        config: &GenerationConfig,
    ) -> Result<GenerationResult> {
        debug!(deployment = %self.deployment, max_tokens = config.max_tokens, "requesting completion");
        let completion = self.perform_completion(messages, config);

        match timeout(config.timeout, completion).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout("Request timed out".to_string())),
        }
    }

    fn model_id(&self) -> &str {
        &self.deployment
    }
}
