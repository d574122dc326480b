//! Azure configuration
//!
//! Values are parsed through a lookup function so the whole configuration can
//! be injected in tests; `from_env` reads the process environment after
//! loading `.env`.

use serde::{Deserialize, Serialize};
use std::env;

use ragqa_core::{DEFAULT_INDEX_NAME, Error, Result, SearchConfig};

pub const DEFAULT_OPENAI_API_VERSION: &str = "2024-02-01";
pub const DEFAULT_SEARCH_API_VERSION: &str = "2023-11-01";

fn required<F>(lookup: &F, key: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| Error::Configuration(format!("{} environment variable not found", key)))
}

fn optional<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).filter(|value| !value.trim().is_empty())
}

/// Configuration for the Azure OpenAI resource used for embeddings, answers and judging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AzureOpenAIConfig {
    pub endpoint: String,
    pub api_key: String,
    pub api_version: String,
    pub chat_deployment: String,
    pub embedding_deployment: String,
    pub embedding_model: String,
    /// Deployment used by the quality judges
    pub evaluation_deployment: String,
}

impl AzureOpenAIConfig {
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let endpoint = required(&lookup, "AZURE_OPENAI_ENDPOINT")?;
        let api_key = required(&lookup, "AZURE_OPENAI_API_KEY")?;
        let api_version = optional(&lookup, "AZURE_OPENAI_API_VERSION")
            .unwrap_or_else(|| DEFAULT_OPENAI_API_VERSION.to_string());
        let chat_deployment = required(&lookup, "AZURE_OPENAI_CHAT_DEPLOYMENT")?;
        let embedding_deployment = required(&lookup, "AZURE_OPENAI_EMBEDDING_DEPLOYMENT")?;
        let embedding_model = optional(&lookup, "AZURE_OPENAI_EMBEDDING_MODEL")
            .unwrap_or_else(|| embedding_deployment.clone());
        let evaluation_deployment = optional(&lookup, "AZURE_OPENAI_DEPLOYMENT")
            .unwrap_or_else(|| chat_deployment.clone());

        Ok(Self {
            endpoint,
            api_key,
            api_version,
            chat_deployment,
            embedding_deployment,
            embedding_model,
            evaluation_deployment,
        })
    }

    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }
}

/// Configuration for the Azure AI Search service holding the document index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchServiceConfig {
    pub endpoint: String,
    pub api_key: String,
    pub api_version: String,
    pub index_name: String,
    pub search: SearchConfig,
    pub content_field: String,
    pub vector_field: String,
    pub title_field: String,
    pub source_field: String,
}

impl SearchServiceConfig {
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let endpoint = required(&lookup, "AZURE_SEARCH_ENDPOINT")?;
        let api_key = required(&lookup, "AZURE_SEARCH_KEY")?;
        let index_name =
            optional(&lookup, "AZURE_SEARCH_INDEX").unwrap_or_else(|| DEFAULT_INDEX_NAME.to_string());

        Ok(Self {
            endpoint,
            api_key,
            index_name,
            ..Self::defaults()
        })
    }

    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn defaults() -> Self {
        Self {
            endpoint: String::new(),
            api_key: String::new(),
            api_version: DEFAULT_SEARCH_API_VERSION.to_string(),
            index_name: DEFAULT_INDEX_NAME.to_string(),
            search: SearchConfig::default(),
            content_field: "content".to_string(),
            vector_field: "contentVector".to_string(),
            title_field: "title".to_string(),
            source_field: "url".to_string(),
        }
    }
}

/// Azure AI project that receives published evaluation reports
///
/// Every field is optional: an incomplete project only disables publishing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub subscription_id: Option<String>,
    pub resource_group: Option<String>,
    pub project_name: Option<String>,
    pub location: Option<String>,
    #[serde(skip_serializing)]
    pub access_token: Option<String>,
}

impl ProjectConfig {
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            subscription_id: optional(&lookup, "AZURE_SUBSCRIPTION_ID"),
            resource_group: optional(&lookup, "AZURE_RESOURCE_GROUP"),
            project_name: optional(&lookup, "AZUREAI_PROJECT_NAME"),
            location: optional(&lookup, "AZURE_LOCATION"),
            access_token: optional(&lookup, "AZURE_ACCESS_TOKEN"),
        }
    }

    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// ARM path of the project workspace, if all identifiers are present
    pub fn workspace_path(&self) -> Option<String> {
        match (&self.subscription_id, &self.resource_group, &self.project_name) {
            (Some(subscription), Some(group), Some(project)) => Some(format!(
                "/subscriptions/{}/resourceGroups/{}/providers/Microsoft.MachineLearningServices/workspaces/{}",
                subscription, group, project
            )),
            _ => None,
        }
    }
}
