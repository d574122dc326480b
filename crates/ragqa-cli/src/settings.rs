//! Process-wide settings, loaded once at startup

use chrono::Local;
use std::env;

use ragqa_azure::{AzureOpenAIConfig, ProjectConfig, SearchServiceConfig};
use ragqa_core::{Error, Result};

/// Longest run prefix kept; longer values are cut
pub const MAX_PREFIX_LEN: usize = 14;

#[derive(Debug, Clone)]
pub struct Settings {
    pub openai: AzureOpenAIConfig,
    /// Absent when no search key is set; only the answer pipeline needs it
    pub search: Option<SearchServiceConfig>,
    pub project: ProjectConfig,
    /// Tags this run's evaluation name
    pub prefix: String,
}

impl Settings {
    /// Parse settings through `lookup`, so tests can supply their own values
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let prefix = lookup("PREFIX")
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(default_prefix);

        let search_configured = ["AZURE_SEARCH_ENDPOINT", "AZURE_SEARCH_KEY"]
            .iter()
            .any(|key| lookup(key).is_some_and(|value| !value.trim().is_empty()));
        let search = if search_configured {
            Some(SearchServiceConfig::from_lookup(&lookup)?)
        } else {
            None
        };

        Ok(Self {
            openai: AzureOpenAIConfig::from_lookup(&lookup)?,
            search,
            project: ProjectConfig::from_lookup(&lookup),
            prefix: truncate_prefix(&prefix),
        })
    }

    /// Search service settings, required by commands that answer questions
    pub fn search(&self) -> Result<&SearchServiceConfig> {
        self.search.as_ref().ok_or_else(|| {
            Error::Configuration("AZURE_SEARCH_ENDPOINT environment variable not found".to_string())
        })
    }

    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }
}

/// Local time as `yymmddHHMMSS`
pub fn default_prefix() -> String {
    Local::now().format("%y%m%d%H%M%S").to_string()
}

fn truncate_prefix(prefix: &str) -> String {
    prefix.chars().take(MAX_PREFIX_LEN).collect()
}
