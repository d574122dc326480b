//! Azure AI Search retriever

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::cmp::Ordering;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use ragqa_core::{DocumentContext, Error, Result, Retriever, Snippet};

use crate::config::SearchServiceConfig;

const SCORE_FIELD: &str = "@search.score";

/// Retriever backed by an Azure AI Search index with a vector field
pub struct AzureSearchRetriever {
    config: SearchServiceConfig,
    client: Client,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    #[serde(default)]
    pub value: Vec<Map<String, Value>>,
}

impl AzureSearchRetriever {
    pub fn new(config: SearchServiceConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(Self { config, client })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(SearchServiceConfig::from_env()?)
    }

    /// Index configured for this deployment
    pub fn index_name(&self) -> &str {
        &self.config.index_name
    }

    pub(crate) fn search_url(&self, index_name: &str) -> Result<Url> {
        let mut url = Url::parse(&self.config.endpoint)
            .map_err(|e| Error::Configuration(format!("Invalid search endpoint: {}", e)))?;

        url.path_segments_mut()
            .map_err(|_| Error::Configuration("Search endpoint cannot be a base URL".to_string()))?
            .pop_if_empty()
            .extend(["indexes", index_name, "docs", "search"]);

        url.query_pairs_mut()
            .append_pair("api-version", &self.config.api_version);

        Ok(url)
    }

    pub(crate) fn search_request(&self, question: &str, embedding: &[f32]) -> Value {
        let top_k = self.config.search.top_k;
        let mut body = json!({
            "top": top_k,
            "vectorQueries": [{
                "kind": "vector",
                "vector": embedding,
                "k": top_k,
                "fields": self.config.vector_field,
            }],
        });

        if self.config.search.hybrid {
            body["search"] = json!(question);
        }

        body
    }

    /// Turn raw hits into snippets ordered by descending score
    pub(crate) fn parse_hits(&self, response: SearchResponse) -> DocumentContext {
        let mut snippets: Vec<Snippet> = response
            .value
            .into_iter()
            .filter_map(|hit| {
                let Some(content) = hit.get(&self.config.content_field).and_then(Value::as_str) else {
                    warn!(field = %self.config.content_field, "search hit without content, skipping");
                    return None;
                };

                let source = hit
                    .get(&self.config.source_field)
                    .or_else(|| hit.get(&self.config.title_field))
                    .and_then(Value::as_str)
                    .map(str::to_string);

                Some(Snippet {
                    content: content.to_string(),
                    score: hit.get(SCORE_FIELD).and_then(Value::as_f64),
                    source,
                })
            })
            .collect();

        snippets.sort_by(|a, b| match (a.score, b.score) {
            (Some(a), Some(b)) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });

        DocumentContext::new(snippets)
    }
}

#[async_trait]
impl Retriever for AzureSearchRetriever {
    async fn retrieve(
        &self,
        question: &str,
        embedding: &[f32],
        index_name: &str,
    ) -> Result<DocumentContext> {
        let url = self.search_url(index_name)?;
        debug!(index = %index_name, top_k = self.config.search.top_k, "searching index");

        let response = self
            .client
            .post(url)
            .header("api-key", &self.config.api_key)
            .json(&self.search_request(question, embedding))
            .send()
            .await
            .map_err(|e| Error::RetrievalFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(Error::RetrievalFailed(format!(
                "search on index '{}' failed with status {}: {}",
                index_name, status, error_text
            )));
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| Error::RetrievalFailed(format!("unreadable search response: {}", e)))?;

        Ok(self.parse_hits(body))
    }
}
