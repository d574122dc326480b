//! Publishing evaluation reports to an Azure AI project

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::info;
use url::Url;

use ragqa_core::{Error, EvaluationReport, ReportPublisher, Result};

use crate::config::ProjectConfig;

const STUDIO_URL: &str = "https://ai.azure.com/build/evaluation";

/// Uploads reports to the evaluation service of an Azure AI project
pub struct AzureAiProjectPublisher {
    project: ProjectConfig,
    client: Client,
}

impl AzureAiProjectPublisher {
    pub fn new(project: ProjectConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(Self { project, client })
    }

    /// Evaluation upload endpoint for the configured project
    pub(crate) fn upload_url(&self) -> Result<Url> {
        let workspace = self.project.workspace_path().ok_or_else(|| {
            Error::ReportingUnavailable(
                "AZURE_SUBSCRIPTION_ID, AZURE_RESOURCE_GROUP and AZUREAI_PROJECT_NAME must all be set"
                    .to_string(),
            )
        })?;
        let location = self.project.location.as_deref().ok_or_else(|| {
            Error::ReportingUnavailable("AZURE_LOCATION is not set".to_string())
        })?;

        let base = format!("https://{}.api.azureml.ms/raisvc/v1.0{}/evaluations", location, workspace);
        Url::parse(&base).map_err(|e| Error::ReportingUnavailable(format!("invalid project URL: {}", e)))
    }

    pub(crate) fn studio_url(&self, report: &EvaluationReport) -> String {
        match self.project.workspace_path() {
            Some(workspace) => format!("{}/{}?wsid={}", STUDIO_URL, report.run_id, workspace),
            None => format!("{}/{}", STUDIO_URL, report.run_id),
        }
    }
}

#[async_trait]
impl ReportPublisher for AzureAiProjectPublisher {
    async fn publish(&self, report: &EvaluationReport) -> Result<String> {
        let url = self.upload_url()?;
        let token = self.project.access_token.as_deref().ok_or_else(|| {
            Error::ReportingUnavailable("AZURE_ACCESS_TOKEN is not set".to_string())
        })?;

        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(report)
            .send()
            .await
            .map_err(|e| Error::ReportingUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(Error::ReportingUnavailable(format!(
                "project rejected report with status {}: {}",
                status, error_text
            )));
        }

        let studio_url = self.studio_url(report);
        info!(url = %studio_url, "evaluation report published");
        Ok(studio_url)
    }
}
