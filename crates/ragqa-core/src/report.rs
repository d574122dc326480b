//! Evaluation report types and the remote publisher trait

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::{EvaluationRecord, Result};

/// Per-judge scores: one entry per row plus the mean over scored rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluatorScores {
    pub metric: String,
    pub aggregate: Option<f64>,
    pub rows: Vec<Option<f64>>,
    pub failed_rows: usize,
}

impl EvaluatorScores {
    pub fn from_rows(metric: impl Into<String>, rows: Vec<Option<f64>>) -> Self {
        let scored: Vec<f64> = rows.iter().flatten().copied().collect();
        let aggregate = if scored.is_empty() {
            None
        } else {
            Some(scored.iter().sum::<f64>() / scored.len() as f64)
        };

        Self {
            metric: metric.into(),
            aggregate,
            failed_rows: rows.len() - scored.len(),
            rows,
        }
    }
}

/// Scores for every judge over one evaluation dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub run_id: Uuid,
    pub evaluation_name: String,
    pub created_at: DateTime<Utc>,
    pub evaluators: BTreeMap<String, EvaluatorScores>,
    pub rows: Vec<EvaluationRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_url: Option<String>,
}

impl EvaluationReport {
    /// Aggregate score per judge name
    pub fn metrics(&self) -> BTreeMap<&str, Option<f64>> {
        self.evaluators
            .iter()
            .map(|(name, scores)| (name.as_str(), scores.aggregate))
            .collect()
    }
}

/// Trait for remote report sinks (project dashboards, telemetry backends)
#[async_trait]
pub trait ReportPublisher: Send + Sync {
    /// Publish a finished report, returning where it can be viewed.
    ///
    /// Any failure is [`Error::ReportingUnavailable`](crate::Error::ReportingUnavailable).
    async fn publish(&self, report: &EvaluationReport) -> Result<String>;
}
