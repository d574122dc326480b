//! Evaluation harness: score every row with every judge and persist the report

use chrono::Utc;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, info, warn};
use uuid::Uuid;

use ragqa_core::{
    Error, EvaluationRecord, EvaluationReport, EvaluatorScores, ReportPublisher, Result,
};

use crate::judges::JudgeSet;

/// Where the local report is written unless told otherwise
pub const DEFAULT_REPORT_PATH: &str = "qa_flow_quality_eval.json";

/// Evaluation name for a run prefix
pub fn evaluation_name(prefix: &str) -> String {
    format!("{} Quality Evaluation", prefix)
}

/// A finished evaluation and how it was obtained
#[derive(Debug, Clone)]
pub struct EvaluationOutcome {
    pub report: EvaluationReport,
    pub attempts: u32,
    /// Remote reporting failed and the report exists only locally
    pub degraded: bool,
}

pub struct EvaluationHarness {
    judges: JudgeSet,
    output_path: PathBuf,
    publisher: Option<Arc<dyn ReportPublisher>>,
}

impl EvaluationHarness {
    pub fn new(judges: JudgeSet) -> Self {
        Self {
            judges,
            output_path: PathBuf::from(DEFAULT_REPORT_PATH),
            publisher: None,
        }
    }

    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = path.into();
        self
    }

    pub fn with_publisher(mut self, publisher: Arc<dyn ReportPublisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Evaluate the records and write the report.
    ///
    /// If publishing fails the whole evaluation runs once more with
    /// publishing disabled, over the same records. Any other failure, or a
    /// failure of the local-only run, is returned. A run in which no judge
    /// scored any row is an evaluation failure.
    pub async fn evaluate(
        &self,
        evaluation_name: &str,
        records: &[EvaluationRecord],
    ) -> Result<EvaluationOutcome> {
        match self
            .attempt(evaluation_name, records, self.publisher.as_deref())
            .await
        {
            Ok(report) => Ok(EvaluationOutcome {
                report,
                attempts: 1,
                degraded: false,
            }),
            Err(Error::ReportingUnavailable(reason)) => {
                warn!(
                    error = %reason,
                    "reporting unavailable, retrying evaluation without remote reporting"
                );
                let report = self.attempt(evaluation_name, records, None).await?;
                Ok(EvaluationOutcome {
                    report,
                    attempts: 2,
                    degraded: true,
                })
            }
            Err(e) => Err(e),
        }
    }

    async fn attempt(
        &self,
        evaluation_name: &str,
        records: &[EvaluationRecord],
        publisher: Option<&dyn ReportPublisher>,
    ) -> Result<EvaluationReport> {
        if self.judges.is_empty() {
            return Err(Error::Evaluation("no judges configured".to_string()));
        }
        if records.is_empty() {
            return Err(Error::Evaluation("no records to evaluate".to_string()));
        }

        info!(
            evaluation = %evaluation_name,
            rows = records.len(),
            judges = self.judges.len(),
            publish = publisher.is_some(),
            "starting evaluation"
        );

        let evaluators = self.score_rows(records).await;
        if evaluators.values().all(|scores| scores.aggregate.is_none()) {
            return Err(Error::Evaluation("no judge produced a score".to_string()));
        }

        let mut report = EvaluationReport {
            run_id: Uuid::new_v4(),
            evaluation_name: evaluation_name.to_string(),
            created_at: Utc::now(),
            evaluators,
            rows: records.to_vec(),
            published_url: None,
        };

        if let Some(publisher) = publisher {
            let url = publisher.publish(&report).await.map_err(|e| match e {
                Error::ReportingUnavailable(_) => e,
                other => Error::ReportingUnavailable(other.to_string()),
            })?;
            report.published_url = Some(url);
        }

        self.write_report(&report).await?;
        Ok(report)
    }

    async fn score_rows(&self, records: &[EvaluationRecord]) -> BTreeMap<String, EvaluatorScores> {
        let mut rows: BTreeMap<&str, Vec<Option<f64>>> = self
            .judges
            .keys()
            .map(|name| (name.as_str(), Vec::with_capacity(records.len())))
            .collect();

        for (index, record) in records.iter().enumerate() {
            for (name, judge) in &self.judges {
                let score = match judge.score(record).await {
                    Ok(score) => Some(score),
                    Err(e) => {
                        warn!(row = index, judge = %name, error = %e, "judge failed");
                        None
                    }
                };
                if let Some(scores) = rows.get_mut(name.as_str()) {
                    scores.push(score);
                }
            }
            debug!(row = index, "row scored");
        }

        self.judges
            .iter()
            .map(|(name, judge)| {
                let scores = rows.remove(name.as_str()).unwrap_or_default();
                (name.clone(), EvaluatorScores::from_rows(judge.metric(), scores))
            })
            .collect()
    }

    async fn write_report(&self, report: &EvaluationReport) -> Result<()> {
        let json = serde_json::to_string_pretty(report)?;
        fs::write(&self.output_path, json).await?;
        info!(path = %self.output_path.display(), "evaluation report written");
        Ok(())
    }
}

/// Load a report written by the harness
pub async fn read_report(path: impl AsRef<Path>) -> Result<EvaluationReport> {
    let content = fs::read_to_string(path.as_ref()).await?;
    Ok(serde_json::from_str(&content)?)
}
