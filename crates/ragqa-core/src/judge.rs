//! Quality judge trait

use async_trait::async_trait;

use crate::{EvaluationRecord, Result};

/// A component that rates one question/answer/context triple
#[async_trait]
pub trait Judge: Send + Sync {
    /// Name of the metric this judge reports, e.g. `gpt_fluency`
    fn metric(&self) -> &str;

    /// Score a single record
    async fn score(&self, record: &EvaluationRecord) -> Result<f64>;
}
