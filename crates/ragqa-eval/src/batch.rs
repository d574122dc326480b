//! Batch runner: drives a flow over a dataset, one row at a time

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use ragqa_core::{
    DocumentContext, Error, ErrorKind, Flow, FlowInput, FlowOutput, ResponseRecord, Result, Snippet,
};

/// Which flow outputs feed the `answer` and `context` fields of a response record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub answer: String,
    pub context: String,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            answer: "answer".to_string(),
            context: "context".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    /// Abort on the first failed row instead of recording it
    pub fail_fast: bool,
    pub columns: ColumnMapping,
}

/// A row that failed, kept as a copyable kind plus the message
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowFailure {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&Error> for RowFailure {
    fn from(err: &Error) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RowStatus {
    Succeeded { outputs: FlowOutput },
    Failed { failure: RowFailure },
}

/// Result of running the flow on one dataset row
#[derive(Debug, Clone, Serialize)]
pub struct RowOutcome {
    pub index: usize,
    pub input: FlowInput,
    pub status: RowStatus,
}

impl RowOutcome {
    pub fn succeeded(&self) -> bool {
        matches!(self.status, RowStatus::Succeeded { .. })
    }

    pub fn failure(&self) -> Option<&RowFailure> {
        match &self.status {
            RowStatus::Failed { failure } => Some(failure),
            RowStatus::Succeeded { .. } => None,
        }
    }

    pub fn outputs(&self) -> Option<&FlowOutput> {
        match &self.status {
            RowStatus::Succeeded { outputs } => Some(outputs),
            RowStatus::Failed { .. } => None,
        }
    }

    /// Whether the row produced the named output
    pub fn has_output(&self, name: &str) -> bool {
        self.outputs().is_some_and(|outputs| outputs.contains_key(name))
    }
}

/// Per-row presence of the two required outputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ColumnPresence {
    pub index: usize,
    pub answer: bool,
    pub context: bool,
}

/// All row outcomes of one batch, in dataset order
#[derive(Debug, Clone)]
pub struct BatchRun {
    pub rows: Vec<RowOutcome>,
    columns: ColumnMapping,
}

impl BatchRun {
    pub fn succeeded_count(&self) -> usize {
        self.rows.iter().filter(|row| row.succeeded()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.rows.len() - self.succeeded_count()
    }

    pub fn failures(&self) -> impl Iterator<Item = (usize, &RowFailure)> {
        self.rows
            .iter()
            .filter_map(|row| row.failure().map(|failure| (row.index, failure)))
    }

    pub fn presence(&self) -> Vec<ColumnPresence> {
        self.rows
            .iter()
            .map(|row| ColumnPresence {
                index: row.index,
                answer: row.has_output(&self.columns.answer),
                context: row.has_output(&self.columns.context),
            })
            .collect()
    }

    /// Mapped outputs that no succeeded row produced
    pub fn missing_columns(&self) -> Vec<String> {
        [&self.columns.answer, &self.columns.context]
            .into_iter()
            .filter(|column| {
                !self
                    .rows
                    .iter()
                    .any(|row| row.has_output(column.as_str()))
            })
            .cloned()
            .collect()
    }

    /// Normalise succeeded rows into response records
    ///
    /// A mapped output absent from every succeeded row is a configuration
    /// problem and fails the whole batch with `MissingOutputColumns`. A value
    /// missing from a single row is a content problem: it is logged and the
    /// field left empty.
    pub fn into_response_records(self) -> Result<Vec<ResponseRecord>> {
        if self.succeeded_count() == 0 {
            return Err(Error::Batch(format!(
                "all {} rows failed, no outputs to evaluate",
                self.rows.len()
            )));
        }

        let missing = self.missing_columns();
        if !missing.is_empty() {
            return Err(Error::MissingOutputColumns(missing));
        }

        let columns = self.columns;
        let records = self
            .rows
            .into_iter()
            .filter_map(|row| {
                let RowStatus::Succeeded { mut outputs } = row.status else {
                    return None;
                };

                let answer = match outputs.remove(&columns.answer) {
                    Some(Value::String(text)) => text,
                    Some(Value::Null) | None => {
                        warn!(row = row.index, column = %columns.answer, "row has no answer");
                        String::new()
                    }
                    Some(other) => other.to_string(),
                };

                let context = match outputs.remove(&columns.context) {
                    Some(value) => context_from_value(value),
                    None => {
                        warn!(row = row.index, column = %columns.context, "row has no context");
                        DocumentContext::default()
                    }
                };

                Some(ResponseRecord {
                    question: row.input.question,
                    chat_history: row.input.chat_history,
                    answer,
                    context,
                })
            })
            .collect();

        Ok(records)
    }
}

fn context_from_value(value: Value) -> DocumentContext {
    match value {
        Value::Null => DocumentContext::default(),
        Value::String(text) => DocumentContext::new(vec![Snippet::text(text)]),
        Value::Array(items) => items
            .into_iter()
            .map(|item| match serde_json::from_value::<Snippet>(item.clone()) {
                Ok(snippet) => snippet,
                Err(_) => Snippet::text(item.to_string()),
            })
            .collect::<Vec<_>>()
            .into(),
        other => DocumentContext::new(vec![Snippet::text(other.to_string())]),
    }
}

/// Runs a flow once per dataset row, in order
pub struct BatchRunner<'a, F: Flow + ?Sized> {
    flow: &'a F,
    options: BatchOptions,
}

impl<'a, F: Flow + ?Sized> BatchRunner<'a, F> {
    pub fn new(flow: &'a F) -> Self {
        Self {
            flow,
            options: BatchOptions::default(),
        }
    }

    pub fn with_options(mut self, options: BatchOptions) -> Self {
        self.options = options;
        self
    }

    /// Run every row. Row failures are recorded unless `fail_fast` is set.
    pub async fn run(&self, dataset: &[FlowInput]) -> Result<BatchRun> {
        if dataset.is_empty() {
            return Err(Error::InvalidInput("dataset has no rows".to_string()));
        }

        let mut rows = Vec::with_capacity(dataset.len());
        for (index, input) in dataset.iter().enumerate() {
            let status = match self.flow.invoke(input).await {
                Ok(outputs) => RowStatus::Succeeded { outputs },
                Err(e) if self.options.fail_fast => {
                    return Err(e);
                }
                Err(e) => {
                    warn!(row = index, error = %e, "row failed");
                    RowStatus::Failed { failure: RowFailure::from(&e) }
                }
            };

            rows.push(RowOutcome {
                index,
                input: input.clone(),
                status,
            });
        }

        let run = BatchRun {
            rows,
            columns: self.options.columns.clone(),
        };
        info!(
            rows = run.rows.len(),
            succeeded = run.succeeded_count(),
            failed = run.failed_count(),
            "batch finished"
        );
        Ok(run)
    }
}
