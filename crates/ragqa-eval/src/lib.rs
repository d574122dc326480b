//! Batch runner and quality evaluation harness for RAGQA
//!
//! The batch runner drives a [`Flow`](ragqa_core::Flow) over a JSON Lines
//! dataset and normalises its outputs into response records. The harness
//! scores those records with a set of judges and writes a report, falling
//! back to a local-only run when remote reporting is unavailable.

pub mod batch;
pub mod dataset;
pub mod harness;
pub mod judges;

#[cfg(test)]
mod tests;

pub use batch::{
    BatchOptions, BatchRun, BatchRunner, ColumnMapping, ColumnPresence, RowFailure, RowOutcome,
    RowStatus,
};
pub use dataset::{
    parse_jsonl, read_dataset, read_evaluation_records, to_jsonl, write_responses,
};
pub use harness::{
    DEFAULT_REPORT_PATH, EvaluationHarness, EvaluationOutcome, evaluation_name, read_report,
};
pub use judges::{JudgeKind, JudgeSet, PromptJudge, default_judges, parse_rating};

// Re-export core types for convenience
pub use ragqa_core::{Error, EvaluationRecord, EvaluationReport, Judge, Result};
