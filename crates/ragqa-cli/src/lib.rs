//! Settings, commands and terminal output for the RAGQA binary

mod commands;
mod settings;
mod ui;


pub use commands::{
    AzurePipeline, BatchSummary, DEFAULT_DATASET_PATH, DEFAULT_QUESTION, DEFAULT_RESPONSES_PATH,
    PipelineOptions, build_harness, build_pipeline, evaluate_responses, run_batch,
};
pub use settings::{MAX_PREFIX_LEN, Settings, default_prefix};
pub use ui::{
    banner_lines, display_banner, print_batch_summary, print_evaluation, print_response,
    score_table,
};

// Re-export core types
pub use ragqa_core::{Error, Result};
pub use ragqa_eval::{BatchOptions, DEFAULT_REPORT_PATH};
pub use ragqa_rag::EmptyResultPolicy;
