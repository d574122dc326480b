//! Command implementations behind the `ragqa` binary

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use ragqa_azure::{AzureAiProjectPublisher, AzureOpenAIClient, AzureSearchRetriever};
use ragqa_core::{Flow, Result};
use ragqa_eval::{
    BatchOptions, BatchRun, BatchRunner, EvaluationHarness, EvaluationOutcome, RowFailure,
    default_judges, evaluation_name, read_dataset, read_evaluation_records, write_responses,
};
use ragqa_rag::{AnswerGenerator, AnswerPipeline, EmptyResultPolicy, PromptTemplate};

use crate::settings::Settings;

pub const DEFAULT_QUESTION: &str = "What is the size of the moon?";
pub const DEFAULT_DATASET_PATH: &str = "evaluations/test-dataset.jsonl";
pub const DEFAULT_RESPONSES_PATH: &str = "responses.jsonl";

/// The answer pipeline wired to Azure services
pub type AzurePipeline = AnswerPipeline<AzureOpenAIClient, AzureSearchRetriever, AzureOpenAIClient>;

/// Options shared by the commands that answer questions
#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    pub policy: EmptyResultPolicy,
    /// Prompt file replacing the built-in template
    pub prompt: Option<PathBuf>,
}

pub fn build_pipeline(settings: &Settings, options: &PipelineOptions) -> Result<AzurePipeline> {
    let search = settings.search()?;
    let embedder = AzureOpenAIClient::new(settings.openai.clone())?;
    let llm = AzureOpenAIClient::new(settings.openai.clone())?;
    let retriever = AzureSearchRetriever::new(search.clone())?;

    let mut generator = AnswerGenerator::new(llm);
    if let Some(path) = &options.prompt {
        generator = generator.with_template(PromptTemplate::load(path)?);
    }

    Ok(AnswerPipeline::new(embedder, retriever, generator)
        .with_index(search.index_name.clone())
        .with_policy(options.policy))
}

/// Harness with the four default judges; `publish` adds the Azure AI project publisher
pub fn build_harness(
    settings: &Settings,
    output: impl Into<PathBuf>,
    publish: bool,
) -> Result<EvaluationHarness> {
    let judge_llm = Arc::new(AzureOpenAIClient::for_evaluation(settings.openai.clone())?);
    let harness = EvaluationHarness::new(default_judges(judge_llm)).with_output_path(output);

    if !publish {
        return Ok(harness);
    }
    let publisher = AzureAiProjectPublisher::new(settings.project.clone())?;
    Ok(harness.with_publisher(Arc::new(publisher)))
}

/// What a batch run produced, kept after its records are written
#[derive(Debug, Clone)]
pub struct BatchSummary {
    pub total: usize,
    pub written: usize,
    pub failures: Vec<(usize, RowFailure)>,
    pub output: PathBuf,
}

impl BatchSummary {
    fn new(run: &BatchRun, output: &Path) -> Self {
        Self {
            total: run.rows.len(),
            written: 0,
            failures: run
                .failures()
                .map(|(index, failure)| (index, failure.clone()))
                .collect(),
            output: output.to_path_buf(),
        }
    }
}

/// Run the flow over a dataset file and write the succeeded rows as responses
pub async fn run_batch<F: Flow + ?Sized>(
    flow: &F,
    data: &Path,
    output: &Path,
    options: BatchOptions,
) -> Result<BatchSummary> {
    info!(data = %data.display(), "running batch");
    let dataset = read_dataset(data).await?;
    let run = BatchRunner::new(flow).with_options(options).run(&dataset).await?;

    let mut summary = BatchSummary::new(&run, output);
    for (index, failure) in &summary.failures {
        warn!(row = index + 1, kind = ?failure.kind, "row skipped: {}", failure.message);
    }

    let records = run.into_response_records()?;
    write_responses(output, &records).await?;
    summary.written = records.len();

    info!(output = %output.display(), rows = summary.written, "responses written");
    Ok(summary)
}

/// Evaluate a response file under the run prefix's evaluation name
pub async fn evaluate_responses(
    harness: &EvaluationHarness,
    data: &Path,
    prefix: &str,
) -> Result<EvaluationOutcome> {
    let records = read_evaluation_records(data).await?;
    harness.evaluate(&evaluation_name(prefix), &records).await
}
