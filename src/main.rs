use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use ragqa_cli::{
    BatchOptions, DEFAULT_DATASET_PATH, DEFAULT_QUESTION, DEFAULT_REPORT_PATH,
    DEFAULT_RESPONSES_PATH, EmptyResultPolicy, PipelineOptions, Settings, build_harness,
    build_pipeline, display_banner, evaluate_responses, print_batch_summary, print_evaluation,
    print_response, run_batch,
};

#[derive(Parser)]
#[command(name = "ragqa")]
#[command(about = "Retrieval-augmented question answering with quality evaluation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a single question
    Ask {
        question: Option<String>,
        #[command(flatten)]
        pipeline: PipelineArgs,
    },
    /// Answer every question in a dataset and write the responses
    Run {
        #[arg(long, default_value = DEFAULT_DATASET_PATH)]
        data: PathBuf,
        #[arg(long, default_value = DEFAULT_RESPONSES_PATH)]
        output: PathBuf,
        #[command(flatten)]
        pipeline: PipelineArgs,
        #[command(flatten)]
        batch: BatchArgs,
    },
    /// Evaluate a response file with the quality judges
    Evaluate {
        #[arg(long, default_value = DEFAULT_RESPONSES_PATH)]
        data: PathBuf,
        #[arg(long, default_value = DEFAULT_REPORT_PATH)]
        output: PathBuf,
        /// Keep the report local
        #[arg(long)]
        no_publish: bool,
    },
    /// Run the dataset, then evaluate the responses
    All {
        #[command(flatten)]
        pipeline: PipelineArgs,
        #[command(flatten)]
        batch: BatchArgs,
        #[arg(long)]
        no_publish: bool,
    },
}

#[derive(Args, Default)]
struct PipelineArgs {
    /// Fail on an empty search result or an empty answer
    #[arg(long)]
    strict: bool,
    /// Prompt template file
    #[arg(long)]
    prompt: Option<PathBuf>,
}

impl PipelineArgs {
    fn options(&self) -> PipelineOptions {
        PipelineOptions {
            policy: if self.strict {
                EmptyResultPolicy::Strict
            } else {
                EmptyResultPolicy::Tolerant
            },
            prompt: self.prompt.clone(),
        }
    }
}

#[derive(Args, Default)]
struct BatchArgs {
    /// Stop at the first failed row
    #[arg(long)]
    fail_fast: bool,
}

impl BatchArgs {
    fn options(&self) -> BatchOptions {
        BatchOptions {
            fail_fast: self.fail_fast,
            ..Default::default()
        }
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_tracing();
    let cli = Cli::parse();

    match dispatch(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn dispatch(cli: Cli) -> Result<()> {
    let settings = Settings::from_env().context("failed to load configuration")?;
    display_banner(&settings);

    match cli.command.unwrap_or(Commands::All {
        pipeline: PipelineArgs::default(),
        batch: BatchArgs::default(),
        no_publish: false,
    }) {
        Commands::Ask { question, pipeline } => {
            ask(&settings, question.as_deref().unwrap_or(DEFAULT_QUESTION), &pipeline).await
        }
        Commands::Run {
            data,
            output,
            pipeline,
            batch,
        } => run(&settings, &data, &output, &pipeline, &batch).await,
        Commands::Evaluate {
            data,
            output,
            no_publish,
        } => evaluate(&settings, &data, &output, !no_publish).await,
        Commands::All {
            pipeline,
            batch,
            no_publish,
        } => {
            let data = Path::new(DEFAULT_DATASET_PATH);
            let responses = Path::new(DEFAULT_RESPONSES_PATH);
            run(&settings, data, responses, &pipeline, &batch).await?;
            evaluate(&settings, responses, Path::new(DEFAULT_REPORT_PATH), !no_publish).await
        }
    }
}

async fn ask(settings: &Settings, question: &str, args: &PipelineArgs) -> Result<()> {
    let pipeline = build_pipeline(settings, &args.options())?;
    let record = pipeline.respond(question, Vec::new()).await?;
    print_response(&record)?;
    Ok(())
}

async fn run(
    settings: &Settings,
    data: &Path,
    output: &Path,
    pipeline: &PipelineArgs,
    batch: &BatchArgs,
) -> Result<()> {
    let pipeline = build_pipeline(settings, &pipeline.options())?;
    let summary = run_batch(&pipeline, data, output, batch.options())
        .await
        .with_context(|| format!("batch run over {} failed", data.display()))?;
    print_batch_summary(&summary);
    Ok(())
}

async fn evaluate(settings: &Settings, data: &Path, output: &Path, publish: bool) -> Result<()> {
    let harness = build_harness(settings, output, publish)?;
    let outcome = evaluate_responses(&harness, data, &settings.prefix)
        .await
        .with_context(|| format!("evaluation of {} failed", data.display()))?;

    info!(attempts = outcome.attempts, degraded = outcome.degraded, "evaluation finished");
    print_evaluation(&outcome, output);
    Ok(())
}
