//! Terminal output for the CLI

use colored::*;
use std::path::Path;

use ragqa_core::{EvaluationReport, ResponseRecord, Result};
use ragqa_eval::EvaluationOutcome;

use crate::commands::BatchSummary;
use crate::settings::Settings;

const BANNER_WIDTH: usize = 60;
const NOT_SET: &str = "(not set)";

/// Label/value pairs shown in the configuration banner. Secrets never appear here.
pub fn banner_lines(settings: &Settings) -> Vec<(&'static str, String)> {
    let project = &settings.project;
    let shown = |value: &Option<String>| value.clone().unwrap_or_else(|| NOT_SET.to_string());

    vec![
        ("Location", shown(&project.location)),
        ("Subscription", shown(&project.subscription_id)),
        ("Resource group", shown(&project.resource_group)),
        ("Project", shown(&project.project_name)),
        (
            "Search index",
            settings
                .search
                .as_ref()
                .map(|search| search.index_name.clone())
                .unwrap_or_else(|| NOT_SET.to_string()),
        ),
        ("Prefix", settings.prefix.clone()),
    ]
}

/// Display the configuration banner
pub fn display_banner(settings: &Settings) {
    let inner = BANNER_WIDTH - 2;
    let title = "RAGQA - Retrieval QA Evaluation";

    println!();
    println!("{}", format!("┌{}┐", "─".repeat(inner)).blue());
    println!(
        "{}{}{}{}",
        "│  ".blue(),
        title.blue().bold(),
        " ".repeat(inner.saturating_sub(title.len() + 2)),
        "│".blue()
    );
    println!("{}", format!("│{}│", " ".repeat(inner)).blue());

    for (label, value) in banner_lines(settings) {
        let line = format!("{:<16}{}", format!("{}:", label), value);
        println!(
            "{}{}{}{}",
            "│  ".blue(),
            line,
            " ".repeat(inner.saturating_sub(line.chars().count() + 2)),
            "│".blue()
        );
    }

    println!("{}", format!("└{}┘", "─".repeat(inner)).blue());
    println!();
}

/// Print one answered question as JSON
pub fn print_response(record: &ResponseRecord) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(record)?);
    Ok(())
}

pub fn print_batch_summary(summary: &BatchSummary) {
    println!(
        "{} {} of {} rows written to {}",
        "✅".green(),
        summary.written,
        summary.total,
        summary.output.display()
    );

    if summary.failures.is_empty() {
        return;
    }
    println!("{} {} rows failed:", "⚠️".yellow(), summary.failures.len());
    for (index, failure) in &summary.failures {
        println!("  {} row {}: {}", "•".yellow(), index + 1, failure.message);
    }
}

/// Plain-text table of evaluator aggregates
pub fn score_table(report: &EvaluationReport) -> String {
    let mut table = format!("{:<14} {:<18} {:>7} {:>7}\n", "Evaluator", "Metric", "Score", "Failed");
    for (name, scores) in &report.evaluators {
        let aggregate = scores
            .aggregate
            .map(|value| format!("{:.2}", value))
            .unwrap_or_else(|| "n/a".to_string());
        table.push_str(&format!(
            "{:<14} {:<18} {:>7} {:>7}\n",
            name, scores.metric, aggregate, scores.failed_rows
        ));
    }
    table
}

pub fn print_evaluation(outcome: &EvaluationOutcome, output: &Path) {
    let report = &outcome.report;
    println!("{}", report.evaluation_name.bold());
    print!("{}", score_table(report));
    println!();
    println!("{} Report written to {}", "📄".cyan(), output.display());

    match (&report.published_url, outcome.degraded) {
        (Some(url), _) => println!("{} Published: {}", "🔗".green(), url),
        (None, true) => println!(
            "{} Remote reporting unavailable, evaluation was rerun locally",
            "⚠️".yellow()
        ),
        (None, false) => println!("{}", "Remote reporting disabled".dimmed()),
    }
}
