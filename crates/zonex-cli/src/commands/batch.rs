//! Batch command - extract agents from several PDFs into one export.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use serde::Serialize;
use tracing::{debug, error, warn};

use zonex_core::{BatchResult, Pipeline};

use super::config::load_config;
use super::process::{OutputFormat, format_csv, format_text, progress_bar, write_output};
use super::zones::load_zones;

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Zones file shared by every document
    #[arg(short, long)]
    zones: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "csv")]
    format: OutputFormat,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,

    /// Hide the progress bar
    #[arg(short, long)]
    quiet: bool,
}

/// JSON export of a batch run.
#[derive(Serialize)]
struct BatchReport<'a> {
    generated_at: String,
    #[serde(flatten)]
    batch: &'a BatchResult,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = load_config(config_path)?;
    let zones = load_zones(&args.zones)?;

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
        })
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    eprintln!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    let mut documents = Vec::with_capacity(files.len());
    for path in &files {
        let name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("document.pdf")
            .to_string();
        match fs::read(path) {
            Ok(data) => documents.push((name, data)),
            Err(e) if args.continue_on_error => {
                warn!("Skipping {}: {}", path.display(), e);
            }
            Err(e) => {
                error!("Failed to read {}: {}", path.display(), e);
                anyhow::bail!("Failed to read {}: {}", path.display(), e);
            }
        }
    }

    let pb = progress_bar(args.quiet);
    let mut progress = |percent: f32, status: &str| {
        pb.set_position(percent.round() as u64);
        pb.set_message(status.to_string());
    };

    let batch = Pipeline::new(config)
        .process_batch(&documents, &zones, &mut progress)
        .await;

    pb.finish_and_clear();

    let failures: Vec<(&str, &str)> = batch.failures().collect();
    if !failures.is_empty() && !args.continue_on_error {
        for (name, message) in &failures {
            error!("Failed to process {}: {}", name, message);
        }
        anyhow::bail!(
            "Processing failed for {} of {} files (use --continue-on-error to export the rest)",
            failures.len(),
            batch.documents.len()
        );
    }

    let output = match args.format {
        OutputFormat::Json => serde_json::to_string_pretty(&BatchReport {
            generated_at: chrono::Local::now().to_rfc3339(),
            batch: &batch,
        })?,
        OutputFormat::Csv => format_csv(batch.agents())?,
        OutputFormat::Text => format_text(batch.agents()),
    };
    debug!("Rendered {} output", args.format.extension());
    write_output(&output, args.output.as_ref())?;

    eprintln!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        batch.documents.len(),
        start.elapsed()
    );
    eprintln!(
        "   {} successful, {} failed, {} agents",
        style(batch.processed_count()).green(),
        style(failures.len()).red(),
        batch.agents().count()
    );

    if !failures.is_empty() {
        eprintln!();
        eprintln!("{}", style("Failed files:").red());
        for (name, message) in &failures {
            eprintln!("  - {}: {}", name, message);
        }
    }

    Ok(())
}
