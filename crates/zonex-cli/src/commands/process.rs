//! Process command - extract agents from a single PDF.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use zonex_core::models::ExportRow;
use zonex_core::{AgentSummary, Pipeline, ProcessingResult};

use super::config::load_config;
use super::zones::load_zones;

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input PDF
    #[arg(required = true)]
    input: PathBuf,

    /// Zones file (JSON array)
    #[arg(short, long)]
    zones: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Hide the progress bar
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text table
    Text,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }
    let zones = load_zones(&args.zones)?;

    info!("Processing file: {}", args.input.display());

    let pb = progress_bar(args.quiet);
    let mut progress = |percent: f32, status: &str| {
        pb.set_position(percent.round() as u64);
        pb.set_message(status.to_string());
    };

    let data = fs::read(&args.input)?;
    let result = Pipeline::new(config)
        .process_pdf(&data, &zones, &mut progress)
        .await?;

    pb.finish_and_clear();

    let output = format_result(&result, args.format)?;
    write_output(&output, args.output.as_ref())?;

    eprintln!(
        "{} {} agents from {}/{} pages",
        style("ℹ").blue(),
        result.agents.len(),
        result.processed_pages,
        result.total_pages
    );
    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

/// Progress bar fed with percentages, hidden when `quiet`.
pub fn progress_bar(quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(100);
    if let Ok(bar_style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos:>3}% {msg}")
    {
        pb.set_style(bar_style.progress_chars("##-"));
    }
    pb
}

pub fn write_output(output: &str, path: Option<&PathBuf>) -> anyhow::Result<()> {
    if let Some(output_path) = path {
        fs::write(output_path, output)?;
        eprintln!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }
    Ok(())
}

fn format_result(result: &ProcessingResult, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(result)?),
        OutputFormat::Csv => format_csv(&result.agents),
        OutputFormat::Text => Ok(format_text(&result.agents)),
    }
}

/// One CSV row per agent, with the export header.
pub fn format_csv<'a>(agents: impl IntoIterator<Item = &'a AgentSummary>) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record(ExportRow::HEADERS)?;
    for agent in agents {
        wtr.write_record(agent.export_row().as_record())?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

/// Aligned text table of the export rows.
pub fn format_text<'a>(agents: impl IntoIterator<Item = &'a AgentSummary>) -> String {
    let rows: Vec<ExportRow> = agents.into_iter().map(|a| a.export_row()).collect();
    if rows.is_empty() {
        return "No agents found.".to_string();
    }

    let mut widths = ExportRow::HEADERS.map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row.as_record()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let render = |cells: [&str; 6]| {
        cells
            .iter()
            .zip(widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = width))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut output = String::new();
    output.push_str(&render(ExportRow::HEADERS));
    output.push('\n');
    output.push_str(
        &widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("  "),
    );
    for row in &rows {
        output.push('\n');
        output.push_str(&render(row.as_record()));
    }
    output
}
