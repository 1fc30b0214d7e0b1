//! CLI application for zone-based extraction from scanned expense forms.

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{batch, config, inspect, process, render, zones};

/// zonex - Read names and amounts out of fixed zones on scanned PDF forms
#[derive(Parser)]
#[command(name = "zonex")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract zones from a single PDF
    Process(process::ProcessArgs),

    /// Extract zones from several PDFs
    Batch(batch::BatchArgs),

    /// Dump the positioned text of a PDF
    Inspect(inspect::InspectArgs),

    /// Write the scanned image of a page
    Render(render::RenderArgs),

    /// Check and convert zone files
    Zones(zones::ZonesArgs),

    /// Manage configuration
    Config(config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Process(args) => process::run(args, config_path).await,
        Commands::Batch(args) => batch::run(args, config_path).await,
        Commands::Inspect(args) => inspect::run(args).await,
        Commands::Render(args) => render::run(args, config_path),
        Commands::Zones(args) => zones::run(args, config_path),
        Commands::Config(args) => config::run(args, config_path),
    }
}
