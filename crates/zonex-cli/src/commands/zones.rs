//! Zones command - validate and convert zone files.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use console::style;
use tracing::debug;

use zonex_core::{CanvasTransform, Zone};

use super::config::load_config;

/// Arguments for the zones command.
#[derive(Args)]
pub struct ZonesArgs {
    #[command(subcommand)]
    command: ZonesCommand,
}

#[derive(Subcommand)]
enum ZonesCommand {
    /// Validate a zones file
    Check {
        /// Zones file (JSON array)
        file: PathBuf,
    },

    /// Convert zones drawn on a scaled canvas to reference units
    Scale(ScaleArgs),
}

#[derive(Args)]
struct ScaleArgs {
    /// Zones file in canvas units
    file: PathBuf,

    /// Canvas scale the zones were drawn at (default: pdf.render_scale)
    #[arg(long)]
    from_scale: Option<f64>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

pub fn run(args: ZonesArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    match args.command {
        ZonesCommand::Check { file } => check_zones(&file),
        ZonesCommand::Scale(scale_args) => scale_zones(scale_args, config_path),
    }
}

/// Read a zones file without validating it.
fn read_zones(path: &Path) -> anyhow::Result<Vec<Zone>> {
    if !path.exists() {
        anyhow::bail!("Zones file not found: {}", path.display());
    }
    let content = fs::read_to_string(path)?;
    let zones: Vec<Zone> = serde_json::from_str(&content)
        .map_err(|e| anyhow::anyhow!("Invalid zones file {}: {}", path.display(), e))?;
    debug!("Read {} zones from {}", zones.len(), path.display());
    Ok(zones)
}

/// Read and validate a zones file.
pub fn load_zones(path: &Path) -> anyhow::Result<Vec<Zone>> {
    let zones = read_zones(path)?;
    for zone in &zones {
        zone.validate()?;
    }
    Ok(zones)
}

fn check_zones(path: &Path) -> anyhow::Result<()> {
    let zones = read_zones(path)?;

    let mut errors = Vec::new();
    let mut seen_ids = HashSet::new();
    for zone in &zones {
        if let Err(e) = zone.validate() {
            errors.push(e.to_string());
        }
        if !seen_ids.insert(zone.id.as_str()) {
            eprintln!(
                "{} Duplicate zone id {}",
                style("⚠").yellow(),
                zone.id
            );
        }
    }

    if !errors.is_empty() {
        eprintln!("{}", style("Invalid zones:").red());
        for error in &errors {
            eprintln!("  - {}", error);
        }
        anyhow::bail!("{} of {} zones are invalid", errors.len(), zones.len());
    }

    let pages: HashSet<u32> = zones.iter().map(|z| z.page).collect();
    println!(
        "{} {} zones on {} pages are valid",
        style("✓").green(),
        zones.len(),
        pages.len()
    );
    for zone in &zones {
        println!(
            "  {:<12} {:<14} page {:<3} x={:.1} y={:.1} w={:.1} h={:.1}",
            zone.id,
            zone.tag().to_string(),
            zone.page,
            zone.rect.x,
            zone.rect.y,
            zone.rect.width,
            zone.rect.height
        );
    }

    Ok(())
}

fn scale_zones(args: ScaleArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let scale = match args.from_scale {
        Some(scale) => scale,
        None => load_config(config_path)?.pdf.render_scale,
    };
    if !(scale.is_finite() && scale > 0.0) {
        anyhow::bail!("Canvas scale must be positive, got {}", scale);
    }

    let transform = CanvasTransform::new(scale);
    let zones: Vec<Zone> = read_zones(&args.file)?
        .into_iter()
        .map(|mut zone| {
            zone.rect = transform.to_reference(zone.rect);
            zone
        })
        .collect();
    debug!("Scaled {} zones by 1/{}", zones.len(), scale);

    let output = serde_json::to_string_pretty(&zones)?;
    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Wrote {} zones to {}",
            style("✓").green(),
            zones.len(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    Ok(())
}
