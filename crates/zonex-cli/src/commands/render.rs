//! Render command - write the scanned image behind a page.

use std::path::PathBuf;

use clap::Args;
use console::style;
use tracing::debug;

use zonex_core::pdf::save_page_image;
use zonex_core::{PageEnhancer, PdfExtractor, TextLayer};

use super::config::load_config;

/// Arguments for the render command.
#[derive(Args)]
pub struct RenderArgs {
    /// Input PDF
    #[arg(required = true)]
    input: PathBuf,

    /// Page to render (1-indexed)
    #[arg(short, long, default_value = "1")]
    page: u32,

    /// Output image (format from the extension)
    #[arg(short, long)]
    output: PathBuf,

    /// Grayscale and stretch contrast (default: ocr.enhance_image)
    #[arg(long)]
    enhance: bool,

    /// Write the image as embedded, even if the config enables enhancement
    #[arg(long, conflicts_with = "enhance")]
    raw: bool,
}

pub fn run(args: RenderArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let document = PdfExtractor::open(&args.input)?;
    if args.page == 0 || args.page > document.page_count() {
        anyhow::bail!(
            "Page {} out of range (document has {} pages)",
            args.page,
            document.page_count()
        );
    }

    let enhance = args.enhance || (config.ocr.enhance_image && !args.raw);
    debug!("Rendering page {} (enhance: {})", args.page, enhance);
    let enhancer = PageEnhancer::new();
    save_page_image(
        &document,
        args.page,
        enhance.then_some(&enhancer),
        &args.output,
    )?;

    println!(
        "{} Page {} written to {}",
        style("✓").green(),
        args.page,
        args.output.display()
    );

    Ok(())
}
