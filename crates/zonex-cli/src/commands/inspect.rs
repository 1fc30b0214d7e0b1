//! Inspect command - dump positioned text to help place zones.

use std::path::PathBuf;

use clap::Args;
use console::style;
use serde::Serialize;
use tracing::warn;

use zonex_core::{PdfExtractor, TextFragment, TextLayer};

/// Arguments for the inspect command.
#[derive(Args)]
pub struct InspectArgs {
    /// Input PDF
    #[arg(required = true)]
    input: PathBuf,

    /// Only this page (1-indexed)
    #[arg(short, long)]
    page: Option<u32>,

    /// Print JSON instead of a listing
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct PageDump {
    page: u32,
    fragments: Vec<TextFragment>,
}

pub async fn run(args: InspectArgs) -> anyhow::Result<()> {
    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let document = PdfExtractor::open(&args.input)?;
    let page_count = document.page_count();

    let pages: Vec<u32> = match args.page {
        Some(page) if page == 0 || page > page_count => {
            anyhow::bail!("Page {} out of range (document has {} pages)", page, page_count)
        }
        Some(page) => vec![page],
        None => (1..=page_count).collect(),
    };

    let mut dumps = Vec::with_capacity(pages.len());
    for page in pages {
        match document.page_fragments(page).await {
            Ok(fragments) => dumps.push(PageDump { page, fragments }),
            Err(e) => warn!("Page {} has no readable text: {}", page, e),
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&dumps)?);
        return Ok(());
    }

    for dump in &dumps {
        println!(
            "{} ({} fragments)",
            style(format!("Page {}", dump.page)).bold(),
            dump.fragments.len()
        );
        for fragment in dump.fragments.iter().filter(|f| !f.is_blank()) {
            println!("  {:>8.1} {:>8.1}  {}", fragment.x, fragment.y, fragment.text);
        }
    }

    Ok(())
}
