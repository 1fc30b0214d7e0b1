//! Core library for zone-based extraction from scanned expense forms.
//!
//! This crate provides:
//! - PDF text layer access (positioned text fragments, embedded scan images)
//! - Three-tier zone extraction: direct, expanded, page-wide patterns
//! - Aggregation of per-zone records into per-person totals
//! - Document and batch pipelines with progress reporting

pub mod aggregation;
pub mod error;
pub mod extraction;
pub mod models;
pub mod pdf;
pub mod pipeline;

pub use aggregation::AgentAggregator;
pub use error::{PdfError, Result, ZoneError, ZonexError};
pub use extraction::{ZoneExtractionEngine, clean_name, parse_amount};
pub use models::{
    AgentSummary, BatchResult, CanvasTransform, ExtractionRecord, FieldKind, FormVariant,
    Observation, ProcessingResult, Rect, Zone, ZoneTag, ZonexConfig,
};
pub use pdf::{PageEnhancer, StaticTextLayer, TextFragment, TextLayer};
#[cfg(feature = "native")]
pub use pdf::PdfExtractor;
pub use pipeline::{NoProgress, Pipeline, ProgressReporter};
#[cfg(feature = "native")]
pub use pipeline::{process_batch, process_pdf};
