//! Data models: zones, extraction records, agent summaries and configuration.

pub mod agent;
pub mod config;
pub mod record;
pub mod zone;

pub use agent::{
    AgentSummary, BatchResult, DocumentOutcome, DocumentStatus, ExportRow, Observation,
    ProcessingResult,
};
pub use config::{ExtractionConfig, OcrHints, PdfConfig, ZonexConfig};
pub use record::{ExtractionRecord, FieldSlots, Resolution, UNREADABLE};
pub use zone::{CanvasTransform, FieldKind, FormVariant, Rect, Zone, ZoneTag};
