//! Zone extraction: geometric matching, pattern fallback and field cleaning.

pub mod cleaner;
pub mod engine;
pub mod matcher;
pub mod patterns;

pub use cleaner::{clean_amount, clean_field, clean_name, format_amount, parse_amount};
pub use engine::{ZoneExtractionEngine, ZoneOutcome};
pub use matcher::ZoneMatcher;
pub use patterns::PatternExtractor;
