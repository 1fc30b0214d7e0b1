//! Page-wide pattern search, the last resort when positional extraction
//! finds nothing.

use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use tracing::debug;

use super::cleaner::leading_decimal;
use crate::models::{ExtractionConfig, FieldKind};

lazy_static! {
    /// Whole words of two or more upper-case letters, accents included.
    pub static ref UPPERCASE_WORD: Regex = Regex::new(
        r"\b[A-ZÀ-ÖØ-ÞŸ]{2,}\b"
    ).unwrap();

    /// Capitalized words: one upper-case letter then two or more lower-case.
    pub static ref CAPITALIZED_WORD: Regex = Regex::new(
        r"\b[A-ZÀ-ÖØ-ÞŸ][a-zà-öø-ÿ]{2,}\b"
    ).unwrap();

    /// Decimal numbers with an optional euro sign.
    pub static ref AMOUNT_CANDIDATE: Regex = Regex::new(
        r"[0-9]+[,.]?[0-9]*\s*€?|[0-9]+\s*€"
    ).unwrap();

    static ref AMOUNT_NOISE: Regex = Regex::new(r"[€\s,]").unwrap();
}

/// Heuristic extractor working on the full text of a page.
///
/// It never fails: no match is an empty result.
#[derive(Debug, Clone)]
pub struct PatternExtractor {
    stoplist: Vec<String>,
    amount_min: Decimal,
    amount_max: Decimal,
}

impl PatternExtractor {
    pub fn new(config: &ExtractionConfig) -> Self {
        Self {
            stoplist: config.name_stoplist.clone(),
            amount_min: config.amount_min,
            amount_max: config.amount_max,
        }
    }

    /// Search `page_text` for a value of the given field.
    pub fn extract(&self, kind: FieldKind, page_text: &str) -> Option<String> {
        let found = match kind {
            FieldKind::Name => self.find_name(page_text),
            FieldKind::FirstName => self.find_first_name(page_text),
            FieldKind::Amount => self.find_amount(page_text),
        };
        if let Some(value) = found {
            debug!("Pattern search found {} candidate {:?}", kind, value);
        }
        found.map(str::to_string)
    }

    /// First upper-case word that is not form boilerplate.
    pub fn find_name<'a>(&self, text: &'a str) -> Option<&'a str> {
        UPPERCASE_WORD
            .find_iter(text)
            .map(|m| m.as_str())
            .find(|word| !self.stoplist.iter().any(|stop| stop.as_str() == *word))
    }

    /// First capitalized word.
    pub fn find_first_name<'a>(&self, text: &'a str) -> Option<&'a str> {
        CAPITALIZED_WORD.find(text).map(|m| m.as_str())
    }

    /// First number whose value is within the accepted amount range.
    pub fn find_amount<'a>(&self, text: &'a str) -> Option<&'a str> {
        AMOUNT_CANDIDATE
            .find_iter(text)
            .map(|m| m.as_str())
            .find(|candidate| {
                let normalized = AMOUNT_NOISE.replace_all(candidate, ".");
                leading_decimal(&normalized)
                    .is_some_and(|value| value >= self.amount_min && value <= self.amount_max)
            })
    }
}

impl Default for PatternExtractor {
    fn default() -> Self {
        Self::new(&ExtractionConfig::default())
    }
}
