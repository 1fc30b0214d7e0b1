//! Configuration structures for the extraction pipeline.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ZonexError;

/// Main configuration for the zonex pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ZonexConfig {
    /// Zone matching and fallback configuration.
    pub extraction: ExtractionConfig,

    /// Hints forwarded to an OCR-capable collaborator.
    pub ocr: OcrHints,

    /// PDF handling configuration.
    pub pdf: PdfConfig,
}

/// Zone matching and fallback configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Slack around a zone when testing fragment positions.
    pub tolerance: f64,

    /// Horizontal growth on each side for the second attempt.
    pub expand_x: f64,

    /// Vertical growth on each side for the second attempt.
    pub expand_y: f64,

    /// Smallest amount the page-wide search accepts.
    pub amount_min: Decimal,

    /// Largest amount the page-wide search accepts.
    pub amount_max: Decimal,

    /// Upper-case form words that are never taken for a last name.
    pub name_stoplist: Vec<String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            tolerance: 10.0,
            expand_x: 20.0,
            expand_y: 10.0,
            amount_min: Decimal::ONE,
            amount_max: Decimal::new(10_000, 0),
            name_stoplist: [
                "VERIFIE",
                "PAIE",
                "TOTAL",
                "PAYER",
                "REMPLIR",
                "BENEFICIAIRE",
                "FRAIS",
                "DEPLACEMENT",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

/// Hints for OCR-capable collaborators; the text-layer core ignores them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrHints {
    /// Tesseract-style language code.
    pub language: String,

    /// Enhance scanned images before recognition or rendering.
    pub enhance_image: bool,
}

impl Default for OcrHints {
    fn default() -> Self {
        Self {
            language: "fra".to_string(),
            enhance_image: true,
        }
    }
}

/// PDF handling configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Scale the zone editor renders pages at.
    pub render_scale: f64,

    /// Maximum pages to read (0 = unlimited). Zones beyond it are unreadable.
    pub max_pages: u32,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            render_scale: 1.5,
            max_pages: 0,
        }
    }
}

impl ZonexConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }

    /// Reject settings the pipeline cannot work with.
    pub fn validate(&self) -> crate::Result<()> {
        let extraction = &self.extraction;
        let margins = [
            ("extraction.tolerance", extraction.tolerance),
            ("extraction.expand_x", extraction.expand_x),
            ("extraction.expand_y", extraction.expand_y),
        ];
        for (key, value) in margins {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ZonexError::Config(format!(
                    "{} must be a non-negative number, got {}",
                    key, value
                )));
            }
        }
        if extraction.amount_min > extraction.amount_max {
            return Err(ZonexError::Config(format!(
                "extraction.amount_min ({}) exceeds extraction.amount_max ({})",
                extraction.amount_min, extraction.amount_max
            )));
        }
        if !(self.pdf.render_scale.is_finite() && self.pdf.render_scale > 0.0) {
            return Err(ZonexError::Config(format!(
                "pdf.render_scale must be positive, got {}",
                self.pdf.render_scale
            )));
        }
        Ok(())
    }

    /// Whether `page` is within the configured page limit.
    pub fn page_allowed(&self, page: u32) -> bool {
        self.pdf.max_pages == 0 || page <= self.pdf.max_pages
    }
}
