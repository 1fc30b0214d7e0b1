//! Error types for the zonex-core library.

use thiserror::Error;

/// Main error type for the zonex library.
#[derive(Error, Debug)]
pub enum ZonexError {
    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// Invalid zone definition.
    #[error("zone error: {0}")]
    Zone(#[from] ZoneError),

    /// Image processing error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to read the text layer.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// Failed to extract images from PDF.
    #[error("failed to extract images: {0}")]
    ImageExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),
}

/// Errors related to zone definitions.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ZoneError {
    /// Width or height is zero, negative or not finite.
    #[error("zone {id} has a non-positive size ({width}x{height})")]
    NonPositiveSize { id: String, width: f64, height: f64 },

    /// Page numbers start at 1.
    #[error("zone {id} references page 0")]
    InvalidPage { id: String },

    /// The zone tag is not one of the known kind/variant pairs.
    #[error("unknown zone tag: {0}")]
    UnknownTag(String),
}

/// Result type for the zonex library.
pub type Result<T> = std::result::Result<T, ZonexError>;
