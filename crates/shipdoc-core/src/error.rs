//! Error types for the shipdoc-core library.

use std::path::PathBuf;

use thiserror::Error;

use crate::models::record::FieldName;

/// Main error type for the shipdoc library.
#[derive(Error, Debug)]
pub enum ShipdocError {
    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// Rule table loading or compilation error.
    #[error("rule table error: {0}")]
    Rules(#[from] RuleError),

    /// Field extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The input file type has no text extractor.
    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),

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

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,
}

/// Errors raised while loading, validating or compiling a rule table.
#[derive(Error, Debug)]
pub enum RuleError {
    /// The rule table file could not be read or parsed.
    #[error("failed to load rule table {path}: {reason}")]
    Load { path: PathBuf, reason: String },

    /// The rule table is structurally invalid.
    #[error("invalid rule table: {0}")]
    Invalid(String),

    /// A matcher could not be compiled into a pattern.
    #[error("invalid pattern for {field}: {reason}")]
    Pattern { field: FieldName, reason: String },
}

/// Errors related to field extraction from document text.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// The extractor could not process the document text.
    #[error("field extraction failed: {0}")]
    Engine(String),
}

/// Result type for the shipdoc library.
pub type Result<T> = std::result::Result<T, ShipdocError>;
