//! Core library for shipping document field extraction.
//!
//! This crate provides:
//! - PDF text extraction (page texts joined into one linear stream)
//! - A rule engine driven by a declarative, JSON-loadable rule table
//! - Batch orchestration with per-document failure isolation
//! - Record and result table models with a fixed column order

pub mod batch;
pub mod error;
pub mod extract;
pub mod models;
pub mod pdf;

pub use batch::{
    BatchEntry, BatchOutcome, BatchProcessor, DocumentFailure, FailureStage, FileTextSource,
    NoProgress, Progress, ProgressSink, TextSource,
};
pub use error::{ExtractionError, PdfError, Result, RuleError, ShipdocError};
pub use extract::rules::{default_rule_table, load_rule_table, RuleTableDef};
pub use extract::{FieldExtractor, RuleEngine};
pub use models::config::ShipdocConfig;
pub use models::record::{FieldName, Record, ResultTable, SOURCE_COLUMN};
pub use pdf::{PdfExtractor, PdfProcessor};
