//! Shipping document field extraction module.

mod engine;
pub mod normalize;
pub mod rules;

pub use engine::RuleEngine;

use crate::error::ExtractionError;
use crate::models::record::Record;

/// Result type for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractionError>;

/// Trait for document field extractors.
pub trait FieldExtractor {
    /// Extract a record from a document's plain text.
    fn extract_from_text(&self, text: &str) -> Result<Record>;
}
