//! Batch orchestration: many documents in, one result table out.
//!
//! Documents are processed one at a time in input order. A document whose
//! text cannot be read, or whose extraction fails, is reported and skipped;
//! it never aborts the batch.

mod source;

pub use source::FileTextSource;

use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::extract::FieldExtractor;
use crate::models::record::{Record, ResultTable};

/// Text extraction collaborator: turns a batch input into linear text.
pub trait TextSource {
    /// What a batch entry carries (a path, raw bytes, ...).
    type Input;

    /// Read the full text of one document.
    fn read_text(&self, input: &Self::Input) -> Result<String>;
}

/// One document of a batch.
#[derive(Debug, Clone)]
pub struct BatchEntry<I> {
    /// Display name, copied into the record's source column.
    pub name: String,
    /// Input handed to the text source.
    pub input: I,
}

impl<I> BatchEntry<I> {
    pub fn new(name: impl Into<String>, input: I) -> Self {
        Self {
            name: name.into(),
            input,
        }
    }
}

/// Progress after a processed document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Documents processed so far, successful or not.
    pub processed: usize,
    /// Documents in the batch.
    pub total: usize,
}

impl Progress {
    /// Fraction complete in `[0.0, 1.0]`.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            (self.processed as f64 / self.total as f64).min(1.0)
        }
    }
}

/// Stage at which a document failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    /// Text could not be obtained from the document.
    Read,
    /// The extractor rejected the document text.
    Extract,
}

/// A document skipped by the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentFailure {
    /// Position in the input batch (0-indexed).
    pub index: usize,
    /// Document name.
    pub name: String,
    pub stage: FailureStage,
    /// Error message shown to the user.
    pub message: String,
}

/// Observer for batch progress and skipped documents.
pub trait ProgressSink {
    /// Called after each document, whatever its outcome.
    fn on_progress(&self, progress: Progress);

    /// Called when a document is skipped.
    fn on_failure(&self, _failure: &DocumentFailure) {}
}

/// Sink that ignores every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn on_progress(&self, _progress: Progress) {}
}

static NO_PROGRESS: NoProgress = NoProgress;

/// Result of a batch run.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    /// One row per document that was read successfully, in input order.
    pub table: ResultTable,
    /// Skipped documents, in input order.
    pub failures: Vec<DocumentFailure>,
    /// Wall time of the run in milliseconds.
    pub processing_time_ms: u64,
}

impl BatchOutcome {
    /// Number of documents in the batch.
    pub fn total(&self) -> usize {
        self.table.len() + self.failures.len()
    }
}

/// Applies a field extractor to every document of a batch.
pub struct BatchProcessor<'a> {
    extractor: &'a dyn FieldExtractor,
    progress: &'a dyn ProgressSink,
}

impl<'a> BatchProcessor<'a> {
    /// Create a batch processor without progress reporting.
    pub fn new(extractor: &'a dyn FieldExtractor) -> Self {
        Self {
            extractor,
            progress: &NO_PROGRESS,
        }
    }

    /// Report progress and failures to `progress`.
    pub fn with_progress(mut self, progress: &'a dyn ProgressSink) -> Self {
        self.progress = progress;
        self
    }

    /// Process every entry in order and assemble the result table.
    pub fn run<S: TextSource>(&self, source: &S, entries: &[BatchEntry<S::Input>]) -> BatchOutcome {
        let start = Instant::now();
        let total = entries.len();
        let mut records = Vec::with_capacity(total);
        let mut failures = Vec::new();

        info!("Processing batch of {} documents", total);

        for (index, entry) in entries.iter().enumerate() {
            match self.process_one(source, entry) {
                Ok(record) => records.push(record),
                Err((stage, message)) => {
                    debug!("Skipping {}: {}", entry.name, message);
                    let failure = DocumentFailure {
                        index,
                        name: entry.name.clone(),
                        stage,
                        message,
                    };
                    self.progress.on_failure(&failure);
                    failures.push(failure);
                }
            }

            self.progress.on_progress(Progress {
                processed: index + 1,
                total,
            });
        }

        let table = ResultTable::from_records(records);
        let processing_time_ms = start.elapsed().as_millis() as u64;

        info!(
            "Batch complete: {} extracted, {} skipped in {}ms",
            table.len(),
            failures.len(),
            processing_time_ms
        );

        BatchOutcome {
            table,
            failures,
            processing_time_ms,
        }
    }

    fn process_one<S: TextSource>(
        &self,
        source: &S,
        entry: &BatchEntry<S::Input>,
    ) -> std::result::Result<Record, (FailureStage, String)> {
        let text = source
            .read_text(&entry.input)
            .map_err(|e| (FailureStage::Read, e.to_string()))?;

        if text.trim().is_empty() {
            warn!("No text in {}, all fields will be empty", entry.name);
        }

        let record = self
            .extractor
            .extract_from_text(&text)
            .map_err(|e| (FailureStage::Extract, e.to_string()))?;

        debug!("Extracted {} ({} chars)", entry.name, text.len());
        Ok(record.with_source(entry.name.clone()))
    }
}
