use std::fs;
use std::path::PathBuf;

use tracing::debug;

use super::TextSource;
use crate::error::{Result, ShipdocError};
use crate::models::config::PdfConfig;
use crate::pdf::{PdfExtractor, PdfProcessor};

/// Reads document text from files: PDFs through [`PdfExtractor`], `.txt` as UTF-8.
#[derive(Debug, Clone)]
pub struct FileTextSource {
    page_separator: String,
}

impl FileTextSource {
    pub fn new() -> Self {
        Self::from_config(&PdfConfig::default())
    }

    pub fn from_config(config: &PdfConfig) -> Self {
        Self {
            page_separator: config.page_separator.clone(),
        }
    }
}

impl Default for FileTextSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TextSource for FileTextSource {
    type Input = PathBuf;

    fn read_text(&self, path: &PathBuf) -> Result<String> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        debug!("Reading {}", path.display());

        match extension.as_str() {
            "pdf" => {
                let data = fs::read(path)?;
                let mut extractor =
                    PdfExtractor::new().with_page_separator(self.page_separator.clone());
                extractor.load(&data)?;
                debug!("{}: {} pages", path.display(), extractor.page_count());
                Ok(extractor.extract_text()?)
            }
            "txt" => Ok(fs::read_to_string(path)?),
            _ => Err(ShipdocError::UnsupportedFormat(format!(
                "{} (expected .pdf or .txt)",
                path.display()
            ))),
        }
    }
}
