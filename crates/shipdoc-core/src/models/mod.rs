//! Data models for extracted records and pipeline configuration.

pub mod config;
pub mod record;

pub use config::ShipdocConfig;
pub use record::{FieldName, Record, ResultTable, SOURCE_COLUMN};
