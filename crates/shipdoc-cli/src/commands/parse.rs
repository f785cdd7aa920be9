//! Parse command - extract fields from a single document.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use tracing::{debug, info};

use shipdoc_core::{FieldName, FileTextSource, Record, TextSource};

use super::{load_config, load_engine};

/// Arguments for the parse command.
#[derive(Args)]
pub struct ParseArgs {
    /// Input file (PDF or plain text)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: RecordFormat,

    /// Rule table file (overrides extraction.rules_file)
    #[arg(short, long)]
    rules: Option<PathBuf>,

    /// Also print the raw text the fields were extracted from
    #[arg(long)]
    show_text: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum RecordFormat {
    /// JSON output
    Json,
    /// Plain text summary
    Text,
}

pub async fn run(args: ParseArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = load_config(config_path)?;
    let engine = load_engine(args.rules.as_deref(), &config)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let text = FileTextSource::from_config(&config.pdf).read_text(&args.input)?;
    let name = args
        .input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let record = engine.extract(&text).with_source(name);

    if args.show_text {
        eprintln!("{}", style("Extracted text:").blue());
        eprintln!("{}", text);
        eprintln!();
    }

    let output = format_record(&record, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        eprintln!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

fn format_record(record: &Record, format: RecordFormat) -> anyhow::Result<String> {
    match format {
        RecordFormat::Json => Ok(serde_json::to_string_pretty(record)?),
        RecordFormat::Text => Ok(format_text(record)),
    }
}

fn format_text(record: &Record) -> String {
    let width = FieldName::ALL
        .iter()
        .map(|f| f.column().len())
        .max()
        .unwrap_or(0);

    let mut output = format!("File: {}\n", record.source);
    for field in FieldName::ALL {
        let value = record.get(field);
        let value = if value.is_empty() { "-" } else { value };
        output.push_str(&format!("{:<width$}  {}\n", field.column(), value, width = width));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_text() {
        let mut record = Record::empty().with_source("label.pdf");
        record.set(FieldName::Phone, "555-0100");

        let text = format_text(&record);
        assert!(text.starts_with("File: label.pdf\n"));
        assert!(text.contains("Phone        555-0100\n"));
        assert!(text.contains("SKU          -\n"));
    }

    #[test]
    fn test_format_json_uses_field_keys() {
        let record = Record::empty().with_source("a.txt");
        let json = format_record(&record, RecordFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["file_name"], "a.txt");
        assert_eq!(value["values"]["seller_name"], "");
    }
}
