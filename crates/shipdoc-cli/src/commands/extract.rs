//! Extract command - batch extraction of many documents into one table.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{DateTime, Utc};
use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{debug, warn};

use shipdoc_core::models::config::{BatchConfig, ShipdocConfig};
use shipdoc_core::{
    BatchEntry, BatchOutcome, BatchProcessor, DocumentFailure, FileTextSource, Progress,
    ProgressSink, Record, ResultTable,
};

use super::{load_config, load_engine};

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Input files, directories or glob patterns
    #[arg(required = true)]
    inputs: Vec<String>,

    /// Output file, `-` for stdout (default: output.file_name from config)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "csv")]
    format: TableFormat,

    /// Rule table file (overrides extraction.rules_file)
    #[arg(short, long)]
    rules: Option<PathBuf>,

    /// Print the extracted table after the run
    #[arg(long)]
    preview: bool,

    /// Exit with an error if any document was skipped
    #[arg(long)]
    strict: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum TableFormat {
    /// Comma separated values with a header row
    Csv,
    /// JSON report with records and failures
    Json,
}

/// Progress bar adapter for the batch processor.
struct BarProgress {
    bar: ProgressBar,
}

impl ProgressSink for BarProgress {
    fn on_progress(&self, progress: Progress) {
        self.bar.set_position(progress.processed as u64);
    }

    fn on_failure(&self, failure: &DocumentFailure) {
        // println is a no-op on a hidden bar, so print around it instead
        self.bar.suspend(|| {
            eprintln!(
                "{} Error reading {}: {}",
                style("⚠").yellow(),
                failure.name,
                failure.message
            );
        });
    }
}

/// JSON form of a batch result.
#[derive(Serialize)]
struct JsonReport<'a> {
    generated_at: DateTime<Utc>,
    rule_table: &'a str,
    columns: [&'static str; 6],
    records: &'a [Record],
    failures: &'a [DocumentFailure],
}

pub async fn run(args: ExtractArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = load_config(config_path)?;
    let engine = load_engine(args.rules.as_deref(), &config)?;

    let files = expand_inputs(&args.inputs, &config.batch)?;
    if files.is_empty() {
        anyhow::bail!("No matching files found for: {}", args.inputs.join(" "));
    }

    let max = config.batch.max_documents;
    if max > 0 && files.len() > max {
        anyhow::bail!(
            "{} files selected but at most {} are allowed per run (batch.max_documents)",
            files.len(),
            max
        );
    }

    eprintln!("{} Found {} files to process", style("ℹ").blue(), files.len());

    let entries: Vec<BatchEntry<PathBuf>> = files
        .into_iter()
        .map(|path| BatchEntry::new(display_name(&path), path))
        .collect();

    let bar = ProgressBar::new(entries.len() as u64);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );
    let sink = BarProgress { bar: bar.clone() };

    let source = FileTextSource::from_config(&config.pdf);
    let outcome = BatchProcessor::new(&engine)
        .with_progress(&sink)
        .run(&source, &entries);

    bar.finish_and_clear();

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.output.file_name));
    write_outcome(&outcome, &output, args.format, &config, engine.table_name())?;

    if args.preview {
        eprintln!();
        eprint!("{}", format_preview(&outcome.table));
    }

    print_summary(&outcome, &output, start);

    if args.strict && !outcome.failures.is_empty() {
        anyhow::bail!(
            "{} of {} documents could not be read",
            outcome.failures.len(),
            outcome.total()
        );
    }

    Ok(())
}

/// Expand inputs into files, keeping argument order.
///
/// Explicit files are kept whatever their extension so the batch reports them;
/// directories and glob patterns only contribute accepted extensions.
fn expand_inputs(inputs: &[String], batch: &BatchConfig) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for input in inputs {
        let path = Path::new(input);

        if path.is_file() {
            files.push(path.to_path_buf());
        } else if path.is_dir() {
            let mut entries: Vec<PathBuf> = fs::read_dir(path)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_file() && batch.accepts(p))
                .collect();
            entries.sort();
            files.extend(entries);
        } else {
            let matched: Vec<PathBuf> = glob(input)?
                .filter_map(|r| r.ok())
                .filter(|p| p.is_file() && batch.accepts(p))
                .collect();
            if matched.is_empty() {
                warn!("No files match {}", input);
            }
            files.extend(matched);
        }
    }

    debug!("Expanded {} inputs into {} files", inputs.len(), files.len());
    Ok(files)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn write_outcome(
    outcome: &BatchOutcome,
    output: &Path,
    format: TableFormat,
    config: &ShipdocConfig,
    rule_table: &str,
) -> anyhow::Result<()> {
    let mut buffer = Vec::new();

    match format {
        TableFormat::Csv => write_csv(&outcome.table, delimiter(config)?, &mut buffer)?,
        TableFormat::Json => {
            let report = JsonReport {
                generated_at: Utc::now(),
                rule_table,
                columns: ResultTable::columns(),
                records: outcome.table.records(),
                failures: &outcome.failures,
            };
            serde_json::to_writer_pretty(&mut buffer, &report)?;
            buffer.push(b'\n');
        }
    }

    if output == Path::new("-") {
        io::stdout().write_all(&buffer)?;
    } else {
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(output, &buffer)?;
        debug!("Wrote {} bytes to {}", buffer.len(), output.display());
    }

    Ok(())
}

fn delimiter(config: &ShipdocConfig) -> anyhow::Result<u8> {
    let delimiter = config.output.delimiter;
    if !delimiter.is_ascii() {
        anyhow::bail!("output.delimiter must be an ASCII character, got {:?}", delimiter);
    }
    Ok(delimiter as u8)
}

/// Write the table as delimited text with a header row.
fn write_csv<W: Write>(table: &ResultTable, delimiter: u8, writer: W) -> anyhow::Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(writer);

    wtr.write_record(ResultTable::columns())?;
    for row in table.rows() {
        wtr.write_record(row)?;
    }

    wtr.flush()?;
    Ok(())
}

const PREVIEW_WIDTH: usize = 32;

/// Fixed-width text rendering of the table for the terminal.
fn format_preview(table: &ResultTable) -> String {
    let columns = ResultTable::columns();
    let rows: Vec<[String; 6]> = table
        .rows()
        .map(|row| row.map(|cell| truncate(cell, PREVIEW_WIDTH)))
        .collect();

    let mut widths = columns.map(|c| c.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut output = String::new();
    push_line(&mut output, &columns.map(String::from), &widths);
    push_line(&mut output, &widths.map(|w| "-".repeat(w)), &widths);
    for row in &rows {
        push_line(&mut output, row, &widths);
    }
    output
}

fn push_line(output: &mut String, cells: &[String; 6], widths: &[usize; 6]) {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
        .collect::<Vec<_>>()
        .join(" | ");
    output.push_str(line.trim_end());
    output.push('\n');
}

fn truncate(cell: &str, max: usize) -> String {
    if cell.chars().count() <= max {
        cell.to_string()
    } else {
        let mut short: String = cell.chars().take(max - 1).collect();
        short.push('…');
        short
    }
}

fn print_summary(outcome: &BatchOutcome, output: &Path, start: Instant) {
    eprintln!();
    eprintln!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        outcome.total(),
        start.elapsed()
    );
    eprintln!(
        "   {} extracted, {} failed",
        style(outcome.table.len()).green(),
        style(outcome.failures.len()).red()
    );

    if !outcome.failures.is_empty() {
        eprintln!();
        eprintln!("{}", style("Failed files:").red());
        for failure in &outcome.failures {
            eprintln!("  - {}: {}", failure.name, failure.message);
        }
    }

    if output != Path::new("-") {
        eprintln!(
            "{} Table written to {}",
            style("✓").green(),
            output.display()
        );
    }
}
