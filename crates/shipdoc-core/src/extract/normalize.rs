//! Normalization of raw captures into field values.

use lazy_static::lazy_static;
use regex::Regex;

use super::rules::Normalization;

lazy_static! {
    static ref WHITESPACE_RUN: Regex = Regex::new(r"\s+").unwrap();
    static ref LINE_BREAK: Regex = Regex::new(r"\r\n|\r|\n").unwrap();
}

/// Apply a normalization to a raw capture.
pub fn normalize(raw: &str, normalization: Normalization) -> String {
    match normalization {
        Normalization::Trim => trim(raw),
        Normalization::JoinLines => join_lines(raw),
    }
}

/// Trim surrounding whitespace.
pub fn trim(raw: &str) -> String {
    raw.trim().to_string()
}

/// Flatten a multi-line block into one line.
///
/// Lines are joined with `", "`; blank lines are dropped so that page breaks
/// and trailing newlines never leave dangling separators.
pub fn join_lines(raw: &str) -> String {
    let joined = LINE_BREAK
        .split(raw)
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(", ");

    WHITESPACE_RUN.replace_all(&joined, " ").trim().to_string()
}
