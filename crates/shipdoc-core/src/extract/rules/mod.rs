//! Declarative recognition rules for shipping document fields.

pub mod builtin;
pub mod schema;

use std::collections::HashSet;
use std::path::Path;

use crate::error::RuleError;

pub use builtin::default_rule_table;
pub use schema::{CaptureDef, FieldRuleDef, MatcherDef, Normalization, RuleTableDef};

/// Load a rule table from a JSON file.
pub fn load_rule_table(path: &Path) -> Result<RuleTableDef, RuleError> {
    let content = std::fs::read_to_string(path).map_err(|e| RuleError::Load {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    parse_rule_table(&content, path)
}

/// Parse a rule table from a JSON string read from `source`.
pub fn parse_rule_table(json: &str, source: &Path) -> Result<RuleTableDef, RuleError> {
    let table: RuleTableDef = serde_json::from_str(json).map_err(|e| RuleError::Load {
        path: source.to_path_buf(),
        reason: e.to_string(),
    })?;
    validate_rule_table(&table)?;
    Ok(table)
}

/// Parse a rule table from a JSON string (no file path context).
pub fn parse_rule_table_str(json: &str) -> Result<RuleTableDef, RuleError> {
    let table: RuleTableDef =
        serde_json::from_str(json).map_err(|e| RuleError::Invalid(e.to_string()))?;
    validate_rule_table(&table)?;
    Ok(table)
}

/// Validate that a rule table is well-formed.
///
/// Patterns themselves are checked when the table is compiled into an engine.
pub fn validate_rule_table(table: &RuleTableDef) -> Result<(), RuleError> {
    if table.fields.is_empty() {
        return Err(RuleError::Invalid("fields must not be empty".into()));
    }

    let mut seen = HashSet::new();
    for rule in &table.fields {
        if !seen.insert(rule.field) {
            return Err(RuleError::Invalid(format!(
                "field '{}' is defined more than once",
                rule.field.key()
            )));
        }

        if rule.matchers.is_empty() {
            return Err(RuleError::Invalid(format!(
                "field '{}' has no matchers",
                rule.field.key()
            )));
        }

        for matcher in &rule.matchers {
            validate_matcher(rule, matcher)?;
        }
    }

    Ok(())
}

fn validate_matcher(rule: &FieldRuleDef, matcher: &MatcherDef) -> Result<(), RuleError> {
    let field = rule.field.key();

    if matcher.labels.is_empty() {
        return Err(RuleError::Invalid(format!("field '{}' has a matcher without labels", field)));
    }
    if matcher.labels.iter().any(|label| label.trim().is_empty()) {
        return Err(RuleError::Invalid(format!("field '{}' has an empty label", field)));
    }
    if matcher.separators.iter().any(|sep| sep.is_empty()) {
        return Err(RuleError::Invalid(format!("field '{}' has an empty separator", field)));
    }
    if matcher.separator_required && matcher.separators.is_empty() {
        return Err(RuleError::Invalid(format!(
            "field '{}' requires a separator but lists none",
            field
        )));
    }

    match &matcher.capture {
        CaptureDef::Token { class, .. } if class.is_empty() => Err(RuleError::Invalid(format!(
            "field '{}' has an empty token class",
            field
        ))),
        CaptureDef::UntilLabels { terminators } if terminators.is_empty() => Err(
            RuleError::Invalid(format!("field '{}' has no terminators", field)),
        ),
        CaptureDef::UntilLabels { terminators } if terminators.contains(&rule.field) => Err(
            RuleError::Invalid(format!("field '{}' cannot terminate on its own labels", field)),
        ),
        _ => Ok(()),
    }
}
