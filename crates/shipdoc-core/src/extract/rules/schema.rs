use serde::{Deserialize, Serialize};

use crate::models::record::FieldName;

/// A table of recognition rules, one entry per extracted field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleTableDef {
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub fields: Vec<FieldRuleDef>,
}

impl RuleTableDef {
    /// Rule for a field, if the table defines one.
    pub fn rule(&self, field: FieldName) -> Option<&FieldRuleDef> {
        self.fields.iter().find(|rule| rule.field == field)
    }
}

/// Recognition rule for one field.
///
/// Matchers are tried in list order; the first one that yields a non-empty
/// value wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldRuleDef {
    pub field: FieldName,
    pub matchers: Vec<MatcherDef>,
}

/// One candidate matcher: a label vocabulary plus capture and normalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatcherDef {
    /// Label synonyms, matched case-insensitively.
    pub labels: Vec<String>,
    /// Literal separators that may follow the label, e.g. `:` or `#`.
    #[serde(default = "default_separators")]
    pub separators: Vec<String>,
    /// Reject label occurrences that are not followed by a separator.
    #[serde(default)]
    pub separator_required: bool,
    pub capture: CaptureDef,
    #[serde(default)]
    pub normalize: Normalization,
}

fn default_separators() -> Vec<String> {
    vec![":".to_string()]
}

/// Extent of the captured region after a label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CaptureDef {
    /// Maximal run of characters from a regex character class body
    /// (for example `A-Za-z0-9\-`), optionally preceded by a literal prefix.
    Token {
        class: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        prefix: Option<String>,
    },
    /// Rest of the current line, or of the next one when the label ends its line.
    RestOfLine,
    /// Everything up to the next label of any terminator field, or end of text.
    UntilLabels { terminators: Vec<FieldName> },
}

/// Normalization applied to a raw capture.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Normalization {
    /// Trim surrounding whitespace.
    #[default]
    Trim,
    /// Join lines with `", "` and collapse whitespace.
    JoinLines,
}
