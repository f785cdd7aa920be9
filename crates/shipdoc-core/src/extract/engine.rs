//! Rule engine compiling a rule table into regex matchers.

use regex::Regex;
use tracing::{debug, trace};

use crate::error::RuleError;
use crate::models::record::{FieldName, Record};

use super::normalize::normalize;
use super::rules::{
    default_rule_table, CaptureDef, FieldRuleDef, MatcherDef, Normalization, RuleTableDef,
};
use super::{FieldExtractor, Result};

/// Gap allowed around separators for captures that may start on a later line.
const GAP_ANY: &str = r"\s*";
/// Gap allowed around separators for line-bound captures.
const GAP_INLINE: &str = r"[ \t]*";

/// Field extraction engine driven by a [`RuleTableDef`].
///
/// Every matcher is compiled once at construction; extraction holds no state.
#[derive(Debug, Clone)]
pub struct RuleEngine {
    name: String,
    rules: Vec<CompiledRule>,
}

#[derive(Debug, Clone)]
struct CompiledRule {
    field: FieldName,
    matchers: Vec<CompiledMatcher>,
}

#[derive(Debug, Clone)]
struct CompiledMatcher {
    /// Label and separator, plus capture group 1 for inline captures.
    head: Regex,
    capture: CompiledCapture,
    normalize: Normalization,
}

#[derive(Debug, Clone)]
enum CompiledCapture {
    /// The value is capture group 1 of the head pattern.
    Inline,
    /// The value runs from the end of the head to the first terminator label.
    UntilLabels(Option<Regex>),
}

impl RuleEngine {
    /// Compile a rule table.
    pub fn new(table: &RuleTableDef) -> std::result::Result<Self, RuleError> {
        let rules = table
            .fields
            .iter()
            .map(|rule| compile_rule(rule, table))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        debug!(
            "Compiled rule table '{}' v{} ({} fields)",
            table.name,
            table.version,
            rules.len()
        );

        Ok(Self {
            name: table.name.clone(),
            rules,
        })
    }

    /// Engine for the built-in shipping label rules.
    pub fn builtin() -> std::result::Result<Self, RuleError> {
        Self::new(&default_rule_table()?)
    }

    /// Name of the rule table this engine was compiled from.
    pub fn table_name(&self) -> &str {
        &self.name
    }

    /// Extract every field from a document's text.
    ///
    /// Never fails: a field whose labels are absent is left empty.
    pub fn extract(&self, text: &str) -> Record {
        let mut record = Record::empty();

        for rule in &self.rules {
            let value = rule
                .matchers
                .iter()
                .enumerate()
                .find_map(|(priority, matcher)| {
                    matcher.first_value(text).map(|value| (priority, value))
                });

            match value {
                Some((priority, value)) => {
                    debug!("{} = {:?} (matcher {})", rule.field, value, priority);
                    record.set(rule.field, value);
                }
                None => trace!("{} not found", rule.field),
            }
        }

        record
    }
}

impl FieldExtractor for RuleEngine {
    fn extract_from_text(&self, text: &str) -> Result<Record> {
        Ok(self.extract(text))
    }
}

impl CompiledMatcher {
    /// First occurrence, in text order, whose normalized capture is non-empty.
    fn first_value(&self, text: &str) -> Option<String> {
        let non_empty = |raw: &str| {
            let value = normalize(raw, self.normalize);
            (!value.is_empty()).then_some(value)
        };

        match &self.capture {
            CompiledCapture::Inline => self
                .head
                .captures_iter(text)
                .find_map(|caps| caps.get(1).and_then(|m| non_empty(m.as_str()))),
            CompiledCapture::UntilLabels(terminator) => {
                self.head.find_iter(text).find_map(|head| {
                    let rest = &text[head.end()..];
                    let end = terminator
                        .as_ref()
                        .and_then(|t| t.find(rest))
                        .map(|m| m.start())
                        .unwrap_or(rest.len());
                    non_empty(&rest[..end])
                })
            }
        }
    }
}

fn compile_rule(
    rule: &FieldRuleDef,
    table: &RuleTableDef,
) -> std::result::Result<CompiledRule, RuleError> {
    let matchers = rule
        .matchers
        .iter()
        .map(|matcher| compile_matcher(rule.field, matcher, table))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(CompiledRule {
        field: rule.field,
        matchers,
    })
}

fn compile_matcher(
    field: FieldName,
    matcher: &MatcherDef,
    table: &RuleTableDef,
) -> std::result::Result<CompiledMatcher, RuleError> {
    let labels = labels_pattern(&matcher.labels);

    let (pattern, capture) = match &matcher.capture {
        CaptureDef::Token { class, prefix } => {
            let prefix = prefix
                .as_deref()
                .map(|p| format!("(?:{})?", regex::escape(p)))
                .unwrap_or_default();
            let pattern = format!(
                "(?i){}{}{}({}[{}]+)",
                labels,
                separator_pattern(matcher, GAP_ANY, false),
                GAP_ANY,
                prefix,
                class
            );
            (pattern, CompiledCapture::Inline)
        }
        CaptureDef::RestOfLine => {
            let pattern = format!(
                r"(?i){}{}{}(?:\r?\n)?([^\r\n]*)",
                labels,
                separator_pattern(matcher, GAP_INLINE, false),
                GAP_INLINE
            );
            (pattern, CompiledCapture::Inline)
        }
        CaptureDef::UntilLabels { terminators } => {
            let pattern = format!(
                "(?i){}{}{}",
                labels,
                separator_pattern(matcher, GAP_ANY, false),
                GAP_ANY
            );
            let terminator = terminator_pattern(terminators, table)
                .map(|p| compile(field, &p))
                .transpose()?;
            (pattern, CompiledCapture::UntilLabels(terminator))
        }
    };

    trace!("{} pattern: {}", field, pattern);

    Ok(CompiledMatcher {
        head: compile(field, &pattern)?,
        capture,
        normalize: matcher.normalize,
    })
}

fn compile(field: FieldName, pattern: &str) -> std::result::Result<Regex, RuleError> {
    Regex::new(pattern).map_err(|e| RuleError::Pattern {
        field,
        reason: e.to_string(),
    })
}

/// Alternation of label synonyms.
///
/// Words may be separated by any whitespace (or none), and a label starting
/// or ending with a word character is anchored at a word boundary there.
fn labels_pattern(labels: &[String]) -> String {
    let alternatives: Vec<String> = labels
        .iter()
        .map(|label| {
            let body = label
                .split_whitespace()
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(r"\s*");
            let starts_word = label.trim().chars().next().is_some_and(is_word_char);
            let ends_word = label.trim().chars().last().is_some_and(is_word_char);
            format!(
                "{}{}{}",
                if starts_word { r"\b" } else { "" },
                body,
                if ends_word { r"\b" } else { "" }
            )
        })
        .collect();

    format!("(?:{})", alternatives.join("|"))
}

/// Separator with its leading gap; optional unless required or `force`d.
fn separator_pattern(matcher: &MatcherDef, gap: &str, force: bool) -> String {
    if matcher.separators.is_empty() {
        return String::new();
    }

    let separators = matcher
        .separators
        .iter()
        .map(|s| regex::escape(s))
        .collect::<Vec<_>>()
        .join("|");

    if matcher.separator_required || force {
        format!("{}(?:{})", gap, separators)
    } else {
        format!("(?:{}(?:{}))?", gap, separators)
    }
}

/// Alternation of the stop patterns of every terminator field's matchers.
/// `None` when the table defines none of those fields.
fn terminator_pattern(terminators: &[FieldName], table: &RuleTableDef) -> Option<String> {
    let alternatives: Vec<String> = terminators
        .iter()
        .filter_map(|field| table.rule(*field))
        .flat_map(|rule| rule.matchers.iter())
        .map(stop_pattern)
        .collect();

    if alternatives.is_empty() {
        None
    } else {
        Some(format!("(?i)(?:{})", alternatives.join("|")))
    }
}

/// Matches a label only where its matcher would capture a non-empty value.
///
/// A block that stops here never shares text with the terminator's column.
/// `until_labels` matchers stop on label plus separator.
fn stop_pattern(matcher: &MatcherDef) -> String {
    let labels = labels_pattern(&matcher.labels);

    match &matcher.capture {
        CaptureDef::Token { class, prefix } => {
            let first = match prefix {
                Some(prefix) => format!(r"(?:{}[{}]|[[{}]&&\S])", regex::escape(prefix), class, class),
                None => format!(r"[[{}]&&\S]", class),
            };
            format!(
                "{}{}{}{}",
                labels,
                separator_pattern(matcher, GAP_ANY, false),
                GAP_ANY,
                first
            )
        }
        CaptureDef::RestOfLine => format!(
            r"{}{}{}(?:\r?\n)?[^\r\n]*?\S",
            labels,
            separator_pattern(matcher, GAP_INLINE, false),
            GAP_INLINE
        ),
        CaptureDef::UntilLabels { .. } => {
            format!("{}{}", labels, separator_pattern(matcher, GAP_INLINE, true))
        }
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::rules::parse_rule_table_str;
    use pretty_assertions::assert_eq;

    fn engine() -> RuleEngine {
        RuleEngine::builtin().unwrap()
    }

    fn record(values: [&str; 5]) -> Record {
        let mut record = Record::empty();
        for (field, value) in FieldName::ALL.iter().zip(values) {
            record.set(*field, value);
        }
        record
    }

    #[test]
    fn test_full_label() {
        let text = "Ship to:\nJohn Doe\n123 Main St\nOrder ID: 987-654\nPhone: 555-123-4567\nSeller Name: Acme Co\nSKU: ABC-123.4";

        assert_eq!(
            engine().extract(text),
            record(["John Doe, 123 Main St", "987-654", "555-123-4567", "Acme Co", "ABC-123.4"])
        );
    }

    #[test]
    fn test_no_labels_yields_empty_record() {
        let record = engine().extract("Thank you for shopping with us!\nReturns accepted within 30 days.");
        assert!(record.is_blank());
        assert!(record.missing_fields().is_empty());
    }

    #[test]
    fn test_empty_text() {
        assert!(engine().extract("").is_blank());
    }

    #[test]
    fn test_labels_case_insensitive() {
        let text = "SHIP TO: Jane Roe\n5 Elm Rd\nORDER ID: x-1\nphone: 555 0100\nSELLER NAME: Shop\nsku: q.1";
        assert_eq!(
            engine().extract(text),
            record(["Jane Roe, 5 Elm Rd", "x-1", "555 0100", "Shop", "q.1"])
        );
    }

    #[test]
    fn test_ship_to_stops_at_order_id() {
        let record = engine().extract("Ship to: A\nB\nOrder ID: X");
        assert_eq!(record.get(FieldName::ShipTo), "A, B");
        assert_eq!(record.get(FieldName::OrderId), "X");
    }

    #[test]
    fn test_ship_to_runs_to_end_of_text() {
        let record = engine().extract("Ship To\n  221B Baker St\n\n London  NW1 ");
        assert_eq!(record.get(FieldName::ShipTo), "221B Baker St, London NW1");
    }

    #[test]
    fn test_ship_to_ignores_label_words_in_address() {
        let record = engine().extract("Ship to: Tel Aviv Road 4\nOrder Street 9\nPhone: 12");
        assert_eq!(record.get(FieldName::ShipTo), "Tel Aviv Road 4, Order Street 9");
        assert_eq!(record.get(FieldName::Phone), "12");
    }

    #[test]
    fn test_ship_to_empty_block_is_empty() {
        let record = engine().extract("Ship to:\nOrder ID: 1");
        assert_eq!(record.get(FieldName::ShipTo), "");
        assert_eq!(record.get(FieldName::OrderId), "1");
    }

    #[test]
    fn test_ship_to_stops_at_labels_without_separator() {
        assert_eq!(
            engine().extract("Ship to:\nJane\n1 High St\nPhone 555-1234\nOrder ID: 7"),
            record(["Jane, 1 High St", "7", "555-1234", "", ""])
        );
        assert_eq!(
            engine().extract("Ship To: A\nOrder ID 55\nPhone: 1"),
            record(["A", "55", "1", "", ""])
        );
    }

    #[test]
    fn test_ship_to_stops_at_seller_and_sku() {
        let record = engine().extract("Ship to: A\nB\nSold By: X");
        assert_eq!(record.get(FieldName::ShipTo), "A, B");
        assert_eq!(record.get(FieldName::SellerName), "X");

        let record = engine().extract("Ship to: A\nB\nSeller Name\nCorner Books");
        assert_eq!(record.get(FieldName::ShipTo), "A, B");
        assert_eq!(record.get(FieldName::SellerName), "Corner Books");

        let record = engine().extract("Ship to: A\nB\nSKU: 1");
        assert_eq!(record.get(FieldName::ShipTo), "A, B");
        assert_eq!(record.get(FieldName::Sku), "1");
    }

    #[test]
    fn test_ship_to_keeps_labels_with_nothing_to_capture() {
        // Phone needs a digit, SKU needs a code character
        let record = engine().extract("Ship to: Tel Aviv\nSKU & Co Warehouse\nOrder ID: 3");
        assert_eq!(record.get(FieldName::ShipTo), "Tel Aviv, SKU & Co Warehouse");
        assert_eq!(record.get(FieldName::Phone), "");
        assert_eq!(record.get(FieldName::Sku), "");
    }

    #[test]
    fn test_stop_pattern() {
        let table = default_rule_table().unwrap();
        let phone = &table.rule(FieldName::Phone).unwrap().matchers[0];
        let stop = Regex::new(&format!("(?i){}", stop_pattern(phone))).unwrap();

        assert!(stop.is_match("Phone 555"));
        assert!(stop.is_match("mobile:\n+44 7700"));
        assert!(!stop.is_match("Tel Aviv"));
        assert!(!stop.is_match("Phone: n/a"));
    }

    #[test]
    fn test_phone_synonyms_and_plus() {
        assert_eq!(engine().extract("Mobile: +44 7700-900123").get(FieldName::Phone), "+44 7700-900123");
        assert_eq!(engine().extract("Tel 020 7946 0018").get(FieldName::Phone), "020 7946 0018");
    }

    #[test]
    fn test_phone_stops_at_line_end() {
        let record = engine().extract("Phone: 555-1234\nSeller Name: Acme");
        assert_eq!(record.get(FieldName::Phone), "555-1234");
    }

    #[test]
    fn test_whitespace_only_phone_is_no_match() {
        let record = engine().extract("Phone: n/a\nTel: 555 777");
        assert_eq!(record.get(FieldName::Phone), "555 777");

        let record = engine().extract("Phone:   \nnothing here");
        assert_eq!(record.get(FieldName::Phone), "");
    }

    #[test]
    fn test_order_id_separators() {
        assert_eq!(engine().extract("Order ID # AB-77").get(FieldName::OrderId), "AB-77");
        assert_eq!(engine().extract("Order ID:\n  113-42").get(FieldName::OrderId), "113-42");
        assert_eq!(engine().extract("order #5521-X").get(FieldName::OrderId), "5521-X");
    }

    #[test]
    fn test_order_id_prefers_strict_label() {
        let record = engine().extract("Order: LOOSE-1\nOrder ID: STRICT-2");
        assert_eq!(record.get(FieldName::OrderId), "STRICT-2");
    }

    #[test]
    fn test_loose_order_label_needs_separator() {
        assert_eq!(engine().extract("Order Date 2024").get(FieldName::OrderId), "");
    }

    #[test]
    fn test_seller_name_on_next_line() {
        let record = engine().extract("Seller Name:\n  Widgets & Co  \nSKU: 1");
        assert_eq!(record.get(FieldName::SellerName), "Widgets & Co");

        let record = engine().extract("Sold by: Bob's Store");
        assert_eq!(record.get(FieldName::SellerName), "Bob's Store");
    }

    #[test]
    fn test_seller_name_empty_capture() {
        let record = engine().extract("Seller Name:\n\nSKU: 1");
        assert_eq!(record.get(FieldName::SellerName), "");
    }

    #[test]
    fn test_sku_stops_at_other_characters() {
        let record = engine().extract("SKU#  ZX-9.10/blue");
        assert_eq!(record.get(FieldName::Sku), "ZX-9.10");
    }

    #[test]
    fn test_extract_is_idempotent() {
        let text = "Ship to: A\nOrder ID: 1\nSKU: 2";
        let engine = engine();
        assert_eq!(engine.extract(text), engine.extract(text));
    }

    #[test]
    fn test_matcher_priority_is_authoritative() {
        let json = r#"{
            "name": "priority",
            "version": "1",
            "fields": [{
                "field": "sku",
                "matchers": [
                    { "labels": ["Item Code"], "capture": { "kind": "token", "class": "0-9" } },
                    { "labels": ["SKU"], "capture": { "kind": "token", "class": "A-Z0-9" } }
                ]
            }]
        }"#;
        let engine = RuleEngine::new(&parse_rule_table_str(json).unwrap()).unwrap();

        let record = engine.extract("SKU: AAA\nItem Code: 123");
        assert_eq!(record.get(FieldName::Sku), "123");

        let record = engine.extract("SKU: AAA\nItem Code: none");
        assert_eq!(record.get(FieldName::Sku), "AAA");
    }

    #[test]
    fn test_fields_missing_from_table_stay_empty() {
        let json = r#"{
            "name": "sku only",
            "version": "1",
            "fields": [{
                "field": "sku",
                "matchers": [{ "labels": ["SKU"], "capture": { "kind": "token", "class": "A-Z0-9" } }]
            }]
        }"#;
        let engine = RuleEngine::new(&parse_rule_table_str(json).unwrap()).unwrap();

        let record = engine.extract("Phone: 555\nSKU: K9");
        assert_eq!(record, record_with_sku("K9"));
    }

    fn record_with_sku(sku: &str) -> Record {
        let mut record = Record::empty();
        record.set(FieldName::Sku, sku);
        record
    }

    #[test]
    fn test_invalid_class_is_pattern_error() {
        let json = r#"{
            "name": "broken",
            "version": "1",
            "fields": [{
                "field": "phone",
                "matchers": [{ "labels": ["Phone"], "capture": { "kind": "token", "class": "z-a" } }]
            }]
        }"#;
        let table = parse_rule_table_str(json).unwrap();
        assert!(matches!(
            RuleEngine::new(&table),
            Err(RuleError::Pattern { field: FieldName::Phone, .. })
        ));
    }

    #[test]
    fn test_labels_pattern() {
        assert_eq!(
            labels_pattern(&["Order ID".to_string(), "Ref No.".to_string()]),
            r"(?:\bOrder\s*ID\b|\bRef\s*No\.)"
        );
    }
}
