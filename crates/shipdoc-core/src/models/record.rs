//! Extracted record and result table models.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Header of the trailing column holding the source document name.
pub const SOURCE_COLUMN: &str = "File Name";

/// A field extracted from a shipping document.
///
/// Declaration order is the column order of the result table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldName {
    /// Recipient address block.
    ShipTo,
    /// Order identifier.
    OrderId,
    /// Recipient phone number.
    Phone,
    /// Seller or merchant name.
    SellerName,
    /// Stock keeping unit code.
    Sku,
}

impl FieldName {
    /// All fields in column order.
    pub const ALL: [FieldName; 5] = [
        FieldName::ShipTo,
        FieldName::OrderId,
        FieldName::Phone,
        FieldName::SellerName,
        FieldName::Sku,
    ];

    /// Column header used in exported tables.
    pub fn column(&self) -> &'static str {
        match self {
            FieldName::ShipTo => "Ship To",
            FieldName::OrderId => "Order ID",
            FieldName::Phone => "Phone",
            FieldName::SellerName => "Seller Name",
            FieldName::Sku => "SKU",
        }
    }

    /// Key used in rule tables and JSON output.
    pub fn key(&self) -> &'static str {
        match self {
            FieldName::ShipTo => "ship_to",
            FieldName::OrderId => "order_id",
            FieldName::Phone => "phone",
            FieldName::SellerName => "seller_name",
            FieldName::Sku => "sku",
        }
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// Fields extracted from one document.
///
/// Every field is present; a field that was not found holds an empty string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Name of the source document (empty until tagged by the batch).
    #[serde(rename = "file_name")]
    pub source: String,

    /// Extracted values keyed by field.
    pub values: BTreeMap<FieldName, String>,
}

impl Record {
    /// Create a record with every field empty.
    pub fn empty() -> Self {
        Self {
            source: String::new(),
            values: FieldName::ALL
                .iter()
                .map(|field| (*field, String::new()))
                .collect(),
        }
    }

    /// Tag the record with the name of its source document.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Value of a field, empty when not found.
    pub fn get(&self, field: FieldName) -> &str {
        self.values.get(&field).map(String::as_str).unwrap_or("")
    }

    /// Set the value of a field.
    pub fn set(&mut self, field: FieldName, value: impl Into<String>) {
        self.values.insert(field, value.into());
    }

    /// True when no field holds a value.
    pub fn is_blank(&self) -> bool {
        FieldName::ALL.iter().all(|field| self.get(*field).is_empty())
    }

    /// Fields that have no entry at all (as opposed to an empty value).
    pub fn missing_fields(&self) -> Vec<FieldName> {
        FieldName::ALL
            .iter()
            .copied()
            .filter(|field| !self.values.contains_key(field))
            .collect()
    }
}

impl Default for Record {
    fn default() -> Self {
        Self::empty()
    }
}

/// Batch output: one complete row per successfully read document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResultTable {
    records: Vec<Record>,
}

impl ResultTable {
    /// Build a table from records, keeping their order.
    ///
    /// A record lacking a field entry gets an empty value for it so that every
    /// row carries the full column set.
    pub fn from_records(records: Vec<Record>) -> Self {
        let records = records
            .into_iter()
            .map(|mut record| {
                for field in record.missing_fields() {
                    warn!(
                        "Record for {} has no {} entry, filling with empty value",
                        record.source, field
                    );
                    record.set(field, "");
                }
                record
            })
            .collect();

        Self { records }
    }

    /// Column headers in output order.
    pub fn columns() -> [&'static str; 6] {
        [
            FieldName::ShipTo.column(),
            FieldName::OrderId.column(),
            FieldName::Phone.column(),
            FieldName::SellerName.column(),
            FieldName::Sku.column(),
            SOURCE_COLUMN,
        ]
    }

    /// Rows as cells in column order.
    pub fn rows(&self) -> impl Iterator<Item = [&str; 6]> + '_ {
        self.records.iter().map(|record| {
            [
                record.get(FieldName::ShipTo),
                record.get(FieldName::OrderId),
                record.get(FieldName::Phone),
                record.get(FieldName::SellerName),
                record.get(FieldName::Sku),
                record.source.as_str(),
            ]
        })
    }

    /// Records in input order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_record_has_every_field() {
        let record = Record::empty();
        assert!(record.missing_fields().is_empty());
        assert!(record.is_blank());
        assert_eq!(record.get(FieldName::Sku), "");
    }

    #[test]
    fn test_columns_order() {
        assert_eq!(
            ResultTable::columns(),
            ["Ship To", "Order ID", "Phone", "Seller Name", "SKU", "File Name"]
        );
    }

    #[test]
    fn test_table_fills_missing_fields() {
        let mut partial = Record::empty().with_source("a.pdf");
        partial.values.remove(&FieldName::Phone);
        partial.set(FieldName::OrderId, "42");

        let table = ResultTable::from_records(vec![partial]);
        let rows: Vec<_> = table.rows().collect();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0], ["", "42", "", "", "", "a.pdf"]);
        assert!(table.records()[0].missing_fields().is_empty());
    }

    #[test]
    fn test_table_keeps_blank_records() {
        let table = ResultTable::from_records(vec![
            Record::empty().with_source("one.pdf"),
            Record::empty().with_source("two.pdf"),
        ]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.records()[1].source, "two.pdf");
    }

    #[test]
    fn test_field_keys_match_serde() {
        for field in FieldName::ALL {
            let json = serde_json::to_string(&field).unwrap();
            assert_eq!(json, format!("\"{}\"", field.key()));
        }
    }
}
