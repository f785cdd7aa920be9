use crate::error::RuleError;

use super::schema::RuleTableDef;
use super::validate_rule_table;

const SHIPPING_LABEL_JSON: &str = include_str!("../../../rules/shipping-label.json");

/// Load the built-in rule table for English shipping labels.
pub fn default_rule_table() -> Result<RuleTableDef, RuleError> {
    let table: RuleTableDef = serde_json::from_str(SHIPPING_LABEL_JSON)
        .map_err(|e| RuleError::Invalid(format!("built-in rule table: {}", e)))?;
    validate_rule_table(&table)?;
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::rules::{CaptureDef, Normalization};
    use crate::models::record::FieldName;

    #[test]
    fn test_builtin_covers_every_field() {
        let table = default_rule_table().unwrap();
        for field in FieldName::ALL {
            assert!(table.rule(field).is_some(), "missing rule for {}", field);
        }
    }

    #[test]
    fn test_ship_to_terminates_on_other_fields() {
        let table = default_rule_table().unwrap();
        let ship_to = &table.rule(FieldName::ShipTo).unwrap().matchers[0];

        assert_eq!(ship_to.normalize, Normalization::JoinLines);
        assert_eq!(
            ship_to.capture,
            CaptureDef::UntilLabels {
                terminators: vec![
                    FieldName::OrderId,
                    FieldName::Phone,
                    FieldName::SellerName,
                    FieldName::Sku,
                ]
            }
        );
    }

    #[test]
    fn test_order_id_prefers_strict_label() {
        let table = default_rule_table().unwrap();
        let order = table.rule(FieldName::OrderId).unwrap();

        assert_eq!(order.matchers.len(), 2);
        assert_eq!(order.matchers[0].labels, vec!["Order ID"]);
        assert_eq!(order.matchers[1].labels, vec!["Order"]);
        assert!(order.matchers[1].separator_required);
    }
}
