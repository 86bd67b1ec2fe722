//! UpdateItem expression building.
//!
//! Pure functions that turn a [`DevicePatch`] into the update expression,
//! attribute names and attribute values of an UpdateItem request.

use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use chrono::{DateTime, Utc};
use devicehub_core::device::DevicePatch;

use super::conversions::{format_datetime, KEY_ATTRIBUTE};

/// Condition that makes UpdateItem fail instead of creating a new item, or
/// when `updated_at` would precede `created_at`.
///
/// Timestamps are fixed-width RFC 3339 strings, so string order is time order.
pub const UPDATE_CONDITION: &str = "attribute_exists(#id) AND #created_at <= :updated_at";

/// The parts of an UpdateItem request derived from a patch.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateExpression {
    pub expression: String,
    pub names: HashMap<String, String>,
    pub values: HashMap<String, AttributeValue>,
}

/// Build a `SET` expression for the supplied fields plus `updated_at`.
///
/// Placeholders are `#field` and `:field`, so attribute names that collide
/// with DynamoDB reserved words (`name` is one) stay valid. Returns `None`
/// for an empty patch.
pub fn build_update_expression(
    patch: &DevicePatch,
    updated_at: &DateTime<Utc>,
) -> Option<UpdateExpression> {
    if patch.is_empty() {
        return None;
    }

    let mut assignments = Vec::new();
    let mut names = HashMap::new();
    let mut values = HashMap::new();

    let updated_at = format_datetime(updated_at);
    let fields = patch
        .fields()
        .into_iter()
        .chain(std::iter::once(("updated_at", updated_at.as_str())));

    for (field, value) in fields {
        assignments.push(format!("#{field} = :{field}"));
        names.insert(format!("#{field}"), field.to_string());
        values.insert(format!(":{field}"), AttributeValue::S(value.to_string()));
    }
    names.insert("#id".to_string(), KEY_ATTRIBUTE.to_string());
    names.insert("#created_at".to_string(), "created_at".to_string());

    Some(UpdateExpression {
        expression: format!("SET {}", assignments.join(", ")),
        names,
        values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timestamp() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-06-15T10:30:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_empty_patch_has_no_expression() {
        assert_eq!(
            build_update_expression(&DevicePatch::default(), &timestamp()),
            None
        );
    }

    #[test]
    fn test_single_field_expression() {
        let patch = DevicePatch::default().with_manufacturer("Globex");

        let update = build_update_expression(&patch, &timestamp()).unwrap();

        assert_eq!(
            update.expression,
            "SET #manufacturer = :manufacturer, #updated_at = :updated_at"
        );
        assert_eq!(update.names.get("#manufacturer").unwrap(), "manufacturer");
        assert_eq!(update.names.get("#id").unwrap(), "id");
        assert!(!update.names.contains_key("#name"));
        assert_eq!(
            update.values.get(":manufacturer").unwrap().as_s().unwrap(),
            "Globex"
        );
        assert_eq!(
            update.values.get(":updated_at").unwrap().as_s().unwrap(),
            "2024-06-15T10:30:00.000000000Z"
        );
    }

    #[test]
    fn test_both_fields_expression() {
        let patch = DevicePatch::default()
            .with_name("Heat Pump")
            .with_manufacturer("Globex");

        let update = build_update_expression(&patch, &timestamp()).unwrap();

        assert_eq!(
            update.expression,
            "SET #name = :name, #manufacturer = :manufacturer, #updated_at = :updated_at"
        );
        assert_eq!(update.values.len(), 3);
        assert_eq!(update.names.len(), 5);
    }

    #[test]
    fn test_condition_placeholders_are_bound() {
        let patch = DevicePatch::default().with_name("Heat Pump");

        let update = build_update_expression(&patch, &timestamp()).unwrap();

        for placeholder in ["#id", "#created_at"] {
            assert!(UPDATE_CONDITION.contains(placeholder));
            assert!(update.names.contains_key(placeholder));
        }
        assert!(UPDATE_CONDITION.contains(":updated_at"));
        assert!(update.values.contains_key(":updated_at"));
        assert_eq!(update.names.get("#created_at").unwrap(), "created_at");
    }
}
