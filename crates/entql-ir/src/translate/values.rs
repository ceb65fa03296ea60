//! Column names, literal coercion and parameter lookup

use entql_ast::{ColumnRef, ColumnSource, Literal, Operand};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::error::TranslateError;
use crate::command::Parameters;
use crate::AttributeValue;

pub(crate) fn entity_name(table: &str) -> String {
    table.to_lowercase()
}

pub(crate) fn attribute_name(column: &ColumnRef) -> String {
    column.name.to_lowercase()
}

/// Alias if the source carries one, else its entity name.
pub(crate) fn source_name(source: &ColumnSource) -> String {
    match &source.alias {
        Some(alias) => alias.clone(),
        None => entity_name(&source.table),
    }
}

pub(crate) fn describe_column(column: &ColumnRef) -> String {
    match &column.source {
        Some(source) => format!("{}.{}", source_name(source), column.name),
        None => column.name.clone(),
    }
}

/// Coerce a literal to the value sent to the remote service.
///
/// Strings that parse as identifiers become identifiers, whole numbers that
/// fit 32 bits become `Int32`, other numbers become decimals unless the
/// decimal range overflows, in which case the float is kept.
pub fn coerce_literal(literal: &Literal) -> Result<AttributeValue, TranslateError> {
    match literal {
        Literal::String(value) => Ok(match Uuid::parse_str(value) {
            Ok(guid) => AttributeValue::Guid(guid),
            Err(_) => AttributeValue::String(value.clone()),
        }),
        Literal::Numeric(value) => Ok(coerce_numeric(*value)),
        Literal::Null => Ok(AttributeValue::Null),
        Literal::Boolean(value) => Err(TranslateError::UnsupportedLiteral(format!(
            "boolean literal {}",
            value
        ))),
        Literal::Binary(bytes) => Err(TranslateError::UnsupportedLiteral(format!(
            "binary literal of {} bytes",
            bytes.len()
        ))),
    }
}

fn coerce_numeric(value: f64) -> AttributeValue {
    if value.fract() == 0.0 && value >= i32::MIN as f64 && value <= i32::MAX as f64 {
        return AttributeValue::Int32(value as i32);
    }
    match Decimal::from_f64(value) {
        Some(decimal) => AttributeValue::Decimal(decimal),
        None => AttributeValue::Double(value),
    }
}

/// Bound parameter value, passed through exactly as the caller supplied it.
pub(crate) fn parameter_value(
    parameters: &Parameters,
    name: &str,
) -> Result<AttributeValue, TranslateError> {
    parameters
        .get(name)
        .cloned()
        .ok_or_else(|| TranslateError::MissingParameterValue(name.to_string()))
}

/// Value of a literal or placeholder operand; `None` for any other operand.
pub(crate) fn operand_value(
    operand: &Operand,
    parameters: &Parameters,
) -> Result<Option<AttributeValue>, TranslateError> {
    match operand {
        Operand::Literal(literal) => coerce_literal(literal).map(Some),
        Operand::Placeholder(name) => parameter_value(parameters, name).map(Some),
        Operand::Column(_) | Operand::Function(_) | Operand::Subquery(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_plain_string_stays_string() {
        let value = coerce_literal(&Literal::String("123".to_string())).unwrap();
        assert_eq!(value, AttributeValue::String("123".to_string()));
    }

    #[test]
    fn test_identifier_string_becomes_guid() {
        let text = "9c2f8a52-1e5b-4c3e-8f61-3a9d0c7b4e21";
        let value = coerce_literal(&Literal::String(text.to_string())).unwrap();
        assert_eq!(value, AttributeValue::Guid(Uuid::parse_str(text).unwrap()));
    }

    #[test]
    fn test_numeric_coercion() {
        assert_eq!(coerce_literal(&Literal::Numeric(5.0)).unwrap(), AttributeValue::Int32(5));
        assert_eq!(
            coerce_literal(&Literal::Numeric(5.5)).unwrap(),
            AttributeValue::Decimal(Decimal::from_str("5.5").unwrap())
        );
        // whole but wider than 32 bits
        assert_eq!(
            coerce_literal(&Literal::Numeric(3_000_000_000.0)).unwrap(),
            AttributeValue::Decimal(Decimal::from(3_000_000_000i64))
        );
        // beyond the decimal range
        assert_eq!(
            coerce_literal(&Literal::Numeric(1.0e30)).unwrap(),
            AttributeValue::Double(1.0e30)
        );
    }

    #[test]
    fn test_null_is_explicit() {
        assert_eq!(coerce_literal(&Literal::Null).unwrap(), AttributeValue::Null);
    }

    #[test]
    fn test_other_literals_rejected() {
        assert!(matches!(
            coerce_literal(&Literal::Boolean(true)),
            Err(TranslateError::UnsupportedLiteral(_))
        ));
    }

    #[test]
    fn test_placeholder_passes_through_uncoerced() {
        let mut parameters = Parameters::new();
        parameters.insert("@code", "123");

        let value = operand_value(&Operand::placeholder("@code"), &parameters).unwrap();
        assert_eq!(value, Some(AttributeValue::String("123".to_string())));

        let missing = operand_value(&Operand::placeholder("@other"), &parameters);
        assert_eq!(
            missing,
            Err(TranslateError::MissingParameterValue("@other".to_string()))
        );
    }
}
