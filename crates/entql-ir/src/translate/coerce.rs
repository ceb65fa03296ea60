//! Insert value coercion against declared attribute types

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

use super::error::TranslateError;
use crate::metadata::{AttributeMetadata, AttributeType};
use crate::AttributeValue;

/// Convert a value to the representation the attribute's type requires.
///
/// Null passes through for every type.
pub fn coerce_to_attribute(
    attribute: &AttributeMetadata,
    value: AttributeValue,
) -> Result<AttributeValue, TranslateError> {
    if value.is_null() {
        return Ok(value);
    }

    let coerced = match attribute.attribute_type {
        AttributeType::String | AttributeType::Memo | AttributeType::EntityName => {
            to_text(&value).map(AttributeValue::String)
        }
        AttributeType::Integer => to_i64(&value)
            .and_then(|v| i32::try_from(v).ok())
            .map(AttributeValue::Int32),
        AttributeType::BigInt => to_i64(&value).map(AttributeValue::Int64),
        AttributeType::Decimal => to_decimal(&value).map(AttributeValue::Decimal),
        AttributeType::Money => to_decimal(&value).map(AttributeValue::Money),
        AttributeType::Double => to_f64(&value).map(AttributeValue::Double),
        AttributeType::Boolean => to_bool(&value).map(AttributeValue::Boolean),
        AttributeType::DateTime => to_datetime(&value).map(AttributeValue::DateTime),
        AttributeType::Uniqueidentifier => to_guid(&value).map(AttributeValue::Guid),
        AttributeType::Lookup | AttributeType::Customer | AttributeType::Owner => {
            to_reference(attribute, &value)
        }
        AttributeType::Picklist | AttributeType::State | AttributeType::Status => to_i64(&value)
            .and_then(|v| i32::try_from(v).ok())
            .map(AttributeValue::OptionSet),
        AttributeType::CalendarRules
        | AttributeType::ManagedProperty
        | AttributeType::PartyList
        | AttributeType::Virtual => None,
    };

    coerced.ok_or_else(|| TranslateError::TypeCoercion {
        attribute: attribute.logical_name.clone(),
        expected: attribute.attribute_type,
        value: value.to_string(),
    })
}

fn to_text(value: &AttributeValue) -> Option<String> {
    match value {
        AttributeValue::String(s) => Some(s.clone()),
        AttributeValue::Guid(g) => Some(g.to_string()),
        AttributeValue::Int32(i) => Some(i.to_string()),
        AttributeValue::Int64(i) => Some(i.to_string()),
        AttributeValue::Decimal(d) | AttributeValue::Money(d) => Some(d.to_string()),
        AttributeValue::Double(d) => Some(d.to_string()),
        _ => None,
    }
}

fn to_i64(value: &AttributeValue) -> Option<i64> {
    match value {
        AttributeValue::Int32(i) | AttributeValue::OptionSet(i) => Some(i64::from(*i)),
        AttributeValue::Int64(i) => Some(*i),
        AttributeValue::Decimal(d) | AttributeValue::Money(d) if d.fract().is_zero() => d.to_i64(),
        // `i64::MAX as f64` rounds up to 2^63, hence the strict upper bound
        AttributeValue::Double(d)
            if d.fract() == 0.0 && *d >= i64::MIN as f64 && *d < i64::MAX as f64 =>
        {
            Some(*d as i64)
        }
        AttributeValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn to_decimal(value: &AttributeValue) -> Option<Decimal> {
    match value {
        AttributeValue::Int32(i) => Some(Decimal::from(*i)),
        AttributeValue::Int64(i) => Some(Decimal::from(*i)),
        AttributeValue::Decimal(d) | AttributeValue::Money(d) => Some(*d),
        AttributeValue::Double(d) => Decimal::from_f64(*d),
        AttributeValue::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    }
}

fn to_f64(value: &AttributeValue) -> Option<f64> {
    match value {
        AttributeValue::Int32(i) => Some(f64::from(*i)),
        AttributeValue::Int64(i) => Some(*i as f64),
        AttributeValue::Decimal(d) | AttributeValue::Money(d) => d.to_f64(),
        AttributeValue::Double(d) => Some(*d),
        AttributeValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn to_bool(value: &AttributeValue) -> Option<bool> {
    match value {
        AttributeValue::Boolean(b) => Some(*b),
        AttributeValue::Int32(0) => Some(false),
        AttributeValue::Int32(1) => Some(true),
        AttributeValue::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn to_datetime(value: &AttributeValue) -> Option<DateTime<Utc>> {
    match value {
        AttributeValue::DateTime(dt) => Some(*dt),
        AttributeValue::String(s) => parse_datetime(s.trim()),
        _ => None,
    }
}

fn parse_datetime(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn to_guid(value: &AttributeValue) -> Option<Uuid> {
    match value {
        AttributeValue::Guid(g) => Some(*g),
        AttributeValue::EntityReference { id, .. } => Some(*id),
        AttributeValue::String(s) => Uuid::parse_str(s.trim()).ok(),
        _ => None,
    }
}

fn to_reference(attribute: &AttributeMetadata, value: &AttributeValue) -> Option<AttributeValue> {
    if let AttributeValue::EntityReference { .. } = value {
        return Some(value.clone());
    }
    let id = to_guid(value)?;
    // Only an unambiguous target can name the referenced entity.
    let logical_name = match attribute.targets.as_slice() {
        [target] => Some(target.clone()),
        _ => None,
    };
    Some(AttributeValue::EntityReference { logical_name, id })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coerce(attribute_type: AttributeType, value: AttributeValue) -> Result<AttributeValue, TranslateError> {
        coerce_to_attribute(&AttributeMetadata::new("attr", attribute_type), value)
    }

    #[test]
    fn test_null_passes_every_type() {
        for attribute_type in [AttributeType::Integer, AttributeType::Lookup, AttributeType::Virtual] {
            assert_eq!(coerce(attribute_type, AttributeValue::Null), Ok(AttributeValue::Null));
        }
    }

    #[test]
    fn test_numeric_targets() {
        assert_eq!(coerce(AttributeType::Integer, "42".into()), Ok(AttributeValue::Int32(42)));
        assert_eq!(coerce(AttributeType::BigInt, 7.into()), Ok(AttributeValue::Int64(7)));
        assert_eq!(
            coerce(AttributeType::Money, "19.99".into()),
            Ok(AttributeValue::Money(Decimal::from_str("19.99").unwrap()))
        );
        assert_eq!(coerce(AttributeType::Double, 2.into()), Ok(AttributeValue::Double(2.0)));
        assert!(matches!(
            coerce(AttributeType::Integer, AttributeValue::Decimal(Decimal::from_str("1.5").unwrap())),
            Err(TranslateError::TypeCoercion { .. })
        ));
    }

    #[test]
    fn test_out_of_range_double_rejected_for_integers() {
        assert_eq!(
            coerce(AttributeType::BigInt, AttributeValue::Double(4.0e15)),
            Ok(AttributeValue::Int64(4_000_000_000_000_000))
        );
        for value in [1.0e30, -1.0e25, 9_223_372_036_854_775_808.0] {
            assert!(matches!(
                coerce(AttributeType::BigInt, AttributeValue::Double(value)),
                Err(TranslateError::TypeCoercion {
                    expected: AttributeType::BigInt,
                    ..
                })
            ));
        }
        assert!(matches!(
            coerce(AttributeType::Integer, AttributeValue::Double(1.0e30)),
            Err(TranslateError::TypeCoercion { .. })
        ));
    }

    #[test]
    fn test_boolean_forms() {
        assert_eq!(coerce(AttributeType::Boolean, 1.into()), Ok(AttributeValue::Boolean(true)));
        assert_eq!(coerce(AttributeType::Boolean, "False".into()), Ok(AttributeValue::Boolean(false)));
        assert!(coerce(AttributeType::Boolean, 2.into()).is_err());
    }

    #[test]
    fn test_datetime_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        assert_eq!(
            coerce(AttributeType::DateTime, "2024-03-01".into()),
            Ok(AttributeValue::DateTime(expected))
        );
        assert_eq!(
            coerce(AttributeType::DateTime, "2024-03-01 00:00:00".into()),
            Ok(AttributeValue::DateTime(expected))
        );
        assert_eq!(
            coerce(AttributeType::DateTime, "2024-03-01T00:00:00Z".into()),
            Ok(AttributeValue::DateTime(expected))
        );
    }

    #[test]
    fn test_lookup_takes_single_target() {
        let id = Uuid::new_v4();
        let attribute = AttributeMetadata::new("parentcustomerid", AttributeType::Lookup)
            .with_targets(["account"]);

        assert_eq!(
            coerce_to_attribute(&attribute, AttributeValue::Guid(id)),
            Ok(AttributeValue::EntityReference {
                logical_name: Some("account".to_string()),
                id,
            })
        );
    }

    #[test]
    fn test_unconvertible_value_reports_attribute() {
        let err = coerce(AttributeType::Uniqueidentifier, "not-a-guid".into()).unwrap_err();
        assert_eq!(
            err,
            TranslateError::TypeCoercion {
                attribute: "attr".to_string(),
                expected: AttributeType::Uniqueidentifier,
                value: "'not-a-guid'".to_string(),
            }
        );
    }
}
