//! Lenient field access for loosely-typed broker and alert payloads.
//!
//! Brokers return numbers as JSON numbers or as strings depending on the
//! endpoint, and field names vary between vendors.

use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::str::FromStr;

/// First present, non-null field among `keys`.
pub fn field<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .find(|v| !v.is_null())
}

/// Numeric value (number or numeric string) as a decimal.
pub fn decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => Decimal::from_str(&n.to_string())
            .or_else(|_| Decimal::from_scientific(&n.to_string()))
            .ok(),
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    }
}

/// Integral value (number or numeric string).
pub fn integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Numeric value as f64.
pub fn float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// String value, trimmed; numbers are rendered.
pub fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_decimal_accepts_numbers_and_strings() {
        assert_eq!(decimal(&json!(0.25)), Some(dec!(0.25)));
        assert_eq!(decimal(&json!("1.5")), Some(dec!(1.5)));
        assert_eq!(decimal(&json!(-12)), Some(dec!(-12)));
        assert_eq!(decimal(&json!("abc")), None);
        assert_eq!(decimal(&json!(true)), None);
    }

    #[test]
    fn test_integer_rejects_fractions() {
        assert_eq!(integer(&json!(123456)), Some(123456));
        assert_eq!(integer(&json!("42")), Some(42));
        assert_eq!(integer(&json!(1.5)), None);
    }

    #[test]
    fn test_field_skips_nulls() {
        let value = json!({"lots": null, "volume": 0.3});
        let obj = value.as_object().unwrap();
        assert_eq!(field(obj, &["lots", "volume"]), Some(&json!(0.3)));
        assert_eq!(field(obj, &["missing"]), None);
    }
}
