//! Money helpers using decimal arithmetic.
//!
//! The storefront API reports amounts as JSON numbers in some payloads and as
//! numeric strings in others. These helpers normalize both into [`Decimal`]
//! without going through binary floating point.

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::{Number, Value};

/// Read a decimal amount from a JSON number or numeric string.
///
/// Returns `None` for any other JSON shape, for blank strings, and for values
/// outside the range of [`Decimal`].
///
/// # Examples
///
/// ```
/// use rust_decimal::Decimal;
/// use serde_json::json;
/// use zid_theme_core::lenient_decimal;
///
/// assert_eq!(lenient_decimal(&json!(15.5)), Some(Decimal::new(155, 1)));
/// assert_eq!(lenient_decimal(&json!(" 42.00 ")), Some(Decimal::new(4200, 2)));
/// assert_eq!(lenient_decimal(&json!("abc")), None);
/// assert_eq!(lenient_decimal(&json!(null)), None);
/// ```
#[must_use]
pub fn lenient_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => parse_decimal(&n.to_string()),
        Value::String(s) => parse_decimal(s.trim()),
        _ => None,
    }
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    if s.is_empty() {
        return None;
    }
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}

/// Format an amount with exactly two decimal places.
///
/// Midpoints round away from zero, so `0.125` becomes `"0.13"`.
#[must_use]
pub fn format_fixed2(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{rounded:.2}")
}

/// Render a JSON number the way a browser stringifies it.
///
/// Whole-valued floats lose their trailing `.0` (`100.0` renders as `"100"`),
/// everything else keeps `serde_json`'s shortest round-trip form.
#[must_use]
pub fn js_number_string(number: &Number) -> String {
    if let Some(f) = number.as_f64()
        && !number.is_i64()
        && !number.is_u64()
        && f.fract() == 0.0
        && f.abs() < 1e15
    {
        #[allow(clippy::cast_possible_truncation)] // bounded by the 1e15 check above
        return (f as i64).to_string();
    }
    number.to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lenient_decimal_numbers() {
        assert_eq!(lenient_decimal(&json!(0)), Some(Decimal::ZERO));
        assert_eq!(lenient_decimal(&json!(42)), Some(Decimal::new(42, 0)));
        assert_eq!(lenient_decimal(&json!(0.1)), Some(Decimal::new(1, 1)));
        assert_eq!(lenient_decimal(&json!(-3.25)), Some(Decimal::new(-325, 2)));
    }

    #[test]
    fn test_lenient_decimal_strings() {
        assert_eq!(lenient_decimal(&json!("19.99")), Some(Decimal::new(1999, 2)));
        assert_eq!(lenient_decimal(&json!("")), None);
        assert_eq!(lenient_decimal(&json!("   ")), None);
        assert_eq!(lenient_decimal(&json!("SAR 10")), None);
    }

    #[test]
    fn test_lenient_decimal_other_shapes() {
        assert_eq!(lenient_decimal(&json!(true)), None);
        assert_eq!(lenient_decimal(&json!([1])), None);
        assert_eq!(lenient_decimal(&json!({"amount": 1})), None);
    }

    #[test]
    fn test_format_fixed2() {
        assert_eq!(format_fixed2(Decimal::new(155, 1)), "15.50");
        assert_eq!(format_fixed2(Decimal::new(42, 0)), "42.00");
        assert_eq!(format_fixed2(Decimal::new(125, 3)), "0.13");
        assert_eq!(format_fixed2(Decimal::new(12_344, 3)), "12.34");
    }

    #[test]
    fn test_js_number_string() {
        let n = |v: Value| match v {
            Value::Number(n) => n,
            _ => unreachable!(),
        };
        assert_eq!(js_number_string(&n(json!(100))), "100");
        assert_eq!(js_number_string(&n(json!(100.0))), "100");
        assert_eq!(js_number_string(&n(json!(12.5))), "12.5");
        assert_eq!(js_number_string(&n(json!(-7))), "-7");
    }
}
