//! Wire presentation of property values.
//!
//! Single-property reads return numbers as JSON strings, the way the device
//! firmware does; batch reads keep plain JSON numbers.

use serde_json::Value;

use pharos_domain::value::PropertyValue;

/// Decimal places kept when a float is rendered as text.
const FLOAT_PRECISION: usize = 3;

/// Render `value` for a single-property `GET`.
#[must_use]
pub fn single(value: &PropertyValue) -> Value {
    match value {
        PropertyValue::Int(_) | PropertyValue::Float(_) => Value::String(text(value)),
        PropertyValue::Bool(v) => Value::Bool(*v),
        PropertyValue::String(v) => Value::String(v.clone()),
        PropertyValue::List(v) => Value::Array(v.clone()),
    }
}

/// Render `value` as plain text: integers in decimal, floats with at most
/// three decimals and no trailing zeros.
#[must_use]
pub fn text(value: &PropertyValue) -> String {
    match value {
        PropertyValue::Float(v) => {
            let fixed = format!("{v:.FLOAT_PRECISION$}");
            let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
            match trimmed {
                "-0" | "" => "0".to_string(),
                other => other.to_string(),
            }
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_trim_trailing_zeros() {
        assert_eq!(text(&PropertyValue::Float(75.5)), "75.5");
        assert_eq!(text(&PropertyValue::Float(100.0)), "100");
        assert_eq!(text(&PropertyValue::Float(0.125)), "0.125");
    }

    #[test]
    fn should_round_to_three_decimals() {
        assert_eq!(text(&PropertyValue::Float(2.666_666)), "2.667");
        assert_eq!(text(&PropertyValue::Float(-0.0001)), "0");
    }

    #[test]
    fn should_render_integers_in_decimal() {
        assert_eq!(single(&PropertyValue::Int(-1)), Value::String("-1".to_string()));
    }

    #[test]
    fn should_keep_non_numbers_as_json() {
        assert_eq!(single(&PropertyValue::Bool(true)), Value::Bool(true));
        assert_eq!(
            single(&PropertyValue::String("StateOff".to_string())),
            Value::String("StateOff".to_string())
        );
        assert_eq!(single(&PropertyValue::List(vec![])), Value::Array(vec![]));
    }
}
