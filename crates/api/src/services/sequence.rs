//! The repeated-digit number sequence.
//!
//! For `n`, each `i` in `1..=n` is written `i` times in its decimal form:
//! `n = 5` gives `"122333444455555"`.

use serde_json::Value;

use crate::validation::{self, FieldErrors};

/// Message for a `number` below 1.
pub const NOT_POSITIVE: &str = "Field 'number' must be a positive integer.";

/// Build the sequence for `n`.
#[must_use]
pub fn number_sequence(n: u32) -> String {
    let capacity = (1..=n).fold(0_usize, |acc, i| {
        let digits = i.to_string().len();
        acc.saturating_add(digits.saturating_mul(i as usize))
    });
    let mut sequence = String::with_capacity(capacity);
    for i in 1..=n {
        let digits = i.to_string();
        for _ in 0..i {
            sequence.push_str(&digits);
        }
    }
    sequence
}

/// Validate the raw `number` field against the configured ceiling.
///
/// # Errors
///
/// Returns field errors under `number` when it is missing, not an integer,
/// below 1, or above `max`.
pub fn parse_number(value: Option<&Value>, max: u32) -> Result<u32, FieldErrors> {
    let number = validation::integer_field(value).map_err(|m| FieldErrors::single("number", m))?;
    if number < 1 {
        return Err(FieldErrors::single("number", NOT_POSITIVE));
    }
    u32::try_from(number)
        .ok()
        .filter(|n| *n <= max)
        .ok_or_else(|| FieldErrors::single("number", validation::max_value(i64::from(max))))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_small_sequences() {
        assert_eq!(number_sequence(1), "1");
        assert_eq!(number_sequence(2), "122");
        assert_eq!(number_sequence(5), "122333444455555");
    }

    #[test]
    fn test_single_digit_length() {
        for n in 1..=9_u32 {
            assert_eq!(number_sequence(n).len(), (n * (n + 1) / 2) as usize);
        }
    }

    #[test]
    fn test_multi_digit_terms_repeat_decimal_form() {
        let sequence = number_sequence(10);
        assert!(sequence.ends_with(&"10".repeat(10)));
        assert_eq!(sequence.len(), 45 + 20);
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number(Some(&json!(5)), 1000).unwrap(), 5);
        assert_eq!(parse_number(Some(&json!("7")), 1000).unwrap(), 7);
    }

    #[test]
    fn test_parse_number_rejects_non_positive() {
        for value in [json!(0), json!(-3)] {
            let err = parse_number(Some(&value), 1000).unwrap_err();
            assert_eq!(
                err.to_value(),
                json!({"number": ["Field 'number' must be a positive integer."]})
            );
        }
    }

    #[test]
    fn test_parse_number_missing_or_invalid() {
        let err = parse_number(None, 1000).unwrap_err();
        assert_eq!(err.to_value(), json!({"number": ["This field is required."]}));
        let err = parse_number(Some(&json!("five")), 1000).unwrap_err();
        assert_eq!(
            err.to_value(),
            json!({"number": ["A valid integer is required."]})
        );
    }

    #[test]
    fn test_parse_number_ceiling() {
        let err = parse_number(Some(&json!(1001)), 1000).unwrap_err();
        assert_eq!(
            err.to_value(),
            json!({"number": ["Ensure this value is less than or equal to 1000."]})
        );
        assert!(parse_number(Some(&json!(1000)), 1000).is_ok());
    }
}
