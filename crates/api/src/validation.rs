//! Field-scoped validation errors.
//!
//! Request validation collects messages per field and renders them as a JSON
//! object mapping each field to a list of messages (or, for list fields, to
//! one object per submitted item), the shape API clients already parse.

use serde::Serialize;
use serde_json::{Map, Value};

/// Message for a field missing from the request body.
pub const REQUIRED: &str = "This field is required.";
/// Message for a value that is not an integer.
pub const INVALID_INTEGER: &str = "A valid integer is required.";
/// Message for a value repeated within a list that must hold distinct values.
pub const NOT_UNIQUE: &str = "This field must be unique.";
/// Message for an empty string field.
pub const BLANK: &str = "This field may not be blank.";
/// Message for a value that cannot be read as a string.
pub const INVALID_STRING: &str = "Not a valid string.";

/// Message for an integer below its minimum.
#[must_use]
pub fn min_value(min: i64) -> String {
    format!("Ensure this value is greater than or equal to {min}.")
}

/// Message for an integer above its maximum.
#[must_use]
pub fn max_value(max: i64) -> String {
    format!("Ensure this value is less than or equal to {max}.")
}

/// Name of a JSON value's type, as reported back in validation messages.
#[must_use]
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

/// Read an integer field.
///
/// Integers, integral floats (`2.0`) and strings holding either are
/// accepted; anything else is reported with [`INVALID_INTEGER`].
///
/// # Errors
///
/// Returns the message to attach to the field.
pub fn integer_field(value: Option<&Value>) -> Result<i64, String> {
    match value {
        None | Some(Value::Null) => Err(REQUIRED.to_owned()),
        Some(Value::Number(n)) => n
            .as_i64()
            .map_or_else(|| parse_integer(&n.to_string()), Ok),
        Some(Value::String(s)) => parse_integer(s),
        Some(_) => Err(INVALID_INTEGER.to_owned()),
    }
}

/// Parse decimal text, ignoring a fractional part made only of zeros.
fn parse_integer(text: &str) -> Result<i64, String> {
    let text = text.trim();
    let digits = match text.split_once('.') {
        Some((whole, fraction)) if fraction.chars().all(|c| c == '0') => whole,
        _ => text,
    };
    digits.parse().map_err(|_| INVALID_INTEGER.to_owned())
}

/// Read a non-blank string field.
///
/// Numbers are accepted in their decimal form; other non-string values are
/// reported with [`INVALID_STRING`].
///
/// # Errors
///
/// Returns the message to attach to the field.
pub fn string_field(value: Option<&Value>) -> Result<String, String> {
    let text = match value {
        None | Some(Value::Null) => return Err(REQUIRED.to_owned()),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(_) => return Err(INVALID_STRING.to_owned()),
    };
    if text.trim().is_empty() {
        return Err(BLANK.to_owned());
    }
    Ok(text)
}

/// Validation failures keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(Map<String, Value>);

impl FieldErrors {
    /// Create an empty error set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an error set holding a single message for `field`.
    #[must_use]
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    /// Append a message to `field`.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        let entry = self
            .0
            .entry(field.to_owned())
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(messages) = entry {
            messages.push(Value::String(message.into()));
        } else {
            *entry = Value::Array(vec![Value::String(message.into())]);
        }
    }

    /// Attach per-item errors to a list field.
    ///
    /// `items` holds one entry per submitted item; valid items are empty.
    pub fn add_items(&mut self, field: &str, items: Vec<Self>) {
        let items = items.into_iter().map(|item| Value::Object(item.0)).collect();
        self.0.insert(field.to_owned(), Value::Array(items));
    }

    /// Returns `true` if no field has an error.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the errors as a JSON value.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_string_field() {
        assert_eq!(string_field(Some(&json!("auth_user"))).unwrap(), "auth_user");
        assert_eq!(string_field(Some(&json!(42))).unwrap(), "42");
        assert_eq!(string_field(None).unwrap_err(), REQUIRED);
        assert_eq!(string_field(Some(&json!("  "))).unwrap_err(), BLANK);
        assert_eq!(string_field(Some(&json!([1]))).unwrap_err(), INVALID_STRING);
    }

    #[test]
    fn test_single_error() {
        let errors = FieldErrors::single("number", REQUIRED);
        assert_eq!(errors.to_value(), json!({"number": ["This field is required."]}));
    }

    #[test]
    fn test_messages_accumulate_per_field() {
        let mut errors = FieldErrors::new();
        errors.add("amount", REQUIRED);
        errors.add("amount", min_value(1));
        assert_eq!(
            errors.to_value(),
            json!({"amount": [
                "This field is required.",
                "Ensure this value is greater than or equal to 1."
            ]})
        );
    }

    #[test]
    fn test_item_errors_keep_positions() {
        let mut errors = FieldErrors::new();
        errors.add_items(
            "goods",
            vec![FieldErrors::new(), FieldErrors::single("good", NOT_UNIQUE)],
        );
        assert_eq!(
            errors.to_value(),
            json!({"goods": [{}, {"good": ["This field must be unique."]}]})
        );
    }

    #[test]
    fn test_integer_field() {
        assert_eq!(integer_field(Some(&json!(5))), Ok(5));
        assert_eq!(integer_field(Some(&json!("12"))), Ok(12));
        assert_eq!(integer_field(None), Err(REQUIRED.to_owned()));
        assert_eq!(integer_field(Some(&json!(null))), Err(REQUIRED.to_owned()));
        assert_eq!(
            integer_field(Some(&json!("abc"))),
            Err(INVALID_INTEGER.to_owned())
        );
        assert_eq!(
            integer_field(Some(&json!(1.5))),
            Err(INVALID_INTEGER.to_owned())
        );
        assert_eq!(
            integer_field(Some(&json!([1]))),
            Err(INVALID_INTEGER.to_owned())
        );
    }

    #[test]
    fn test_integer_field_accepts_integral_floats() {
        assert_eq!(integer_field(Some(&json!(2.0))), Ok(2));
        assert_eq!(integer_field(Some(&json!(-3.0))), Ok(-3));
        assert_eq!(integer_field(Some(&json!("4.00"))), Ok(4));
        assert_eq!(integer_field(Some(&json!("7."))), Ok(7));
        assert_eq!(
            integer_field(Some(&json!("2.50"))),
            Err(INVALID_INTEGER.to_owned())
        );
        assert_eq!(
            integer_field(Some(&json!(1e30))),
            Err(INVALID_INTEGER.to_owned())
        );
        assert_eq!(integer_field(Some(&json!("."))), Err(INVALID_INTEGER.to_owned()));
    }

    #[test]
    fn test_json_type_name() {
        assert_eq!(json_type_name(&json!("x")), "str");
        assert_eq!(json_type_name(&json!(1)), "int");
        assert_eq!(json_type_name(&json!(1.5)), "float");
        assert_eq!(json_type_name(&json!({})), "dict");
    }
}
