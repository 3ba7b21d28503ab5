//! Client-supplied request fields.
//!
//! Request bodies deserialize every field as a [`Lenient`] so that a value of
//! the wrong JSON type, or an unknown enum variant, is reported by validation
//! against its field instead of failing the whole body.

use crate::error::FieldError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A field that is either a well-typed `T` or whatever JSON arrived instead.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Lenient<T> {
    /// The value parsed as `T`
    Valid(T),
    /// Any other JSON value
    Invalid(Value),
}

impl<T> Lenient<T> {
    /// The parsed value, if there is one.
    #[must_use]
    pub fn valid(self) -> Option<T> {
        match self {
            Self::Valid(value) => Some(value),
            Self::Invalid(_) => None,
        }
    }
}

impl<T> From<T> for Lenient<T> {
    fn from(value: T) -> Self {
        Self::Valid(value)
    }
}

/// Resolve a mandatory field, recording `missing` or `invalid` under `field`.
pub(crate) fn required<T>(
    value: Option<Lenient<T>>,
    field: &str,
    missing: &str,
    invalid: &str,
    errors: &mut Vec<FieldError>,
) -> Option<T> {
    match value {
        None => {
            errors.push(FieldError::new(field, missing));
            None
        },
        Some(value) => optional(Some(value), field, invalid, errors),
    }
}

/// Resolve an optional field; only a mistyped value is an error.
pub(crate) fn optional<T>(
    value: Option<Lenient<T>>,
    field: &str,
    invalid: &str,
    errors: &mut Vec<FieldError>,
) -> Option<T> {
    match value? {
        Lenient::Valid(value) => Some(value),
        Lenient::Invalid(_) => {
            errors.push(FieldError::new(field, invalid));
            None
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Body {
        count: Option<Lenient<i64>>,
    }

    #[test]
    fn mistyped_values_are_kept_not_rejected() {
        let body: Body = serde_json::from_str(r#"{"count":"ten"}"#).unwrap();
        assert_eq!(body.count, Some(Lenient::Invalid(Value::from("ten"))));

        let body: Body = serde_json::from_str(r#"{"count":7}"#).unwrap();
        assert_eq!(body.count.and_then(Lenient::valid), Some(7));
    }

    #[test]
    fn null_and_absent_read_as_missing() {
        let body: Body = serde_json::from_str(r#"{"count":null}"#).unwrap();
        assert!(body.count.is_none());
        let body: Body = serde_json::from_str("{}").unwrap();
        assert!(body.count.is_none());
    }

    #[test]
    fn resolution_records_field_errors() {
        let mut errors = Vec::new();
        assert_eq!(required::<i64>(None, "count", "missing", "bad", &mut errors), None);
        assert_eq!(
            optional(Some(Lenient::<i64>::Invalid(Value::Bool(true))), "count", "bad", &mut errors),
            None
        );
        assert_eq!(optional::<i64>(None, "count", "bad", &mut errors), None);
        assert_eq!(required(Some(Lenient::Valid(3_i64)), "count", "missing", "bad", &mut errors), Some(3));
        assert_eq!(
            errors,
            vec![FieldError::new("count", "missing"), FieldError::new("count", "bad")]
        );
    }
}
