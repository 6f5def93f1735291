//! Attribute type tags and value coercion.

use crate::errors::TypeCoercionError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// The declared type of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    /// Any value, stored untouched.
    #[default]
    Any,
    /// A string.
    String,
    /// A 32-bit integer.
    Integer,
    /// A 64-bit integer.
    Long,
    /// A floating point number.
    Double,
    /// A boolean.
    Boolean,
    /// A JSON object.
    Object,
    /// An opaque structured value, kept as a JSON object.
    #[serde(rename = "complex_object", alias = "complexObject")]
    ComplexObject,
    /// A JSON array.
    Array,
    /// A string-to-string map.
    Params,
}

impl DataType {
    /// Returns the canonical name of the type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::String => "string",
            Self::Integer => "integer",
            Self::Long => "long",
            Self::Double => "double",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::ComplexObject => "complex_object",
            Self::Array => "array",
            Self::Params => "params",
        }
    }

    /// Returns true for the types whose values are JSON objects.
    #[must_use]
    pub const fn is_object_like(self) -> bool {
        matches!(self, Self::Object | Self::ComplexObject | Self::Params)
    }

    /// Coerces a value to this type.
    ///
    /// # Errors
    ///
    /// Returns `TypeCoercionError` when the value cannot represent this type.
    pub fn coerce(self, value: Value) -> Result<Value, TypeCoercionError> {
        match self {
            Self::Any => Ok(value),
            Self::String => Ok(Value::String(coerce_to_string(value))),
            Self::Integer => {
                coerce_to_integer(value, self, i64::from(i32::MIN), i64::from(i32::MAX))
            }
            Self::Long => coerce_to_integer(value, self, i64::MIN, i64::MAX),
            Self::Double => coerce_to_double(value),
            Self::Boolean => coerce_to_boolean(value),
            Self::Object | Self::ComplexObject => coerce_to_object(value, self),
            Self::Array => coerce_to_array(value),
            Self::Params => coerce_to_params(value),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn coerce_to_string(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    }
}

fn coerce_to_integer(
    value: Value,
    target: DataType,
    min: i64,
    max: i64,
) -> Result<Value, TypeCoercionError> {
    let parsed = match &value {
        Value::Null => Some(Ok(0)),
        Value::Bool(b) => Some(Ok(i64::from(*b))),
        Value::Number(n) => match (n.as_i64(), n.as_u64()) {
            (Some(i), _) => Some(Ok(i)),
            (None, Some(_)) => Some(Err(())),
            (None, None) => n.as_f64().map(truncate),
        },
        Value::String(s) => {
            let trimmed = s.trim();
            match trimmed.parse::<i64>() {
                Ok(i) => Some(Ok(i)),
                Err(_) => trimmed.parse::<f64>().ok().map(truncate),
            }
        }
        Value::Array(_) | Value::Object(_) => None,
    };

    match parsed {
        Some(Ok(n)) if (min..=max).contains(&n) => Ok(Value::from(n)),
        Some(_) => Err(TypeCoercionError::new(&value, target, "value out of range")),
        None => Err(TypeCoercionError::new(&value, target, "not a number")),
    }
}

/// Truncates toward zero, failing for values outside the `i64` range.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn truncate(f: f64) -> Result<i64, ()> {
    // 2^63 is exact as f64; i64::MAX as f64 rounds up to it.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    let t = f.trunc();
    if t.is_finite() && t >= -LIMIT && t < LIMIT {
        Ok(t as i64)
    } else {
        Err(())
    }
}

fn coerce_to_double(value: Value) -> Result<Value, TypeCoercionError> {
    let parsed = match &value {
        Value::Null => Some(0.0),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Array(_) | Value::Object(_) => None,
    };

    parsed
        .and_then(|f| serde_json::Number::from_f64(f).map(Value::Number))
        .ok_or_else(|| TypeCoercionError::new(&value, DataType::Double, "not a finite number"))
}

fn coerce_to_boolean(value: Value) -> Result<Value, TypeCoercionError> {
    match &value {
        Value::Null => Ok(Value::Bool(false)),
        Value::Bool(b) => Ok(Value::Bool(*b)),
        Value::Number(n) => Ok(Value::Bool(n.as_f64().is_some_and(|f| f != 0.0))),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(Value::Bool(true)),
            "false" | "0" | "" => Ok(Value::Bool(false)),
            _ => Err(TypeCoercionError::new(&value, DataType::Boolean, "not a boolean literal")),
        },
        Value::Array(_) | Value::Object(_) => Err(TypeCoercionError::new(
            &value,
            DataType::Boolean,
            "structured value",
        )),
    }
}

fn coerce_to_object(value: Value, target: DataType) -> Result<Value, TypeCoercionError> {
    match value {
        Value::Null | Value::Object(_) => Ok(value),
        Value::String(ref s) => match serde_json::from_str::<Value>(s) {
            Ok(parsed @ Value::Object(_)) => Ok(parsed),
            _ => Err(TypeCoercionError::new(&value, target, "string is not a JSON object")),
        },
        other => Err(TypeCoercionError::new(&other, target, "not an object")),
    }
}

fn coerce_to_array(value: Value) -> Result<Value, TypeCoercionError> {
    match value {
        Value::Null | Value::Array(_) => Ok(value),
        Value::String(ref s) if s.trim_start().starts_with('[') => serde_json::from_str::<Value>(s)
            .map_err(|_| TypeCoercionError::new(&value, DataType::Array, "string is not a JSON array")),
        other => Ok(Value::Array(vec![other])),
    }
}

fn coerce_to_params(value: Value) -> Result<Value, TypeCoercionError> {
    match coerce_to_object(value, DataType::Params)? {
        Value::Object(map) => Ok(Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, Value::String(coerce_to_string(v))))
                .collect::<Map<String, Value>>(),
        )),
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_any_passes_through() {
        let value = json!({"a": [1, 2]});
        assert_eq!(DataType::Any.coerce(value.clone()).unwrap(), value);
    }

    #[test]
    fn test_string_coercion() {
        assert_eq!(DataType::String.coerce(json!(42)).unwrap(), json!("42"));
        assert_eq!(DataType::String.coerce(json!(true)).unwrap(), json!("true"));
        assert_eq!(DataType::String.coerce(Value::Null).unwrap(), json!(""));
    }

    #[test]
    fn test_integer_coercion() {
        assert_eq!(DataType::Integer.coerce(json!("17")).unwrap(), json!(17));
        assert_eq!(DataType::Integer.coerce(json!(3.9)).unwrap(), json!(3));
        assert_eq!(DataType::Integer.coerce(json!(true)).unwrap(), json!(1));
        assert!(DataType::Integer.coerce(json!("abc")).is_err());
        assert!(DataType::Integer.coerce(json!(i64::MAX)).is_err());
        assert_eq!(DataType::Long.coerce(json!(i64::MAX)).unwrap(), json!(i64::MAX));
    }

    #[test]
    fn test_long_rejects_values_beyond_i64() {
        for value in [json!(1e30), json!(-1e30), json!(u64::MAX), json!("1e30")] {
            let err = DataType::Long.coerce(value.clone()).unwrap_err();
            assert_eq!(err.reason, "value out of range", "for {value}");
        }
        assert_eq!(DataType::Long.coerce(json!(-9.2e18)).unwrap(), json!(-9_200_000_000_000_000_000_i64));
        assert_eq!(DataType::Long.coerce(json!(i64::MIN)).unwrap(), json!(i64::MIN));
    }

    #[test]
    fn test_double_coercion() {
        assert_eq!(DataType::Double.coerce(json!("2.5")).unwrap(), json!(2.5));
        assert_eq!(DataType::Double.coerce(json!(2)).unwrap(), json!(2.0));
        assert!(DataType::Double.coerce(json!([1])).is_err());
    }

    #[test]
    fn test_boolean_coercion() {
        assert_eq!(DataType::Boolean.coerce(json!("TRUE")).unwrap(), json!(true));
        assert_eq!(DataType::Boolean.coerce(json!(0)).unwrap(), json!(false));
        assert!(DataType::Boolean.coerce(json!("maybe")).is_err());
    }

    #[test]
    fn test_object_coercion() {
        assert_eq!(
            DataType::Object.coerce(json!(r#"{"a":1}"#)).unwrap(),
            json!({"a": 1})
        );
        assert!(DataType::Object.coerce(json!(5)).is_err());
    }

    #[test]
    fn test_array_wraps_scalars() {
        assert_eq!(DataType::Array.coerce(json!(5)).unwrap(), json!([5]));
        assert_eq!(DataType::Array.coerce(json!("[1,2]")).unwrap(), json!([1, 2]));
    }

    #[test]
    fn test_params_stringifies_values() {
        assert_eq!(
            DataType::Params.coerce(json!({"a": 1, "b": "x"})).unwrap(),
            json!({"a": "1", "b": "x"})
        );
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(serde_json::to_string(&DataType::ComplexObject).unwrap(), "\"complex_object\"");
        let parsed: DataType = serde_json::from_str("\"complexObject\"").unwrap();
        assert_eq!(parsed, DataType::ComplexObject);
        let parsed: DataType = serde_json::from_str("\"integer\"").unwrap();
        assert_eq!(parsed, DataType::Integer);
    }
}
