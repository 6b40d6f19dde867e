//! Scalar values exchanged with the driver.
//!
//! Only strings and integers cross the mapping boundary. `ToValue` and `FromValue`
//! form the typed conversion contract between entity fields and [`Value`].

use std::fmt;

/// A raw scalar as bound to a statement or read from a row.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Value {
    #[default]
    Null,
    Integer(i64),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Borrow the text payload, if any.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Integer payload, coercing numeric-looking text.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            Self::Text(s) => parse_numeric(s),
            Self::Null => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Text(s) => write!(f, "'{s}'"),
        }
    }
}

/// Parse text that looks like an integer (`"42"`, `" -7 "`, `"+3"`).
pub fn parse_numeric(s: &str) -> Option<i64> {
    let trimmed = s.trim();
    let digits = trimmed.strip_prefix(['-', '+']).unwrap_or(trimmed);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    trimmed.parse().ok()
}

/// Conversion from an entity field into a [`Value`].
pub trait ToValue {
    fn to_value(&self) -> Value;
}

/// Conversion from a [`Value`] into an entity field.
///
/// The error is a human-readable message; callers attach the column name.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self, String>;
}

impl ToValue for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self, String> {
        Ok(value)
    }
}

impl ToValue for i64 {
    fn to_value(&self) -> Value {
        Value::Integer(*self)
    }
}

impl ToValue for i32 {
    fn to_value(&self) -> Value {
        Value::Integer(i64::from(*self))
    }
}

impl ToValue for String {
    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }
}

impl ToValue for &str {
    fn to_value(&self) -> Value {
        Value::Text((*self).to_string())
    }
}

impl<T: ToValue> ToValue for Option<T> {
    fn to_value(&self) -> Value {
        self.as_ref().map_or(Value::Null, ToValue::to_value)
    }
}

impl FromValue for i64 {
    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Integer(i) => Ok(i),
            Value::Text(s) => {
                parse_numeric(&s).ok_or_else(|| format!("expected integer, got '{s}'"))
            }
            Value::Null => Err("unexpected NULL for integer field".to_string()),
        }
    }
}

impl FromValue for i32 {
    fn from_value(value: Value) -> Result<Self, String> {
        let wide = i64::from_value(value)?;
        i32::try_from(wide).map_err(|_| format!("integer {wide} out of range for i32"))
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Text(s) => Ok(s),
            Value::Integer(i) => Ok(i.to_string()),
            Value::Null => Err("unexpected NULL for text field".to_string()),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(i64::from(v))
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_text_is_detected() {
        assert_eq!(parse_numeric("42"), Some(42));
        assert_eq!(parse_numeric(" -7 "), Some(-7));
        assert_eq!(parse_numeric("+3"), Some(3));
        assert_eq!(parse_numeric("4.2"), None);
        assert_eq!(parse_numeric("12abc"), None);
        assert_eq!(parse_numeric("-"), None);
        assert_eq!(parse_numeric(""), None);
    }

    #[test]
    fn integer_fields_coerce_numeric_text() {
        assert_eq!(i64::from_value(Value::Text("7".into())), Ok(7));
        assert_eq!(i32::from_value(Value::Integer(9)), Ok(9));
        assert!(i64::from_value(Value::Text("Bob".into())).is_err());
        assert!(i32::from_value(Value::Integer(i64::MAX)).is_err());
    }

    #[test]
    fn text_fields_keep_text_verbatim() {
        assert_eq!(String::from_value(Value::Text("007".into())), Ok("007".to_string()));
        assert_eq!(String::from_value(Value::Integer(5)), Ok("5".to_string()));
    }

    #[test]
    fn option_maps_null() {
        assert_eq!(Option::<String>::from_value(Value::Null), Ok(None));
        assert_eq!(None::<i64>.to_value(), Value::Null);
        assert_eq!(Some(3_i64).to_value(), Value::Integer(3));
    }
}
