//! Column schema and value coercion.

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use super::error::ResolverError;

/// Storage type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Integer,
    Float,
    Text,
    Bool,
}

/// A column known to an adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub key: String,
    pub display: String,
    pub kind: ValueKind,
}

impl ColumnSchema {
    pub fn new(key: impl Into<String>, display: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            key: key.into(),
            display: display.into(),
            kind,
        }
    }

    pub fn integer(key: impl Into<String>, display: impl Into<String>) -> Self {
        Self::new(key, display, ValueKind::Integer)
    }

    pub fn float(key: impl Into<String>, display: impl Into<String>) -> Self {
        Self::new(key, display, ValueKind::Float)
    }

    pub fn text(key: impl Into<String>, display: impl Into<String>) -> Self {
        Self::new(key, display, ValueKind::Text)
    }

    pub fn bool(key: impl Into<String>, display: impl Into<String>) -> Self {
        Self::new(key, display, ValueKind::Bool)
    }

    /// Coerce a wire string to this column's type.
    pub fn coerce(&self, raw: &str) -> Result<Value, ResolverError> {
        let invalid = |reason: &str| ResolverError::InvalidValue {
            column: self.key.clone(),
            value: raw.to_string(),
            reason: reason.to_string(),
        };
        match self.kind {
            ValueKind::Integer => raw
                .trim()
                .parse::<i64>()
                .map(Value::from)
                .map_err(|_| invalid("expected an integer")),
            ValueKind::Float => raw
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| invalid("expected a finite number")),
            ValueKind::Text => Ok(Value::String(raw.to_string())),
            ValueKind::Bool => match raw.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => Ok(Value::Bool(true)),
                "false" | "0" | "no" => Ok(Value::Bool(false)),
                _ => Err(invalid("expected a boolean")),
            },
        }
    }

    /// Coerce one element of an `in` list. Non-string JSON is kept as is.
    pub fn coerce_json(&self, value: &Value) -> Result<Value, ResolverError> {
        match value {
            Value::String(s) => self.coerce(s),
            other => Ok(other.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coerce_integer() {
        let col = ColumnSchema::integer("age", "Age");
        assert_eq!(col.coerce("42").unwrap(), json!(42));
        assert_eq!(col.coerce(" 7 ").unwrap(), json!(7));
        assert!(matches!(
            col.coerce("forty"),
            Err(ResolverError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_coerce_float() {
        let col = ColumnSchema::float("price", "Price");
        assert_eq!(col.coerce("1.5").unwrap(), json!(1.5));
        assert!(col.coerce("NaN").is_err());
    }

    #[test]
    fn test_coerce_bool() {
        let col = ColumnSchema::bool("active", "Active");
        assert_eq!(col.coerce("TRUE").unwrap(), json!(true));
        assert_eq!(col.coerce("0").unwrap(), json!(false));
        assert!(col.coerce("maybe").is_err());
    }

    #[test]
    fn test_coerce_text_is_verbatim() {
        let col = ColumnSchema::text("name", "Name");
        assert_eq!(col.coerce(" a;b ").unwrap(), json!(" a;b "));
    }
}
