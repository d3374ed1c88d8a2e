//! Scalar values, rendered literals and ordered field mappings

use std::fmt::{self, Display};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// The one value rendered as a raw SQL function call instead of a quoted
/// string literal.
pub const NOW: &str = "now()";

/// A scalar SQL value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// 64-bit integer
    I64(i64),
    /// 64-bit float
    F64(f64),
    /// String value
    String(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Textual coercion used by the generated-statement path.
    ///
    /// Every value becomes text; the compiler decides quoting afterwards.
    pub fn to_text(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Bool(true) => "1".to_string(),
            Value::Bool(false) => "0".to_string(),
            Value::I64(i) => i.to_string(),
            Value::F64(f) => f.to_string(),
            Value::String(s) => s.clone(),
        }
    }

    /// Borrow the inner string of a `String` value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}

impl From<bool> for Value {
    fn from(val: bool) -> Self {
        Value::Bool(val)
    }
}

impl From<i32> for Value {
    fn from(val: i32) -> Self {
        Value::I64(val.into())
    }
}

impl From<i64> for Value {
    fn from(val: i64) -> Self {
        Value::I64(val)
    }
}

impl From<u32> for Value {
    fn from(val: u32) -> Self {
        Value::I64(val.into())
    }
}

/// Values beyond `i64::MAX` keep their decimal text
impl From<u64> for Value {
    fn from(val: u64) -> Self {
        i64::try_from(val)
            .map(Value::I64)
            .unwrap_or_else(|_| Value::String(val.to_string()))
    }
}

impl From<f64> for Value {
    fn from(val: f64) -> Self {
        Value::F64(val)
    }
}

impl From<String> for Value {
    fn from(val: String) -> Self {
        Value::String(val)
    }
}

impl From<&str> for Value {
    fn from(val: &str) -> Self {
        Value::String(val.to_string())
    }
}

impl From<&String> for Value {
    fn from(val: &String) -> Self {
        Value::String(val.clone())
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(val) => val.into(),
            None => Value::Null,
        }
    }
}

impl TryFrom<serde_json::Value> for Value {
    type Error = Error;

    fn try_from(json: serde_json::Value) -> Result<Self> {
        match json {
            serde_json::Value::Null => Ok(Value::Null),
            serde_json::Value::Bool(b) => Ok(Value::Bool(b)),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Ok(Value::I64(i)),
                None => n
                    .as_f64()
                    .map(Value::F64)
                    .ok_or_else(|| Error::format(format!("unsupported number {}", n))),
            },
            serde_json::Value::String(s) => Ok(Value::String(s)),
            other => Err(Error::format(format!(
                "expected a scalar value, got {}",
                other
            ))),
        }
    }
}

/// A normalized value fragment as it appears in compiled SQL text.
///
/// Values are interpolated, not bound: `Text` is wrapped in single quotes
/// without escaping, so callers must pre-sanitize untrusted input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    /// Raw function call, emitted unquoted (`now()`)
    Function(String),
    /// SQL NULL keyword, emitted unquoted
    Null,
    /// Quoted string literal
    Text(String),
}

impl Literal {
    /// Classify an already-coerced text fragment
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        if text == NOW {
            Literal::Function(text)
        } else {
            Literal::Text(text)
        }
    }
}

impl From<&Value> for Literal {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => Literal::Null,
            other => Literal::from_text(other.to_text().trim()),
        }
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Function(call) => f.write_str(call),
            Literal::Null => f.write_str("NULL"),
            Literal::Text(text) => write!(f, "'{}'", text),
        }
    }
}

/// An ordered column → value mapping.
///
/// Iteration follows insertion order; the compiler zips columns and values
/// positionally, so the order is never re-sorted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fields(IndexMap<String, Value>);

impl Fields {
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    /// Add or replace a field, keeping the original position on replace
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.0.insert(column.into(), value.into());
        self
    }

    /// Builder-style variant of [`Fields::insert`]
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(column, value);
        self
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.0.contains_key(column)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Split into the paired column list and value list, in insertion order
    pub fn decompose(&self) -> (Vec<String>, Vec<Value>) {
        self.0
            .iter()
            .map(|(column, value)| (column.clone(), value.clone()))
            .unzip()
    }
}

impl<K, V> FromIterator<(K, V)> for Fields
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl From<IndexMap<String, Value>> for Fields {
    fn from(map: IndexMap<String, Value>) -> Self {
        Self(map)
    }
}

impl<V, const N: usize> From<[(&str, V); N]> for Fields
where
    V: Into<Value>,
{
    fn from(pairs: [(&str, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

impl<V> From<Vec<(&str, V)>> for Fields
where
    V: Into<Value>,
{
    fn from(pairs: Vec<(&str, V)>) -> Self {
        pairs.into_iter().collect()
    }
}

impl TryFrom<serde_json::Value> for Fields {
    type Error = Error;

    fn try_from(json: serde_json::Value) -> Result<Self> {
        match json {
            serde_json::Value::Object(map) => map
                .into_iter()
                .map(|(k, v)| Value::try_from(v).map(|v| (k, v)))
                .collect::<Result<IndexMap<_, _>>>()
                .map(Fields),
            other => Err(Error::format(format!(
                "expected a column-value mapping, got {}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_creation() {
        assert_eq!(Value::from(42i32), Value::I64(42));
        assert_eq!(Value::from(true), Value::Bool(true));
        assert_eq!(Value::from("hello"), Value::String("hello".to_string()));
        assert_eq!(Value::from(()), Value::Null);
        assert_eq!(Value::from(None::<i64>), Value::Null);
    }

    #[test]
    fn test_text_coercion() {
        assert_eq!(Value::from(1).to_text(), "1");
        assert_eq!(Value::from(true).to_text(), "1");
        assert_eq!(Value::from(false).to_text(), "0");
        assert_eq!(Value::from(2.5).to_text(), "2.5");
        assert_eq!(Value::from("henn").to_text(), "henn");
    }

    #[test]
    fn test_literal_rendering() {
        assert_eq!(Literal::from(&Value::from("now()")).to_string(), "now()");
        assert_eq!(Literal::from(&Value::from(" henn ")).to_string(), "'henn'");
        assert_eq!(Literal::from(&Value::from(12)).to_string(), "'12'");
        assert_eq!(Literal::from(&Value::Null).to_string(), "NULL");
        // only the exact lowercase call is treated as a function
        assert_eq!(Literal::from(&Value::from("NOW()")).to_string(), "'NOW()'");
    }

    #[test]
    fn test_fields_preserve_insertion_order() {
        let fields = Fields::new()
            .with("username", "chkhong")
            .with("email", "a@b.c")
            .with("is_active", 1);
        let (columns, values) = fields.decompose();
        assert_eq!(columns, vec!["username", "email", "is_active"]);
        assert_eq!(values[2], Value::I64(1));
    }

    #[test]
    fn test_fields_from_json() {
        let json = serde_json::json!({"id": 1, "name": "henn", "gone": null});
        let fields = Fields::try_from(json).unwrap();
        let (columns, values) = fields.decompose();
        assert_eq!(columns, vec!["id", "name", "gone"]);
        assert_eq!(values, vec![Value::I64(1), Value::from("henn"), Value::Null]);

        let err = Fields::try_from(serde_json::json!(["id"])).unwrap_err();
        assert!(matches!(err, Error::Format { .. }));

        let err = Fields::try_from(serde_json::json!({"id": [1, 2]})).unwrap_err();
        assert!(matches!(err, Error::Format { .. }));
    }
}
