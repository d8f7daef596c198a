//! Dynamically typed cell values.

use rusqlite::types::{FromSql, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Serialize, Serializer};
use std::fmt;

/// A single cell, mirroring SQLite's storage classes.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    /// Type a raw text cell.
    ///
    /// Empty input is `Null`, then integer, then float, falling back to text.
    pub fn infer(raw: &str) -> Self {
        if raw.is_empty() {
            return Value::Null;
        }
        if let Ok(i) = raw.parse::<i64>() {
            return Value::Integer(i);
        }
        if let Ok(f) = raw.parse::<f64>() {
            if f.is_finite() {
                return Value::Real(f);
            }
        }
        Value::Text(raw.to_string())
    }

    /// Whether this is SQL NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view used by statistics; text is parsed, everything else is `None`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Real(f) => Some(*f),
            Value::Text(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
            Value::Null | Value::Blob(_) => None,
        }
    }

    /// Text view; numbers are rendered, NULL and blobs are `None`.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Value::Text(s) => Some(s.clone()),
            Value::Integer(_) | Value::Real(_) => Some(self.to_string()),
            Value::Null | Value::Blob(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Real(r) => write!(f, "{}", r),
            Value::Text(s) => write!(f, "{}", s),
            Value::Blob(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
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

impl From<ValueRef<'_>> for Value {
    fn from(v: ValueRef<'_>) -> Self {
        match v {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(i) => Value::Integer(i),
            ValueRef::Real(f) => Value::Real(f),
            ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => Value::Blob(b.to_vec()),
        }
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let out = match self {
            Value::Null => ValueRef::Null,
            Value::Integer(i) => ValueRef::Integer(*i),
            Value::Real(f) => ValueRef::Real(*f),
            Value::Text(s) => ValueRef::Text(s.as_bytes()),
            Value::Blob(b) => ValueRef::Blob(b),
        };
        Ok(ToSqlOutput::Borrowed(out))
    }
}

impl FromSql for Value {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        Ok(Value::from(value))
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Real(f) if f.is_finite() => serializer.serialize_f64(*f),
            Value::Real(_) => serializer.serialize_none(),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Blob(b) => serializer.serialize_str(&format!("<{} bytes>", b.len())),
        }
    }
}

/// Declared SQLite column type chosen on import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Real,
    Text,
}

impl ColumnType {
    /// SQL type name for `CREATE TABLE`.
    pub fn sql_name(self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Real => "REAL",
            ColumnType::Text => "TEXT",
        }
    }

    /// Narrowest type that holds every value; NULLs do not constrain.
    ///
    /// A column with no values at all is declared `REAL`.
    pub fn infer<'a>(values: impl IntoIterator<Item = &'a Value>) -> Self {
        let mut ty: Option<ColumnType> = None;
        for value in values {
            ty = match (ty, value) {
                (_, Value::Null) => ty,
                (None | Some(ColumnType::Integer), Value::Integer(_)) => Some(ColumnType::Integer),
                (None | Some(ColumnType::Integer) | Some(ColumnType::Real), Value::Real(_))
                | (Some(ColumnType::Real), Value::Integer(_)) => Some(ColumnType::Real),
                _ => return ColumnType::Text,
            };
        }
        ty.unwrap_or(ColumnType::Real)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_cells() {
        assert_eq!(Value::infer(""), Value::Null);
        assert_eq!(Value::infer("42"), Value::Integer(42));
        assert_eq!(Value::infer("-7"), Value::Integer(-7));
        assert_eq!(Value::infer("7.5"), Value::Real(7.5));
        assert_eq!(Value::infer("2009-12-10"), Value::Text("2009-12-10".into()));
        assert_eq!(Value::infer("inf"), Value::Text("inf".into()));
    }

    #[test]
    fn test_column_type_widening() {
        let ints = [Value::Integer(1), Value::Null, Value::Integer(3)];
        assert_eq!(ColumnType::infer(&ints), ColumnType::Integer);

        let mixed = [Value::Integer(1), Value::Real(2.5)];
        assert_eq!(ColumnType::infer(&mixed), ColumnType::Real);

        let text = [Value::Real(2.5), Value::Text("x".into()), Value::Integer(1)];
        assert_eq!(ColumnType::infer(&text), ColumnType::Text);

        assert_eq!(ColumnType::infer(&[Value::Null]), ColumnType::Real);
    }

    #[test]
    fn test_numeric_views() {
        assert_eq!(Value::Text(" 12.5".into()).as_f64(), Some(12.5));
        assert_eq!(Value::Text("abc".into()).as_f64(), None);
        assert_eq!(Value::Null.as_text(), None);
        assert_eq!(Value::Integer(3).as_text().as_deref(), Some("3"));
    }

    #[test]
    fn test_serialize_json() {
        let json = serde_json::to_string(&vec![
            Value::Null,
            Value::Integer(1),
            Value::Text("a".into()),
        ])
        .unwrap();
        assert_eq!(json, r#"[null,1,"a"]"#);
    }
}
