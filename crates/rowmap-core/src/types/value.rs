use serde::Serialize;
use std::fmt;

/// Declared SQL type of a mapped column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SqlType {
    Integer,
    Real,
    Text,
    /// Stored as INTEGER 0/1
    Boolean,
    Blob,
    /// Stored as `YYYY-MM-DD` text
    Date,
    /// Stored as UTC RFC 3339 text with nanoseconds
    Timestamp,
}

impl SqlType {
    /// Column type as written in DDL
    pub fn ddl(&self) -> &'static str {
        match self {
            SqlType::Integer | SqlType::Boolean => "INTEGER",
            SqlType::Real => "REAL",
            SqlType::Text | SqlType::Date | SqlType::Timestamp => "TEXT",
            SqlType::Blob => "BLOB",
        }
    }

    /// Storage class a non-null value of this type must have
    pub fn storage_class(&self) -> &'static str {
        self.ddl()
    }

    /// Whether a primary key may use this type
    pub fn is_key_capable(&self) -> bool {
        matches!(self, SqlType::Integer | SqlType::Text)
    }
}

/// A single SQL column value, one variant per storage class
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    pub fn storage_class(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Integer(_) => "INTEGER",
            Value::Real(_) => "REAL",
            Value::Text(_) => "TEXT",
            Value::Blob(_) => "BLOB",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Real(r) => write!(f, "{}", r),
            Value::Text(s) => write!(f, "{:?}", s),
            Value::Blob(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ddl_storage_for_derived_types() {
        assert_eq!(SqlType::Boolean.ddl(), "INTEGER");
        assert_eq!(SqlType::Date.ddl(), "TEXT");
        assert_eq!(SqlType::Timestamp.ddl(), "TEXT");
        assert!(SqlType::Text.is_key_capable());
        assert!(!SqlType::Real.is_key_capable());
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Integer(7).to_string(), "7");
        assert_eq!(Value::Text("Ana".into()).to_string(), "\"Ana\"");
        assert_eq!(Value::Blob(vec![1, 2]).to_string(), "<2 bytes>");
        assert_eq!(Value::Null.to_string(), "NULL");
    }
}
