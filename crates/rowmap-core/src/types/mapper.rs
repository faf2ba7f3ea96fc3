use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use std::fmt::Debug;

use super::value::{SqlType, Value};
use crate::errors::TypeMappingError;
use crate::model::ColumnDef;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Static SQL type information for a host type
pub trait ColumnType {
    const SQL_TYPE: SqlType;
    const NULLABLE: bool = false;
}

/// Host value → column value
pub trait ToColumn {
    /// # Errors
    ///
    /// `OutOfRange` when the value has no lossless representation.
    fn to_column(&self) -> Result<Value, TypeMappingError>;
}

/// Column value → host value
pub trait FromColumn: Sized {
    /// # Errors
    ///
    /// `Mismatch`, `OutOfRange`, `UnexpectedNull` or `InvalidTemporal`.
    fn from_column(value: Value) -> Result<Self, TypeMappingError>;
}

/// A host type usable as an entity's primary key
pub trait PrimaryKey: ColumnType + ToColumn + FromColumn + Clone + Debug + 'static {
    /// True when the key has not been assigned yet
    ///
    /// Zero for integers, empty for text, `None` for options.
    fn is_unset(&self) -> bool;
}

fn mismatch(expected: SqlType, found: &Value) -> TypeMappingError {
    match found {
        Value::Null => TypeMappingError::UnexpectedNull { expected },
        other => TypeMappingError::Mismatch {
            expected,
            found: other.storage_class(),
        },
    }
}

macro_rules! impl_integer {
    ($($ty:ty),*) => {$(
        impl ColumnType for $ty {
            const SQL_TYPE: SqlType = SqlType::Integer;
        }

        impl ToColumn for $ty {
            #[allow(clippy::useless_conversion)]
            fn to_column(&self) -> Result<Value, TypeMappingError> {
                i64::try_from(*self)
                    .map(Value::Integer)
                    .map_err(|_| TypeMappingError::OutOfRange {
                        target: "INTEGER",
                        value: self.to_string(),
                    })
            }
        }

        impl FromColumn for $ty {
            #[allow(clippy::useless_conversion)]
            fn from_column(value: Value) -> Result<Self, TypeMappingError> {
                match value {
                    Value::Integer(i) => <$ty>::try_from(i).map_err(|_| {
                        TypeMappingError::OutOfRange {
                            target: stringify!($ty),
                            value: i.to_string(),
                        }
                    }),
                    other => Err(mismatch(SqlType::Integer, &other)),
                }
            }
        }
    )*};
}

impl_integer!(i8, i16, i32, i64, u8, u16, u32, u64);

macro_rules! impl_integer_key {
    ($($ty:ty),*) => {$(
        impl PrimaryKey for $ty {
            fn is_unset(&self) -> bool {
                *self == 0
            }
        }
    )*};
}

impl_integer_key!(i32, i64, u32);

impl ColumnType for f64 {
    const SQL_TYPE: SqlType = SqlType::Real;
}

impl ToColumn for f64 {
    fn to_column(&self) -> Result<Value, TypeMappingError> {
        Ok(Value::Real(*self))
    }
}

impl FromColumn for f64 {
    fn from_column(value: Value) -> Result<Self, TypeMappingError> {
        match value {
            Value::Real(r) => Ok(r),
            Value::Integer(i) => Ok(i as f64),
            other => Err(mismatch(SqlType::Real, &other)),
        }
    }
}

impl ColumnType for f32 {
    const SQL_TYPE: SqlType = SqlType::Real;
}

impl ToColumn for f32 {
    fn to_column(&self) -> Result<Value, TypeMappingError> {
        Ok(Value::Real(f64::from(*self)))
    }
}

impl FromColumn for f32 {
    fn from_column(value: Value) -> Result<Self, TypeMappingError> {
        let wide = f64::from_column(value)?;
        if wide.is_finite() && wide.abs() > f64::from(f32::MAX) {
            return Err(TypeMappingError::OutOfRange {
                target: "f32",
                value: wide.to_string(),
            });
        }
        Ok(wide as f32)
    }
}

impl ColumnType for bool {
    const SQL_TYPE: SqlType = SqlType::Boolean;
}

impl ToColumn for bool {
    fn to_column(&self) -> Result<Value, TypeMappingError> {
        Ok(Value::Integer(i64::from(*self)))
    }
}

impl FromColumn for bool {
    fn from_column(value: Value) -> Result<Self, TypeMappingError> {
        match value {
            Value::Integer(0) => Ok(false),
            Value::Integer(1) => Ok(true),
            Value::Integer(i) => Err(TypeMappingError::OutOfRange {
                target: "bool",
                value: i.to_string(),
            }),
            other => Err(mismatch(SqlType::Boolean, &other)),
        }
    }
}

impl ColumnType for String {
    const SQL_TYPE: SqlType = SqlType::Text;
}

impl ToColumn for String {
    fn to_column(&self) -> Result<Value, TypeMappingError> {
        Ok(Value::Text(self.clone()))
    }
}

impl FromColumn for String {
    fn from_column(value: Value) -> Result<Self, TypeMappingError> {
        match value {
            Value::Text(s) => Ok(s),
            other => Err(mismatch(SqlType::Text, &other)),
        }
    }
}

impl PrimaryKey for String {
    fn is_unset(&self) -> bool {
        self.is_empty()
    }
}

impl ColumnType for Vec<u8> {
    const SQL_TYPE: SqlType = SqlType::Blob;
}

impl ToColumn for Vec<u8> {
    fn to_column(&self) -> Result<Value, TypeMappingError> {
        Ok(Value::Blob(self.clone()))
    }
}

impl FromColumn for Vec<u8> {
    fn from_column(value: Value) -> Result<Self, TypeMappingError> {
        match value {
            Value::Blob(b) => Ok(b),
            other => Err(mismatch(SqlType::Blob, &other)),
        }
    }
}

impl ColumnType for NaiveDate {
    const SQL_TYPE: SqlType = SqlType::Date;
}

impl ToColumn for NaiveDate {
    fn to_column(&self) -> Result<Value, TypeMappingError> {
        Ok(Value::Text(self.format(DATE_FORMAT).to_string()))
    }
}

impl FromColumn for NaiveDate {
    fn from_column(value: Value) -> Result<Self, TypeMappingError> {
        match value {
            Value::Text(s) => NaiveDate::parse_from_str(&s, DATE_FORMAT).map_err(|e| {
                TypeMappingError::InvalidTemporal {
                    value: s.clone(),
                    reason: e.to_string(),
                }
            }),
            other => Err(mismatch(SqlType::Date, &other)),
        }
    }
}

impl ColumnType for DateTime<Utc> {
    const SQL_TYPE: SqlType = SqlType::Timestamp;
}

impl ToColumn for DateTime<Utc> {
    fn to_column(&self) -> Result<Value, TypeMappingError> {
        Ok(Value::Text(self.to_rfc3339_opts(SecondsFormat::Nanos, true)))
    }
}

impl FromColumn for DateTime<Utc> {
    fn from_column(value: Value) -> Result<Self, TypeMappingError> {
        match value {
            Value::Text(s) => DateTime::parse_from_rfc3339(&s)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| TypeMappingError::InvalidTemporal {
                    value: s.clone(),
                    reason: e.to_string(),
                }),
            other => Err(mismatch(SqlType::Timestamp, &other)),
        }
    }
}

impl<T: ColumnType> ColumnType for Option<T> {
    const SQL_TYPE: SqlType = T::SQL_TYPE;
    const NULLABLE: bool = true;
}

impl<T: ToColumn> ToColumn for Option<T> {
    fn to_column(&self) -> Result<Value, TypeMappingError> {
        match self {
            Some(inner) => inner.to_column(),
            None => Ok(Value::Null),
        }
    }
}

impl<T: FromColumn> FromColumn for Option<T> {
    fn from_column(value: Value) -> Result<Self, TypeMappingError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_column(other).map(Some),
        }
    }
}

impl<T: PrimaryKey> PrimaryKey for Option<T> {
    fn is_unset(&self) -> bool {
        self.as_ref().map_or(true, T::is_unset)
    }
}

impl ToColumn for Value {
    fn to_column(&self) -> Result<Value, TypeMappingError> {
        Ok(self.clone())
    }
}

impl FromColumn for Value {
    fn from_column(value: Value) -> Result<Self, TypeMappingError> {
        Ok(value)
    }
}

/// Validate a value against its column before binding
///
/// Checks nullability, storage class and maximum length. Real columns
/// accept integer values, matching SQLite's REAL affinity.
///
/// # Errors
///
/// `NullViolation`, `Mismatch` or `TooLong`.
pub fn check_value(column: &ColumnDef, value: &Value) -> Result<(), TypeMappingError> {
    let expected = column.sql_type;
    let length = match (expected, value) {
        (_, Value::Null) => {
            return if column.nullable {
                Ok(())
            } else {
                Err(TypeMappingError::NullViolation {
                    column: column.name.clone(),
                })
            };
        }
        (SqlType::Integer | SqlType::Boolean, Value::Integer(_)) => None,
        (SqlType::Real, Value::Real(_) | Value::Integer(_)) => None,
        (SqlType::Text | SqlType::Date | SqlType::Timestamp, Value::Text(s)) => {
            Some(s.chars().count())
        }
        (SqlType::Blob, Value::Blob(b)) => Some(b.len()),
        (_, other) => {
            return Err(TypeMappingError::Mismatch {
                expected,
                found: other.storage_class(),
            })
        }
    };

    match (column.max_length, length) {
        (Some(max), Some(actual)) if actual > max => Err(TypeMappingError::TooLong {
            column: column.name.clone(),
            max,
            actual,
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsigned_above_i64_is_out_of_range() {
        let err = u64::MAX.to_column().unwrap_err();
        assert!(matches!(err, TypeMappingError::OutOfRange { target: "INTEGER", .. }));
    }

    #[test]
    fn test_narrowing_read_is_out_of_range() {
        let err = i32::from_column(Value::Integer(i64::from(i32::MAX) + 1)).unwrap_err();
        assert!(matches!(err, TypeMappingError::OutOfRange { target: "i32", .. }));
        assert_eq!(u8::from_column(Value::Integer(255)).unwrap(), 255);
    }

    #[test]
    fn test_null_into_required_is_unexpected_null() {
        assert_eq!(
            String::from_column(Value::Null).unwrap_err(),
            TypeMappingError::UnexpectedNull {
                expected: SqlType::Text
            }
        );
        assert_eq!(Option::<String>::from_column(Value::Null).unwrap(), None);
    }

    #[test]
    fn test_key_unset() {
        assert!(0i64.is_unset());
        assert!(!7i64.is_unset());
        assert!(String::new().is_unset());
        assert!(Option::<i64>::None.is_unset());
        assert!(Some(0i64).is_unset());
        assert!(!Some(3i64).is_unset());
    }

    #[test]
    fn test_option_column_type_is_nullable() {
        assert!(<Option<i32> as ColumnType>::NULLABLE);
        assert!(!<i32 as ColumnType>::NULLABLE);
        assert_eq!(<Option<bool> as ColumnType>::SQL_TYPE, SqlType::Boolean);
    }
}
