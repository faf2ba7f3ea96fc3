#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use chrono::{NaiveDate, TimeZone, Utc};
use common::{registry, Person};
use rowmap_core::{check_value, FromColumn, RowReader, SqlType, ToColumn, TypeMappingError, Value};

#[test]
fn test_timestamp_normalized_to_utc_nanos() {
    let ts = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
    assert_eq!(
        ts.to_column().unwrap(),
        Value::Text("2024-05-01T10:00:00.000000000Z".into())
    );

    let parsed = chrono::DateTime::<Utc>::from_column(Value::Text(
        "2024-05-01T12:00:00.000000+02:00".into(),
    ))
    .unwrap();
    assert_eq!(parsed, ts);

    let fine = Utc.timestamp_opt(1_714_557_600, 123_456_789).unwrap();
    let text = fine.to_column().unwrap();
    assert_eq!(text, Value::Text("2024-05-01T10:00:00.123456789Z".into()));
    assert_eq!(chrono::DateTime::<Utc>::from_column(text).unwrap(), fine);
}

#[test]
fn test_date_text_format() {
    let date = NaiveDate::from_ymd_opt(1990, 2, 28).unwrap();
    assert_eq!(date.to_column().unwrap(), Value::Text("1990-02-28".into()));
    assert_eq!(
        NaiveDate::from_column(Value::Text("1990-02-28".into())).unwrap(),
        date
    );
}

#[test]
fn test_invalid_temporal_text() {
    let err = NaiveDate::from_column(Value::Text("28/02/1990".into())).unwrap_err();
    assert!(matches!(err, TypeMappingError::InvalidTemporal { value, .. } if value == "28/02/1990"));

    let err = chrono::DateTime::<Utc>::from_column(Value::Text("yesterday".into())).unwrap_err();
    assert!(matches!(err, TypeMappingError::InvalidTemporal { .. }));
}

#[test]
fn test_bool_stored_as_integer() {
    assert_eq!(true.to_column().unwrap(), Value::Integer(1));
    assert_eq!(false.to_column().unwrap(), Value::Integer(0));
    assert!(bool::from_column(Value::Integer(1)).unwrap());
    assert!(matches!(
        bool::from_column(Value::Integer(2)),
        Err(TypeMappingError::OutOfRange { target: "bool", .. })
    ));
}

#[test]
fn test_storage_class_mismatch() {
    assert_eq!(
        i64::from_column(Value::Text("30".into())).unwrap_err(),
        TypeMappingError::Mismatch {
            expected: SqlType::Integer,
            found: "TEXT"
        }
    );
    assert_eq!(
        Vec::<u8>::from_column(Value::Text("x".into())).unwrap_err(),
        TypeMappingError::Mismatch {
            expected: SqlType::Blob,
            found: "TEXT"
        }
    );
}

#[test]
fn test_real_accepts_integer_storage() {
    assert_eq!(f64::from_column(Value::Integer(3)).unwrap(), 3.0);
    assert_eq!(f32::from_column(Value::Real(1.5)).unwrap(), 1.5);
    assert!(matches!(
        f32::from_column(Value::Real(1e300)),
        Err(TypeMappingError::OutOfRange { target: "f32", .. })
    ));
}

#[test]
fn test_check_value_enforces_column_rules() {
    let registry = registry();
    let meta = registry.model::<Person>().unwrap().metamodel();
    let surname = meta.column("surname").unwrap();
    let born = meta.column("born").unwrap();
    let age = meta.column("age").unwrap();

    assert!(check_value(surname, &Value::Text("Novak".into())).is_ok());
    assert_eq!(
        check_value(surname, &Value::Text("x".repeat(31))).unwrap_err(),
        TypeMappingError::TooLong {
            column: "surname".into(),
            max: 30,
            actual: 31
        }
    );
    assert_eq!(
        check_value(surname, &Value::Null).unwrap_err(),
        TypeMappingError::NullViolation {
            column: "surname".into()
        }
    );
    assert!(check_value(born, &Value::Null).is_ok());
    assert!(matches!(
        check_value(age, &Value::Real(1.0)),
        Err(TypeMappingError::Mismatch { expected: SqlType::Integer, found: "REAL" })
    ));
}

#[test]
fn test_max_length_counts_characters() {
    let registry = registry();
    let meta = registry.model::<Person>().unwrap().metamodel();
    let surname = meta.column("surname").unwrap();
    // 30 two-byte characters
    assert!(check_value(surname, &Value::Text("č".repeat(30))).is_ok());
}

#[test]
fn test_row_reader_through_option_fields() {
    let mut row = RowReader::new(vec![
        Value::Integer(1),
        Value::Null,
        Value::Text("2024-01-31".into()),
    ]);
    let id: i64 = row.read().unwrap();
    let nick: Option<String> = row.read().unwrap();
    let born: Option<NaiveDate> = row.read().unwrap();
    row.finish().unwrap();

    assert_eq!(id, 1);
    assert_eq!(nick, None);
    assert_eq!(born, NaiveDate::from_ymd_opt(2024, 1, 31));
}
