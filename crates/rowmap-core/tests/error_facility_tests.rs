use rowmap_core::errors::{
    ExtractionError, PersistenceError, RmError, RmErrorKind, TypeMappingError,
};
use rowmap_core::SqlType;

#[test]
fn test_constraint_violation_verifiable_by_kind() {
    let err = PersistenceError::ConstraintViolation {
        entity: "Department".to_string(),
        message: "UNIQUE constraint failed: Department.name".to_string(),
    };

    let rm_err: RmError = err.into();

    assert_eq!(rm_err.kind(), RmErrorKind::ConstraintViolation);
    assert_eq!(rm_err.code(), "ERR_CONSTRAINT_VIOLATION");
    assert_eq!(rm_err.entity(), Some("Department"));
    assert!(rm_err.message().contains("UNIQUE"));
}

#[test]
fn test_extraction_error_structured_fields() {
    let err = ExtractionError::UnknownRelationTarget {
        entity: "Person".to_string(),
        field: "department".to_string(),
        target: "Department".to_string(),
    };

    let rm_err: RmError = err.into();

    assert_eq!(rm_err.kind(), RmErrorKind::UnknownRelationTarget);
    assert_eq!(rm_err.op(), Some("extract"));
    assert_eq!(rm_err.entity(), Some("Person"));
    assert_eq!(rm_err.field(), Some("department"));
}

#[test]
fn test_type_mapping_flattens_through_persistence() {
    let err = PersistenceError::TypeMapping(TypeMappingError::UnexpectedNull {
        expected: SqlType::Text,
    });

    let rm_err: RmError = err.into();

    assert_eq!(rm_err.kind(), RmErrorKind::UnexpectedNull);
    assert_eq!(rm_err.op(), Some("type_mapping"));
}

#[test]
fn test_display_includes_code_op_and_entity() {
    let rm_err: RmError = PersistenceError::StaleCursor {
        entity: "Person".to_string(),
    }
    .into();

    let text = rm_err.to_string();
    assert!(text.starts_with("[ERR_STALE_CURSOR] in operation 'persist'"));
    assert!(text.ends_with("(entity: Person)"));
}

#[test]
fn test_error_kind_code_mapping() {
    let kinds = vec![
        (RmErrorKind::MissingPrimaryKey, "ERR_MISSING_PRIMARY_KEY"),
        (RmErrorKind::MultiplePrimaryKeys, "ERR_MULTIPLE_PRIMARY_KEYS"),
        (RmErrorKind::MissingBackReference, "ERR_MISSING_BACK_REFERENCE"),
        (RmErrorKind::EmptyUpdate, "ERR_EMPTY_UPDATE"),
        (RmErrorKind::OutOfRange, "ERR_OUT_OF_RANGE"),
        (RmErrorKind::NotFound, "ERR_NOT_FOUND"),
        (RmErrorKind::SessionClosed, "ERR_SESSION_CLOSED"),
        (RmErrorKind::UnsavedReference, "ERR_UNSAVED_REFERENCE"),
        (RmErrorKind::InvalidConfig, "ERR_INVALID_CONFIG"),
        (RmErrorKind::Persistence, "ERR_PERSISTENCE"),
        (RmErrorKind::Io, "ERR_IO"),
    ];

    for (kind, expected_code) in kinds {
        assert_eq!(kind.code(), expected_code);
    }
}
