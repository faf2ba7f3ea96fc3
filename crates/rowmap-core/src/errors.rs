use crate::types::SqlType;
use thiserror::Error;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Every failure family below converts into an [`RmError`] carrying one of
/// these kinds. Each kind maps to a stable code that callers and tests can
/// match on without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RmErrorKind {
    // Extraction (build-time gate)
    MissingPrimaryKey,
    MultiplePrimaryKeys,
    UnsupportedFieldType,
    InvalidCardinality,
    UnknownRelationTarget,
    MissingBackReference,
    DuplicateColumn,
    InvalidKeyGeneration,
    DuplicateEntity,
    InvalidName,

    // Generation
    EmptyUpdate,
    InvalidOperation,

    // Type mapping
    TypeMismatch,
    OutOfRange,
    UnexpectedNull,
    ValueTooLong,
    InvalidTemporal,
    ColumnCount,

    // Persistence
    ConstraintViolation,
    NotFound,
    StaleCursor,
    SessionClosed,
    SessionBusy,
    TransactionActive,
    NoTransaction,
    UnregisteredEntity,
    UnboundRelation,
    UnsavedReference,
    MissingKey,
    Persistence,

    // Configuration
    InvalidConfig,
    Io,
}

impl RmErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            RmErrorKind::MissingPrimaryKey => "ERR_MISSING_PRIMARY_KEY",
            RmErrorKind::MultiplePrimaryKeys => "ERR_MULTIPLE_PRIMARY_KEYS",
            RmErrorKind::UnsupportedFieldType => "ERR_UNSUPPORTED_FIELD_TYPE",
            RmErrorKind::InvalidCardinality => "ERR_INVALID_CARDINALITY",
            RmErrorKind::UnknownRelationTarget => "ERR_UNKNOWN_RELATION_TARGET",
            RmErrorKind::MissingBackReference => "ERR_MISSING_BACK_REFERENCE",
            RmErrorKind::DuplicateColumn => "ERR_DUPLICATE_COLUMN",
            RmErrorKind::InvalidKeyGeneration => "ERR_INVALID_KEY_GENERATION",
            RmErrorKind::DuplicateEntity => "ERR_DUPLICATE_ENTITY",
            RmErrorKind::InvalidName => "ERR_INVALID_NAME",
            RmErrorKind::EmptyUpdate => "ERR_EMPTY_UPDATE",
            RmErrorKind::InvalidOperation => "ERR_INVALID_OPERATION",
            RmErrorKind::TypeMismatch => "ERR_TYPE_MISMATCH",
            RmErrorKind::OutOfRange => "ERR_OUT_OF_RANGE",
            RmErrorKind::UnexpectedNull => "ERR_UNEXPECTED_NULL",
            RmErrorKind::ValueTooLong => "ERR_VALUE_TOO_LONG",
            RmErrorKind::InvalidTemporal => "ERR_INVALID_TEMPORAL",
            RmErrorKind::ColumnCount => "ERR_COLUMN_COUNT",
            RmErrorKind::ConstraintViolation => "ERR_CONSTRAINT_VIOLATION",
            RmErrorKind::NotFound => "ERR_NOT_FOUND",
            RmErrorKind::StaleCursor => "ERR_STALE_CURSOR",
            RmErrorKind::SessionClosed => "ERR_SESSION_CLOSED",
            RmErrorKind::SessionBusy => "ERR_SESSION_BUSY",
            RmErrorKind::TransactionActive => "ERR_TRANSACTION_ACTIVE",
            RmErrorKind::NoTransaction => "ERR_NO_TRANSACTION",
            RmErrorKind::UnregisteredEntity => "ERR_UNREGISTERED_ENTITY",
            RmErrorKind::UnboundRelation => "ERR_UNBOUND_RELATION",
            RmErrorKind::UnsavedReference => "ERR_UNSAVED_REFERENCE",
            RmErrorKind::MissingKey => "ERR_MISSING_KEY",
            RmErrorKind::Persistence => "ERR_PERSISTENCE",
            RmErrorKind::InvalidConfig => "ERR_INVALID_CONFIG",
            RmErrorKind::Io => "ERR_IO",
        }
    }
}

/// Canonical structured error type
///
/// Classification fields for programmatic handling plus free-form context
/// for humans. Produced from every error family via `From`.
#[derive(Debug, Clone)]
pub struct RmError {
    kind: RmErrorKind,
    op: Option<String>,
    entity: Option<String>,
    field: Option<String>,
    message: String,
}

impl RmError {
    /// Create a new error with the specified kind
    pub fn new(kind: RmErrorKind) -> Self {
        Self {
            kind,
            op: None,
            entity: None,
            field: None,
            message: String::new(),
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add entity context
    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    /// Add field context
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> RmErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Get the operation context, if any
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Get the entity context, if any
    pub fn entity(&self) -> Option<&str> {
        self.entity.as_deref()
    }

    /// Get the field context, if any
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for RmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(entity) = &self.entity {
            write!(f, " (entity: {})", entity)?;
        }
        if let Some(field) = &self.field {
            write!(f, " (field: {})", field)?;
        }
        Ok(())
    }
}

impl std::error::Error for RmError {}

// ========== End Error Facility ==========

/// A malformed entity declaration. Fatal: blocks registry construction.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractionError {
    #[error("Entity {entity} declares no primary key")]
    MissingPrimaryKey { entity: String },

    #[error("Entity {entity} declares more than one primary key: {fields:?}")]
    MultiplePrimaryKeys { entity: String, fields: Vec<String> },

    #[error("Field {entity}.{field} has unsupported type {type_name}")]
    UnsupportedFieldType {
        entity: String,
        field: String,
        type_name: String,
    },

    #[error("Field {entity}.{field} has an invalid relation cardinality: {reason}")]
    InvalidCardinality {
        entity: String,
        field: String,
        reason: String,
    },

    #[error("Field {entity}.{field} references unregistered entity {target}")]
    UnknownRelationTarget {
        entity: String,
        field: String,
        target: String,
    },

    #[error("Collection {entity}.{field} needs {target} to declare a back reference on column {foreign_key:?}")]
    MissingBackReference {
        entity: String,
        field: String,
        target: String,
        foreign_key: Option<String>,
    },

    #[error("Entity {entity} maps more than one field to column {column}")]
    DuplicateColumn { entity: String, column: String },

    #[error("Field {entity}.{field} cannot use a generated key: {reason}")]
    InvalidKeyGeneration {
        entity: String,
        field: String,
        reason: String,
    },

    #[error("Entity {entity} is registered more than once")]
    DuplicateEntity { entity: String },

    #[error("Entity {entity} has an empty {what} name")]
    EmptyName { entity: String, what: String },

    #[error(transparent)]
    Generation(#[from] GenerationError),
}

/// A statement that cannot be generated for a metamodel.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenerationError {
    #[error("Entity {entity} has no non-key columns to update")]
    EmptyUpdate { entity: String },

    #[error("Entity {entity} does not use a store-generated key")]
    KeyNotGenerated { entity: String },

    #[error("Column {column} of entity {entity} is not a foreign key")]
    NotAForeignKey { entity: String, column: String },
}

/// A value that does not fit the column it is read from or written to.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TypeMappingError {
    #[error("Expected {expected:?} column value, found {found}")]
    Mismatch { expected: SqlType, found: &'static str },

    #[error("Value {value} does not fit {target}")]
    OutOfRange { target: &'static str, value: String },

    #[error("Unexpected NULL for {expected:?} value")]
    UnexpectedNull { expected: SqlType },

    #[error("Column {column} is NOT NULL")]
    NullViolation { column: String },

    #[error("Value for column {column} has length {actual}, maximum is {max}")]
    TooLong {
        column: String,
        max: usize,
        actual: usize,
    },

    #[error("Invalid date/time value {value:?}: {reason}")]
    InvalidTemporal { value: String, reason: String },

    #[error("Row has {actual} columns, expected {expected}")]
    ColumnCount { expected: usize, actual: usize },
}

/// A runtime failure of a repository or session operation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PersistenceError {
    #[error("Constraint violated on {entity}: {message}")]
    ConstraintViolation { entity: String, message: String },

    #[error("No {entity} row with key {key}")]
    NotFound { entity: String, key: String },

    #[error("Cursor over {entity} outlived its session")]
    StaleCursor { entity: String },

    #[error("Session is closed")]
    SessionClosed,

    #[error("Session is already executing a statement")]
    SessionBusy,

    #[error("A transaction is already active on this session")]
    TransactionActive,

    #[error("No transaction is active on this session")]
    NoTransaction,

    #[error("Entity {entity} is not registered")]
    UnregisteredEntity { entity: String },

    #[error("Collection of {entity} is not bound to a persisted owner")]
    UnboundRelation { entity: String },

    #[error("Relation {entity}.{field} points at an unsaved entity")]
    UnsavedReference { entity: String, field: String },

    #[error("Entity {entity} needs a caller-supplied key")]
    MissingKey { entity: String },

    #[error("Entity {entity} has no updatable columns")]
    UpdateNotSupported { entity: String },

    #[error("Column {column} of entity {entity} is not a foreign key")]
    UnknownForeignKey { entity: String, column: String },

    #[error(transparent)]
    TypeMapping(#[from] TypeMappingError),

    #[error("Store failure in {op}: {message}")]
    Store { op: String, message: String },
}

impl PersistenceError {
    /// True for errors caused by misusing the session or repository API
    /// rather than by the data or the store.
    pub fn is_misuse(&self) -> bool {
        matches!(
            self,
            PersistenceError::StaleCursor { .. }
                | PersistenceError::SessionClosed
                | PersistenceError::SessionBusy
                | PersistenceError::TransactionActive
                | PersistenceError::NoTransaction
                | PersistenceError::UnregisteredEntity { .. }
                | PersistenceError::UnboundRelation { .. }
                | PersistenceError::UnsavedReference { .. }
                | PersistenceError::MissingKey { .. }
                | PersistenceError::UpdateNotSupported { .. }
                | PersistenceError::UnknownForeignKey { .. }
        )
    }
}

impl From<ExtractionError> for RmError {
    fn from(err: ExtractionError) -> Self {
        let message = err.to_string();
        match err {
            ExtractionError::MissingPrimaryKey { entity } => {
                RmError::new(RmErrorKind::MissingPrimaryKey).with_entity(entity)
            }
            ExtractionError::MultiplePrimaryKeys { entity, .. } => {
                RmError::new(RmErrorKind::MultiplePrimaryKeys).with_entity(entity)
            }
            ExtractionError::UnsupportedFieldType { entity, field, .. } => {
                RmError::new(RmErrorKind::UnsupportedFieldType)
                    .with_entity(entity)
                    .with_field(field)
            }
            ExtractionError::InvalidCardinality { entity, field, .. } => {
                RmError::new(RmErrorKind::InvalidCardinality)
                    .with_entity(entity)
                    .with_field(field)
            }
            ExtractionError::UnknownRelationTarget { entity, field, .. } => {
                RmError::new(RmErrorKind::UnknownRelationTarget)
                    .with_entity(entity)
                    .with_field(field)
            }
            ExtractionError::MissingBackReference { entity, field, .. } => {
                RmError::new(RmErrorKind::MissingBackReference)
                    .with_entity(entity)
                    .with_field(field)
            }
            ExtractionError::DuplicateColumn { entity, .. } => {
                RmError::new(RmErrorKind::DuplicateColumn).with_entity(entity)
            }
            ExtractionError::InvalidKeyGeneration { entity, field, .. } => {
                RmError::new(RmErrorKind::InvalidKeyGeneration)
                    .with_entity(entity)
                    .with_field(field)
            }
            ExtractionError::DuplicateEntity { entity } => {
                RmError::new(RmErrorKind::DuplicateEntity).with_entity(entity)
            }
            ExtractionError::EmptyName { entity, .. } => {
                RmError::new(RmErrorKind::InvalidName).with_entity(entity)
            }
            ExtractionError::Generation(inner) => return inner.into(),
        }
        .with_op("extract")
        .with_message(message)
    }
}

impl From<GenerationError> for RmError {
    fn from(err: GenerationError) -> Self {
        let message = err.to_string();
        match err {
            GenerationError::EmptyUpdate { entity } => {
                RmError::new(RmErrorKind::EmptyUpdate).with_entity(entity)
            }
            GenerationError::KeyNotGenerated { entity }
            | GenerationError::NotAForeignKey { entity, .. } => {
                RmError::new(RmErrorKind::InvalidOperation).with_entity(entity)
            }
        }
        .with_op("generate")
        .with_message(message)
    }
}

impl From<TypeMappingError> for RmError {
    fn from(err: TypeMappingError) -> Self {
        let kind = match &err {
            TypeMappingError::Mismatch { .. } => RmErrorKind::TypeMismatch,
            TypeMappingError::OutOfRange { .. } => RmErrorKind::OutOfRange,
            TypeMappingError::UnexpectedNull { .. } | TypeMappingError::NullViolation { .. } => {
                RmErrorKind::UnexpectedNull
            }
            TypeMappingError::TooLong { .. } => RmErrorKind::ValueTooLong,
            TypeMappingError::InvalidTemporal { .. } => RmErrorKind::InvalidTemporal,
            TypeMappingError::ColumnCount { .. } => RmErrorKind::ColumnCount,
        };
        RmError::new(kind)
            .with_op("type_mapping")
            .with_message(err.to_string())
    }
}

impl From<PersistenceError> for RmError {
    fn from(err: PersistenceError) -> Self {
        let message = err.to_string();
        match err {
            PersistenceError::ConstraintViolation { entity, .. } => {
                RmError::new(RmErrorKind::ConstraintViolation).with_entity(entity)
            }
            PersistenceError::NotFound { entity, .. } => {
                RmError::new(RmErrorKind::NotFound).with_entity(entity)
            }
            PersistenceError::StaleCursor { entity } => {
                RmError::new(RmErrorKind::StaleCursor).with_entity(entity)
            }
            PersistenceError::SessionClosed => RmError::new(RmErrorKind::SessionClosed),
            PersistenceError::SessionBusy => RmError::new(RmErrorKind::SessionBusy),
            PersistenceError::TransactionActive => RmError::new(RmErrorKind::TransactionActive),
            PersistenceError::NoTransaction => RmError::new(RmErrorKind::NoTransaction),
            PersistenceError::UnregisteredEntity { entity } => {
                RmError::new(RmErrorKind::UnregisteredEntity).with_entity(entity)
            }
            PersistenceError::UnboundRelation { entity } => {
                RmError::new(RmErrorKind::UnboundRelation).with_entity(entity)
            }
            PersistenceError::UnsavedReference { entity, field } => {
                RmError::new(RmErrorKind::UnsavedReference)
                    .with_entity(entity)
                    .with_field(field)
            }
            PersistenceError::MissingKey { entity } => {
                RmError::new(RmErrorKind::MissingKey).with_entity(entity)
            }
            PersistenceError::UpdateNotSupported { entity } => {
                RmError::new(RmErrorKind::EmptyUpdate).with_entity(entity)
            }
            PersistenceError::UnknownForeignKey { entity, column } => {
                RmError::new(RmErrorKind::InvalidOperation)
                    .with_entity(entity)
                    .with_field(column)
            }
            PersistenceError::TypeMapping(inner) => return inner.into(),
            PersistenceError::Store { op, .. } => {
                return RmError::new(RmErrorKind::Persistence)
                    .with_op(op)
                    .with_message(message)
            }
        }
        .with_op("persist")
        .with_message(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persistence_error_kind_codes() {
        let cases = [
            (RmErrorKind::ConstraintViolation, "ERR_CONSTRAINT_VIOLATION"),
            (RmErrorKind::StaleCursor, "ERR_STALE_CURSOR"),
            (RmErrorKind::SessionBusy, "ERR_SESSION_BUSY"),
            (RmErrorKind::TransactionActive, "ERR_TRANSACTION_ACTIVE"),
            (RmErrorKind::NoTransaction, "ERR_NO_TRANSACTION"),
        ];
        for (kind, expected_code) in cases {
            assert_eq!(kind.code(), expected_code, "Wrong code for {:?}", kind);
        }
    }

    #[test]
    fn test_generation_error_flattens_through_extraction() {
        let err = ExtractionError::Generation(GenerationError::EmptyUpdate {
            entity: "Tag".into(),
        });
        let rm: RmError = err.into();
        assert_eq!(rm.kind(), RmErrorKind::EmptyUpdate);
        assert_eq!(rm.op(), Some("generate"));
        assert_eq!(rm.entity(), Some("Tag"));
    }

    #[test]
    fn test_store_error_keeps_its_op() {
        let err = PersistenceError::Store {
            op: "commit".into(),
            message: "disk I/O error".into(),
        };
        let rm: RmError = err.into();
        assert_eq!(rm.kind(), RmErrorKind::Persistence);
        assert_eq!(rm.op(), Some("commit"));
        assert!(rm.message().contains("disk I/O error"));
    }

    #[test]
    fn test_misuse_classification() {
        assert!(PersistenceError::SessionBusy.is_misuse());
        assert!(PersistenceError::TransactionActive.is_misuse());
        assert!(!PersistenceError::ConstraintViolation {
            entity: "Person".into(),
            message: "UNIQUE".into()
        }
        .is_misuse());
        assert!(!PersistenceError::NotFound {
            entity: "Person".into(),
            key: "1".into()
        }
        .is_misuse());
    }
}
