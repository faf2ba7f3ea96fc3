//! rowmap Core - metamodel, extraction and SQL generation
//!
//! This crate holds the pure half of the mapping pipeline:
//! - Entity declarations and the derived, immutable Metamodel
//! - The metadata extractor and the explicit entity Registry
//! - Deterministic SQL statement template generation
//! - The Type Mapper between Rust values and SQL column values
//! - The error taxonomy and the structured logging facility
//!
//! Nothing here touches a database connection; the runtime lives in
//! `rowmap-store`.

pub mod errors;
pub mod extract;
pub mod logging_facility;
pub mod model;
pub mod sql;
pub mod types;

pub use rowmap_core_types::schema;

// Re-export commonly used types
pub use errors::{
    ExtractionError, GenerationError, PersistenceError, RmError, RmErrorKind, TypeMappingError,
};
pub use extract::{extract, Catalog, EntityModel, Registry, RegistryBuilder};
pub use model::{
    Cardinality, ColumnDef, ColumnRole, EntityDeclaration, FetchMode, FieldDeclaration,
    FieldType, KeyGeneration, Metamodel, RelationDef, TypeRef,
};
pub use sql::{generate, OperationKind, ParamBinding, ParamSource, StatementSet, StatementTemplate};
pub use types::{
    check_value, ColumnType, FromColumn, PrimaryKey, RowReader, SqlType, ToColumn, Value,
};
