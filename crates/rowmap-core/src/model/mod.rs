//! Entity declarations and the derived metamodel

pub mod declaration;
pub mod metamodel;

pub use declaration::{
    Cardinality, EntityDeclaration, FetchMode, FieldDeclaration, FieldType, TypeRef,
};
pub use metamodel::{ColumnDef, ColumnRole, KeyGeneration, Metamodel, RelationDef};
