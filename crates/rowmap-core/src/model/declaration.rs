use serde::Serialize;
use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::types::{ColumnType, SqlType};

/// Identity of an entity type
///
/// Compares and hashes by `TypeId`; the name is kept for messages and
/// as the default table name.
#[derive(Clone, Copy)]
pub struct TypeRef {
    id: TypeId,
    name: &'static str,
}

impl TypeRef {
    pub fn of<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Fully qualified type name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Type name without its module path or generic arguments
    pub fn short_name(&self) -> &'static str {
        let base = self.name.split('<').next().unwrap_or(self.name);
        base.rsplit("::").next().unwrap_or(base)
    }
}

impl PartialEq for TypeRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeRef {}

impl Hash for TypeRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeRef({})", self.name)
    }
}

impl Serialize for TypeRef {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.short_name())
    }
}

/// Relation cardinality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    OneToOne,
    OneToMany,
}

/// When a relation is resolved
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchMode {
    #[default]
    Lazy,
    Eager,
}

/// Shape of a declared field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    Scalar { sql_type: SqlType, nullable: bool },
    /// Single-valued relation, stored as a foreign-key column
    Reference(TypeRef),
    /// Collection relation, materialized through the target's foreign key
    Collection(TypeRef),
    /// Anything the mapper cannot store; rejected at extraction
    Other(String),
}

/// One field of an entity declaration
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDeclaration {
    pub name: String,
    pub field_type: FieldType,
    pub column: Option<String>,
    pub primary_key: bool,
    pub generated: bool,
    pub nullable: bool,
    pub unique: bool,
    pub max_length: Option<usize>,
    pub cardinality: Option<Cardinality>,
    pub foreign_key: Option<String>,
    pub fetch: FetchMode,
}

impl FieldDeclaration {
    fn with_type(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            column: None,
            primary_key: false,
            generated: false,
            nullable: false,
            unique: false,
            max_length: None,
            cardinality: None,
            foreign_key: None,
            fetch: FetchMode::Lazy,
        }
    }

    /// A primitive field of host type `T`
    pub fn scalar<T: ColumnType>(name: impl Into<String>) -> Self {
        let mut field = Self::with_type(
            name,
            FieldType::Scalar {
                sql_type: T::SQL_TYPE,
                nullable: T::NULLABLE,
            },
        );
        field.nullable = T::NULLABLE;
        field
    }

    /// A primitive field with an explicit SQL type
    pub fn sql(name: impl Into<String>, sql_type: SqlType) -> Self {
        Self::with_type(
            name,
            FieldType::Scalar {
                sql_type,
                nullable: false,
            },
        )
    }

    /// A single-valued relation to `T`; nullable unless marked otherwise
    pub fn reference<T: 'static>(name: impl Into<String>) -> Self {
        let mut field = Self::with_type(name, FieldType::Reference(TypeRef::of::<T>()));
        field.nullable = true;
        field.cardinality = Some(Cardinality::OneToOne);
        field
    }

    /// A collection relation to `T`
    pub fn collection<T: 'static>(name: impl Into<String>) -> Self {
        let mut field = Self::with_type(name, FieldType::Collection(TypeRef::of::<T>()));
        field.cardinality = Some(Cardinality::OneToMany);
        field
    }

    /// A field of a type the mapper does not know
    pub fn other(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self::with_type(name, FieldType::Other(type_name.into()))
    }

    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn generated(mut self) -> Self {
        self.generated = true;
        self
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    /// Override the cardinality implied by the field shape
    pub fn cardinality(mut self, cardinality: Cardinality) -> Self {
        self.cardinality = Some(cardinality);
        self
    }

    pub fn foreign_key(mut self, column: impl Into<String>) -> Self {
        self.foreign_key = Some(column.into());
        self
    }

    pub fn fetch(mut self, fetch: FetchMode) -> Self {
        self.fetch = fetch;
        self
    }

    /// Column name this field maps to (explicit or the field name)
    pub fn column_name(&self) -> &str {
        self.column.as_deref().unwrap_or(&self.name)
    }
}

/// Static structural description of an entity
///
/// Built by `#[derive(Entity)]` or by hand, consumed by the extractor.
///
/// ```
/// use rowmap_core::{EntityDeclaration, FieldDeclaration};
///
/// struct Department;
///
/// let decl = EntityDeclaration::new::<Department>("Department")
///     .field(FieldDeclaration::scalar::<i64>("id").primary_key().generated())
///     .field(FieldDeclaration::scalar::<String>("name").max_length(30));
/// assert_eq!(decl.table_name(), "Department");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct EntityDeclaration {
    pub name: String,
    pub type_ref: TypeRef,
    pub table: Option<String>,
    pub fields: Vec<FieldDeclaration>,
}

impl EntityDeclaration {
    pub fn new<T: 'static>(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_ref: TypeRef::of::<T>(),
            table: None,
            fields: Vec::new(),
        }
    }

    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn field(mut self, field: FieldDeclaration) -> Self {
        self.fields.push(field);
        self
    }

    /// Table name this entity maps to (explicit or the entity name)
    pub fn table_name(&self) -> &str {
        self.table.as_deref().unwrap_or(&self.name)
    }
}
