use serde::Serialize;

use super::declaration::{Cardinality, FetchMode, TypeRef};
use crate::types::SqlType;

/// What a persisted column stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "role")]
pub enum ColumnRole {
    PrimaryKey,
    Scalar,
    /// Backs the single-valued relation at this index of `relations()`
    ForeignKey { relation: usize },
}

/// One persisted column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnDef {
    pub field: String,
    pub name: String,
    pub sql_type: SqlType,
    pub nullable: bool,
    pub unique: bool,
    pub max_length: Option<usize>,
    #[serde(flatten)]
    pub role: ColumnRole,
}

impl ColumnDef {
    pub fn is_primary_key(&self) -> bool {
        self.role == ColumnRole::PrimaryKey
    }

    pub fn is_foreign_key(&self) -> bool {
        matches!(self.role, ColumnRole::ForeignKey { .. })
    }
}

/// Who supplies primary-key values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyGeneration {
    Caller,
    /// `INTEGER PRIMARY KEY AUTOINCREMENT`
    Store,
}

/// A resolved relation field
///
/// For one-to-one relations `foreign_key` is a column of this entity's
/// table; for one-to-many it is the back-reference column on the target.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelationDef {
    pub field: String,
    pub target: TypeRef,
    pub target_table: String,
    pub target_key: String,
    pub cardinality: Cardinality,
    pub foreign_key: String,
    pub fetch: FetchMode,
}

/// Validated, immutable mapping of one entity onto one table
///
/// Only the extractor constructs these; a `Metamodel` always has exactly
/// one primary-key column and every relation target was registered.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metamodel {
    entity: String,
    #[serde(rename = "type")]
    type_ref: TypeRef,
    table: String,
    columns: Vec<ColumnDef>,
    primary_key: usize,
    key_generation: KeyGeneration,
    relations: Vec<RelationDef>,
}

impl Metamodel {
    pub(crate) fn new(
        entity: String,
        type_ref: TypeRef,
        table: String,
        columns: Vec<ColumnDef>,
        primary_key: usize,
        key_generation: KeyGeneration,
        relations: Vec<RelationDef>,
    ) -> Self {
        Self {
            entity,
            type_ref,
            table,
            columns,
            primary_key,
            key_generation,
            relations,
        }
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn type_ref(&self) -> TypeRef {
        self.type_ref
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Persisted columns in declared order
    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn primary_key(&self) -> &ColumnDef {
        &self.columns[self.primary_key]
    }

    pub fn primary_key_index(&self) -> usize {
        self.primary_key
    }

    pub fn key_generation(&self) -> KeyGeneration {
        self.key_generation
    }

    pub fn relations(&self) -> &[RelationDef] {
        &self.relations
    }

    /// Relation declared on the given field
    pub fn relation(&self, field: &str) -> Option<&RelationDef> {
        self.relations.iter().find(|r| r.field == field)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Every column except the key, with its position in the row
    pub fn non_key_columns(&self) -> impl Iterator<Item = (usize, &ColumnDef)> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.is_primary_key())
    }

    /// Single-valued relations, in declared order
    pub fn references(&self) -> impl Iterator<Item = &RelationDef> {
        self.relations
            .iter()
            .filter(|r| r.cardinality == Cardinality::OneToOne)
    }
}
