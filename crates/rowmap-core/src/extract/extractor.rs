use std::collections::{HashMap, HashSet};

use crate::errors::ExtractionError;
use crate::model::{
    Cardinality, ColumnDef, ColumnRole, EntityDeclaration, FieldDeclaration, FieldType,
    KeyGeneration, Metamodel, RelationDef, TypeRef,
};
use crate::types::SqlType;

/// The set of declarations being registered together
///
/// Relation targets are resolved against the catalog, never against any
/// ambient state.
#[derive(Debug, Default)]
pub struct Catalog<'a> {
    declarations: HashMap<TypeRef, &'a EntityDeclaration>,
}

impl<'a> Catalog<'a> {
    pub fn new(declarations: &'a [EntityDeclaration]) -> Self {
        declarations.iter().collect()
    }

    pub fn get(&self, type_ref: TypeRef) -> Option<&'a EntityDeclaration> {
        self.declarations.get(&type_ref).copied()
    }

    pub fn contains(&self, type_ref: TypeRef) -> bool {
        self.declarations.contains_key(&type_ref)
    }
}

impl<'a> FromIterator<&'a EntityDeclaration> for Catalog<'a> {
    fn from_iter<I: IntoIterator<Item = &'a EntityDeclaration>>(iter: I) -> Self {
        Self {
            declarations: iter.into_iter().map(|d| (d.type_ref, d)).collect(),
        }
    }
}

/// Column a single-valued relation is stored in
fn reference_column(field: &FieldDeclaration) -> &str {
    field
        .column
        .as_deref()
        .or(field.foreign_key.as_deref())
        .unwrap_or(&field.name)
}

/// Primary-key field of a declaration, if it has exactly one
fn single_key(decl: &EntityDeclaration) -> Result<&FieldDeclaration, ExtractionError> {
    let keys: Vec<&FieldDeclaration> = decl.fields.iter().filter(|f| f.primary_key).collect();
    match keys.as_slice() {
        [] => Err(ExtractionError::MissingPrimaryKey {
            entity: decl.name.clone(),
        }),
        [key] => Ok(*key),
        many => Err(ExtractionError::MultiplePrimaryKeys {
            entity: decl.name.clone(),
            fields: many.iter().map(|f| f.name.clone()).collect(),
        }),
    }
}

fn key_sql_type(decl: &EntityDeclaration, key: &FieldDeclaration) -> Result<SqlType, ExtractionError> {
    match &key.field_type {
        FieldType::Scalar { sql_type, .. } if sql_type.is_key_capable() => Ok(*sql_type),
        FieldType::Scalar { sql_type, .. } => Err(ExtractionError::UnsupportedFieldType {
            entity: decl.name.clone(),
            field: key.name.clone(),
            type_name: format!("{:?} primary key", sql_type),
        }),
        FieldType::Reference(target) | FieldType::Collection(target) => {
            Err(ExtractionError::UnsupportedFieldType {
                entity: decl.name.clone(),
                field: key.name.clone(),
                type_name: format!("relation to {} as primary key", target.short_name()),
            })
        }
        FieldType::Other(type_name) => Err(ExtractionError::UnsupportedFieldType {
            entity: decl.name.clone(),
            field: key.name.clone(),
            type_name: type_name.clone(),
        }),
    }
}

fn check_cardinality(
    decl: &EntityDeclaration,
    field: &FieldDeclaration,
    expected: Cardinality,
) -> Result<(), ExtractionError> {
    match field.cardinality {
        Some(found) if found != expected => Err(ExtractionError::InvalidCardinality {
            entity: decl.name.clone(),
            field: field.name.clone(),
            reason: format!(
                "{:?} declared on a {} field",
                found,
                match expected {
                    Cardinality::OneToOne => "single-valued",
                    Cardinality::OneToMany => "collection",
                }
            ),
        }),
        _ => Ok(()),
    }
}

fn resolve_target<'a>(
    decl: &EntityDeclaration,
    field: &FieldDeclaration,
    target: TypeRef,
    catalog: &Catalog<'a>,
) -> Result<&'a EntityDeclaration, ExtractionError> {
    catalog
        .get(target)
        .ok_or_else(|| ExtractionError::UnknownRelationTarget {
            entity: decl.name.clone(),
            field: field.name.clone(),
            target: target.short_name().to_string(),
        })
}

/// Turn a declaration into a validated metamodel
///
/// Relation targets must be present in `catalog`. Fields are visited in
/// declared order, so the first offending field determines the error.
///
/// # Errors
///
/// One [`ExtractionError`] variant per violated structural rule.
pub fn extract(decl: &EntityDeclaration, catalog: &Catalog<'_>) -> Result<Metamodel, ExtractionError> {
    if decl.name.is_empty() {
        return Err(ExtractionError::EmptyName {
            entity: decl.type_ref.short_name().to_string(),
            what: "entity".into(),
        });
    }
    if decl.table_name().is_empty() {
        return Err(ExtractionError::EmptyName {
            entity: decl.name.clone(),
            what: "table".into(),
        });
    }

    let key_field = single_key(decl)?;
    let key_type = key_sql_type(decl, key_field)?;

    let mut columns = Vec::new();
    let mut relations = Vec::new();
    let mut seen = HashSet::new();
    let mut primary_key = 0;

    for field in &decl.fields {
        if field.generated && !field.primary_key {
            return Err(ExtractionError::InvalidKeyGeneration {
                entity: decl.name.clone(),
                field: field.name.clone(),
                reason: "only the primary key can be generated".into(),
            });
        }

        let column = match &field.field_type {
            FieldType::Other(type_name) => {
                return Err(ExtractionError::UnsupportedFieldType {
                    entity: decl.name.clone(),
                    field: field.name.clone(),
                    type_name: type_name.clone(),
                });
            }
            FieldType::Scalar { sql_type, .. } => {
                if field.cardinality.is_some() {
                    return Err(ExtractionError::InvalidCardinality {
                        entity: decl.name.clone(),
                        field: field.name.clone(),
                        reason: "relation marker on a primitive field".into(),
                    });
                }
                if field.primary_key {
                    if field.generated && key_type != SqlType::Integer {
                        return Err(ExtractionError::InvalidKeyGeneration {
                            entity: decl.name.clone(),
                            field: field.name.clone(),
                            reason: format!("{:?} keys cannot be generated", key_type),
                        });
                    }
                    primary_key = columns.len();
                }
                ColumnDef {
                    field: field.name.clone(),
                    name: field.column_name().to_string(),
                    sql_type: *sql_type,
                    nullable: field.nullable && !field.primary_key,
                    unique: field.unique && !field.primary_key,
                    max_length: field.max_length,
                    role: if field.primary_key {
                        ColumnRole::PrimaryKey
                    } else {
                        ColumnRole::Scalar
                    },
                }
            }
            FieldType::Reference(target) => {
                check_cardinality(decl, field, Cardinality::OneToOne)?;
                let target_decl = resolve_target(decl, field, *target, catalog)?;
                let target_key = single_key(target_decl)?;
                let target_key_type = key_sql_type(target_decl, target_key)?;
                let column = reference_column(field).to_string();

                relations.push(RelationDef {
                    field: field.name.clone(),
                    target: *target,
                    target_table: target_decl.table_name().to_string(),
                    target_key: target_key.column_name().to_string(),
                    cardinality: Cardinality::OneToOne,
                    foreign_key: column.clone(),
                    fetch: field.fetch,
                });

                ColumnDef {
                    field: field.name.clone(),
                    name: column,
                    sql_type: target_key_type,
                    nullable: field.nullable,
                    unique: field.unique,
                    max_length: None,
                    role: ColumnRole::ForeignKey {
                        relation: relations.len() - 1,
                    },
                }
            }
            FieldType::Collection(target) => {
                check_cardinality(decl, field, Cardinality::OneToMany)?;
                let target_decl = resolve_target(decl, field, *target, catalog)?;
                let missing = || ExtractionError::MissingBackReference {
                    entity: decl.name.clone(),
                    field: field.name.clone(),
                    target: target_decl.name.clone(),
                    foreign_key: field.foreign_key.clone(),
                };
                let foreign_key = field.foreign_key.as_deref().ok_or_else(&missing)?;
                let has_back_reference = target_decl.fields.iter().any(|f| {
                    f.field_type == FieldType::Reference(decl.type_ref)
                        && reference_column(f) == foreign_key
                });
                if !has_back_reference {
                    return Err(missing());
                }
                let target_key = single_key(target_decl)?;

                relations.push(RelationDef {
                    field: field.name.clone(),
                    target: *target,
                    target_table: target_decl.table_name().to_string(),
                    target_key: target_key.column_name().to_string(),
                    cardinality: Cardinality::OneToMany,
                    foreign_key: foreign_key.to_string(),
                    fetch: field.fetch,
                });
                continue;
            }
        };

        if column.name.is_empty() {
            return Err(ExtractionError::EmptyName {
                entity: decl.name.clone(),
                what: format!("column of field {}", field.name),
            });
        }
        if !seen.insert(column.name.clone()) {
            return Err(ExtractionError::DuplicateColumn {
                entity: decl.name.clone(),
                column: column.name,
            });
        }
        columns.push(column);
    }

    let key_generation = if key_field.generated {
        KeyGeneration::Store
    } else {
        KeyGeneration::Caller
    };

    Ok(Metamodel::new(
        decl.name.clone(),
        decl.type_ref,
        decl.table_name().to_string(),
        columns,
        primary_key,
        key_generation,
        relations,
    ))
}
