use serde::Serialize;
use std::collections::BTreeMap;

use super::ident::quote_ident;
use super::template::{OperationKind, ParamBinding, ParamSource, StatementTemplate};
use crate::errors::GenerationError;
use crate::model::{ColumnDef, ColumnRole, KeyGeneration, Metamodel};
use crate::types::SqlType;

/// Generate one statement template
///
/// # Errors
///
/// - `EmptyUpdate` for `Update` on an entity with only a key column
/// - `KeyNotGenerated` for `InsertGenerated` on caller-keyed entities
/// - `NotAForeignKey` for `SelectByForeignKey` on any other column
pub fn generate(meta: &Metamodel, kind: &OperationKind) -> Result<StatementTemplate, GenerationError> {
    let table = quote_ident(meta.table());
    let key_index = meta.primary_key_index();
    let key = quote_ident(&meta.primary_key().name);
    let mut params = Params::default();

    let sql = match kind {
        OperationKind::CreateTable => create_table(meta),
        OperationKind::Insert => {
            let columns: Vec<(usize, &ColumnDef)> = meta.columns().iter().enumerate().collect();
            insert_into(&table, &columns, &mut params)
        }
        OperationKind::InsertGenerated => {
            if meta.key_generation() != KeyGeneration::Store {
                return Err(GenerationError::KeyNotGenerated {
                    entity: meta.entity().to_string(),
                });
            }
            let columns: Vec<(usize, &ColumnDef)> = meta.non_key_columns().collect();
            if columns.is_empty() {
                format!("INSERT INTO {} DEFAULT VALUES", table)
            } else {
                insert_into(&table, &columns, &mut params)
            }
        }
        OperationKind::Update => {
            let assignments: Vec<String> = meta
                .non_key_columns()
                .map(|(index, column)| {
                    format!("{} = {}", quote_ident(&column.name), params.column(index))
                })
                .collect();
            if assignments.is_empty() {
                return Err(GenerationError::EmptyUpdate {
                    entity: meta.entity().to_string(),
                });
            }
            format!(
                "UPDATE {} SET {} WHERE {} = {}",
                table,
                assignments.join(", "),
                key,
                params.column(key_index)
            )
        }
        OperationKind::Upsert => {
            let columns: Vec<(usize, &ColumnDef)> = meta.columns().iter().enumerate().collect();
            let insert = insert_into(&table, &columns, &mut params);
            let updates: Vec<String> = meta
                .non_key_columns()
                .map(|(_, column)| {
                    let name = quote_ident(&column.name);
                    format!("{} = excluded.{}", name, name)
                })
                .collect();
            if updates.is_empty() {
                format!("{} ON CONFLICT ({}) DO NOTHING", insert, key)
            } else {
                format!(
                    "{} ON CONFLICT ({}) DO UPDATE SET {}",
                    insert,
                    key,
                    updates.join(", ")
                )
            }
        }
        OperationKind::Delete => {
            format!("DELETE FROM {} WHERE {} = {}", table, key, params.column(key_index))
        }
        OperationKind::SelectByKey => format!(
            "SELECT {} FROM {} WHERE {} = {}",
            select_list(meta),
            table,
            key,
            params.column(key_index)
        ),
        OperationKind::SelectAll => {
            let after = params.push(ParamSource::PageAfter);
            let limit = params.push(ParamSource::PageLimit);
            format!(
                "SELECT {} FROM {} WHERE ({} IS NULL OR {} > {}) ORDER BY {} LIMIT {}",
                select_list(meta),
                table,
                after,
                key,
                after,
                key,
                limit
            )
        }
        OperationKind::SelectByForeignKey(column) => {
            let index = meta
                .column_index(column)
                .filter(|&i| meta.columns()[i].is_foreign_key())
                .ok_or_else(|| GenerationError::NotAForeignKey {
                    entity: meta.entity().to_string(),
                    column: column.clone(),
                })?;
            let fk = params.column(index);
            let after = params.push(ParamSource::PageAfter);
            let limit = params.push(ParamSource::PageLimit);
            format!(
                "SELECT {} FROM {} WHERE {} = {} AND ({} IS NULL OR {} > {}) ORDER BY {} LIMIT {}",
                select_list(meta),
                table,
                quote_ident(column),
                fk,
                after,
                key,
                after,
                key,
                limit
            )
        }
        OperationKind::Count => format!("SELECT COUNT(*) FROM {}", table),
    };

    Ok(StatementTemplate::new(kind.clone(), sql, params.bindings))
}

#[derive(Default)]
struct Params {
    bindings: Vec<ParamBinding>,
}

impl Params {
    fn push(&mut self, source: ParamSource) -> String {
        let slot = self.bindings.len() + 1;
        self.bindings.push(ParamBinding { slot, source });
        format!("?{}", slot)
    }

    fn column(&mut self, index: usize) -> String {
        self.push(ParamSource::Column(index))
    }
}

fn insert_into(table: &str, columns: &[(usize, &ColumnDef)], params: &mut Params) -> String {
    let names: Vec<String> = columns.iter().map(|(_, c)| quote_ident(&c.name)).collect();
    let slots: Vec<String> = columns.iter().map(|(i, _)| params.column(*i)).collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table,
        names.join(", "),
        slots.join(", ")
    )
}

fn select_list(meta: &Metamodel) -> String {
    meta.columns()
        .iter()
        .map(|c| quote_ident(&c.name))
        .collect::<Vec<_>>()
        .join(", ")
}

fn column_ddl(meta: &Metamodel, column: &ColumnDef) -> String {
    let name = quote_ident(&column.name);
    let mut ddl = format!("{} {}", name, column.sql_type.ddl());

    if column.is_primary_key() {
        match meta.key_generation() {
            KeyGeneration::Store => ddl.push_str(" PRIMARY KEY AUTOINCREMENT"),
            KeyGeneration::Caller => ddl.push_str(" PRIMARY KEY NOT NULL"),
        }
    } else {
        if !column.nullable {
            ddl.push_str(" NOT NULL");
        }
        if column.unique {
            ddl.push_str(" UNIQUE");
        }
    }

    if let Some(max) = column.max_length {
        if matches!(column.sql_type, SqlType::Text | SqlType::Blob) {
            ddl.push_str(&format!(" CHECK (length({}) <= {})", name, max));
        }
    }
    ddl
}

fn create_table(meta: &Metamodel) -> String {
    let mut parts: Vec<String> = meta.columns().iter().map(|c| column_ddl(meta, c)).collect();

    for column in meta.columns() {
        if let ColumnRole::ForeignKey { relation } = column.role {
            let rel = &meta.relations()[relation];
            parts.push(format!(
                "FOREIGN KEY ({}) REFERENCES {} ({})",
                quote_ident(&column.name),
                quote_ident(&rel.target_table),
                quote_ident(&rel.target_key)
            ));
        }
    }

    format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        quote_ident(meta.table()),
        parts.join(", ")
    )
}

/// Every template an entity needs at runtime, generated once at registry
/// build
#[derive(Debug, Clone, Serialize)]
pub struct StatementSet {
    pub create_table: StatementTemplate,
    pub insert: StatementTemplate,
    /// Present only for store-generated keys
    pub insert_generated: Option<StatementTemplate>,
    /// Absent when the entity has no non-key column
    pub update: Option<StatementTemplate>,
    pub upsert: StatementTemplate,
    pub delete: StatementTemplate,
    pub select_by_key: StatementTemplate,
    pub select_all: StatementTemplate,
    pub count: StatementTemplate,
    /// Keyed by foreign-key column name
    pub by_foreign_key: BTreeMap<String, StatementTemplate>,
}

impl StatementSet {
    /// # Errors
    ///
    /// Propagates generator errors other than the two optional templates.
    pub fn generate(meta: &Metamodel) -> Result<Self, GenerationError> {
        let insert_generated = match meta.key_generation() {
            KeyGeneration::Store => Some(generate(meta, &OperationKind::InsertGenerated)?),
            KeyGeneration::Caller => None,
        };
        let update = match generate(meta, &OperationKind::Update) {
            Ok(template) => Some(template),
            Err(GenerationError::EmptyUpdate { .. }) => None,
            Err(other) => return Err(other),
        };
        let by_foreign_key = meta
            .references()
            .map(|rel| {
                generate(meta, &OperationKind::SelectByForeignKey(rel.foreign_key.clone()))
                    .map(|t| (rel.foreign_key.clone(), t))
            })
            .collect::<Result<BTreeMap<_, _>, _>>()?;

        Ok(Self {
            create_table: generate(meta, &OperationKind::CreateTable)?,
            insert: generate(meta, &OperationKind::Insert)?,
            insert_generated,
            update,
            upsert: generate(meta, &OperationKind::Upsert)?,
            delete: generate(meta, &OperationKind::Delete)?,
            select_by_key: generate(meta, &OperationKind::SelectByKey)?,
            select_all: generate(meta, &OperationKind::SelectAll)?,
            count: generate(meta, &OperationKind::Count)?,
            by_foreign_key,
        })
    }

    pub fn by_foreign_key(&self, column: &str) -> Option<&StatementTemplate> {
        self.by_foreign_key.get(column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{extract, Catalog};
    use crate::model::{EntityDeclaration, FieldDeclaration as F};

    struct Tag;

    fn tag_meta() -> Metamodel {
        let decls = vec![EntityDeclaration::new::<Tag>("Tag")
            .field(F::scalar::<String>("label").primary_key())];
        extract(&decls[0], &Catalog::new(&decls)).unwrap()
    }

    #[test]
    fn test_key_only_entity_has_no_update() {
        let meta = tag_meta();
        assert_eq!(
            generate(&meta, &OperationKind::Update).unwrap_err(),
            GenerationError::EmptyUpdate {
                entity: "Tag".into()
            }
        );
        let set = StatementSet::generate(&meta).unwrap();
        assert!(set.update.is_none());
        assert!(set.insert_generated.is_none());
        assert_eq!(
            set.upsert.sql(),
            r#"INSERT INTO "Tag" ("label") VALUES (?1) ON CONFLICT ("label") DO NOTHING"#
        );
    }

    #[test]
    fn test_caller_text_key_ddl() {
        let meta = tag_meta();
        assert_eq!(
            generate(&meta, &OperationKind::CreateTable).unwrap().sql(),
            r#"CREATE TABLE IF NOT EXISTS "Tag" ("label" TEXT PRIMARY KEY NOT NULL)"#
        );
    }
}
