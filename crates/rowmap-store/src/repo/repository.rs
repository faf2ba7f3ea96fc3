use rowmap_core::errors::{PersistenceError, TypeMappingError};
use rowmap_core::{
    check_value, log_op_end, log_op_error, log_op_start, EntityModel, FromColumn, KeyGeneration,
    PrimaryKey, Registry, RowReader, StatementTemplate, ToColumn, TypeRef, Value,
};
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Instant;

use super::bind::{bind_params, execute, from_row, query_rows};
use super::cursor::{Cursor, Scan};
use crate::config::SavePolicy;
use crate::entity::Entity;
use crate::errors::{for_entity, Result};
use crate::session::Session;

const DEFAULT_PAGE_SIZE: usize = 64;

/// Typed CRUD over one registered entity
///
/// Holds only the shared model and policy; every operation takes the
/// session it runs on.
pub struct Repository<E: Entity> {
    model: Arc<EntityModel>,
    policy: SavePolicy,
    page_size: usize,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> Clone for Repository<E> {
    fn clone(&self) -> Self {
        Self {
            model: self.model.clone(),
            policy: self.policy,
            page_size: self.page_size,
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> std::fmt::Debug for Repository<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("entity", &self.model.entity())
            .field("policy", &self.policy)
            .field("page_size", &self.page_size)
            .finish()
    }
}

/// Build an entity from a fetched row, then bind and resolve its relations
pub(crate) fn materialize<E: Entity>(
    model: &EntityModel,
    session: &Session,
    row: Vec<Value>,
) -> Result<E> {
    let expected = model.metamodel().column_count();
    if row.len() != expected {
        return Err(TypeMappingError::ColumnCount {
            expected,
            actual: row.len(),
        }
        .into());
    }

    let mut reader = RowReader::new(row);
    let mut entity = E::from_row(&mut reader)?;
    reader.finish()?;
    entity.bind_collections()?;
    session
        .eager_scope(|| entity.resolve_eager(session))
        .transpose()?;
    Ok(entity)
}

impl<E: Entity> Repository<E> {
    /// # Errors
    ///
    /// `UnregisteredEntity` when `E` is not in `registry`.
    pub fn new(registry: &Registry, policy: SavePolicy) -> Result<Self> {
        let type_ref = TypeRef::of::<E>();
        let model = registry
            .get(type_ref)
            .cloned()
            .ok_or_else(|| PersistenceError::UnregisteredEntity {
                entity: type_ref.short_name().to_string(),
            })?;
        Ok(Self {
            model,
            policy,
            page_size: DEFAULT_PAGE_SIZE,
            _entity: PhantomData,
        })
    }

    /// Rows fetched per cursor page; values below 1 are raised to 1
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn model(&self) -> &Arc<EntityModel> {
        &self.model
    }

    pub fn policy(&self) -> SavePolicy {
        self.policy
    }

    fn entity_name(&self) -> &str {
        self.model.entity()
    }

    fn logged<R>(&self, op: &'static str, session: &Session, f: impl FnOnce() -> Result<R>) -> Result<R> {
        let entity = self.model.entity();
        let table = self.model.table();
        let start = Instant::now();
        log_op_start!(
            op,
            entity = entity,
            table = table,
            session_id = session.id().as_str()
        );

        let result = f();
        let duration_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(_) => {
                log_op_end!(
                    op,
                    duration_ms = duration_ms,
                    entity = entity,
                    table = table,
                    session_id = session.id().as_str()
                );
            }
            Err(err) => {
                log_op_error!(
                    op,
                    err,
                    duration_ms = duration_ms,
                    entity = entity,
                    table = table,
                    session_id = session.id().as_str()
                );
            }
        }
        result
    }

    /// Persist `entity`, choosing insert or update by the save policy
    ///
    /// Returns the entity with its key assigned and collections bound.
    ///
    /// # Errors
    ///
    /// - `UnsavedReference` when a reference points at an entity without a key
    /// - `MissingKey` for an unset caller-supplied key
    /// - `ConstraintViolation` for any constraint the store rejects
    /// - `NotFound` under `KeyPresence` when the keyed row does not exist
    pub fn save(&self, session: &Session, entity: E) -> Result<E> {
        self.logged("save", session, || {
            if entity.key().is_unset() {
                return self.insert_entity(session, entity);
            }
            match self.policy {
                SavePolicy::Upsert => self.upsert_entity(session, entity),
                SavePolicy::InsertOnly => self.insert_entity(session, entity),
                SavePolicy::KeyPresence => self.update_entity(session, entity),
            }
        })
    }

    /// Insert regardless of the save policy
    ///
    /// # Errors
    ///
    /// As [`Self::save`]; an existing key is a `ConstraintViolation`.
    pub fn insert(&self, session: &Session, entity: E) -> Result<E> {
        self.logged("insert", session, || self.insert_entity(session, entity))
    }

    /// Update regardless of the save policy
    ///
    /// # Errors
    ///
    /// `NotFound` when no row has the entity's key, `MissingKey` for an
    /// unset key, `UpdateNotSupported` for key-only entities.
    pub fn update(&self, session: &Session, entity: E) -> Result<E> {
        self.logged("update", session, || self.update_entity(session, entity))
    }

    /// Row with the given key, `None` when absent
    ///
    /// # Errors
    ///
    /// Store, type mapping and session errors.
    pub fn find_by_key(&self, session: &Session, key: &E::Key) -> Result<Option<E>> {
        self.logged("find_by_key", session, || {
            let key_value = key.to_column()?;
            let template = &self.model.statements().select_by_key;
            let rows = session.with_conn(|conn| {
                query_rows(conn, template.sql(), bind_params(template, |_| key_value.clone(), None))
                    .map_err(for_entity(self.entity_name(), "find_by_key"))
            })?;
            rows.into_iter()
                .next()
                .map(|row| materialize::<E>(&self.model, session, row))
                .transpose()
        })
    }

    /// Lazy cursor over every row in key order
    ///
    /// # Errors
    ///
    /// `SessionClosed`.
    pub fn find_all(&self, session: &Session) -> Result<Cursor<E>> {
        self.logged("find_all", session, || {
            self.ensure_open(session)?;
            Ok(Cursor::new(session, self.model.clone(), Scan::All, self.page_size))
        })
    }

    /// Lazy cursor over rows whose foreign-key `column` equals `value`
    ///
    /// # Errors
    ///
    /// `UnknownForeignKey` when `column` backs no reference, `SessionClosed`.
    pub fn find_by_foreign_key(&self, session: &Session, column: &str, value: &Value) -> Result<Cursor<E>> {
        self.logged("find_by_foreign_key", session, || {
            self.ensure_open(session)?;
            if self.model.statements().by_foreign_key(column).is_none() {
                return Err(PersistenceError::UnknownForeignKey {
                    entity: self.entity_name().to_string(),
                    column: column.to_string(),
                });
            }
            Ok(Cursor::new(
                session,
                self.model.clone(),
                Scan::ForeignKey {
                    column: column.to_string(),
                    value: value.clone(),
                },
                self.page_size,
            ))
        })
    }

    /// Delete by key; `false` when no row had the key
    ///
    /// # Errors
    ///
    /// `ConstraintViolation` when other rows still reference this one.
    pub fn delete(&self, session: &Session, key: &E::Key) -> Result<bool> {
        self.logged("delete", session, || {
            let key_value = key.to_column()?;
            let template = &self.model.statements().delete;
            let removed = session.write(|conn| {
                execute(conn, template.sql(), bind_params(template, |_| key_value.clone(), None))
                    .map_err(for_entity(self.entity_name(), "delete"))
            })?;
            Ok(removed > 0)
        })
    }

    /// Delete the row of `entity`
    ///
    /// # Errors
    ///
    /// As [`Self::delete`].
    pub fn remove(&self, session: &Session, entity: &E) -> Result<bool> {
        self.delete(session, entity.key())
    }

    /// # Errors
    ///
    /// Store and session errors.
    pub fn count(&self, session: &Session) -> Result<u64> {
        self.logged("count", session, || {
            let template = &self.model.statements().count;
            let count: i64 = session.with_conn(|conn| {
                conn.prepare_cached(template.sql())
                    .and_then(|mut stmt| stmt.query_row([], |row| row.get(0)))
                    .map_err(for_entity(self.entity_name(), "count"))
            })?;
            Ok(u64::try_from(count).unwrap_or_default())
        })
    }

    fn ensure_open(&self, session: &Session) -> Result<()> {
        if session.is_closed() {
            Err(PersistenceError::SessionClosed)
        } else {
            Ok(())
        }
    }

    /// Entity row validated against the metamodel
    fn checked_row(&self, entity: &E, skip_key: bool) -> Result<Vec<Value>> {
        if let Some(field) = entity.unsaved_reference() {
            return Err(PersistenceError::UnsavedReference {
                entity: self.entity_name().to_string(),
                field: field.to_string(),
            });
        }

        let meta = self.model.metamodel();
        let row = entity.to_row()?;
        if row.len() != meta.column_count() {
            return Err(TypeMappingError::ColumnCount {
                expected: meta.column_count(),
                actual: row.len(),
            }
            .into());
        }
        for (index, (column, value)) in meta.columns().iter().zip(&row).enumerate() {
            if skip_key && index == meta.primary_key_index() {
                continue;
            }
            check_value(column, value)?;
        }
        Ok(row)
    }

    fn write_row(&self, session: &Session, template: &StatementTemplate, row: &[Value], op: &str) -> Result<usize> {
        session.write(|conn| {
            execute(conn, template.sql(), bind_params(template, from_row(row), None))
                .map_err(for_entity(self.entity_name(), op))
        })
    }

    fn insert_entity(&self, session: &Session, mut entity: E) -> Result<E> {
        let statements = self.model.statements();

        if entity.key().is_unset() {
            let template = match (self.model.metamodel().key_generation(), &statements.insert_generated) {
                (KeyGeneration::Store, Some(template)) => template,
                _ => {
                    return Err(PersistenceError::MissingKey {
                        entity: self.entity_name().to_string(),
                    })
                }
            };
            let row = self.checked_row(&entity, true)?;
            // The key must convert before the write commits
            let key = session.write(|conn| {
                execute(conn, template.sql(), bind_params(template, from_row(&row), None))
                    .map_err(for_entity(self.entity_name(), "insert"))?;
                Ok(E::Key::from_column(Value::Integer(conn.last_insert_rowid()))?)
            })?;
            entity.set_key(key);
        } else {
            let row = self.checked_row(&entity, false)?;
            self.write_row(session, &statements.insert, &row, "insert")?;
        }

        entity.bind_collections()?;
        Ok(entity)
    }

    fn upsert_entity(&self, session: &Session, mut entity: E) -> Result<E> {
        let row = self.checked_row(&entity, false)?;
        self.write_row(session, &self.model.statements().upsert, &row, "upsert")?;
        entity.bind_collections()?;
        Ok(entity)
    }

    fn update_entity(&self, session: &Session, mut entity: E) -> Result<E> {
        if entity.key().is_unset() {
            return Err(PersistenceError::MissingKey {
                entity: self.entity_name().to_string(),
            });
        }
        let template = self.model.statements().update.as_ref().ok_or_else(|| {
            PersistenceError::UpdateNotSupported {
                entity: self.entity_name().to_string(),
            }
        })?;

        let row = self.checked_row(&entity, false)?;
        let updated = self.write_row(session, template, &row, "update")?;
        if updated == 0 {
            return Err(PersistenceError::NotFound {
                entity: self.entity_name().to_string(),
                key: row[self.model.metamodel().primary_key_index()].to_string(),
            });
        }
        entity.bind_collections()?;
        Ok(entity)
    }
}
