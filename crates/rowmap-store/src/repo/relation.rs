//! Relation handles stored in entity fields
//!
//! [`Ref`] holds the foreign key of a single-valued relation and loads the
//! target on first access. [`Many`] is the owner side of a one-to-many
//! relation; it has no column of its own and queries the target table by
//! the back-referencing foreign key.

use rowmap_core::errors::{PersistenceError, TypeMappingError};
use rowmap_core::{ColumnType, FromColumn, PrimaryKey, SqlType, ToColumn, TypeRef, Value};
use std::cell::OnceCell;
use std::fmt;

use super::cursor::Cursor;
use crate::entity::Entity;
use crate::errors::Result;
use crate::session::Session;

/// Single-valued relation to `T`, stored as `T`'s key
pub struct Ref<T: Entity> {
    key: Option<T::Key>,
    loaded: OnceCell<Option<T>>,
}

impl<T: Entity> Ref<T> {
    /// Reference by key
    pub fn new(key: T::Key) -> Self {
        Self {
            key: Some(key),
            loaded: OnceCell::new(),
        }
    }

    pub fn none() -> Self {
        Self {
            key: None,
            loaded: OnceCell::new(),
        }
    }

    /// Reference to an existing instance
    ///
    /// Only the key is kept. Referencing an instance that has not been saved
    /// yet makes saving the owner fail with `UnsavedReference`.
    pub fn to(target: &T) -> Self {
        Self::new(target.key().clone())
    }

    /// Point at another key, dropping anything already loaded
    pub fn set(&mut self, key: Option<T::Key>) {
        self.key = key;
        self.loaded = OnceCell::new();
    }

    pub fn key(&self) -> Option<&T::Key> {
        self.key.as_ref()
    }

    pub fn is_set(&self) -> bool {
        self.key.is_some()
    }

    /// True when the reference carries a key that has not been assigned
    pub fn is_unsaved(&self) -> bool {
        self.key.as_ref().is_some_and(|key| key.is_unset())
    }

    /// The referenced entity, loaded once per handle
    ///
    /// # Errors
    ///
    /// `UnregisteredEntity`, session and store errors.
    pub fn get(&self, session: &Session) -> Result<Option<&T>> {
        if let Some(loaded) = self.loaded.get() {
            return Ok(loaded.as_ref());
        }

        let target = match &self.key {
            Some(key) => session.repository::<T>()?.find_by_key(session, key)?,
            None => None,
        };
        Ok(self.loaded.get_or_init(|| target).as_ref())
    }

    /// The entity loaded by an earlier [`Ref::get`] or eager fetch
    pub fn loaded(&self) -> Option<&T> {
        self.loaded.get().and_then(Option::as_ref)
    }
}

impl<T: Entity> Default for Ref<T> {
    fn default() -> Self {
        Self::none()
    }
}

impl<T: Entity> Clone for Ref<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            loaded: OnceCell::new(),
        }
    }
}

impl<T: Entity> fmt::Debug for Ref<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ref")
            .field("target", &TypeRef::of::<T>().short_name())
            .field("key", &self.key)
            .field("loaded", &self.loaded.get().is_some())
            .finish()
    }
}

impl<T: Entity> PartialEq for Ref<T> {
    fn eq(&self, other: &Self) -> bool {
        let column = |r: &Self| r.key.as_ref().map(|k| k.to_column().ok());
        column(self) == column(other)
    }
}

impl<T: Entity> ColumnType for Ref<T> {
    const SQL_TYPE: SqlType = <T::Key as ColumnType>::SQL_TYPE;
    const NULLABLE: bool = true;
}

impl<T: Entity> ToColumn for Ref<T> {
    fn to_column(&self) -> std::result::Result<Value, TypeMappingError> {
        match &self.key {
            Some(key) => key.to_column(),
            None => Ok(Value::Null),
        }
    }
}

impl<T: Entity> FromColumn for Ref<T> {
    fn from_column(value: Value) -> std::result::Result<Self, TypeMappingError> {
        match value {
            Value::Null => Ok(Self::none()),
            other => T::Key::from_column(other).map(Self::new),
        }
    }
}

/// Owner side of a one-to-many relation to `T`
///
/// Bound to its owner's key when the owner is saved or loaded; an unbound
/// collection fails with `UnboundRelation`.
pub struct Many<T: Entity> {
    owner: Option<(Value, &'static str)>,
    loaded: OnceCell<Vec<T>>,
}

impl<T: Entity> Many<T> {
    /// Bind to the owner key matched against `foreign_key` in `T`'s table
    pub fn bind(&mut self, owner: Value, foreign_key: &'static str) {
        self.owner = Some((owner, foreign_key));
        self.loaded = OnceCell::new();
    }

    pub fn is_bound(&self) -> bool {
        self.owner.is_some()
    }

    fn owner(&self) -> Result<&(Value, &'static str)> {
        self.owner
            .as_ref()
            .ok_or_else(|| PersistenceError::UnboundRelation {
                entity: TypeRef::of::<T>().short_name().to_string(),
            })
    }

    /// Fresh cursor over the related rows
    ///
    /// # Errors
    ///
    /// `UnboundRelation`, `UnregisteredEntity`, `SessionClosed`.
    pub fn iter(&self, session: &Session) -> Result<Cursor<T>> {
        let (owner, foreign_key) = self.owner()?;
        session
            .repository::<T>()?
            .find_by_foreign_key(session, foreign_key, owner)
    }

    /// All related rows, loaded once per handle
    ///
    /// # Errors
    ///
    /// As [`Many::iter`], plus any failure while reading rows.
    pub fn load(&self, session: &Session) -> Result<&[T]> {
        if let Some(items) = self.loaded.get() {
            return Ok(items);
        }
        let items = self.iter(session)?.collect::<Result<Vec<T>>>()?;
        Ok(self.loaded.get_or_init(|| items))
    }

    /// Items from an earlier [`Many::load`] or eager fetch
    pub fn loaded(&self) -> Option<&[T]> {
        self.loaded.get().map(Vec::as_slice)
    }
}

impl<T: Entity> Default for Many<T> {
    fn default() -> Self {
        Self {
            owner: None,
            loaded: OnceCell::new(),
        }
    }
}

impl<T: Entity> Clone for Many<T> {
    fn clone(&self) -> Self {
        Self {
            owner: self.owner.clone(),
            loaded: OnceCell::new(),
        }
    }
}

impl<T: Entity> fmt::Debug for Many<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Many")
            .field("target", &TypeRef::of::<T>().short_name())
            .field("owner", &self.owner)
            .field("loaded", &self.loaded.get().map(Vec::len))
            .finish()
    }
}

/// Collections never take part in entity equality
impl<T: Entity> PartialEq for Many<T> {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}
