//! The `Entity` trait implemented by `#[derive(Entity)]`

use rowmap_core::errors::{PersistenceError, TypeMappingError};
use rowmap_core::{EntityDeclaration, PrimaryKey, RegistryBuilder, RowReader, Value};

use crate::session::Session;

/// A struct mapped onto one table
///
/// Normally derived. `to_row` and `from_row` must visit persisted fields in
/// declared order, skipping collection fields; that order is the column
/// order of the metamodel built from [`Entity::declaration`].
pub trait Entity: Sized + 'static {
    type Key: PrimaryKey;

    fn declaration() -> EntityDeclaration;

    fn key(&self) -> &Self::Key;

    fn set_key(&mut self, key: Self::Key);

    /// # Errors
    ///
    /// Any field whose value has no column representation.
    fn to_row(&self) -> Result<Vec<Value>, TypeMappingError>;

    /// # Errors
    ///
    /// Any column that does not convert into its field.
    fn from_row(row: &mut RowReader) -> Result<Self, TypeMappingError>;

    /// Name of the first single-valued relation pointing at an entity
    /// that has no key yet
    fn unsaved_reference(&self) -> Option<&'static str> {
        None
    }

    /// Bind collection handles to this instance's key
    ///
    /// # Errors
    ///
    /// When the key has no column representation.
    fn bind_collections(&mut self) -> Result<(), TypeMappingError> {
        Ok(())
    }

    /// Resolve relations declared with `fetch = "eager"`
    ///
    /// # Errors
    ///
    /// Any failure loading a related entity.
    fn resolve_eager(&self, _session: &Session) -> Result<(), PersistenceError> {
        Ok(())
    }
}

/// Register entities by type
///
/// ```ignore
/// let registry = Registry::builder()
///     .entity::<Department>()
///     .entity::<Person>()
///     .build()?;
/// ```
pub trait RegisterEntity {
    fn entity<E: Entity>(self) -> Self;
}

impl RegisterEntity for RegistryBuilder {
    fn entity<E: Entity>(self) -> Self {
        self.register(E::declaration())
    }
}
