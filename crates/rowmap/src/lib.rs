//! rowmap - lightweight entity mapping over SQLite
//!
//! Derive [`Entity`] on a struct, register it, bootstrap the schema and
//! use a typed [`Repository`]:
//!
//! ```ignore
//! use rowmap::{Entity, Ref, RegisterEntity, Registry, SessionManager, StoreConfig};
//!
//! #[derive(Entity)]
//! #[rowmap(table = "clovek")]
//! struct Person {
//!     #[rowmap(primary_key, generated)]
//!     id: i64,
//!     #[rowmap(max_length = 30)]
//!     name: String,
//!     department: Ref<Department>,
//! }
//!
//! let registry = Registry::builder().entity::<Department>().entity::<Person>().build()?;
//! let manager = SessionManager::new(StoreConfig::in_memory(), registry.into());
//! let session = manager.open()?;
//! rowmap::create_tables(&session)?;
//! let ana = session.repository::<Person>()?.save(&session, person)?;
//! ```

pub use rowmap_core as core;
pub use rowmap_core::errors::{
    ExtractionError, GenerationError, PersistenceError, RmError, RmErrorKind, TypeMappingError,
};
pub use rowmap_core::logging_facility;
pub use rowmap_core::{Registry, RegistryBuilder, SqlType, TypeRef, Value};
pub use rowmap_derive::Entity;
pub use rowmap_store::*;

#[doc(hidden)]
pub mod __private {
    pub use rowmap_core::errors::{PersistenceError, TypeMappingError};
    pub use rowmap_core::{EntityDeclaration, FetchMode, FieldDeclaration, RowReader, ToColumn, Value};
}
