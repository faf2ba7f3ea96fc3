//! Deterministic SQL statement generation
//!
//! Templates are pure functions of a [`Metamodel`](crate::model::Metamodel):
//! the same metamodel always yields byte-identical SQL and binding order.

pub mod generator;
pub mod ident;
pub mod template;

pub use generator::{generate, StatementSet};
pub use ident::quote_ident;
pub use template::{OperationKind, ParamBinding, ParamSource, StatementTemplate};
