//! Repository runtime: CRUD, cursors and relation handles

mod bind;
mod cursor;
mod relation;
mod repository;

pub use cursor::Cursor;
pub use relation::{Many, Ref};
pub use repository::Repository;
