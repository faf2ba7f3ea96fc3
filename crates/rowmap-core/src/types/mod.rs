//! Type Mapper
//!
//! Bidirectional conversion between Rust host types and SQL column values.
//! Every conversion between an entity field and a bound parameter or a
//! fetched column goes through [`ToColumn`] / [`FromColumn`]; nothing else
//! in the workspace inspects storage classes.

pub mod mapper;
pub mod row;
pub mod value;

pub use mapper::{check_value, ColumnType, FromColumn, PrimaryKey, ToColumn};
pub use row::RowReader;
pub use value::{SqlType, Value};
