//! rowmap Store - the runtime persistence engine over SQLite
//!
//! Provides:
//! - `SessionManager` / `Session`: one connection per session and the
//!   transaction state machine
//! - `Repository<E>`: CRUD over a session with lazy keyset-paged cursors
//! - `Ref<T>` / `Many<T>`: relation handles resolved through the session
//! - Schema bootstrap with DDL checksum bookkeeping
//! - `StoreConfig`, loadable from TOML

pub mod config;
pub mod db;
pub mod entity;
pub mod errors;
pub mod repo;
pub mod schema;
pub mod session;

// Re-export key types
pub use config::{ConfigError, JournalMode, Location, SavePolicy, StoreConfig, TransactionMode};
pub use entity::{Entity, RegisterEntity};
pub use errors::Result;
pub use repo::{Cursor, Many, Ref, Repository};
pub use schema::{create_tables, create_tables_for, BootstrapReport};
pub use session::{Session, SessionManager, SessionState};
