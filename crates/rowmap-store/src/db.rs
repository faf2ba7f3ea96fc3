//! Database connection management

use crate::config::{Location, StoreConfig};
use crate::errors::{from_rusqlite, Result};
use rusqlite::Connection;
use std::time::Duration;

/// Open and configure a connection for the given config
pub fn open(config: &StoreConfig) -> Result<Connection> {
    let conn = match &config.location {
        Location::Memory => Connection::open_in_memory(),
        Location::Path(path) => Connection::open(path),
    }
    .map_err(from_rusqlite)?;
    configure(&conn, config)?;
    Ok(conn)
}

/// Apply pragmas and the busy timeout
pub fn configure(conn: &Connection, config: &StoreConfig) -> Result<()> {
    conn.pragma_update(None, "foreign_keys", config.foreign_keys)
        .map_err(from_rusqlite)?;

    // In-memory databases keep "memory" whatever is requested
    if config.location != Location::Memory {
        conn.pragma_update(None, "journal_mode", config.journal_mode.pragma_value())
            .map_err(from_rusqlite)?;
    }

    conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))
        .map_err(from_rusqlite)?;

    Ok(())
}
