use rowmap_core::{log_op_end, log_op_error, log_op_start, Registry};
use std::sync::Arc;
use std::time::Instant;

use super::Session;
use crate::config::StoreConfig;
use crate::db;
use crate::errors::Result;

/// Opens configured sessions over one registry
///
/// Holds no connection itself; every [`Session`] gets its own.
#[derive(Debug, Clone)]
pub struct SessionManager {
    config: Arc<StoreConfig>,
    registry: Arc<Registry>,
}

impl SessionManager {
    pub fn new(config: StoreConfig, registry: Arc<Registry>) -> Self {
        Self {
            config: Arc::new(config),
            registry,
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Open a new session on a fresh connection
    ///
    /// # Errors
    ///
    /// Store failures opening or configuring the connection.
    pub fn open(&self) -> Result<Session> {
        let start = Instant::now();
        log_op_start!("open_session");

        match db::open(&self.config) {
            Ok(conn) => {
                let session = Session::new(conn, self.registry.clone(), self.config.clone());
                log_op_end!(
                    "open_session",
                    duration_ms = start.elapsed().as_millis() as u64,
                    session_id = session.id().as_str()
                );
                Ok(session)
            }
            Err(err) => {
                log_op_error!(
                    "open_session",
                    &err,
                    duration_ms = start.elapsed().as_millis() as u64
                );
                Err(err)
            }
        }
    }
}
