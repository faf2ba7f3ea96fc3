//! Schema bootstrap
//!
//! Creates the tables of registered entities, targets before dependents,
//! and records the checksum of every applied DDL statement in
//! `rowmap_schema`. A table whose recorded checksum differs from its
//! current DDL is reported as drifted and left untouched.

mod checksums;

pub use checksums::ddl_checksum;

use rowmap_core::errors::PersistenceError;
use rowmap_core::{log_op_end, log_op_error, log_op_start, EntityModel, TypeRef};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

use crate::errors::{from_rusqlite, Result};
use crate::session::Session;

pub const SCHEMA_TABLE: &str = "rowmap_schema";

const CREATE_SCHEMA_TABLE: &str = "CREATE TABLE IF NOT EXISTS \"rowmap_schema\" (
    \"table_name\" TEXT PRIMARY KEY NOT NULL,
    \"entity\" TEXT NOT NULL,
    \"checksum\" TEXT NOT NULL,
    \"applied_at\" TEXT NOT NULL
)";

/// Tables a bootstrap run touched, by outcome
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BootstrapReport {
    pub created: Vec<String>,
    pub unchanged: Vec<String>,
    /// Recorded DDL differs from the current one
    pub drifted: Vec<String>,
}

impl BootstrapReport {
    pub fn has_drift(&self) -> bool {
        !self.drifted.is_empty()
    }
}

/// Create every registered table
///
/// # Errors
///
/// Session and store errors; nothing is applied when one occurs.
pub fn create_tables(session: &Session) -> Result<BootstrapReport> {
    let models: Vec<Arc<EntityModel>> = session
        .registry()
        .creation_order()
        .into_iter()
        .cloned()
        .collect();
    bootstrap(session, &models)
}

/// Create the tables of `entities` only, still in dependency order
///
/// # Errors
///
/// `UnregisteredEntity` for a type outside the registry, otherwise as
/// [`create_tables`].
pub fn create_tables_for(session: &Session, entities: &[TypeRef]) -> Result<BootstrapReport> {
    if let Some(missing) = entities.iter().find(|t| !session.registry().contains(**t)) {
        return Err(PersistenceError::UnregisteredEntity {
            entity: missing.short_name().to_string(),
        });
    }

    let models: Vec<Arc<EntityModel>> = session
        .registry()
        .creation_order()
        .into_iter()
        .filter(|model| entities.contains(&model.metamodel().type_ref()))
        .cloned()
        .collect();
    bootstrap(session, &models)
}

fn bootstrap(session: &Session, models: &[Arc<EntityModel>]) -> Result<BootstrapReport> {
    let start = Instant::now();
    log_op_start!(
        "bootstrap",
        session_id = session.id().as_str(),
        entities = models.len()
    );

    let result = session.write(|conn| {
        conn.execute_batch(CREATE_SCHEMA_TABLE).map_err(from_rusqlite)?;

        let mut report = BootstrapReport::default();
        for model in models {
            apply_table(conn, model, &mut report)?;
        }
        Ok(report)
    });

    let duration_ms = start.elapsed().as_millis() as u64;
    match &result {
        Ok(report) => {
            log_op_end!(
                "bootstrap",
                duration_ms = duration_ms,
                session_id = session.id().as_str(),
                created = report.created.len(),
                drifted = report.drifted.len()
            );
        }
        Err(err) => {
            log_op_error!(
                "bootstrap",
                err,
                duration_ms = duration_ms,
                session_id = session.id().as_str()
            );
        }
    }
    result
}

fn apply_table(conn: &Connection, model: &EntityModel, report: &mut BootstrapReport) -> Result<()> {
    let table = model.table();
    let ddl = model.statements().create_table.sql();
    let checksum = ddl_checksum(ddl);

    let recorded: Option<String> = conn
        .query_row(
            "SELECT \"checksum\" FROM \"rowmap_schema\" WHERE \"table_name\" = ?1",
            [table],
            |row| row.get(0),
        )
        .optional()
        .map_err(from_rusqlite)?;

    match recorded {
        Some(existing) if existing == checksum => {
            tracing::debug!(entity = model.entity(), table = table, "table unchanged");
            report.unchanged.push(table.to_string());
        }
        Some(existing) => {
            tracing::warn!(
                entity = model.entity(),
                table = table,
                recorded = %existing,
                current = %checksum,
                "table definition drifted from recorded schema"
            );
            report.drifted.push(table.to_string());
        }
        None => {
            conn.execute_batch(ddl).map_err(from_rusqlite)?;
            conn.execute(
                "INSERT INTO \"rowmap_schema\" (\"table_name\", \"entity\", \"checksum\", \"applied_at\") \
                 VALUES (?1, ?2, ?3, ?4)",
                params![table, model.entity(), checksum, chrono::Utc::now().to_rfc3339()],
            )
            .map_err(from_rusqlite)?;
            tracing::debug!(entity = model.entity(), table = table, "table created");
            report.created.push(table.to_string());
        }
    }
    Ok(())
}
