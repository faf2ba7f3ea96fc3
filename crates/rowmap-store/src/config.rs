//! Store configuration
//!
//! `StoreConfig` deserializes from TOML; every field has a default.
//!
//! ```toml
//! location = "people.db"      # or "memory"
//! foreign_keys = true
//! journal_mode = "wal"        # wal | delete | memory
//! busy_timeout_ms = 5000
//! save_policy = "upsert"      # upsert | insert_only | key_presence
//! page_size = 64
//! transaction_behavior = "deferred"  # deferred | immediate | exclusive
//! ```

use rowmap_core::errors::{RmError, RmErrorKind};
use rusqlite::TransactionBehavior;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl From<ConfigError> for RmError {
    fn from(err: ConfigError) -> Self {
        let kind = match &err {
            ConfigError::Io { .. } => RmErrorKind::Io,
            ConfigError::Parse(_) | ConfigError::Invalid { .. } => RmErrorKind::InvalidConfig,
        };
        RmError::new(kind)
            .with_op("load_config")
            .with_message(err.to_string())
    }
}

/// Where the database lives
///
/// An in-memory location gives every session its own private database.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum Location {
    Memory,
    Path(PathBuf),
}

impl From<String> for Location {
    fn from(value: String) -> Self {
        match value.as_str() {
            "memory" | ":memory:" => Location::Memory,
            _ => Location::Path(PathBuf::from(value)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JournalMode {
    Wal,
    Delete,
    Memory,
}

impl JournalMode {
    pub fn pragma_value(&self) -> &'static str {
        match self {
            JournalMode::Wal => "WAL",
            JournalMode::Delete => "DELETE",
            JournalMode::Memory => "MEMORY",
        }
    }
}

/// How `Repository::save` chooses between insert and update
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SavePolicy {
    /// Unset key: store-generated insert. Set key: insert or update on conflict.
    #[default]
    Upsert,
    /// Always insert; an existing key is a constraint violation
    InsertOnly,
    /// Unset key: insert. Set key: update, `NotFound` when the row is missing.
    KeyPresence,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionMode {
    #[default]
    Deferred,
    Immediate,
    Exclusive,
}

impl TransactionMode {
    pub fn behavior(&self) -> TransactionBehavior {
        match self {
            TransactionMode::Deferred => TransactionBehavior::Deferred,
            TransactionMode::Immediate => TransactionBehavior::Immediate,
            TransactionMode::Exclusive => TransactionBehavior::Exclusive,
        }
    }

    /// Statement opening an explicit transaction
    pub fn begin_sql(&self) -> &'static str {
        match self {
            TransactionMode::Deferred => "BEGIN DEFERRED",
            TransactionMode::Immediate => "BEGIN IMMEDIATE",
            TransactionMode::Exclusive => "BEGIN EXCLUSIVE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    pub location: Location,
    pub foreign_keys: bool,
    pub journal_mode: JournalMode,
    pub busy_timeout_ms: u64,
    pub save_policy: SavePolicy,
    pub page_size: usize,
    pub transaction_behavior: TransactionMode,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            location: Location::Memory,
            foreign_keys: true,
            journal_mode: JournalMode::Wal,
            busy_timeout_ms: 5000,
            save_policy: SavePolicy::Upsert,
            page_size: 64,
            transaction_behavior: TransactionMode::Deferred,
        }
    }
}

impl StoreConfig {
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            location: Location::Path(path.into()),
            ..Self::default()
        }
    }

    pub fn with_save_policy(mut self, policy: SavePolicy) -> Self {
        self.save_policy = policy;
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_journal_mode(mut self, mode: JournalMode) -> Self {
        self.journal_mode = mode;
        self
    }

    pub fn with_transaction_behavior(mut self, mode: TransactionMode) -> Self {
        self.transaction_behavior = mode;
        self
    }

    /// Parse and validate a TOML document
    ///
    /// # Errors
    ///
    /// `Parse` for malformed TOML or unknown keys, `Invalid` for values
    /// that parse but make no sense.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: StoreConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    ///
    /// # Errors
    ///
    /// `Io` when the file cannot be read, otherwise as [`Self::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// # Errors
    ///
    /// `Invalid` naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::Invalid {
                field: "page_size",
                reason: "must be at least 1".into(),
            });
        }
        if let Location::Path(path) = &self.location {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::Invalid {
                    field: "location",
                    reason: "path is empty".into(),
                });
            }
        }
        if self.busy_timeout_ms > u64::from(u32::MAX) {
            return Err(ConfigError::Invalid {
                field: "busy_timeout_ms",
                reason: format!("{} exceeds {}", self.busy_timeout_ms, u32::MAX),
            });
        }
        Ok(())
    }
}
