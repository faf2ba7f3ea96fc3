//! DDL checksums for drift detection

use sha2::{Digest, Sha256};

/// SHA-256 of a statement, hex encoded
pub fn ddl_checksum(ddl: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(ddl.as_bytes());
    hex::encode(hasher.finalize())
}
