//! Correlation identifiers
//!
//! Every session gets a `SessionId` so log events emitted by repositories,
//! cursors and the transaction state machine can be grouped per unit of work.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for one session
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    /// Generate a new SessionId using UUIDv7 (time-ordered)
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Get the string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Create from an existing string
    pub fn from_string(s: String) -> Self {
        Self(s)
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_generation() {
        let id1 = SessionId::new();
        let id2 = SessionId::new();

        assert_ne!(id1, id2);
        assert!(!id1.as_str().is_empty());
    }

    #[test]
    fn test_session_id_display() {
        let id = SessionId::new();
        assert_eq!(format!("{}", id), id.as_str());
    }

    #[test]
    fn test_session_ids_are_time_ordered() {
        let earlier = SessionId::new();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let later = SessionId::new();
        assert!(earlier.as_str() < later.as_str());
    }

    #[test]
    fn test_serialization() {
        let id = SessionId::new();
        let json = serde_json::to_string(&id).unwrap();
        let deserialized: SessionId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);
    }
}
