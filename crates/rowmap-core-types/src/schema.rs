//! Canonical schema constants for structured logging and events
//!
//! These constants keep field names identical across every crate that logs.

// Canonical field keys for structured logging
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";
pub const FIELD_SESSION_ID: &str = "session_id";

// Mapping identifiers
pub const FIELD_ENTITY: &str = "entity";
pub const FIELD_TABLE: &str = "table";
pub const FIELD_OPERATION_KIND: &str = "operation_kind";

// Result sizes
pub const FIELD_ROWS: &str = "rows";

// Error fields
pub const FIELD_ERR_KIND: &str = "err_kind";
pub const FIELD_ERR_CODE: &str = "err_code";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";
