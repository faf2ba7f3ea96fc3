//! Canonical logging macros
//!
//! Callers need `tracing` in their own dependency set; the macros expand to
//! `tracing::info!` / `tracing::error!` at the call site.

/// Log the start of an operation
///
/// # Example
///
/// ```
/// # use rowmap_core::log_op_start;
/// log_op_start!("save");
/// log_op_start!("save", entity = "Person", table = "clovek");
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::schema::EVENT_START,
        );
    };
    ($op:expr, $($field:tt)*) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::schema::EVENT_START,
            $($field)*
        );
    };
}

/// Log the successful end of an operation
///
/// # Example
///
/// ```
/// # use rowmap_core::log_op_end;
/// log_op_end!("save", duration_ms = 3);
/// log_op_end!("find_all", duration_ms = 3, rows = 10u64);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::schema::EVENT_END,
            duration_ms = $duration,
        );
    };
    ($op:expr, duration_ms = $duration:expr, $($field:tt)*) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::schema::EVENT_END,
            duration_ms = $duration,
            $($field)*
        );
    };
}

/// Log an operation error
///
/// The error is cloned and converted into [`RmError`](crate::errors::RmError)
/// so the event carries the canonical kind and stable code.
///
/// # Example
///
/// ```
/// # use rowmap_core::{log_op_error, errors::PersistenceError};
/// let err = PersistenceError::SessionClosed;
/// log_op_error!("commit", &err, duration_ms = 1);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr) => {{
        let rm_err: $crate::errors::RmError = ::std::clone::Clone::clone($err).into();
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = $crate::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err_kind = ?rm_err.kind(),
            err_code = rm_err.code(),
        );
    }};
    ($op:expr, $err:expr, duration_ms = $duration:expr, $($field:tt)*) => {{
        let rm_err: $crate::errors::RmError = ::std::clone::Clone::clone($err).into();
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = $crate::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err_kind = ?rm_err.kind(),
            err_code = rm_err.code(),
            $($field)*
        );
    }};
}
