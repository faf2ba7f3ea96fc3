//! Core types shared across rowmap facilities
//!
//! This crate provides foundational types used by the error, logging and
//! session layers:
//!
//! - **Correlation types**: SessionId for tying log events to one session
//! - **Schema constants**: Canonical field keys and event names

pub mod correlation;
pub mod schema;

pub use correlation::SessionId;
