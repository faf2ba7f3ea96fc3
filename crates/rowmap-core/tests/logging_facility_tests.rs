#![allow(clippy::unwrap_used, clippy::expect_used)]

use rowmap_core::errors::PersistenceError;
use rowmap_core::logging_facility::test_capture::init_test_capture;
use rowmap_core::schema::{EVENT_END, EVENT_END_ERROR, EVENT_START};
use rowmap_core::{log_op_end, log_op_error, log_op_start, EntityDeclaration, FieldDeclaration, Registry};

#[test]
fn test_log_op_start_macro() {
    let capture = init_test_capture();
    let op_name = "test_log_op_start_unique_1";

    log_op_start!(op_name, entity = "Person");

    let start_events: Vec<_> = capture
        .events_for(op_name)
        .into_iter()
        .filter(|e| e.event.as_deref() == Some(EVENT_START))
        .collect();

    assert_eq!(start_events.len(), 1);
    assert_eq!(start_events[0].field("entity"), Some("Person"));
}

#[test]
fn test_log_op_end_macro() {
    let capture = init_test_capture();
    let op_name = "test_log_op_end_unique_2";

    log_op_end!(op_name, duration_ms = 42);

    let end_events: Vec<_> = capture
        .events_for(op_name)
        .into_iter()
        .filter(|e| e.event.as_deref() == Some(EVENT_END))
        .collect();

    assert_eq!(end_events.len(), 1, "Should have exactly one end event");
    assert_eq!(end_events[0].field("duration_ms"), Some("42"));
}

#[test]
fn test_log_op_error_includes_kind_and_code() {
    let capture = init_test_capture();
    let op_name = "test_log_op_error_unique_3";
    let err = PersistenceError::SessionBusy;

    log_op_error!(op_name, &err, duration_ms = 5);

    let error_events: Vec<_> = capture
        .events_for(op_name)
        .into_iter()
        .filter(|e| e.event.as_deref() == Some(EVENT_END_ERROR))
        .collect();

    assert_eq!(error_events.len(), 1);
    assert_eq!(error_events[0].field("err_code"), Some("ERR_SESSION_BUSY"));
    assert_eq!(error_events[0].field("err_kind"), Some("SessionBusy"));
    assert_eq!(error_events[0].level, tracing::Level::ERROR);
}

#[test]
fn test_registry_build_logs_start_and_end() {
    struct Logged;
    let capture = init_test_capture();

    Registry::builder()
        .register(
            EntityDeclaration::new::<Logged>("LoggedEntity")
                .field(FieldDeclaration::scalar::<i64>("id").primary_key()),
        )
        .build()
        .unwrap();

    capture.assert_event_exists("registry_build", EVENT_START);
    capture.assert_event_exists("registry_build", EVENT_END);
    let registered = capture.count_events(|e| e.field("entity") == Some("LoggedEntity"));
    assert!(registered >= 1);
}
