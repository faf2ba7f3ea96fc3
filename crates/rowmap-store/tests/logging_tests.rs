// Integration tests for structured logging of store operations

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{setup_session, Tag};
use rowmap_core::logging_facility::test_capture::{init_test_capture, CapturedEvent};
use rowmap_core::schema::{EVENT_END, EVENT_END_ERROR, EVENT_START};

fn events_in(events: Vec<CapturedEvent>, session_id: &str) -> Vec<CapturedEvent> {
    events
        .into_iter()
        .filter(|e| e.field("session_id") == Some(session_id))
        .collect()
}

#[test]
fn test_save_logs_start_and_end_with_entity_fields() {
    let capture = init_test_capture();
    let session = setup_session();
    let tags = session.repository::<Tag>().unwrap();

    tags.save(&session, Tag::new("logged", None)).unwrap();

    let events = events_in(capture.events_for("save"), session.id().as_str());
    let kinds: Vec<_> = events.iter().map(|e| e.event.as_deref()).collect();
    assert_eq!(kinds, vec![Some(EVENT_START), Some(EVENT_END)]);
    assert!(events
        .iter()
        .all(|e| e.field("entity") == Some("Tag") && e.field("table") == Some("Tag")));
    assert!(events[1].field("duration_ms").is_some());
}

#[test]
fn test_failed_operation_logs_error_code() {
    let capture = init_test_capture();
    let session = setup_session();
    let tags = session.repository::<Tag>().unwrap();

    tags.save(&session, Tag::new("", None)).unwrap_err();

    let errors: Vec<_> = events_in(capture.events_for("save"), session.id().as_str())
        .into_iter()
        .filter(|e| e.event.as_deref() == Some(EVENT_END_ERROR))
        .collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].field("err_code"), Some("ERR_MISSING_KEY"));
    assert_eq!(errors[0].level, tracing::Level::ERROR);
}

#[test]
fn test_transaction_transitions_are_logged() {
    let capture = init_test_capture();
    let session = setup_session();

    session.begin().unwrap();
    session.begin().unwrap_err();
    session.commit().unwrap();

    let sid = session.id().as_str();
    let begin = events_in(capture.events_for("begin"), sid);
    assert_eq!(begin.len(), 4);
    assert_eq!(
        begin
            .iter()
            .filter(|e| e.field("err_code") == Some("ERR_TRANSACTION_ACTIVE"))
            .count(),
        1
    );
    assert_eq!(events_in(capture.events_for("commit"), sid).len(), 2);
}

#[test]
fn test_bootstrap_and_cursor_pages_are_logged() {
    let capture = init_test_capture();
    let session = setup_session();
    let sid = session.id().as_str();
    capture.assert_event_exists("bootstrap", EVENT_END);

    let tags = session.repository::<Tag>().unwrap();
    tags.save(&session, Tag::new("x", None)).unwrap();
    assert_eq!(tags.find_all(&session).unwrap().count(), 1);

    let pages = capture.count_events(|e| {
        e.field("session_id") == Some(sid) && e.field("message") == Some("cursor page fetched")
    });
    assert_eq!(pages, 1);
}
