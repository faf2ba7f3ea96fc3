// Integration tests for Ref and Many relation handles

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{setup_session, Department, Memo, Person};
use rowmap_core::errors::PersistenceError;
use rowmap_store::{Many, Ref};

#[test]
fn test_ref_loads_target_once() {
    let session = setup_session();
    let departments = session.repository::<Department>().unwrap();
    let people = session.repository::<Person>().unwrap();

    let sales = departments.save(&session, Department::new("Sales")).unwrap();
    let ana = people
        .save(&session, Person::new("Ana", 30).in_department(&sales))
        .unwrap();

    let found = people.find_by_key(&session, &ana.id).unwrap().unwrap();
    assert_eq!(found.department.key(), Some(&sales.id));
    assert!(found.department.loaded().is_none());

    let department = found.department.get(&session).unwrap().unwrap();
    assert_eq!(department.name, "Sales");
    assert_eq!(found.department.loaded().map(|d| d.id), Some(sales.id));
}

#[test]
fn test_empty_ref_resolves_to_none() {
    let session = setup_session();
    let people = session.repository::<Person>().unwrap();
    let ana = people.save(&session, Person::new("Ana", 30)).unwrap();

    let found = people.find_by_key(&session, &ana.id).unwrap().unwrap();
    assert!(!found.department.is_set());
    assert!(found.department.get(&session).unwrap().is_none());
}

#[test]
fn test_saving_with_unsaved_reference_fails() {
    let session = setup_session();
    let people = session.repository::<Person>().unwrap();
    let unsaved = Department::new("Draft");

    let err = people
        .save(&session, Person::new("Ana", 30).in_department(&unsaved))
        .unwrap_err();

    assert_eq!(
        err,
        PersistenceError::UnsavedReference {
            entity: "Person".to_string(),
            field: "department".to_string(),
        }
    );
    assert_eq!(people.count(&session).unwrap(), 0);
}

#[test]
fn test_dangling_reference_is_constraint_violation() {
    let session = setup_session();
    let people = session.repository::<Person>().unwrap();
    let mut ana = Person::new("Ana", 30);
    ana.department = Ref::new(77);

    let err = people.save(&session, ana).unwrap_err();
    assert!(matches!(err, PersistenceError::ConstraintViolation { .. }));
}

#[test]
fn test_collection_yields_every_dependent() {
    let session = setup_session();
    let departments = session.repository::<Department>().unwrap();
    let people = session.repository::<Person>().unwrap();

    // Given: a department with N people and another department with one
    let sales = departments.save(&session, Department::new("Sales")).unwrap();
    let ops = departments.save(&session, Department::new("Ops")).unwrap();
    for i in 0..5 {
        people
            .save(&session, Person::new(&format!("P{i}"), 20 + i).in_department(&sales))
            .unwrap();
    }
    people
        .save(&session, Person::new("Other", 50).in_department(&ops))
        .unwrap();

    // When: the collection is loaded from a fetched department
    let found = departments.find_by_key(&session, &sales.id).unwrap().unwrap();
    let members = found.people.load(&session).unwrap();

    // Then: exactly N items, all pointing back at the department
    assert_eq!(members.len(), 5);
    assert!(members.iter().all(|p| p.department.key() == Some(&sales.id)));
    assert_eq!(found.people.iter(&session).unwrap().count(), 5);
}

#[test]
fn test_saved_owner_has_bound_collection() {
    let session = setup_session();
    let departments = session.repository::<Department>().unwrap();

    let draft = Department::new("Sales");
    assert!(!draft.people.is_bound());

    let saved = departments.save(&session, draft).unwrap();
    assert!(saved.people.is_bound());
    assert!(saved.people.load(&session).unwrap().is_empty());
}

#[test]
fn test_unbound_collection_is_rejected() {
    let session = setup_session();
    let people: Many<Person> = Many::default();

    let err = people.iter(&session).unwrap_err();
    assert_eq!(
        err,
        PersistenceError::UnboundRelation {
            entity: "Person".to_string()
        }
    );
    assert!(err.is_misuse());
}

#[test]
fn test_eager_reference_is_loaded_with_owner() {
    let session = setup_session();
    let departments = session.repository::<Department>().unwrap();
    let memos = session.repository::<Memo>().unwrap();

    let sales = departments.save(&session, Department::new("Sales")).unwrap();
    let memo = memos
        .save(
            &session,
            Memo {
                id: 0,
                text: "quarterly".to_string(),
                department: Ref::to(&sales),
            },
        )
        .unwrap();

    let found = memos.find_by_key(&session, &memo.id).unwrap().unwrap();
    assert_eq!(found.department.loaded().map(|d| d.name.as_str()), Some("Sales"));
}

#[test]
fn test_ref_equality_follows_key() {
    assert_eq!(Ref::<Department>::new(1), Ref::new(1));
    assert_ne!(Ref::<Department>::new(1), Ref::new(2));
    assert_ne!(Ref::<Department>::new(1), Ref::none());
}
