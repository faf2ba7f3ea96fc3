//! Derived entities shared by the rowmap integration tests

#![allow(dead_code)]
#![allow(clippy::unwrap_used, clippy::expect_used)]

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rowmap::{create_tables, Entity, Many, Ref, RegisterEntity, Registry, Session, SessionManager, StoreConfig};
use std::sync::Arc;

#[derive(Entity, Debug, Clone, PartialEq)]
pub struct Department {
    #[rowmap(primary_key, generated)]
    pub id: i64,
    #[rowmap(max_length = 30, unique)]
    pub name: String,
    #[rowmap(max_length = 5)]
    pub code: String,
    #[rowmap(relation(one_to_many), foreign_key = "department")]
    pub people: Many<Person>,
}

impl Department {
    pub fn new(name: &str, code: &str) -> Self {
        Self {
            id: 0,
            name: name.to_string(),
            code: code.to_string(),
            people: Many::default(),
        }
    }
}

#[derive(Entity, Debug, Clone, PartialEq)]
#[rowmap(table = "clovek")]
pub struct Person {
    #[rowmap(primary_key, generated)]
    pub id: i64,
    #[rowmap(max_length = 30)]
    pub surname: String,
    #[rowmap(max_length = 30)]
    pub name: String,
    pub age: i32,
    pub born: Option<NaiveDate>,
    pub updated_at: DateTime<Utc>,
    #[rowmap(relation(one_to_one))]
    pub department: Ref<Department>,
}

impl Person {
    pub fn new(name: &str, surname: &str, age: i32) -> Self {
        Self {
            id: 0,
            surname: surname.to_string(),
            name: name.to_string(),
            age,
            born: None,
            updated_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap(),
            department: Ref::none(),
        }
    }
}

/// Caller-keyed entity with an eagerly fetched owner
#[derive(Entity, Debug, Clone, PartialEq)]
pub struct Badge {
    #[rowmap(primary_key, column = "badge_code")]
    pub code: String,
    #[rowmap(nullable)]
    pub note: Option<String>,
    #[rowmap(column = "holder_id", fetch = "eager")]
    pub holder: Ref<Person>,
}

pub fn registry() -> Arc<Registry> {
    Arc::new(
        Registry::builder()
            .entity::<Department>()
            .entity::<Person>()
            .entity::<Badge>()
            .build()
            .expect("derived entities are valid"),
    )
}

pub fn setup_session() -> Session {
    let session = SessionManager::new(StoreConfig::in_memory(), registry())
        .open()
        .unwrap();
    create_tables(&session).unwrap();
    session
}
