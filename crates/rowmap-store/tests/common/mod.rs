//! Hand-written entities for rowmap-store integration tests

#![allow(dead_code)]
#![allow(clippy::unwrap_used, clippy::expect_used)]

use rowmap_core::errors::{PersistenceError, TypeMappingError};
use rowmap_core::{EntityDeclaration, FetchMode, FieldDeclaration as F, Registry, RowReader, ToColumn, Value};
use rowmap_store::{
    create_tables, Entity, Many, Ref, RegisterEntity, SavePolicy, Session, SessionManager,
    StoreConfig,
};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub struct Department {
    pub id: i64,
    pub name: String,
    pub people: Many<Person>,
}

impl Department {
    pub fn new(name: &str) -> Self {
        Self {
            id: 0,
            name: name.to_string(),
            people: Many::default(),
        }
    }
}

impl Entity for Department {
    type Key = i64;

    fn declaration() -> EntityDeclaration {
        EntityDeclaration::new::<Self>("Department")
            .field(F::scalar::<i64>("id").primary_key().generated())
            .field(F::scalar::<String>("name").max_length(30).unique())
            .field(F::collection::<Person>("people").foreign_key("department"))
    }

    fn key(&self) -> &i64 {
        &self.id
    }

    fn set_key(&mut self, key: i64) {
        self.id = key;
    }

    fn to_row(&self) -> Result<Vec<Value>, TypeMappingError> {
        Ok(vec![self.id.to_column()?, self.name.to_column()?])
    }

    fn from_row(row: &mut RowReader) -> Result<Self, TypeMappingError> {
        Ok(Self {
            id: row.read()?,
            name: row.read()?,
            people: Many::default(),
        })
    }

    fn bind_collections(&mut self) -> Result<(), TypeMappingError> {
        let owner = self.id.to_column()?;
        self.people.bind(owner, "department");
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Person {
    pub id: i64,
    pub name: String,
    pub age: i32,
    pub department: Ref<Department>,
}

impl Person {
    pub fn new(name: &str, age: i32) -> Self {
        Self {
            id: 0,
            name: name.to_string(),
            age,
            department: Ref::none(),
        }
    }

    pub fn with_id(id: i64, name: &str, age: i32) -> Self {
        Self {
            id,
            ..Self::new(name, age)
        }
    }

    pub fn in_department(mut self, department: &Department) -> Self {
        self.department = Ref::to(department);
        self
    }
}

impl Entity for Person {
    type Key = i64;

    fn declaration() -> EntityDeclaration {
        EntityDeclaration::new::<Self>("Person")
            .table("clovek")
            .field(F::scalar::<i64>("id").primary_key().generated())
            .field(F::scalar::<String>("name").max_length(30))
            .field(F::scalar::<i32>("age"))
            .field(F::reference::<Department>("department"))
    }

    fn key(&self) -> &i64 {
        &self.id
    }

    fn set_key(&mut self, key: i64) {
        self.id = key;
    }

    fn to_row(&self) -> Result<Vec<Value>, TypeMappingError> {
        Ok(vec![
            self.id.to_column()?,
            self.name.to_column()?,
            self.age.to_column()?,
            self.department.to_column()?,
        ])
    }

    fn from_row(row: &mut RowReader) -> Result<Self, TypeMappingError> {
        Ok(Self {
            id: row.read()?,
            name: row.read()?,
            age: row.read()?,
            department: row.read()?,
        })
    }

    fn unsaved_reference(&self) -> Option<&'static str> {
        self.department.is_unsaved().then_some("department")
    }
}

/// Caller-keyed entity with a nullable column
#[derive(Debug, Clone, PartialEq)]
pub struct Tag {
    pub label: String,
    pub note: Option<String>,
}

impl Tag {
    pub fn new(label: &str, note: Option<&str>) -> Self {
        Self {
            label: label.to_string(),
            note: note.map(str::to_string),
        }
    }
}

impl Entity for Tag {
    type Key = String;

    fn declaration() -> EntityDeclaration {
        EntityDeclaration::new::<Self>("Tag")
            .field(F::scalar::<String>("label").primary_key().max_length(16))
            .field(F::scalar::<Option<String>>("note"))
    }

    fn key(&self) -> &String {
        &self.label
    }

    fn set_key(&mut self, key: String) {
        self.label = key;
    }

    fn to_row(&self) -> Result<Vec<Value>, TypeMappingError> {
        Ok(vec![self.label.to_column()?, self.note.to_column()?])
    }

    fn from_row(row: &mut RowReader) -> Result<Self, TypeMappingError> {
        Ok(Self {
            label: row.read()?,
            note: row.read()?,
        })
    }
}

/// Entity whose department reference is fetched eagerly
#[derive(Debug, Clone, PartialEq)]
pub struct Memo {
    pub id: i64,
    pub text: String,
    pub department: Ref<Department>,
}

impl Entity for Memo {
    type Key = i64;

    fn declaration() -> EntityDeclaration {
        EntityDeclaration::new::<Self>("Memo")
            .field(F::scalar::<i64>("id").primary_key().generated())
            .field(F::scalar::<String>("text"))
            .field(
                F::reference::<Department>("department")
                    .column("department_id")
                    .fetch(FetchMode::Eager),
            )
    }

    fn key(&self) -> &i64 {
        &self.id
    }

    fn set_key(&mut self, key: i64) {
        self.id = key;
    }

    fn to_row(&self) -> Result<Vec<Value>, TypeMappingError> {
        Ok(vec![
            self.id.to_column()?,
            self.text.to_column()?,
            self.department.to_column()?,
        ])
    }

    fn from_row(row: &mut RowReader) -> Result<Self, TypeMappingError> {
        Ok(Self {
            id: row.read()?,
            text: row.read()?,
            department: row.read()?,
        })
    }

    fn unsaved_reference(&self) -> Option<&'static str> {
        self.department.is_unsaved().then_some("department")
    }

    fn resolve_eager(&self, session: &Session) -> Result<(), PersistenceError> {
        self.department.get(session)?;
        Ok(())
    }
}

pub fn registry() -> Arc<Registry> {
    Arc::new(
        Registry::builder()
            .entity::<Department>()
            .entity::<Person>()
            .entity::<Tag>()
            .entity::<Memo>()
            .build()
            .expect("test entities are valid"),
    )
}

pub fn manager_with(config: StoreConfig) -> SessionManager {
    SessionManager::new(config, registry())
}

/// In-memory session with every table created
pub fn setup_session() -> Session {
    setup_session_with(SavePolicy::Upsert)
}

pub fn setup_session_with(policy: SavePolicy) -> Session {
    let session = manager_with(StoreConfig::in_memory().with_save_policy(policy))
        .open()
        .unwrap();
    create_tables(&session).unwrap();
    session
}
