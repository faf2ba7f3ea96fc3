//! Shared declarations for rowmap-core integration tests

#![allow(dead_code)]

use chrono::{DateTime, NaiveDate, Utc};
use rowmap_core::{EntityDeclaration, FieldDeclaration as F, Registry};

pub struct Department;
pub struct Person;
pub struct Tag;

/// The department of the classic example: a store-generated key and a
/// collection of people through `clovek.department`.
pub fn department() -> EntityDeclaration {
    EntityDeclaration::new::<Department>("Department")
        .field(F::scalar::<i64>("id").primary_key().generated())
        .field(F::scalar::<String>("name").max_length(30).unique())
        .field(F::scalar::<String>("code").max_length(5))
        .field(F::collection::<Person>("people").foreign_key("department"))
}

/// A person stored in table `clovek` with a nullable department reference
pub fn person() -> EntityDeclaration {
    EntityDeclaration::new::<Person>("Person")
        .table("clovek")
        .field(F::scalar::<i64>("id").primary_key().generated())
        .field(F::scalar::<String>("surname").max_length(30))
        .field(F::scalar::<String>("name").max_length(30))
        .field(F::scalar::<i32>("age"))
        .field(F::scalar::<Option<NaiveDate>>("born"))
        .field(F::scalar::<DateTime<Utc>>("updated_at"))
        .field(F::reference::<Department>("department"))
}

pub fn tag() -> EntityDeclaration {
    EntityDeclaration::new::<Tag>("Tag").field(F::scalar::<String>("label").primary_key())
}

pub fn registry() -> Registry {
    Registry::builder()
        .register(department())
        .register(person())
        .register(tag())
        .build()
        .expect("example declarations are valid")
}
