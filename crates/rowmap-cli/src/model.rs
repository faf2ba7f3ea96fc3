//! Demo entities: a department with its people

use chrono::{DateTime, NaiveDate, Utc};
use rowmap::{Entity, Many, Ref, RegisterEntity, Registry};
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
    #[rowmap(relation(one_to_one), fetch = "eager")]
    pub department: Ref<Department>,
}

pub fn registry() -> Result<Arc<Registry>, rowmap::ExtractionError> {
    let registry = Registry::builder()
        .entity::<Department>()
        .entity::<Person>()
        .build()?;
    Ok(Arc::new(registry))
}
