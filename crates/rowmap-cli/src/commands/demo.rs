//! Demo command
//!
//! Usage: rowmap demo --db <PATH> [--config <FILE>] [--json]

use chrono::{NaiveDate, Utc};
use clap::Args;
use rowmap::{create_tables, Many, Ref, Session, SessionManager, StoreConfig};
use serde::Serialize;
use std::path::PathBuf;

use crate::model::{registry, Department, Person};

#[derive(Debug, Args)]
pub struct DemoArgs {
    /// Store file, created when missing
    #[arg(long, default_value = "rowmap-demo.db")]
    pub db: PathBuf,

    /// Store settings in TOML; its location is replaced by --db
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print the people listing as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct PersonRow {
    id: i64,
    name: String,
    surname: String,
    age: i32,
    born: Option<NaiveDate>,
    department: Option<String>,
}

pub fn execute(args: DemoArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = match &args.config {
        Some(path) => StoreConfig::load(path)?,
        None => StoreConfig::default(),
    };
    let config = StoreConfig {
        location: rowmap::Location::Path(args.db.clone()),
        ..config
    };

    let manager = SessionManager::new(config, registry()?);
    let session = manager.open()?;
    let report = create_tables(&session)?;
    if report.has_drift() {
        eprintln!("warning: schema drift in {}", report.drifted.join(", "));
    }

    let people = session.transaction(seed)?;
    let rows = list(&session)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        println!("saved {} people", people);
        for row in &rows {
            println!(
                "{:>4}  {} {} ({})  {}",
                row.id,
                row.name,
                row.surname,
                row.age,
                row.department.as_deref().unwrap_or("-")
            );
        }
    }

    session.close()?;
    Ok(())
}

/// Save the demo department (once) and two people in it
fn seed(session: &Session) -> rowmap::Result<usize> {
    let departments = session.repository::<Department>()?;
    let existing = departments
        .find_all(session)?
        .find(|d| d.as_ref().map_or(true, |d| d.name == "Informatika"))
        .transpose()?;
    let department = match existing {
        Some(department) => department,
        None => departments.save(
            session,
            Department {
                id: 0,
                name: "Informatika".to_string(),
                code: "IT".to_string(),
                people: Many::default(),
            },
        )?,
    };

    let repo = session.repository::<Person>()?;
    let demo = [
        ("Ana", "Nováková", 30, NaiveDate::from_ymd_opt(1994, 3, 14)),
        ("Petr", "Svoboda", 41, None),
    ];
    for (name, surname, age, born) in demo {
        repo.save(
            session,
            Person {
                id: 0,
                surname: surname.to_string(),
                name: name.to_string(),
                age,
                born,
                updated_at: Utc::now(),
                department: Ref::to(&department),
            },
        )?;
    }
    Ok(demo.len())
}

fn list(session: &Session) -> rowmap::Result<Vec<PersonRow>> {
    let people = session.repository::<Person>()?;
    people
        .find_all(session)?
        .map(|person| {
            let person = person?;
            Ok(PersonRow {
                id: person.id,
                department: person.department.loaded().map(|d| d.name.clone()),
                name: person.name,
                surname: person.surname,
                age: person.age,
                born: person.born,
            })
        })
        .collect()
}
