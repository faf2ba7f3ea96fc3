//! Schema command
//!
//! Usage: rowmap schema [--json]

use clap::Args;
use rowmap::schema::ddl_checksum;
use serde::Serialize;

use crate::model::registry;

#[derive(Debug, Args)]
pub struct SchemaArgs {
    /// Print entity, table, DDL and checksum as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct TableDdl<'a> {
    entity: &'a str,
    table: &'a str,
    ddl: &'a str,
    checksum: String,
}

pub fn execute(args: SchemaArgs) -> Result<(), Box<dyn std::error::Error>> {
    let registry = registry()?;

    let tables: Vec<TableDdl<'_>> = registry
        .creation_order()
        .into_iter()
        .map(|model| {
            let ddl = model.statements().create_table.sql();
            TableDdl {
                entity: model.entity(),
                table: model.table(),
                ddl,
                checksum: ddl_checksum(ddl),
            }
        })
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&tables)?);
    } else {
        for table in &tables {
            println!("-- {} ({})", table.entity, table.checksum);
            println!("{};", table.ddl);
        }
    }

    Ok(())
}
